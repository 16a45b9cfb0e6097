// records/common.rs
//! Little-endian read helpers and buffer-size validation shared by the
//! fixed-layout record parsers.

use crate::{Error, Result};

/// Read a u16 from a byte slice at the given offset (little-endian).
#[inline]
pub fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Read an i16 from a byte slice at the given offset (little-endian).
#[inline]
pub fn read_i16(bytes: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Read a u32 from a byte slice at the given offset (little-endian).
#[inline]
pub fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Read an i32 from a byte slice at the given offset (little-endian).
#[inline]
pub fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    read_u32(bytes, offset) as i32
}

/// Read a u64 from a byte slice at the given offset (little-endian).
#[inline]
pub fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
        bytes[offset + 4],
        bytes[offset + 5],
        bytes[offset + 6],
        bytes[offset + 7],
    ])
}

/// Read an i64 from a byte slice at the given offset (little-endian).
#[inline]
pub fn read_i64(bytes: &[u8], offset: usize) -> i64 {
    read_u64(bytes, offset) as i64
}

/// Read a u8 from a byte slice at the given offset.
#[inline]
pub fn read_u8(bytes: &[u8], offset: usize) -> u8 {
    bytes[offset]
}

/// Validate that `expected` bytes of a record starting at `offset` are present.
///
/// Returns [`Error::TruncatedRecord`] if the slice ends first.
#[inline]
pub fn validate_record_bytes(bytes: &[u8], offset: usize, expected: usize) -> Result<()> {
    let available = bytes.len().saturating_sub(offset);
    if available < expected {
        return Err(Error::TruncatedRecord {
            offset,
            expected,
            available,
        });
    }
    Ok(())
}
