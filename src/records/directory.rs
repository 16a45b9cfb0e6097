// records/directory.rs
use super::{
    COMMAND_TAG, ERROR_TAG, FILEDATA_TAG, FILENAME_TAG, LAST_TAG, NEXT_TAG, RESERVED_TAG_HIGH,
    RESERVED_TAG_LOW, SAME_TAG, TIME_TAG,
    common::{read_u8, read_u16, validate_record_bytes},
};
use crate::Result;

/// Size of a directory record in bytes. Records are laid out contiguously
/// starting at a buffer's base offset; a partially present record is a fatal
/// decode error.
pub const DIRECTORY_RECORD_SIZE: usize = 16;

/// Directory record - fixed 16-byte little-endian header describing one field
/// of a buffer.
///
/// The record tells the decoder where a field's payload sits relative to the
/// buffer base (`data_offset`), how large it is, and which acquisition-type
/// layout to decode it with (`typ`). The three parameter bytes and the
/// hardware address are opaque to the core, except that `address` takes part
/// in the file-type check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectoryRecord {
    /// Identifies the field; some values are control sentinels (see [`TagKind`]).
    pub tag_number: u16,
    /// Byte offset of the payload, relative to the start of the current buffer.
    pub data_offset: u16,
    /// Declared payload size in bytes.
    pub number_of_bytes: u16,
    /// Number of repeated samples in the payload.
    pub samples: u16,
    /// Declared per-sample byte width.
    pub bytes_per_sample: u16,
    /// Acquisition-type code selecting the decode layout.
    pub typ: u8,
    /// Type-specific auxiliary parameter.
    pub parameter1: u8,
    /// Type-specific auxiliary parameter.
    pub parameter2: u8,
    /// Type-specific auxiliary parameter.
    pub parameter3: u8,
    /// Hardware address of the acquiring board.
    pub address: u16,
}

impl DirectoryRecord {
    /// Parse the directory record starting at `offset` in `bytes`.
    ///
    /// # Returns
    /// The record, or [`crate::Error::TruncatedRecord`] when fewer than 16
    /// bytes remain at `offset`.
    pub fn read_at(bytes: &[u8], offset: usize) -> Result<Self> {
        validate_record_bytes(bytes, offset, DIRECTORY_RECORD_SIZE)?;

        Ok(Self {
            tag_number: read_u16(bytes, offset),
            data_offset: read_u16(bytes, offset + 2),
            number_of_bytes: read_u16(bytes, offset + 4),
            samples: read_u16(bytes, offset + 6),
            bytes_per_sample: read_u16(bytes, offset + 8),
            typ: read_u8(bytes, offset + 10),
            parameter1: read_u8(bytes, offset + 11),
            parameter2: read_u8(bytes, offset + 12),
            parameter3: read_u8(bytes, offset + 13),
            address: read_u16(bytes, offset + 14),
        })
    }

    /// Parse a directory record from the first 16 bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read_at(bytes, 0)
    }

    /// Serialize the record to its 16-byte wire form.
    pub fn to_bytes(&self) -> [u8; DIRECTORY_RECORD_SIZE] {
        let mut out = [0u8; DIRECTORY_RECORD_SIZE];
        out[0..2].copy_from_slice(&self.tag_number.to_le_bytes());
        out[2..4].copy_from_slice(&self.data_offset.to_le_bytes());
        out[4..6].copy_from_slice(&self.number_of_bytes.to_le_bytes());
        out[6..8].copy_from_slice(&self.samples.to_le_bytes());
        out[8..10].copy_from_slice(&self.bytes_per_sample.to_le_bytes());
        out[10] = self.typ;
        out[11] = self.parameter1;
        out[12] = self.parameter2;
        out[13] = self.parameter3;
        out[14..16].copy_from_slice(&self.address.to_le_bytes());
        out
    }

    /// Classify this record's tag number.
    pub fn tag_kind(&self) -> TagKind {
        TagKind::of(self.tag_number)
    }

    /// Whether this record matches the signature every file's first record is
    /// known a priori to carry: a time field of two 18-byte samples.
    ///
    /// First-record resynchronization advances byte by byte until a record
    /// matching this signature is found.
    pub fn is_first_record_signature(&self) -> bool {
        self.tag_number == TIME_TAG
            && self.number_of_bytes == 36
            && self.samples == 2
            && self.bytes_per_sample == 18
    }
}

/// Classification of a directory record's tag number.
///
/// The control sentinels are fixed by the instrument manuals; everything else
/// is an ordinary data-bearing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Time dataset (tag 0).
    Time,
    /// Buffer terminator (tag 999).
    Next,
    /// Reserved range 65000-65529.
    Reserved,
    /// Embedded configuration file name (tag 65530).
    Filename,
    /// Embedded configuration file contents (tag 65531).
    Filedata,
    /// Operator command echo (tag 65532).
    Command,
    /// Acquisition error report (tag 65533).
    Error,
    /// Same-as-previous-buffer marker (tag 65534).
    Same,
    /// End-of-file sentinel (tag 65535).
    Last,
    /// Ordinary data record.
    Data(u16),
}

impl TagKind {
    /// Classify a raw tag number.
    pub fn of(tag_number: u16) -> Self {
        match tag_number {
            TIME_TAG => TagKind::Time,
            NEXT_TAG => TagKind::Next,
            RESERVED_TAG_LOW..=RESERVED_TAG_HIGH => TagKind::Reserved,
            FILENAME_TAG => TagKind::Filename,
            FILEDATA_TAG => TagKind::Filedata,
            COMMAND_TAG => TagKind::Command,
            ERROR_TAG => TagKind::Error,
            SAME_TAG => TagKind::Same,
            LAST_TAG => TagKind::Last,
            other => TagKind::Data(other),
        }
    }
}
