//! Error types for SEA file operations.
//!
//! This module defines the [`Error`] enum covering every fatal failure mode of
//! the scanner and decoder. Recoverable conditions are not errors; they are
//! reported as [`crate::Diagnostic`] values attached to the affected buffer.

use thiserror::Error;

use crate::records::SeaTime;

/// Errors that can occur while reading an SEA file.
///
/// Fatal stream-level faults ([`Error::InvalidFileFormat`],
/// [`Error::TruncatedRecord`]) abort the scan of the whole file. Per-record
/// faults ([`Error::PayloadOverrun`], [`Error::InvalidTimestamp`]) are fatal
/// only for the record that raised them; the buffer decoder converts them
/// into fatal-severity diagnostics and continues with the remaining records.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream is not a recognized SEA M200/M300 file.
    ///
    /// Raised by the file-type check on the first directory record, or when
    /// first-record resynchronization exhausts the stream (or the configured
    /// maximum resync distance) without finding a time-record signature.
    #[error("not a recognized SEA file: {reason} (at byte {offset})")]
    InvalidFileFormat {
        /// Why the stream was rejected.
        reason: String,
        /// Byte offset at which the check gave up.
        offset: usize,
    },

    /// A fixed-layout record is only partially present.
    #[error("record at byte {offset} is truncated: {available} of {expected} bytes present")]
    TruncatedRecord {
        /// Byte offset where the record was expected to start.
        offset: usize,
        /// Bytes the record layout requires.
        expected: usize,
        /// Bytes actually available before end of input.
        available: usize,
    },

    /// A record's declared payload extends past the end of its buffer.
    #[error(
        "payload for tag {tag_number} at offset {data_offset} ends at {expected_end:#x}, \
         past end of buffer ({buffer_len:#x})"
    )]
    PayloadOverrun {
        /// Tag number of the offending record.
        tag_number: u16,
        /// Payload offset relative to the buffer base.
        data_offset: usize,
        /// Where the declared payload would end.
        expected_end: usize,
        /// Actual length of the buffer's byte range.
        buffer_len: usize,
    },

    /// A time record does not describe a valid calendar timestamp.
    ///
    /// Carries the raw decoded fields so the offending values can be located
    /// in the file, rather than a bare conversion failure.
    #[error("invalid timestamp {time:?} (computed microsecond {microsecond})")]
    InvalidTimestamp {
        /// The raw time-record fields as read from the file.
        time: SeaTime,
        /// Microsecond value computed from `fraction_of_second / max_sys_freq`;
        /// a value of one second or more is itself the fault.
        microsecond: u64,
    },
}

/// A specialized Result type for SEA file operations.
pub type Result<T> = core::result::Result<T, Error>;
