// src/records/mod.rs

// ============================================================================
// Tag number constants
// ============================================================================
// These tag numbers are defined in the user manuals of the SEA Model 200 and
// SEA Model 300. Everything between TIME and NEXT, and between NEXT and the
// reserved range, is an ordinary data tag.

/// Time dataset; always the first record of a buffer.
pub const TIME_TAG: u16 = 0;
/// Terminates the current buffer; its `data_offset` is the buffer's size.
pub const NEXT_TAG: u16 = 999;
/// Low end of the reserved tag range (inclusive).
pub const RESERVED_TAG_LOW: u16 = 65000;
/// High end of the reserved tag range (inclusive).
pub const RESERVED_TAG_HIGH: u16 = 65529;
/// Name of an embedded configuration file.
pub const FILENAME_TAG: u16 = 65530;
/// Contents of an embedded configuration file.
pub const FILEDATA_TAG: u16 = 65531;
/// Operator command echo; marks the buffer as not independently meaningful.
pub const COMMAND_TAG: u16 = 65532;
/// Acquisition error report; marks the buffer as not independently meaningful.
pub const ERROR_TAG: u16 = 65533;
/// "Same as previous buffer" marker.
pub const SAME_TAG: u16 = 65534;
/// End-of-file sentinel; terminates the final buffer.
pub const LAST_TAG: u16 = 65535;

/// Hardware address every time record carries; part of the file-type check.
pub const TIME_RECORD_ADDRESS: u16 = 0xAA55;

// ============================================================================
// Submodules
// ============================================================================

pub mod common;

mod directory;
mod time;

pub use directory::{DIRECTORY_RECORD_SIZE, DirectoryRecord, TagKind};
pub use time::{SeaTime, TIME_RECORD_SIZE};
