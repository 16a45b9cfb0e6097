#![forbid(unsafe_code)]

//! # m200-rs
//!
//! A Rust library for reading SEA Model 200/300 (M200/M300) data-acquisition
//! dump files.
//!
//! The M200/M300 are airborne data-acquisition systems built by Science
//! Engineering Associates. They write a flat binary stream of *buffers*: each
//! buffer starts with a contiguous run of 16-byte little-endian directory
//! records, one per dataset, followed by the payloads the records point at.
//! A buffer always opens with a time record and is terminated by a `NEXT`
//! record (whose `data_offset` is the buffer's total size) or, for the final
//! buffer, a `LAST` record.
//!
//! ## Features
//!
//! - **Scanning**: Lazily partition a dump into buffers from the directory
//!   records alone, with first-record resynchronization and tolerance for
//!   truncated files
//! - **Decoding**: Per-record payload decoding dispatched on the acquisition
//!   type code, with two lookup indexes per buffer (tag number and type)
//! - **Filtering**: Whitelist filters over directory-record attributes to
//!   skip uninteresting buffers before paying their decode cost
//! - **Metadata**: Extraction of the acquisition start time and the
//!   configuration files embedded via FILENAME/FILEDATA records
//! - **Diagnostics**: Recoverable anomalies (unknown acquisition types,
//!   reserved tags, size mismatches) are collected per buffer instead of
//!   aborting the read
//!
//! ## Quick Start
//!
//! ```no_run
//! use m200_rs::{SeaFile, Result};
//!
//! fn main() -> Result<()> {
//!     let mut file = SeaFile::from_file("flight.sea")?;
//!     file.load_metadata()?;
//!     println!("acquisition started {:?}", file.start_datetime());
//!
//!     for buffer in file.buffers() {
//!         let buffer = buffer?;
//!         if let Some(datetime) = buffer.datetime() {
//!             println!("buffer at {datetime}: {} datasets", buffer.len());
//!         }
//!         for diagnostic in buffer.diagnostics() {
//!             eprintln!("  {diagnostic}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Filtered iteration
//!
//! ```no_run
//! use m200_rs::{RecordFilter, SeaFile, Result};
//!
//! fn main() -> Result<()> {
//!     let file = SeaFile::from_file("flight.sea")?;
//!     // Only buffers carrying tag 300 are decoded.
//!     let filter = RecordFilter::new().allow_tag_numbers([300]);
//!     for buffer in file.buffers_filtered(filter) {
//!         let buffer = buffer?;
//!         if let Some(dataset) = buffer.dataset_by_tag_number(300) {
//!             println!("{dataset:?}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`records`] | Wire-level record structures and tag constants |
//! | [`layout`] | Acquisition-type dispatch table |
//! | [`scanner`] | Directory-driven buffer scanner and [`RecordFilter`] |
//! | [`decoder`] | Type-dispatched dataset decoding |
//! | [`buffer`] | The decoded, queryable [`Buffer`] |
//! | [`registry`] | Acquisition-tag registry and embedded config files |
//! | [`diagnostics`] | Recoverable per-buffer diagnostics |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Fatal stream-level faults (invalid file
//! format, truncated records) surface as [`Error`]; per-record faults and
//! recoverable anomalies become [`Diagnostic`]s on the affected buffer so the
//! rest of the file still reads.

pub mod buffer;
pub mod decoder;
pub mod diagnostics;
pub mod error;
pub mod layout;
pub mod records;
pub mod registry;
pub mod scanner;

mod sea;

// Re-export commonly used types at the crate root
pub use buffer::{Buffer, DataSet, Value};
pub use decoder::{BufferDecoder, read_dataset, read_string_dataset};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use error::{Error, Result};
pub use layout::{ElementKind, ElementRun, SampleLayout, layout_for};
pub use records::{DIRECTORY_RECORD_SIZE, DirectoryRecord, SeaTime, TIME_RECORD_SIZE, TagKind};
pub use registry::{ConfigFile, TagInfo, TagRegistry};
pub use scanner::{BufferScanner, FilterField, RawBuffer, RecordFilter};
pub use sea::{Buffers, SeaFile};
