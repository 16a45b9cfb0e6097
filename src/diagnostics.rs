//! Recoverable and per-record diagnostics.
//!
//! Faults that do not abort a scan are collected as [`Diagnostic`] values and
//! attached to the buffer they were observed in, so the caller sees a clean
//! boundary: a buffer is either fully decoded (with its diagnostics attached)
//! or the whole scan terminates with a [`crate::Error`].

use core::fmt;

use crate::records::SeaTime;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// Decoding continued with a best-effort interpretation.
    Warning,
    /// The affected record's dataset is unavailable; the rest of the buffer
    /// still decoded.
    Fatal,
}

/// The condition a [`Diagnostic`] reports.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum DiagnosticKind {
    /// A tag number in the reserved range 65000-65529 was encountered.
    ReservedTag,
    /// The acquisition type code has no known layout; the payload was decoded
    /// as raw bytes.
    UnknownAcquisitionType {
        /// The unrecognized type code.
        typ: u8,
    },
    /// `number_of_bytes` is smaller than `samples * bytes_per_sample`.
    ///
    /// Legal in the file format but only diagnosed here; the record decodes
    /// with its declared layout.
    SampleSizeMismatch {
        /// Declared payload size.
        number_of_bytes: u16,
        /// Size implied by the sample count and width.
        expected: u32,
    },
    /// A 2D Grey Advanced record's sample width is not a multiple of the
    /// 128-bit slice size; the slice count was rounded up.
    MisalignedSliceWidth {
        /// The offending sample width.
        bytes_per_sample: u16,
    },
    /// A tag number appeared twice in one buffer; the first entry was kept.
    DuplicateTag,
    /// First-record resynchronization skipped leading bytes before finding a
    /// valid time-record signature.
    ResyncSkipped {
        /// Number of bytes skipped.
        bytes: usize,
    },
    /// The stream ended without a LAST record; the trailing partial buffer
    /// was still emitted.
    MissingLastRecord,
    /// A filter constraint named an attribute that does not exist on
    /// directory records; the constraint was ignored.
    UnknownFilterField {
        /// The rejected attribute name.
        name: String,
    },
    /// The record's declared payload extends past the end of the buffer; its
    /// dataset is unavailable.
    PayloadOverrun {
        /// Where the declared payload would end.
        expected_end: usize,
        /// Actual length of the buffer's byte range.
        buffer_len: usize,
    },
    /// A time record did not describe a valid calendar timestamp; its dataset
    /// is unavailable.
    InvalidTimestamp {
        /// The raw time-record fields.
        time: SeaTime,
    },
}

impl DiagnosticKind {
    /// The severity this condition is reported with.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::PayloadOverrun { .. } | DiagnosticKind::InvalidTimestamp { .. } => {
                Severity::Fatal
            }
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::ReservedTag => write!(f, "reserved tag number encountered"),
            DiagnosticKind::UnknownAcquisitionType { typ } => {
                write!(f, "unknown acquisition type {typ}, payload read as raw bytes")
            }
            DiagnosticKind::SampleSizeMismatch {
                number_of_bytes,
                expected,
            } => write!(
                f,
                "declared payload size {number_of_bytes} is less than expected {expected}"
            ),
            DiagnosticKind::MisalignedSliceWidth { bytes_per_sample } => write!(
                f,
                "sample width {bytes_per_sample} is not a multiple of 16 bytes, \
                 slice count rounded up"
            ),
            DiagnosticKind::DuplicateTag => write!(f, "duplicate tag number, first entry kept"),
            DiagnosticKind::ResyncSkipped { bytes } => {
                write!(f, "skipped {bytes} leading bytes before first time record")
            }
            DiagnosticKind::MissingLastRecord => {
                write!(f, "stream ended without a LAST record")
            }
            DiagnosticKind::UnknownFilterField { name } => {
                write!(f, "filter attribute {name:?} does not exist on directory records")
            }
            DiagnosticKind::PayloadOverrun {
                expected_end,
                buffer_len,
            } => write!(
                f,
                "payload ends at {expected_end:#x}, past end of buffer ({buffer_len:#x})"
            ),
            DiagnosticKind::InvalidTimestamp { time } => {
                write!(f, "invalid timestamp {time:?}")
            }
        }
    }
}

/// A single diagnostic, anchored to a byte offset in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Severity of the condition.
    pub severity: Severity,
    /// What was observed.
    pub kind: DiagnosticKind,
    /// Absolute byte offset of the directory record that triggered the
    /// diagnostic (or of the scan position for stream-level conditions).
    pub offset: usize,
    /// Tag number of the record involved, when there is one.
    pub tag_number: Option<u16>,
}

impl Diagnostic {
    /// Build a diagnostic; the severity is derived from the kind.
    pub fn new(kind: DiagnosticKind, offset: usize, tag_number: Option<u16>) -> Self {
        Diagnostic {
            severity: kind.severity(),
            kind,
            offset,
            tag_number,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag_number {
            Some(tag) => write!(f, "byte {}, tag {}: {}", self.offset, tag, self.kind),
            None => write!(f, "byte {}: {}", self.offset, self.kind),
        }
    }
}

/// Log a diagnostic and append it to `list`.
pub(crate) fn record(list: &mut Vec<Diagnostic>, diag: Diagnostic) {
    match diag.severity {
        Severity::Warning => log::warn!("{diag}"),
        Severity::Fatal => log::error!("{diag}"),
    }
    list.push(diag);
}
