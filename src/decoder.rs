//! Type-dispatched dataset decoder.
//!
//! Given one scanned buffer's directory records and raw bytes, the decoder
//! produces a [`Buffer`]: each record's payload is decoded according to its
//! acquisition-type layout, bounds-validated against the buffer, and
//! inserted under both lookup indexes. Per-record faults become
//! fatal-severity diagnostics on the buffer; only stream-level faults
//! propagate as errors (from the scanner, not from here).

use std::collections::HashSet;

use crate::buffer::{Buffer, DataSet, Value};
use crate::diagnostics::{Diagnostic, DiagnosticKind, record as record_diagnostic};
use crate::layout::{ElementKind, layout_for};
use crate::records::{
    DIRECTORY_RECORD_SIZE, DirectoryRecord, SeaTime, TIME_RECORD_SIZE, TagKind, common,
};
use crate::scanner::RawBuffer;
use crate::{Error, Result};

/// Decode one sample element at `offset`.
fn read_value(bytes: &[u8], offset: usize, element: ElementKind) -> Value {
    match element {
        ElementKind::U8 => Value::U8(common::read_u8(bytes, offset)),
        ElementKind::I8 => Value::I8(common::read_u8(bytes, offset) as i8),
        ElementKind::U16 => Value::U16(common::read_u16(bytes, offset)),
        ElementKind::I16 => Value::I16(common::read_i16(bytes, offset)),
        ElementKind::U32 => Value::U32(common::read_u32(bytes, offset)),
        ElementKind::I32 => Value::I32(common::read_i32(bytes, offset)),
        ElementKind::U64 => Value::U64(common::read_u64(bytes, offset)),
        ElementKind::I64 => Value::I64(common::read_i64(bytes, offset)),
    }
}

fn overrun(record: &DirectoryRecord, expected_end: usize, buffer_len: usize) -> Error {
    Error::PayloadOverrun {
        tag_number: record.tag_number,
        data_offset: usize::from(record.data_offset),
        expected_end,
        buffer_len,
    }
}

/// Decode an ordinary data record's payload from its buffer's bytes.
///
/// Looks up the sample layout for `(typ, bytes_per_sample)`, validates the
/// declared sizes against `raw` (the buffer's byte range), and decodes
/// little-endian. `record_offset` is the absolute stream offset of the
/// directory record, used to anchor diagnostics.
///
/// # Returns
/// The dataset plus any recoverable diagnostics (unknown type, sample-size
/// mismatch, misaligned slice width), or [`Error::PayloadOverrun`] when the
/// declared payload extends past the end of `raw`.
pub fn read_dataset(
    record: &DirectoryRecord,
    raw: &[u8],
    record_offset: usize,
) -> Result<(DataSet, Vec<Diagnostic>)> {
    let (layout, note) = layout_for(record.typ, record.bytes_per_sample, record.number_of_bytes);
    let mut diagnostics = Vec::new();
    if let Some(kind) = note {
        record_diagnostic(
            &mut diagnostics,
            Diagnostic::new(kind, record_offset, Some(record.tag_number)),
        );
    }

    let data_offset = usize::from(record.data_offset);

    if !layout.per_sample() {
        // Unknown-type fallback: the layout spans the declared payload once.
        let total = layout.byte_len();
        if data_offset + total > raw.len() {
            return Err(overrun(record, data_offset + total, raw.len()));
        }
        let dataset = DataSet::Raw(raw[data_offset..data_offset + total].to_vec());
        return Ok((dataset, diagnostics));
    }

    let expected = u32::from(record.samples) * u32::from(record.bytes_per_sample);
    if u32::from(record.number_of_bytes) < expected {
        // Legal in the file format; diagnosed but not truncated.
        record_diagnostic(
            &mut diagnostics,
            Diagnostic::new(
                DiagnosticKind::SampleSizeMismatch {
                    number_of_bytes: record.number_of_bytes,
                    expected,
                },
                record_offset,
                Some(record.tag_number),
            ),
        );
    }
    if data_offset + expected as usize > raw.len() {
        return Err(overrun(record, data_offset + expected as usize, raw.len()));
    }

    // The layout's own width can differ from the declared sample width
    // (type 2 packs 42 bytes); guard the actual read span as well.
    let total = layout.byte_len() * usize::from(record.samples);
    if data_offset + total > raw.len() {
        return Err(overrun(record, data_offset + total, raw.len()));
    }

    let dataset = if layout.is_raw_bytes() {
        DataSet::Raw(raw[data_offset..data_offset + total].to_vec())
    } else {
        let per_sample: usize = layout.runs().iter().map(|run| run.count).sum();
        let mut values = Vec::with_capacity(per_sample * usize::from(record.samples));
        let mut pos = data_offset;
        for _ in 0..record.samples {
            for run in layout.runs() {
                for _ in 0..run.count {
                    values.push(read_value(raw, pos, run.element));
                    pos += run.element.width();
                }
            }
        }
        DataSet::Samples(values)
    };

    Ok((dataset, diagnostics))
}

/// Decode a FILENAME/FILEDATA record as `samples` fixed-width byte strings
/// of `bytes_per_sample` bytes each.
pub fn read_string_dataset(record: &DirectoryRecord, raw: &[u8]) -> Result<DataSet> {
    let data_offset = usize::from(record.data_offset);
    let width = usize::from(record.bytes_per_sample);
    let total = width * usize::from(record.samples);
    if data_offset + total > raw.len() {
        return Err(overrun(record, data_offset + total, raw.len()));
    }

    let strings = (0..usize::from(record.samples))
        .map(|i| {
            let start = data_offset + i * width;
            raw[start..start + width].to_vec()
        })
        .collect();
    Ok(DataSet::Strings(strings))
}

/// Decode a time record's first 18-byte sample and convert it.
fn read_time_dataset(record: &DirectoryRecord, raw: &[u8]) -> Result<DataSet> {
    let data_offset = usize::from(record.data_offset);
    if data_offset + TIME_RECORD_SIZE > raw.len() {
        return Err(overrun(record, data_offset + TIME_RECORD_SIZE, raw.len()));
    }
    let time = SeaTime::read_at(raw, data_offset)?;
    let datetime = time.to_datetime()?;
    Ok(DataSet::Time { time, datetime })
}

/// Convert a per-record fatal fault into its fatal-severity diagnostic.
fn fatal_diagnostic(record: &DirectoryRecord, record_offset: usize, err: &Error) -> Diagnostic {
    let kind = match err {
        Error::InvalidTimestamp { time, .. } => DiagnosticKind::InvalidTimestamp { time: *time },
        Error::PayloadOverrun {
            expected_end,
            buffer_len,
            ..
        } => DiagnosticKind::PayloadOverrun {
            expected_end: *expected_end,
            buffer_len: *buffer_len,
        },
        Error::TruncatedRecord {
            offset,
            expected,
            available,
        } => DiagnosticKind::PayloadOverrun {
            expected_end: offset + expected,
            buffer_len: offset + available,
        },
        // Stream-level faults never reach here; keep the record locatable.
        _ => DiagnosticKind::PayloadOverrun {
            expected_end: 0,
            buffer_len: 0,
        },
    };
    Diagnostic::new(kind, record_offset, Some(record.tag_number))
}

/// Decodes scanned buffers into [`Buffer`] values.
///
/// The decoder is stateless apart from the set of secondary tag numbers the
/// acquisition-table collaborator wants excluded from decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferDecoder<'a> {
    secondary: Option<&'a HashSet<u16>>,
}

impl<'a> BufferDecoder<'a> {
    /// A decoder with no secondary-tag exclusions.
    pub fn new() -> Self {
        BufferDecoder::default()
    }

    /// A decoder that excludes the given secondary tag numbers; buffers
    /// containing one are flagged for exclusion from normal iteration.
    pub fn with_secondary_tags(secondary: &'a HashSet<u16>) -> Self {
        BufferDecoder {
            secondary: Some(secondary),
        }
    }

    fn is_secondary(&self, tag_number: u16) -> bool {
        self.secondary.is_some_and(|set| set.contains(&tag_number))
    }

    /// Decode one scanned buffer.
    ///
    /// `contents` is the full scanned stream; the buffer's own bytes are
    /// taken from `raw.range`. Per-record faults (payload overruns, invalid
    /// timestamps) become fatal diagnostics on the returned buffer; the
    /// remaining records still decode.
    pub fn decode(&self, raw: &RawBuffer, contents: &[u8]) -> Buffer {
        let mut buffer = Buffer::new();
        buffer.extend_diagnostics(raw.diagnostics.iter().cloned());
        let bytes = &contents[raw.range.clone()];

        for (i, record) in raw.records.iter().enumerate() {
            let record_offset = raw.range.start + i * DIRECTORY_RECORD_SIZE;

            match record.tag_kind() {
                TagKind::Time => match read_time_dataset(record, bytes) {
                    Ok(dataset) => buffer.add_dataset(*record, dataset, record_offset),
                    Err(e) => {
                        buffer.push_diagnostic(fatal_diagnostic(record, record_offset, &e));
                    }
                },
                // Boundary records end this buffer; LAST additionally ends
                // iteration over all buffers, which the owning iterator
                // handles.
                TagKind::Next | TagKind::Last => break,
                TagKind::Reserved => {
                    buffer.push_diagnostic(Diagnostic::new(
                        DiagnosticKind::ReservedTag,
                        record_offset,
                        Some(record.tag_number),
                    ));
                }
                TagKind::Filename | TagKind::Filedata => {
                    match read_string_dataset(record, bytes) {
                        Ok(dataset) => buffer.add_dataset(*record, dataset, record_offset),
                        Err(e) => {
                            buffer.push_diagnostic(fatal_diagnostic(record, record_offset, &e));
                        }
                    }
                }
                TagKind::Command | TagKind::Error | TagKind::Same => {
                    log::debug!(
                        "buffer at byte {} is not independently meaningful (tag {})",
                        raw.range.start,
                        record.tag_number
                    );
                    buffer.mark_excluded();
                }
                TagKind::Data(tag_number) if self.is_secondary(tag_number) => {
                    buffer.mark_excluded();
                }
                TagKind::Data(_) => match read_dataset(record, bytes, record_offset) {
                    Ok((dataset, diagnostics)) => {
                        buffer.extend_diagnostics(diagnostics);
                        buffer.add_dataset(*record, dataset, record_offset);
                    }
                    Err(e) => {
                        buffer.push_diagnostic(fatal_diagnostic(record, record_offset, &e));
                    }
                },
            }
        }

        buffer
    }
}
