//! Directory-driven buffer scanner.
//!
//! [`BufferScanner`] walks the raw byte stream and partitions it into buffer
//! boundaries using the directory records, without decoding any payloads.
//! It yields one [`RawBuffer`] per buffer, in stream order, as a lazy,
//! finite, non-restartable sequence; re-scanning means building a new
//! scanner over the same bytes.
//!
//! The scan performs byte-by-byte resynchronization for the very first
//! record of the file (and only that one), tolerates a missing terminal
//! LAST record, and applies an optional whitelist [`RecordFilter`] so
//! uninteresting buffers are skipped without paying their decode cost.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;

use crate::diagnostics::{Diagnostic, DiagnosticKind, record as record_diagnostic};
use crate::records::{DIRECTORY_RECORD_SIZE, DirectoryRecord, TagKind};
use crate::{Error, Result};

/// Default upper bound on first-record resynchronization distance.
///
/// The instrument never writes more than a handful of garbage bytes before
/// the first time record; a stream that needs more than this is not a valid
/// SEA file.
pub const DEFAULT_MAX_RESYNC: usize = 64 * 1024;

/// A directory-record attribute a filter constraint can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    TagNumber,
    DataOffset,
    NumberOfBytes,
    Samples,
    BytesPerSample,
    Typ,
    Parameter1,
    Parameter2,
    Parameter3,
    Address,
}

impl FilterField {
    /// Resolve an attribute name, as spelled in the directory-record layout.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "tag_number" => Some(FilterField::TagNumber),
            "data_offset" => Some(FilterField::DataOffset),
            "number_of_bytes" => Some(FilterField::NumberOfBytes),
            "samples" => Some(FilterField::Samples),
            "bytes_per_sample" => Some(FilterField::BytesPerSample),
            "typ" => Some(FilterField::Typ),
            "parameter1" => Some(FilterField::Parameter1),
            "parameter2" => Some(FilterField::Parameter2),
            "parameter3" => Some(FilterField::Parameter3),
            "address" => Some(FilterField::Address),
            _ => None,
        }
    }

    fn value_of(self, record: &DirectoryRecord) -> u64 {
        match self {
            FilterField::TagNumber => u64::from(record.tag_number),
            FilterField::DataOffset => u64::from(record.data_offset),
            FilterField::NumberOfBytes => u64::from(record.number_of_bytes),
            FilterField::Samples => u64::from(record.samples),
            FilterField::BytesPerSample => u64::from(record.bytes_per_sample),
            FilterField::Typ => u64::from(record.typ),
            FilterField::Parameter1 => u64::from(record.parameter1),
            FilterField::Parameter2 => u64::from(record.parameter2),
            FilterField::Parameter3 => u64::from(record.parameter3),
            FilterField::Address => u64::from(record.address),
        }
    }
}

/// An immutable whitelist of `(attribute, accepted values)` constraints.
///
/// A non-empty filter drops buffers by default; a buffer is kept as soon as
/// any one of its records matches any constraint. An empty filter keeps
/// everything. Filters are explicit per-scan values; nothing is shared
/// between scans.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    constraints: HashMap<FilterField, HashSet<u64>>,
}

impl RecordFilter {
    /// An empty filter that keeps every buffer.
    pub fn new() -> Self {
        RecordFilter::default()
    }

    /// Whether no constraints are present.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Add accepted values for a field.
    pub fn allow(mut self, field: FilterField, values: impl IntoIterator<Item = u64>) -> Self {
        self.constraints.entry(field).or_default().extend(values);
        self
    }

    /// Convenience for the most common constraint.
    pub fn allow_tag_numbers(self, tag_numbers: impl IntoIterator<Item = u16>) -> Self {
        self.allow(
            FilterField::TagNumber,
            tag_numbers.into_iter().map(u64::from),
        )
    }

    /// Add accepted values for an attribute by name.
    ///
    /// An attribute name that does not exist on directory records is
    /// rejected: the constraint is ignored and a configuration diagnostic is
    /// returned (and logged).
    pub fn allow_named(
        &mut self,
        name: &str,
        values: impl IntoIterator<Item = u64>,
    ) -> Option<Diagnostic> {
        match FilterField::parse(name) {
            Some(field) => {
                self.constraints.entry(field).or_default().extend(values);
                None
            }
            None => {
                let diag = Diagnostic::new(
                    DiagnosticKind::UnknownFilterField {
                        name: name.to_string(),
                    },
                    0,
                    None,
                );
                log::warn!("{diag}");
                Some(diag)
            }
        }
    }

    /// Whether any constraint accepts this record.
    pub fn matches(&self, record: &DirectoryRecord) -> bool {
        self.constraints
            .iter()
            .any(|(field, values)| values.contains(&field.value_of(record)))
    }
}

/// One scanned buffer: its directory records and the byte range it occupies,
/// relative to the start of the stream. Payload offsets in the records are
/// relative to `range.start`.
#[derive(Debug, Clone)]
pub struct RawBuffer {
    /// Directory records in stream order, including the terminal record.
    pub records: Vec<DirectoryRecord>,
    /// Byte range of the buffer within the scanned stream.
    pub range: Range<usize>,
    /// Scanner-level diagnostics for this buffer (resynchronization,
    /// missing LAST record).
    pub diagnostics: Vec<Diagnostic>,
}

/// Lazy iterator over the buffers of a byte stream.
///
/// Yields `Result<RawBuffer>`; a fatal stream-level fault ends the scan with
/// one `Err` item. The scanner holds its own reference to the stream bytes
/// and releases it when the scan terminates, whether by the LAST sentinel,
/// by truncation, or by a fatal fault.
pub struct BufferScanner {
    contents: Option<Arc<[u8]>>,
    filter: RecordFilter,
    max_resync: usize,
    cursor: usize,
    dir_base: usize,
    records: Vec<DirectoryRecord>,
    pending: Vec<Diagnostic>,
    kept: bool,
    synced: bool,
    finished: bool,
    seen_last: bool,
    missing_last: bool,
}

impl BufferScanner {
    /// Scan `contents` from byte 0, keeping only buffers accepted by
    /// `filter` (an empty filter keeps everything).
    pub fn new(contents: impl Into<Arc<[u8]>>, filter: RecordFilter) -> Self {
        let kept = filter.is_empty();
        BufferScanner {
            contents: Some(contents.into()),
            filter,
            max_resync: DEFAULT_MAX_RESYNC,
            cursor: 0,
            dir_base: 0,
            records: Vec::new(),
            pending: Vec::new(),
            kept,
            synced: false,
            finished: false,
            seen_last: false,
            missing_last: false,
        }
    }

    /// Override the maximum first-record resynchronization distance.
    pub fn with_max_resync(mut self, max_resync: usize) -> Self {
        self.max_resync = max_resync;
        self
    }

    /// Whether the scan has terminated (normally or fatally).
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the stream ended without a LAST record. Only meaningful once
    /// the scan is finished.
    pub fn missing_last(&self) -> bool {
        self.missing_last
    }

    /// Whether the terminal LAST record was reached.
    pub fn seen_last(&self) -> bool {
        self.seen_last
    }

    fn finish(&mut self) {
        self.finished = true;
        // Drop the retained byte-slice reference; the file bytes can be
        // released once every holder has done the same.
        self.contents = None;
    }

    fn take_buffer(&mut self, range: Range<usize>) -> RawBuffer {
        RawBuffer {
            records: std::mem::take(&mut self.records),
            range,
            diagnostics: std::mem::take(&mut self.pending),
        }
    }

    /// Byte-by-byte search for the first record's time signature. Applies
    /// only to the very first record of the file; later buffers start
    /// directly after the previous payload.
    fn resync(&mut self, bytes: &[u8]) -> Result<()> {
        let start = self.cursor;
        loop {
            let skipped = self.cursor - start;
            if skipped > self.max_resync {
                return Err(Error::InvalidFileFormat {
                    reason: format!(
                        "no time-record signature within {} bytes of stream start",
                        self.max_resync
                    ),
                    offset: self.cursor,
                });
            }
            if self.cursor + DIRECTORY_RECORD_SIZE > bytes.len() {
                return Err(Error::InvalidFileFormat {
                    reason: "stream exhausted before a time-record signature was found".into(),
                    offset: self.cursor,
                });
            }

            let record = DirectoryRecord::read_at(bytes, self.cursor)?;
            if record.is_first_record_signature() {
                if skipped > 0 {
                    log::debug!("resynchronized after skipping {skipped} bytes");
                    record_diagnostic(
                        &mut self.pending,
                        Diagnostic::new(DiagnosticKind::ResyncSkipped { bytes: skipped }, start, None),
                    );
                }
                self.dir_base = self.cursor;
                self.synced = true;
                return Ok(());
            }

            self.cursor += 1;
            self.dir_base = self.cursor;
        }
    }
}

impl Iterator for BufferScanner {
    type Item = Result<RawBuffer>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let contents = match &self.contents {
            Some(contents) => Arc::clone(contents),
            None => return None,
        };
        let bytes: &[u8] = &contents;
        let len = bytes.len();

        if !self.synced {
            if let Err(e) = self.resync(bytes) {
                self.finish();
                return Some(Err(e));
            }
        }

        loop {
            // Truncation guard: a stream lacking a terminal LAST record is
            // tolerated; whatever remains is emitted as a partial buffer.
            if self.cursor + DIRECTORY_RECORD_SIZE > len {
                self.missing_last = true;
                let kept = self.kept;
                if self.records.is_empty() && self.dir_base >= len {
                    self.finish();
                    return None;
                }
                let mut raw = self.take_buffer(self.dir_base..len);
                record_diagnostic(
                    &mut raw.diagnostics,
                    Diagnostic::new(DiagnosticKind::MissingLastRecord, self.cursor, None),
                );
                self.finish();
                return kept.then_some(Ok(raw));
            }

            let record = match DirectoryRecord::read_at(bytes, self.cursor) {
                Ok(record) => record,
                Err(e) => {
                    self.finish();
                    return Some(Err(e));
                }
            };
            self.records.push(record);
            if !self.kept && self.filter.matches(&record) {
                self.kept = true;
            }

            match record.tag_kind() {
                TagKind::Next => {
                    let payload_end = self.dir_base + usize::from(record.data_offset);
                    // The payload must at least cover the directory itself or
                    // the scan cannot make forward progress.
                    if payload_end < self.cursor + DIRECTORY_RECORD_SIZE {
                        self.finish();
                        return Some(Err(Error::InvalidFileFormat {
                            reason: format!(
                                "NEXT record declares a buffer of {} bytes, shorter than \
                                 its own directory",
                                record.data_offset
                            ),
                            offset: self.cursor,
                        }));
                    }

                    let raw = self.take_buffer(self.dir_base..payload_end.min(len));
                    self.cursor = payload_end;
                    self.dir_base = payload_end;
                    let kept = std::mem::replace(&mut self.kept, self.filter.is_empty());
                    if kept {
                        return Some(Ok(raw));
                    }
                    log::trace!("dropped buffer at {:?} (no filter match)", raw.range);
                    // Dropped by the filter: keep scanning.
                }
                TagKind::Last => {
                    self.seen_last = true;
                    let kept = self.kept;
                    let raw = self.take_buffer(self.dir_base..len);
                    self.finish();
                    return kept.then_some(Ok(raw));
                }
                // TIME is informational here; decoding happens later.
                // Reserved, FILENAME, FILEDATA, COMMAND, ERROR, SAME, and
                // ordinary data tags take no scanner-level action.
                TagKind::Time
                | TagKind::Reserved
                | TagKind::Filename
                | TagKind::Filedata
                | TagKind::Command
                | TagKind::Error
                | TagKind::Same
                | TagKind::Data(_) => {
                    self.cursor += DIRECTORY_RECORD_SIZE;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_record(tag_number: u16, typ: u8) -> DirectoryRecord {
        DirectoryRecord {
            tag_number,
            data_offset: 0,
            number_of_bytes: 2,
            samples: 1,
            bytes_per_sample: 2,
            typ,
            parameter1: 0,
            parameter2: 0,
            parameter3: 0,
            address: 0,
        }
    }

    #[test]
    fn filter_field_names() {
        assert_eq!(FilterField::parse("tag_number"), Some(FilterField::TagNumber));
        assert_eq!(FilterField::parse("typ"), Some(FilterField::Typ));
        assert_eq!(FilterField::parse("type"), None);
        assert_eq!(FilterField::parse("tags"), None);
    }

    #[test]
    fn filter_matches_any_constraint() {
        let filter = RecordFilter::new()
            .allow_tag_numbers([7])
            .allow(FilterField::Typ, [35]);

        assert!(filter.matches(&data_record(7, 1)));
        assert!(filter.matches(&data_record(12, 35)));
        assert!(!filter.matches(&data_record(12, 1)));
    }

    #[test]
    fn unknown_filter_attribute_is_rejected() {
        let mut filter = RecordFilter::new();
        let diag = filter.allow_named("no_such_field", [1]).unwrap();
        assert_eq!(
            diag.kind,
            DiagnosticKind::UnknownFilterField {
                name: "no_such_field".to_string()
            }
        );
        assert!(filter.is_empty());
        assert!(filter.allow_named("samples", [1]).is_none());
        assert!(!filter.is_empty());
    }

    #[test]
    fn resync_limit_is_fatal() {
        // 64 bytes of garbage, limit of 16: the signature is never reached.
        let mut bytes = vec![0xFFu8; 64];
        bytes.extend_from_slice(&[0u8; 32]);
        let mut scanner = BufferScanner::new(bytes, RecordFilter::new()).with_max_resync(16);
        match scanner.next() {
            Some(Err(Error::InvalidFileFormat { .. })) => {}
            other => panic!("unexpected {other:?}"),
        }
        assert!(scanner.next().is_none());
    }
}
