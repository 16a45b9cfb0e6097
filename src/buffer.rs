//! The decoded, queryable result unit of a scan.
//!
//! A [`Buffer`] corresponds to one scan cycle between two `NEXT`/`LAST`
//! boundary records. It holds the buffer's directory records paired with
//! their decoded datasets, indexed by tag number (unique) and by acquisition
//! type (insertion order preserved per type), plus the recoverable
//! diagnostics observed while decoding it. A buffer is never mutated after
//! the decoder yields it.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::diagnostics::{Diagnostic, DiagnosticKind, record};
use crate::records::{DirectoryRecord, SeaTime, TIME_TAG};

/// A single decoded primitive value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
}

/// One record's decoded payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataSet {
    /// A decoded time record with its calendar timestamp.
    Time {
        /// The raw fields as read from the file.
        time: SeaTime,
        /// The converted timestamp.
        datetime: NaiveDateTime,
    },
    /// Fixed-width byte strings (FILENAME/FILEDATA records): `samples`
    /// strings of `bytes_per_sample` bytes each.
    Strings(Vec<Vec<u8>>),
    /// Decoded sample values, flattened across all samples in decode order.
    Samples(Vec<Value>),
    /// An opaque byte payload (network binary, dummy, and unknown-type
    /// acquisitions).
    Raw(Vec<u8>),
}

impl DataSet {
    /// The timestamp, when this is a time dataset.
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        match self {
            DataSet::Time { datetime, .. } => Some(*datetime),
            _ => None,
        }
    }

    /// The decoded values, when this is a sample dataset.
    pub fn as_samples(&self) -> Option<&[Value]> {
        match self {
            DataSet::Samples(values) => Some(values),
            _ => None,
        }
    }

    /// The payload bytes, when this is an opaque dataset.
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            DataSet::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// One decoded buffer: ordered `(DirectoryRecord, DataSet)` pairs with
/// constant-time lookup by tag number and by acquisition type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buffer {
    entries: Vec<(DirectoryRecord, DataSet)>,
    by_tag_number: HashMap<u16, usize>,
    by_typ: HashMap<u8, Vec<usize>>,
    diagnostics: Vec<Diagnostic>,
    excluded: bool,
}

impl Buffer {
    pub(crate) fn new() -> Self {
        Buffer::default()
    }

    /// Insert a decoded dataset, maintaining both indexes.
    ///
    /// Time records are deliberately excluded from the type index: in
    /// asynchronously-triggered buffers their `typ` field carries the
    /// triggering event's acquisition type rather than "time", which would
    /// corrupt type-indexed queries. Lookup by tag number still works since
    /// a buffer only ever carries one time dataset.
    ///
    /// A duplicate tag number keeps the first entry and records a
    /// [`DiagnosticKind::DuplicateTag`] diagnostic; `offset` locates the
    /// duplicate record in the file.
    pub(crate) fn add_dataset(&mut self, entry: DirectoryRecord, dataset: DataSet, offset: usize) {
        if self.by_tag_number.contains_key(&entry.tag_number) {
            self.push_diagnostic(Diagnostic::new(
                DiagnosticKind::DuplicateTag,
                offset,
                Some(entry.tag_number),
            ));
            return;
        }

        let index = self.entries.len();
        self.by_tag_number.insert(entry.tag_number, index);
        if entry.tag_number != TIME_TAG {
            self.by_typ.entry(entry.typ).or_default().push(index);
        }
        self.entries.push((entry, dataset));
    }

    pub(crate) fn push_diagnostic(&mut self, diag: Diagnostic) {
        record(&mut self.diagnostics, diag);
    }

    /// Append already-logged diagnostics (from the scanner or dataset
    /// decoding) without logging them a second time.
    pub(crate) fn extend_diagnostics(&mut self, diags: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diags);
    }

    pub(crate) fn mark_excluded(&mut self) {
        self.excluded = true;
    }

    /// The directory record with the given tag number.
    pub fn record_by_tag_number(&self, tag_number: u16) -> Option<&DirectoryRecord> {
        self.by_tag_number
            .get(&tag_number)
            .map(|&i| &self.entries[i].0)
    }

    /// The decoded dataset with the given tag number.
    pub fn dataset_by_tag_number(&self, tag_number: u16) -> Option<&DataSet> {
        self.by_tag_number
            .get(&tag_number)
            .map(|&i| &self.entries[i].1)
    }

    /// All directory records with the given acquisition type, in insertion
    /// order. Time records never appear here.
    pub fn records_by_typ(&self, typ: u8) -> Vec<&DirectoryRecord> {
        self.by_typ
            .get(&typ)
            .map(|indexes| indexes.iter().map(|&i| &self.entries[i].0).collect())
            .unwrap_or_default()
    }

    /// All datasets with the given acquisition type, in insertion order.
    pub fn datasets_by_typ(&self, typ: u8) -> Vec<&DataSet> {
        self.by_typ
            .get(&typ)
            .map(|indexes| indexes.iter().map(|&i| &self.entries[i].1).collect())
            .unwrap_or_default()
    }

    /// Tag numbers present in this buffer, in insertion order.
    pub fn tag_numbers(&self) -> impl Iterator<Item = u16> + '_ {
        self.entries.iter().map(|(entry, _)| entry.tag_number)
    }

    /// Iterate over all `(record, dataset)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&DirectoryRecord, &DataSet)> {
        self.entries.iter().map(|(entry, dataset)| (entry, dataset))
    }

    /// Number of decoded datasets in this buffer.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer holds no decoded datasets.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The buffer's timestamp, when its time record decoded successfully.
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        self.dataset_by_tag_number(TIME_TAG)
            .and_then(DataSet::datetime)
    }

    /// Recoverable (and per-record fatal) diagnostics observed while scanning
    /// and decoding this buffer.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether this buffer is not independently meaningful (COMMAND, ERROR,
    /// SAME, or secondary-tag records) and is skipped by normal iteration.
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tag_number: u16, typ: u8) -> DirectoryRecord {
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
    fn type_index_preserves_insertion_order() {
        let mut buffer = Buffer::new();
        buffer.add_dataset(entry(7, 9), DataSet::Samples(vec![Value::U16(1)]), 0);
        buffer.add_dataset(entry(8, 9), DataSet::Samples(vec![Value::U16(2)]), 16);
        buffer.add_dataset(entry(9, 1), DataSet::Samples(vec![Value::I16(3)]), 32);

        let records = buffer.records_by_typ(9);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tag_number, 7);
        assert_eq!(records[1].tag_number, 8);
        assert!(buffer.records_by_typ(3).is_empty());
    }

    #[test]
    fn time_excluded_from_type_index() {
        let time = SeaTime {
            year: 2020,
            month: 1,
            day: 2,
            hour: 3,
            minute: 4,
            second: 5,
            fraction_of_second: 0,
            max_sys_freq: 1,
            buffer_life_span: 0,
        };
        let datetime = time.to_datetime().unwrap();

        let mut buffer = Buffer::new();
        // Asynchronous buffers overload a time record's typ field.
        let mut time_entry = entry(TIME_TAG, 35);
        time_entry.samples = 2;
        time_entry.bytes_per_sample = 18;
        buffer.add_dataset(time_entry, DataSet::Time { time, datetime }, 0);
        buffer.add_dataset(entry(7, 35), DataSet::Samples(vec![Value::I16(-1)]), 16);

        assert_eq!(buffer.records_by_typ(35).len(), 1);
        assert_eq!(buffer.records_by_typ(35)[0].tag_number, 7);
        assert_eq!(buffer.datetime(), Some(datetime));
    }

    #[test]
    fn duplicate_tag_keeps_first() {
        let mut buffer = Buffer::new();
        buffer.add_dataset(entry(7, 1), DataSet::Samples(vec![Value::I16(1)]), 0);
        buffer.add_dataset(entry(7, 1), DataSet::Samples(vec![Value::I16(2)]), 16);

        assert_eq!(buffer.len(), 1);
        assert_eq!(
            buffer.dataset_by_tag_number(7),
            Some(&DataSet::Samples(vec![Value::I16(1)]))
        );
        assert_eq!(buffer.diagnostics().len(), 1);
        assert_eq!(buffer.diagnostics()[0].kind, DiagnosticKind::DuplicateTag);
    }
}
