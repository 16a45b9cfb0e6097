//! Top-level handle over one SEA dump file.
//!
//! [`SeaFile`] owns the file bytes (shared with any live scans through an
//! `Arc`), validates the file type on open, extracts the embedded metadata
//! (start time, configuration files), and hands out [`Buffers`] iterators
//! that yield fully decoded [`Buffer`]s.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::buffer::{Buffer, DataSet};
use crate::decoder::BufferDecoder;
use crate::records::{DirectoryRecord, FILEDATA_TAG, TIME_RECORD_ADDRESS, TIME_TAG, TagKind};
use crate::registry::{ConfigFile, TagRegistry};
use crate::scanner::{BufferScanner, RecordFilter};
use crate::{Error, Result};

/// One M200/M300 dump file, held in memory.
///
/// Opening validates the file-type signature. Buffer iteration is on demand:
/// each call to [`SeaFile::buffers`] scans the stream afresh, so iterating
/// twice yields the same sequence.
#[derive(Debug)]
pub struct SeaFile {
    filename: Option<PathBuf>,
    contents: Arc<[u8]>,
    registry: TagRegistry,
    start_time: Option<NaiveDateTime>,
    config_files: Vec<ConfigFile>,
    metadata_loaded: bool,
}

impl SeaFile {
    /// Open and validate a dump file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read(path)?;
        let mut file = Self::from_bytes(contents).map_err(|e| match e {
            Error::InvalidFileFormat { reason, offset } => Error::InvalidFileFormat {
                reason: format!("{}: {reason}", path.display()),
                offset,
            },
            other => other,
        })?;
        file.filename = Some(path.to_path_buf());
        Ok(file)
    }

    /// Validate a dump held in memory.
    ///
    /// Fails with [`Error::InvalidFileFormat`] unless the stream opens on a
    /// time record: tag 0, 18-byte samples, hardware address `0xAA55`.
    pub fn from_bytes(contents: impl Into<Arc<[u8]>>) -> Result<Self> {
        let contents = contents.into();
        Self::check_file_type(&contents)?;
        Ok(SeaFile {
            filename: None,
            contents,
            registry: TagRegistry::new(),
            start_time: None,
            config_files: Vec::new(),
            metadata_loaded: false,
        })
    }

    fn check_file_type(bytes: &[u8]) -> Result<()> {
        let record = DirectoryRecord::from_bytes(bytes).map_err(|_| Error::InvalidFileFormat {
            reason: "shorter than one directory record".into(),
            offset: 0,
        })?;
        if record.tag_number != TIME_TAG
            || record.bytes_per_sample != 18
            || record.address != TIME_RECORD_ADDRESS
        {
            return Err(Error::InvalidFileFormat {
                reason: "first record is not an SEA time record".into(),
                offset: 0,
            });
        }
        Ok(())
    }

    /// The path this file was opened from, when opened from disk.
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// The file size in bytes.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Replace the acquisition-tag registry consulted during iteration.
    pub fn set_registry(&mut self, registry: TagRegistry) {
        self.registry = registry;
    }

    /// The acquisition-tag registry.
    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TagRegistry {
        &mut self.registry
    }

    /// The registered name for a tag number, if the registry knows it.
    pub fn tag_name(&self, tag_number: u16) -> Option<&str> {
        self.registry.name(tag_number)
    }

    /// Extract the embedded metadata: the acquisition start time (the first
    /// time record seen) and any configuration files carried in
    /// FILENAME/FILEDATA record pairs.
    ///
    /// Runs a FILEDATA-filtered scan over the stream; cheap on files without
    /// embedded configuration. Idempotent.
    pub fn load_metadata(&mut self) -> Result<()> {
        if self.metadata_loaded {
            return Ok(());
        }

        let filter = RecordFilter::new().allow_tag_numbers([FILEDATA_TAG]);
        let scanner = BufferScanner::new(Arc::clone(&self.contents), filter);
        let decoder = BufferDecoder::new();

        for item in scanner {
            let raw = item?;
            let buffer = decoder.decode(&raw, &self.contents);

            // FILENAME and FILEDATA arrive as adjacent records of the same
            // buffer; pair them in record order.
            let mut pending_name: Option<String> = None;
            for (record, dataset) in buffer.iter() {
                match record.tag_kind() {
                    TagKind::Time => {
                        if self.start_time.is_none() {
                            self.start_time = dataset.datetime();
                        }
                    }
                    TagKind::Filename => {
                        if let DataSet::Strings(strings) = dataset {
                            pending_name = strings
                                .first()
                                .map(|s| String::from_utf8_lossy(trim_nuls(s)).into_owned());
                        }
                    }
                    TagKind::Filedata => {
                        let DataSet::Strings(strings) = dataset else {
                            continue;
                        };
                        match pending_name.take() {
                            Some(name) => {
                                let data =
                                    strings.first().map(|s| trim_nuls(s).to_vec()).unwrap_or_default();
                                self.config_files.push(ConfigFile { name, data });
                            }
                            None => {
                                log::warn!(
                                    "FILEDATA record (tag {}) with no preceding FILENAME",
                                    record.tag_number
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        self.metadata_loaded = true;
        Ok(())
    }

    /// The acquisition start time, once [`SeaFile::load_metadata`] has run.
    pub fn start_datetime(&self) -> Option<NaiveDateTime> {
        self.start_time
    }

    /// The embedded configuration files, once [`SeaFile::load_metadata`] has
    /// run.
    pub fn config_files(&self) -> &[ConfigFile] {
        &self.config_files
    }

    /// Iterate over all decoded buffers in stream order.
    pub fn buffers(&self) -> Buffers<'_> {
        self.buffers_filtered(RecordFilter::new())
    }

    /// Iterate over the decoded buffers accepted by `filter`.
    pub fn buffers_filtered(&self, filter: RecordFilter) -> Buffers<'_> {
        Buffers {
            scanner: BufferScanner::new(Arc::clone(&self.contents), filter),
            contents: Some(Arc::clone(&self.contents)),
            registry: &self.registry,
        }
    }
}

/// Strip trailing NUL padding and line endings from a fixed-width string
/// record payload.
fn trim_nuls(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0 && b != b'\r' && b != b'\n')
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Iterator over a file's decoded buffers.
///
/// Yields `Result<Buffer>` lazily; buffers flagged as not independently
/// meaningful (COMMAND, ERROR, SAME, secondary tags) are skipped. A fatal
/// stream fault yields one `Err` and ends the iteration. The iterator holds
/// its own reference to the file bytes and releases it when the scan
/// terminates.
pub struct Buffers<'a> {
    scanner: BufferScanner,
    contents: Option<Arc<[u8]>>,
    registry: &'a TagRegistry,
}

impl Buffers<'_> {
    /// Whether the stream ended without a LAST record. Only meaningful once
    /// iteration has finished.
    pub fn missing_last(&self) -> bool {
        self.scanner.missing_last()
    }
}

impl Iterator for Buffers<'_> {
    type Item = Result<Buffer>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = match self.scanner.next() {
                Some(item) => item,
                None => {
                    self.contents = None;
                    return None;
                }
            };
            let raw = match item {
                Ok(raw) => raw,
                Err(e) => {
                    self.contents = None;
                    return Some(Err(e));
                }
            };
            let contents = self.contents.clone()?;

            let decoder = BufferDecoder::with_secondary_tags(self.registry.secondary());
            let buffer = decoder.decode(&raw, &contents);

            if self.scanner.is_finished() {
                // LAST reached: let go of the bytes even while the iterator
                // value stays alive.
                self.contents = None;
            }

            if buffer.is_excluded() {
                log::debug!("skipping excluded buffer at {:?}", raw.range);
                continue;
            }
            return Some(Ok(buffer));
        }
    }
}
