//! Tag registry and configuration-file metadata.
//!
//! An acquisition table (built by the caller, usually from the `.conf` files
//! a deployment ships alongside its dumps) names tag numbers and marks the
//! ones that are secondary outputs of another tag. The registry is plain
//! data; the decoder consults only its secondary set.

use std::collections::{HashMap, HashSet};

/// Descriptive metadata for one acquisition tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagInfo {
    /// Human-readable tag name from the acquisition table.
    pub name: String,
    /// Acquisition-type code this tag is expected to carry.
    pub typ: u8,
    /// Expected number of samples per record.
    pub samples: u16,
    /// Expected sample width in bytes.
    pub bytes_per_sample: u16,
}

/// Maps tag numbers to [`TagInfo`] and tracks secondary tags.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: HashMap<u16, TagInfo>,
    secondary: HashSet<u16>,
}

impl TagRegistry {
    pub fn new() -> Self {
        TagRegistry::default()
    }

    /// Register a tag. A tag number already present keeps its first entry,
    /// matching how the instrument treats repeated table rows; the rejected
    /// registration is logged and `false` returned.
    pub fn insert(&mut self, tag_number: u16, info: TagInfo) -> bool {
        match self.tags.entry(tag_number) {
            std::collections::hash_map::Entry::Occupied(existing) => {
                log::warn!(
                    "tag {} already registered as {:?}; ignoring {:?}",
                    tag_number,
                    existing.get().name,
                    info.name
                );
                false
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(info);
                true
            }
        }
    }

    /// The registered metadata for a tag number.
    pub fn info(&self, tag_number: u16) -> Option<&TagInfo> {
        self.tags.get(&tag_number)
    }

    /// The registered name for a tag number.
    pub fn name(&self, tag_number: u16) -> Option<&str> {
        self.tags.get(&tag_number).map(|info| info.name.as_str())
    }

    /// The tag number registered under `name`, if any.
    pub fn tag_number_for(&self, name: &str) -> Option<u16> {
        self.tags
            .iter()
            .find(|(_, info)| info.name == name)
            .map(|(&tag_number, _)| tag_number)
    }

    /// Mark tag numbers as secondary outputs; buffers containing one are
    /// excluded from normal iteration.
    pub fn mark_secondary(&mut self, tag_numbers: impl IntoIterator<Item = u16>) {
        self.secondary.extend(tag_numbers);
    }

    /// Whether a tag number is marked secondary.
    pub fn is_secondary(&self, tag_number: u16) -> bool {
        self.secondary.contains(&tag_number)
    }

    /// The full secondary set.
    pub fn secondary(&self) -> &HashSet<u16> {
        &self.secondary
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// A configuration file embedded in the dump via FILENAME/FILEDATA records.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigFile {
    /// The embedded file's name, as recorded by the instrument.
    pub name: String,
    /// The file's contents, trailing NULs stripped.
    pub data: Vec<u8>,
}
