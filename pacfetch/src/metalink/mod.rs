//! Metalink descriptors: per-package lists of files to download.
//!
//! A descriptor maps a *file key* (the package file name) to a [`FileEntry`]
//! carrying the candidate mirrors, expected size and checksum of that file.
//! Descriptors are produced by a [`crate::resolver::MetalinkResolver`],
//! usually from a Metalink 4 XML document.

mod document;
mod entry;

pub use entry::{Checksum, FileEntry, FileKey};

use indexmap::IndexMap;
use thiserror::Error;

/// Errors produced while reading a metalink document.
#[derive(Debug, Error)]
pub enum MetalinkError {
    /// The document is not well-formed metalink XML.
    #[error("invalid metalink document: {0}")]
    Xml(String),

    /// A `<file>` element has no usable download location.
    #[error("metalink file '{0}' has no download url")]
    NoUrl(String),

    /// A `<file>` element has an empty name.
    #[error("metalink file entry has no name")]
    MissingName,

    /// A file name that is not a single plain path component.
    #[error("metalink file name '{0}' is not a plain file name")]
    UnsafeName(String),
}

/// Files one package needs, keyed by file name, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetalinkDescriptor {
    files: IndexMap<FileKey, FileEntry>,
}

impl MetalinkDescriptor {
    /// Create an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a descriptor from entries, keeping the first entry per key.
    pub fn from_entries(entries: impl IntoIterator<Item = FileEntry>) -> Self {
        let mut descriptor = Self::new();
        for entry in entries {
            descriptor.insert(entry);
        }
        descriptor
    }

    /// Parse a Metalink 4 XML document.
    pub fn from_xml(xml: &str) -> Result<Self, MetalinkError> {
        let entries = document::parse(xml)?;
        Ok(Self::from_entries(entries))
    }

    /// Add an entry unless its key is already present.
    ///
    /// Returns `true` if the entry was added.
    pub fn insert(&mut self, entry: FileEntry) -> bool {
        if self.files.contains_key(&entry.key) {
            return false;
        }
        self.files.insert(entry.key.clone(), entry);
        true
    }

    /// Key → entry mapping of every file in this descriptor.
    pub fn extract_entries(&self) -> &IndexMap<FileKey, FileEntry> {
        &self.files
    }

    /// Consume the descriptor, yielding its entries in document order.
    pub fn into_entries(self) -> impl Iterator<Item = (FileKey, FileEntry)> {
        self.files.into_iter()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the descriptor lists no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
