//! Package names and the deduplicated download set.

use std::fmt;

use indexmap::IndexMap;

use crate::metalink::{FileEntry, FileKey, MetalinkDescriptor};

/// Name of a package requested for installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    /// Create a package name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for PackageName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Files to fetch in one session, keyed by file key in insertion order.
///
/// The first entry seen for a key is kept; later entries with the same key
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadSet {
    entries: IndexMap<FileKey, FileEntry>,
}

impl DownloadSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry unless its key is already present.
    ///
    /// Returns `true` if the entry was added.
    pub fn insert(&mut self, entry: FileEntry) -> bool {
        if self.entries.contains_key(&entry.key) {
            return false;
        }
        self.entries.insert(entry.key.clone(), entry);
        true
    }

    /// Merge every entry of a descriptor, first wins.
    ///
    /// Returns the number of entries added.
    pub fn merge(&mut self, descriptor: &MetalinkDescriptor) -> usize {
        descriptor
            .extract_entries()
            .values()
            .filter(|entry| self.insert((*entry).clone()))
            .count()
    }

    /// Entry for a key.
    pub fn get(&self, key: &str) -> Option<&FileEntry> {
        self.entries.get(key)
    }

    /// Whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.values()
    }

    /// File keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &FileKey> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FileKey, &FileEntry)> {
        self.entries.iter()
    }

    /// Sum of the known file sizes.
    pub fn total_size(&self) -> u64 {
        self.entries.values().filter_map(|entry| entry.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, mirror: &str) -> FileEntry {
        FileEntry::new(name, vec![format!("http://{mirror}/{name}")])
    }

    #[test]
    fn test_package_name() {
        let name = PackageName::from("linux");
        assert_eq!(name.as_str(), "linux");
        assert_eq!(name.to_string(), "linux");
        assert_eq!(name, PackageName::new(String::from("linux")));
    }

    #[test]
    fn test_insert_keeps_first() {
        let mut set = DownloadSet::new();
        assert!(set.insert(entry("f1", "first")));
        assert!(!set.insert(entry("f1", "second")));

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("f1").unwrap().urls, vec!["http://first/f1"]);
    }

    #[test]
    fn test_merge_counts_new_entries() {
        let mut set = DownloadSet::new();
        set.insert(entry("f1", "a"));

        let descriptor = MetalinkDescriptor::from_entries([entry("f1", "b"), entry("f2", "b")]);
        assert_eq!(set.merge(&descriptor), 1);

        let keys: Vec<_> = set.keys().cloned().collect();
        assert_eq!(keys, vec!["f1", "f2"]);
        assert_eq!(set.get("f1").unwrap().urls, vec!["http://a/f1"]);
        assert!(set.contains("f2"));
    }

    #[test]
    fn test_total_size_skips_unknown() {
        let mut set = DownloadSet::new();
        set.insert(entry("f1", "a").with_size(10));
        set.insert(entry("f2", "a"));
        set.insert(entry("f3", "a").with_size(5));
        assert_eq!(set.total_size(), 15);
    }

    #[test]
    fn test_empty_set() {
        let set = DownloadSet::new();
        assert!(set.is_empty());
        assert_eq!(set.entries().count(), 0);
        assert_eq!(set.total_size(), 0);
    }
}
