//! File entries listed by a metalink descriptor.

use std::fmt;

/// Unique identifier of a download target across a download set.
pub type FileKey = String;

/// Expected digest of a downloaded file, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checksum {
    /// SHA-256 digest.
    Sha256(String),
    /// MD5 digest.
    Md5(String),
}

impl Checksum {
    /// Algorithm name as written in metalink documents.
    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::Sha256(_) => "sha-256",
            Self::Md5(_) => "md5",
        }
    }

    /// Expected digest value.
    pub fn value(&self) -> &str {
        match self {
            Self::Sha256(v) | Self::Md5(v) => v,
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.algorithm(), self.value())
    }
}

/// One file to download.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    /// Unique key of the file within a download set.
    pub key: FileKey,
    /// File name inside the package cache directory.
    pub filename: String,
    /// Package name providing this file, when known.
    pub identity: Option<String>,
    /// Package version, when known.
    pub version: Option<String>,
    /// Candidate URLs, most preferred first.
    pub urls: Vec<String>,
    /// Expected size in bytes.
    pub size: Option<u64>,
    /// Expected checksum.
    pub checksum: Option<Checksum>,
}

impl FileEntry {
    /// Create an entry keyed by its file name.
    pub fn new(filename: impl Into<String>, urls: Vec<String>) -> Self {
        let filename = filename.into();
        Self {
            key: filename.clone(),
            filename,
            identity: None,
            version: None,
            urls,
            size: None,
            checksum: None,
        }
    }

    /// Set the package identity and version.
    pub fn with_package(mut self, identity: impl Into<String>, version: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self.version = Some(version.into());
        self
    }

    /// Set the expected size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the expected checksum.
    pub fn with_checksum(mut self, checksum: Checksum) -> Self {
        self.checksum = Some(checksum);
        self
    }

    /// Short human-readable label, `identity version` when known.
    pub fn label(&self) -> String {
        match (&self.identity, &self.version) {
            (Some(identity), Some(version)) => format!("{} {}", identity, version),
            (Some(identity), None) => identity.clone(),
            _ => self.filename.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_filename_as_key() {
        let entry = FileEntry::new("bash-5.2-1-x86_64.pkg.tar.zst", vec![]);
        assert_eq!(entry.key, "bash-5.2-1-x86_64.pkg.tar.zst");
        assert_eq!(entry.filename, entry.key);
    }

    #[test]
    fn test_label() {
        let bare = FileEntry::new("a.pkg", vec![]);
        assert_eq!(bare.label(), "a.pkg");

        let full = FileEntry::new("a.pkg", vec![]).with_package("a", "1.0-1");
        assert_eq!(full.label(), "a 1.0-1");
    }

    #[test]
    fn test_checksum_display() {
        let sum = Checksum::Sha256("abc".to_string());
        assert_eq!(sum.to_string(), "sha-256=abc");
        assert_eq!(Checksum::Md5("d41d".to_string()).algorithm(), "md5");
    }
}
