//! Reuse of package files already present on disk.
//!
//! Before downloading, a backend looks for a valid copy of each file in the
//! package cache it fills and then in the generic cache of the host system.

use std::fs;
use std::path::{Path, PathBuf};

use super::checksum::verify_checksum;
use super::error::{BackendError, BackendResult};
use super::state::FetchOutcome;
use crate::metalink::FileEntry;

/// Package cache and fallback cache a backend works with.
#[derive(Debug, Clone)]
pub struct CacheDirs {
    /// Directory the downloaded packages must end up in.
    pub pacman_cache_dir: PathBuf,
    /// Read-only cache checked for existing copies.
    pub cache_dir: PathBuf,
}

impl CacheDirs {
    /// Create a cache pair.
    pub fn new(pacman_cache_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            pacman_cache_dir: pacman_cache_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }

    /// Destination of an entry in the package cache.
    pub fn destination(&self, entry: &FileEntry) -> PathBuf {
        self.pacman_cache_dir.join(&entry.filename)
    }

    /// Satisfy an entry from disk if a valid copy exists.
    ///
    /// Returns `None` when the file still has to be downloaded.
    pub fn reuse(&self, entry: &FileEntry) -> BackendResult<Option<FetchOutcome>> {
        let dest = self.destination(entry);
        if is_valid_copy(&dest, entry) {
            tracing::debug!(file = %entry.filename, "Already in package cache");
            return Ok(Some(FetchOutcome::AlreadyCached));
        }

        if self.cache_dir == self.pacman_cache_dir {
            return Ok(None);
        }

        let cached = self.cache_dir.join(&entry.filename);
        if !is_valid_copy(&cached, entry) {
            return Ok(None);
        }

        fs::copy(&cached, &dest).map_err(|e| BackendError::WriteFailed {
            path: dest.clone(),
            source: e,
        })?;
        tracing::debug!(
            file = %entry.filename,
            from = %self.cache_dir.display(),
            "Copied from cache"
        );
        Ok(Some(FetchOutcome::CopiedFromCache))
    }
}

/// Check whether `path` holds a usable copy of `entry`.
///
/// The checksum decides when known, then the size; without either any
/// non-empty file is accepted.
pub fn is_valid_copy(path: &Path, entry: &FileEntry) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    if let Some(checksum) = &entry.checksum {
        return match verify_checksum(path, checksum) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Cached copy rejected");
                false
            }
        };
    }

    match entry.size {
        Some(size) => metadata.len() == size,
        None => metadata.len() > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metalink::Checksum;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn setup() -> (TempDir, CacheDirs) {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("pkg");
        let cache = temp.path().join("cache");
        fs::create_dir_all(&pkg).unwrap();
        fs::create_dir_all(&cache).unwrap();
        (temp, CacheDirs::new(pkg, cache))
    }

    fn hello_entry() -> FileEntry {
        FileEntry::new("hello.pkg", vec!["http://127.0.0.1:9/hello.pkg".to_string()])
            .with_checksum(Checksum::Sha256(HELLO_SHA256.to_string()))
    }

    #[test]
    fn test_reuse_from_package_cache() {
        let (_temp, dirs) = setup();
        fs::write(dirs.pacman_cache_dir.join("hello.pkg"), b"hello world").unwrap();

        let outcome = dirs.reuse(&hello_entry()).unwrap();
        assert_eq!(outcome, Some(FetchOutcome::AlreadyCached));
    }

    #[test]
    fn test_reuse_copies_from_generic_cache() {
        let (_temp, dirs) = setup();
        fs::write(dirs.cache_dir.join("hello.pkg"), b"hello world").unwrap();

        let outcome = dirs.reuse(&hello_entry()).unwrap();

        assert_eq!(outcome, Some(FetchOutcome::CopiedFromCache));
        assert_eq!(
            fs::read(dirs.pacman_cache_dir.join("hello.pkg")).unwrap(),
            b"hello world"
        );
    }

    #[test]
    fn test_corrupt_copies_are_ignored() {
        let (_temp, dirs) = setup();
        fs::write(dirs.pacman_cache_dir.join("hello.pkg"), b"hello").unwrap();
        fs::write(dirs.cache_dir.join("hello.pkg"), b"garbage").unwrap();

        assert_eq!(dirs.reuse(&hello_entry()).unwrap(), None);
    }

    #[test]
    fn test_missing_file_needs_download() {
        let (_temp, dirs) = setup();
        assert_eq!(dirs.reuse(&hello_entry()).unwrap(), None);
    }

    #[test]
    fn test_size_used_without_checksum() {
        let (temp, _dirs) = setup();
        let path = temp.path().join("sized.pkg");
        fs::write(&path, b"12345").unwrap();

        let right = FileEntry::new("sized.pkg", vec![]).with_size(5);
        let wrong = FileEntry::new("sized.pkg", vec![]).with_size(6);

        assert!(is_valid_copy(&path, &right));
        assert!(!is_valid_copy(&path, &wrong));
    }

    #[test]
    fn test_empty_file_rejected_without_metadata() {
        let (temp, _dirs) = setup();
        let path = temp.path().join("empty.pkg");
        fs::write(&path, b"").unwrap();

        assert!(!is_valid_copy(&path, &FileEntry::new("empty.pkg", vec![])));
    }

    #[test]
    fn test_destination() {
        let dirs = CacheDirs::new("/install/var/cache/pacman/pkg", "/var/cache/pacman/pkg");
        assert_eq!(
            dirs.destination(&hello_entry()),
            PathBuf::from("/install/var/cache/pacman/pkg/hello.pkg")
        );
    }
}
