//! Fetch state for one backend run.
//!
//! Tracks how many files of a download set are done, how many bytes were
//! transferred, and which files failed.

use crate::metalink::FileKey;

/// Outcome of fetching a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A valid copy was already in the package cache.
    AlreadyCached,
    /// A valid copy was copied over from the generic cache.
    CopiedFromCache,
    /// The file was downloaded; the value is its size in bytes.
    Downloaded(u64),
}

/// Aggregate state of a backend run.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    /// Total number of files.
    pub total_files: usize,
    /// Number of files present and verified in the package cache.
    pub completed_files: usize,
    /// Number of files satisfied from a cache without downloading.
    pub cached_files: usize,
    /// Total bytes downloaded so far.
    pub bytes_downloaded: u64,
    /// Files that could not be fetched.
    pub failed: Vec<FileKey>,
}

impl FetchState {
    /// Create a state for `total_files` files.
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Default::default()
        }
    }

    /// Check if every file is present and none failed.
    pub fn is_complete(&self) -> bool {
        self.completed_files == self.total_files && self.failed.is_empty()
    }

    /// Check if any file failed.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Number of files processed, successfully or not.
    pub fn processed_files(&self) -> usize {
        self.completed_files + self.failed.len()
    }

    /// Record a successfully fetched file.
    pub fn record_success(&mut self, outcome: FetchOutcome) {
        self.completed_files += 1;
        match outcome {
            FetchOutcome::AlreadyCached | FetchOutcome::CopiedFromCache => {
                self.cached_files += 1;
            }
            FetchOutcome::Downloaded(bytes) => {
                self.bytes_downloaded += bytes;
            }
        }
    }

    /// Record a file that could not be fetched.
    pub fn record_failure(&mut self, key: impl Into<FileKey>) {
        self.failed.push(key.into());
    }
}
