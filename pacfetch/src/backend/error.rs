//! Error types for download backends.
//!
//! These errors describe why a single file could not be fetched. They are
//! logged and reported as events; a backend's `fetch` only reports the
//! aggregate outcome.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur while fetching a file.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Failed to read a file.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// A download request failed.
    #[error("failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// A request timed out.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The downloaded file does not match its expected checksum.
    #[error("checksum mismatch for {filename}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },

    /// The downloaded file does not have its expected size.
    #[error("size mismatch for {}: expected {expected} bytes, got {actual}", path.display())]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Every mirror of a file failed.
    #[error("all {attempts} mirrors failed for {filename}: {last_error}")]
    MirrorsExhausted {
        filename: String,
        attempts: usize,
        last_error: String,
    },

    /// The HTTP client could not be created.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The external download manager could not be run or failed.
    #[error("external downloader {program} failed: {reason}")]
    External { program: String, reason: String },
}
