//! Error types for package database access.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::metalink::MetalinkError;

/// Result type for resolver operations.
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Errors raised by a package database or its handle.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The pacman configuration file could not be read.
    #[error("failed to read pacman configuration {}: {source}", path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    /// The pacman configuration file is not valid.
    #[error("invalid pacman configuration {}: {reason}", path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    /// No metalink is available for a package.
    #[error("no metalink for package {package} (looked in {})", path.display())]
    MetalinkNotFound { package: String, path: PathBuf },

    /// The metalink of a package could not be read.
    #[error("failed to read metalink for package {package}: {source}")]
    MetalinkRead { package: String, source: io::Error },

    /// The metalink of a package is malformed.
    #[error("invalid metalink for package {package}: {source}")]
    MetalinkInvalid {
        package: String,
        source: MetalinkError,
    },

    /// The handle could not be released.
    #[error("failed to release package database: {0}")]
    Release(String),
}
