//! Error types for building and running a download session.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::download::PackageName;
use crate::resolver::ResolverError;

/// Result type for download set construction.
pub type BuildResult<T> = Result<T, BuildError>;

/// Result type for a whole download session.
pub type InstallResult<T> = Result<T, InstallError>;

/// Why a download set could not be produced.
///
/// Every variant means no set exists; callers never see a partial one.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The package database could not be opened.
    #[error("cannot initialize package database: {0}")]
    ResolverInit(#[source] ResolverError),

    /// One package could not be resolved to a metalink.
    #[error("cannot create metalink for package {package}: {source}")]
    Metalink {
        package: PackageName,
        #[source]
        source: ResolverError,
    },

    /// The package database handle could not be released.
    #[error("cannot release package database: {0}")]
    ResolverRelease(#[source] ResolverError),
}

/// The installation-halting error of a download session.
///
/// The display text is meant for the user; details go to the log.
#[derive(Debug, Error)]
pub enum InstallError {
    /// No download set could be built.
    #[error("Can't create download package list. Check log output for details")]
    DownloadListUnavailable(#[source] BuildError),

    /// The backend failed to fetch the set.
    #[error("Can't download needed packages. Installation can't continue.")]
    DownloadFailed,

    /// The package cache directory could not be created.
    #[error("Can't create package cache directory {}: {source}", path.display())]
    CacheDirCreate { path: PathBuf, source: io::Error },
}
