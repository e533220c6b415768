//! Download sessions.
//!
//! A session turns a list of package names into a [`DownloadSet`] through
//! the package database, then hands the set to one backend:
//!
//! ```text
//! package names ──► build_download_set ──► DownloadSet ──► DownloadBackend::fetch
//!                     │ (ResolverGuard)                        │
//!                     └── percent / info events                └── backend events
//! ```
//!
//! [`DownloadCoordinator`] runs the whole session and turns every failure
//! into one [`InstallError`].

mod builder;
mod config;
mod coordinator;
mod error;
mod set;

pub use builder::{build_download_set, CREATING_LIST_MESSAGE};
pub use config::{SessionConfig, DEFAULT_CACHE_DIR, DEFAULT_PACMAN_CACHE_DIR, DEFAULT_PACMAN_CONF};
pub use coordinator::DownloadCoordinator;
pub use error::{BuildError, BuildResult, InstallError, InstallResult};
pub use set::{DownloadSet, PackageName};
