//! Download backends.
//!
//! A backend receives a finished [`DownloadSet`] and fetches every entry into
//! the package cache. Three implementations exist, selected by identifier:
//!
//! - `aria2` ([`Aria2Backend`]): drives the external `aria2c` download manager
//! - `urllib` ([`UrllibBackend`]): sequential HTTP, one connection per file
//! - `requests` ([`RequestsBackend`]): pooled HTTP client with worker threads
//!
//! # Architecture
//!
//! ```text
//! DownloadCoordinator
//!         │
//!         ├── BackendKind::resolve("requests")
//!         │
//!         └── BackendFactory::create(kind, BackendContext)
//!                 │
//!                 └── DownloadBackend (trait)  ── fetch(&DownloadSet) -> bool
//!                         ├── Aria2Backend
//!                         ├── UrllibBackend ─────┐
//!                         └── RequestsBackend ───┴── FileFetcher
//!                                                      ├── CacheDirs (reuse)
//!                                                      └── HttpDownloader
//! ```
//!
//! Backends report progress through their own [`EventReporter`] fed by the
//! session's event sink. Whatever concurrency a backend uses stays inside
//! `fetch`, which blocks until every file has been handled.
//!
//! [`EventReporter`]: crate::events::EventReporter

mod aria2;
mod cache;
mod checksum;
mod error;
mod fetch;
mod http;
mod progress;
mod requests;
mod state;
mod urllib;

pub use aria2::{Aria2Backend, DEFAULT_ARIA2_BINARY};
pub use cache::{is_valid_copy, CacheDirs};
pub use checksum::{calculate_file_checksum, verify_checksum};
pub use error::{BackendError, BackendResult};
pub use fetch::FileFetcher;
pub use http::{HttpDownloader, ProgressCallback, DEFAULT_TIMEOUT_SECS};
pub use progress::{ProgressCounters, ProgressReporter, ProgressSnapshot};
pub use requests::RequestsBackend;
pub use state::{FetchOutcome, FetchState};
pub use urllib::UrllibBackend;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::download::DownloadSet;
use crate::events::EventSink;

/// A download strategy.
pub trait DownloadBackend {
    /// Fetch every entry of `downloads` into the package cache.
    ///
    /// Returns `true` only if every entry ended up present and verified.
    fn fetch(&mut self, downloads: &DownloadSet) -> bool;
}

/// Known backend implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// External aria2 download manager.
    Aria2,
    /// Simple sequential HTTP client.
    Urllib,
    /// Connection-pooled HTTP client.
    Requests,
}

impl BackendKind {
    /// Backend used when the configured identifier is not recognized.
    pub const DEFAULT: BackendKind = BackendKind::Requests;

    /// Every known backend.
    pub const ALL: [BackendKind; 3] = [Self::Aria2, Self::Urllib, Self::Requests];

    /// Configuration identifier of this backend.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Aria2 => "aria2",
            Self::Urllib => "urllib",
            Self::Requests => "requests",
        }
    }

    /// Look up a backend by exact identifier.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.identifier() == identifier)
    }

    /// Select the backend for a configured identifier.
    ///
    /// Empty or unknown identifiers fall back to [`BackendKind::DEFAULT`];
    /// this is logged, never an error.
    pub fn resolve(identifier: &str) -> Self {
        match Self::from_identifier(identifier.trim()) {
            Some(kind) => kind,
            None => {
                tracing::debug!(
                    "Unknown download backend '{}', using '{}' as default",
                    identifier,
                    Self::DEFAULT
                );
                Self::DEFAULT
            }
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Tuning knobs shared by the backends.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendOptions {
    /// Maximum concurrent downloads (minimum 1).
    pub parallel_downloads: usize,
    /// Timeout of each HTTP request.
    pub timeout: Duration,
    /// Program run by the aria2 backend.
    pub aria2_binary: PathBuf,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            parallel_downloads: 4,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            aria2_binary: PathBuf::from(DEFAULT_ARIA2_BINARY),
        }
    }
}

/// Everything a backend is constructed with.
#[derive(Debug, Clone)]
pub struct BackendContext {
    /// Package cache the downloads go to, and the fallback cache.
    pub dirs: CacheDirs,
    /// Event sink for progress reporting.
    pub sink: Option<EventSink>,
    /// Tuning options.
    pub options: BackendOptions,
}

/// Builds backends for a session.
pub trait BackendFactory {
    /// Construct the backend of the given kind.
    fn create(
        &self,
        kind: BackendKind,
        context: BackendContext,
    ) -> BackendResult<Box<dyn DownloadBackend>>;
}

/// Factory for the real backends.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBackendFactory;

impl BackendFactory for DefaultBackendFactory {
    fn create(
        &self,
        kind: BackendKind,
        context: BackendContext,
    ) -> BackendResult<Box<dyn DownloadBackend>> {
        Ok(match kind {
            BackendKind::Aria2 => Box::new(Aria2Backend::new(context)),
            BackendKind::Urllib => Box::new(UrllibBackend::new(context)?),
            BackendKind::Requests => Box::new(RequestsBackend::new(context)?),
        })
    }
}
