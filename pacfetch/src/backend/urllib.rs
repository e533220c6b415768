//! Sequential HTTP backend.
//!
//! Downloads one file at a time without connection reuse. Slow, but it has
//! the smallest footprint and behaves well on flaky networks.

use super::cache::CacheDirs;
use super::error::BackendResult;
use super::fetch::FileFetcher;
use super::http::HttpDownloader;
use super::progress::ProgressSnapshot;
use super::state::FetchState;
use super::{BackendContext, DownloadBackend};
use crate::download::DownloadSet;
use crate::events::{EventKind, EventReporter};

/// The `urllib` backend.
#[derive(Debug)]
pub struct UrllibBackend {
    fetcher: FileFetcher,
    reporter: EventReporter,
}

impl UrllibBackend {
    /// Create the backend.
    pub fn new(context: BackendContext) -> BackendResult<Self> {
        let downloader = HttpDownloader::unpooled(context.options.timeout)?;
        Ok(Self {
            fetcher: FileFetcher::new(downloader, context.dirs),
            reporter: EventReporter::new(context.sink),
        })
    }

    /// Cache directories this backend works with.
    pub fn dirs(&self) -> &CacheDirs {
        self.fetcher.dirs()
    }
}

impl DownloadBackend for UrllibBackend {
    fn fetch(&mut self, downloads: &DownloadSet) -> bool {
        let mut state = FetchState::new(downloads.len());
        let total_bytes = downloads.total_size();

        for entry in downloads.entries() {
            self.reporter
                .queue_event(EventKind::Info, format!("Downloading {}...", entry.label()));

            match self.fetcher.fetch(entry, || None) {
                Ok(outcome) => state.record_success(outcome),
                Err(e) => {
                    tracing::error!(file = %entry.filename, error = %e, "Download failed");
                    self.reporter.queue_event(EventKind::Error, e.to_string());
                    state.record_failure(entry.key.clone());
                }
            }

            ProgressSnapshot {
                bytes_downloaded: state.bytes_downloaded,
                total_bytes,
                files_done: state.processed_files(),
                total_files: state.total_files,
            }
            .emit(&mut self.reporter);
        }

        tracing::info!(
            files = state.total_files,
            cached = state.cached_files,
            failed = state.failed.len(),
            bytes = state.bytes_downloaded,
            "Sequential download finished"
        );
        state.is_complete()
    }
}
