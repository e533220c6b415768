//! Pooled HTTP backend.
//!
//! Worker threads share one connection-pooled HTTP client and pull files
//! from a common work list. Byte-level progress is aggregated in
//! [`ProgressCounters`] and reported by a [`ProgressReporter`] thread.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use super::error::BackendResult;
use super::fetch::FileFetcher;
use super::http::{HttpDownloader, ProgressCallback};
use super::progress::{ProgressCounters, ProgressReporter};
use super::state::{FetchOutcome, FetchState};
use super::{BackendContext, DownloadBackend};
use crate::download::DownloadSet;
use crate::events::{EventKind, EventReporter, EventSink};
use crate::metalink::FileEntry;

/// The `requests` backend.
#[derive(Debug)]
pub struct RequestsBackend {
    fetcher: FileFetcher,
    sink: Option<EventSink>,
    reporter: EventReporter,
    parallel_downloads: usize,
}

impl RequestsBackend {
    /// Create the backend.
    pub fn new(context: BackendContext) -> BackendResult<Self> {
        let downloader = HttpDownloader::pooled(context.options.timeout)?;
        Ok(Self {
            fetcher: FileFetcher::new(downloader, context.dirs),
            reporter: EventReporter::new(context.sink.clone()),
            sink: context.sink,
            parallel_downloads: context.options.parallel_downloads.max(1),
        })
    }

    /// Number of worker threads used for large sets.
    pub fn parallel_downloads(&self) -> usize {
        self.parallel_downloads
    }

    /// Take back the reporter lent to the progress thread.
    ///
    /// If that thread died the reporter is rebuilt on the same sink, losing
    /// only its dedup history.
    fn reclaim_reporter(&self, returned: Option<EventReporter>) -> EventReporter {
        returned.unwrap_or_else(|| {
            tracing::warn!("Progress reporter thread panicked");
            EventReporter::new(self.sink.clone())
        })
    }
}

impl DownloadBackend for RequestsBackend {
    fn fetch(&mut self, downloads: &DownloadSet) -> bool {
        let entries: Arc<Vec<FileEntry>> = Arc::new(downloads.entries().cloned().collect());
        let total_files = entries.len();
        if total_files == 0 {
            return true;
        }

        self.reporter.queue_event(
            EventKind::Info,
            format!("Downloading {} packages...", total_files),
        );

        let counters = Arc::new(ProgressCounters::new(total_files));
        let state = Arc::new(Mutex::new(FetchState::new(total_files)));
        let next_index = Arc::new(AtomicUsize::new(0));

        let progress = ProgressReporter::start_default(
            Arc::clone(&counters),
            downloads.total_size(),
            std::mem::take(&mut self.reporter),
        );

        let workers = self.parallel_downloads.min(total_files);
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let entries = Arc::clone(&entries);
                let counters = Arc::clone(&counters);
                let state = Arc::clone(&state);
                let next_index = Arc::clone(&next_index);
                let fetcher = self.fetcher.clone();
                let sink = self.sink.clone();

                thread::spawn(move || {
                    let mut reporter = EventReporter::new(sink);
                    loop {
                        let index = next_index.fetch_add(1, Ordering::SeqCst);
                        let Some(entry) = entries.get(index) else {
                            break;
                        };

                        let result = fetcher.fetch(entry, || {
                            let counters = Arc::clone(&counters);
                            let callback: ProgressCallback =
                                Box::new(move |downloaded: u64, _total: u64| {
                                    counters.update_file(index, downloaded);
                                });
                            Some(callback)
                        });

                        match result {
                            Ok(outcome) => {
                                let bytes = match outcome {
                                    FetchOutcome::Downloaded(bytes) => bytes,
                                    _ => entry.size.unwrap_or(0),
                                };
                                counters.mark_finished(index, bytes);
                                state.lock().record_success(outcome);
                            }
                            Err(e) => {
                                tracing::error!(file = %entry.filename, error = %e, "Download failed");
                                reporter.queue_event(EventKind::Error, e.to_string());
                                counters.mark_finished(index, 0);
                                state.lock().record_failure(entry.key.clone());
                            }
                        }
                    }
                })
            })
            .collect();

        let mut workers_ok = true;
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("Download worker panicked");
                workers_ok = false;
            }
        }

        self.reporter = self.reclaim_reporter(progress.stop());

        let state = state.lock();
        tracing::info!(
            files = state.total_files,
            cached = state.cached_files,
            failed = state.failed.len(),
            bytes = state.bytes_downloaded,
            workers,
            "Pooled download finished"
        );
        workers_ok && state.is_complete()
    }
}
