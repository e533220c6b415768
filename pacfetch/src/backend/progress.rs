//! Progress reporting for backend runs.
//!
//! Parallel workers update lock-free counters; a reporter thread polls them
//! and turns the totals into UI events.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::events::{format_fraction, format_ratio, EventKind, EventReporter};

/// Default poll interval of the reporter thread.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Point-in-time progress of a backend run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Bytes downloaded across all files.
    pub bytes_downloaded: u64,
    /// Expected bytes across all files, 0 if unknown.
    pub total_bytes: u64,
    /// Files finished, successfully or not.
    pub files_done: usize,
    /// Files in the run.
    pub total_files: usize,
}

impl ProgressSnapshot {
    /// Emit the snapshot as `percent`, `downloads_progress` and
    /// `downloads_percent` events.
    ///
    /// `downloads_percent` follows bytes when the total size is known and
    /// files otherwise.
    pub fn emit(&self, reporter: &mut EventReporter) {
        reporter.queue_event(
            EventKind::Percent,
            format_ratio(self.files_done, self.total_files),
        );
        reporter.queue_event(
            EventKind::DownloadsProgress,
            format!("{}/{}", self.files_done, self.total_files),
        );
        let downloads_percent = if self.total_bytes > 0 {
            format_fraction(self.bytes_downloaded as f64 / self.total_bytes as f64)
        } else {
            format_ratio(self.files_done, self.total_files)
        };
        reporter.queue_event(EventKind::DownloadsPercent, downloads_percent);
    }
}

/// Shared progress counters for parallel downloads.
#[derive(Debug)]
pub struct ProgressCounters {
    /// Bytes downloaded for each file of the run.
    pub file_progress: Vec<AtomicU64>,
    /// Number of files finished, successfully or not.
    pub files_done: AtomicUsize,
    /// Signal to stop the reporter thread.
    pub done: AtomicBool,
}

impl ProgressCounters {
    /// Create counters for `num_files` files.
    pub fn new(num_files: usize) -> Self {
        Self {
            file_progress: (0..num_files).map(|_| AtomicU64::new(0)).collect(),
            files_done: AtomicUsize::new(0),
            done: AtomicBool::new(false),
        }
    }

    /// Total bytes downloaded across all files.
    pub fn total_bytes(&self) -> u64 {
        self.file_progress
            .iter()
            .map(|p| p.load(Ordering::SeqCst))
            .sum()
    }

    /// Number of finished files.
    pub fn finished_files(&self) -> usize {
        self.files_done.load(Ordering::SeqCst)
    }

    /// Update progress for a specific file.
    pub fn update_file(&self, index: usize, bytes: u64) {
        if let Some(progress) = self.file_progress.get(index) {
            progress.store(bytes, Ordering::SeqCst);
        }
    }

    /// Mark a file as finished.
    pub fn mark_finished(&self, index: usize, final_bytes: u64) {
        if let Some(progress) = self.file_progress.get(index) {
            progress.store(final_bytes, Ordering::SeqCst);
            self.files_done.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Signal that all downloads are done.
    pub fn signal_done(&self) {
        self.done.store(true, Ordering::SeqCst);
    }

    /// Check if downloads are done.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Snapshot the counters.
    pub fn snapshot(&self, total_bytes: u64) -> ProgressSnapshot {
        ProgressSnapshot {
            bytes_downloaded: self.total_bytes(),
            total_bytes,
            files_done: self.finished_files(),
            total_files: self.file_progress.len(),
        }
    }
}

/// Background thread turning [`ProgressCounters`] into events.
///
/// The reporter owns its [`EventReporter`]; stopping it (or dropping it)
/// emits one final snapshot and hands the reporter back.
pub struct ProgressReporter {
    handle: Option<JoinHandle<EventReporter>>,
    counters: Arc<ProgressCounters>,
}

impl ProgressReporter {
    /// Start a reporter polling every `poll_interval`.
    pub fn start(
        counters: Arc<ProgressCounters>,
        total_bytes: u64,
        mut reporter: EventReporter,
        poll_interval: Duration,
    ) -> Self {
        let counters_clone = Arc::clone(&counters);

        let handle = thread::spawn(move || {
            while !counters_clone.is_done() {
                counters_clone.snapshot(total_bytes).emit(&mut reporter);
                thread::sleep(poll_interval);
            }

            // Final report
            counters_clone.snapshot(total_bytes).emit(&mut reporter);
            reporter
        });

        Self {
            handle: Some(handle),
            counters,
        }
    }

    /// Start a reporter with the default 100ms poll interval.
    pub fn start_default(
        counters: Arc<ProgressCounters>,
        total_bytes: u64,
        reporter: EventReporter,
    ) -> Self {
        Self::start(counters, total_bytes, reporter, DEFAULT_POLL_INTERVAL)
    }

    /// Stop the reporter and take back its event reporter.
    ///
    /// Returns `None` if the reporter thread panicked.
    pub fn stop(mut self) -> Option<EventReporter> {
        self.counters.signal_done();
        self.handle.take().and_then(|h| h.join().ok())
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.counters.signal_done();
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventSink, ProgressEvent};

    #[test]
    fn test_progress_counters_new() {
        let counters = ProgressCounters::new(3);
        assert_eq!(counters.file_progress.len(), 3);
        assert_eq!(counters.total_bytes(), 0);
        assert_eq!(counters.finished_files(), 0);
        assert!(!counters.is_done());
    }

    #[test]
    fn test_progress_counters_update_file() {
        let counters = ProgressCounters::new(2);

        counters.update_file(0, 500);
        counters.update_file(1, 300);
        counters.update_file(7, 999);

        assert_eq!(counters.total_bytes(), 800);
    }

    #[test]
    fn test_progress_counters_mark_finished() {
        let counters = ProgressCounters::new(2);

        counters.mark_finished(0, 1000);

        assert_eq!(counters.finished_files(), 1);
        assert_eq!(counters.file_progress[0].load(Ordering::SeqCst), 1000);
    }

    #[test]
    fn test_snapshot_emit_without_sizes() {
        let (sink, mut receiver) = EventSink::bounded(8);
        let mut reporter = EventReporter::new(Some(sink));

        ProgressSnapshot {
            bytes_downloaded: 0,
            total_bytes: 0,
            files_done: 1,
            total_files: 2,
        }
        .emit(&mut reporter);

        assert_eq!(
            receiver.drain(),
            vec![
                ProgressEvent::new(EventKind::Percent, "0.5"),
                ProgressEvent::new(EventKind::DownloadsProgress, "1/2"),
                ProgressEvent::new(EventKind::DownloadsPercent, "0.5"),
            ]
        );
    }

    #[test]
    fn test_snapshot_emit_by_bytes() {
        let (sink, mut receiver) = EventSink::bounded(8);
        let mut reporter = EventReporter::new(Some(sink));

        ProgressSnapshot {
            bytes_downloaded: 250,
            total_bytes: 1000,
            files_done: 0,
            total_files: 2,
        }
        .emit(&mut reporter);

        let events = receiver.drain();
        assert_eq!(
            events.last(),
            Some(&ProgressEvent::new(EventKind::DownloadsPercent, "0.25"))
        );
    }

    #[test]
    fn test_progress_reporter_lifecycle() {
        let (sink, mut receiver) = EventSink::bounded(64);
        let counters = Arc::new(ProgressCounters::new(2));

        let reporter = ProgressReporter::start(
            Arc::clone(&counters),
            0,
            EventReporter::new(Some(sink)),
            Duration::from_millis(10),
        );

        thread::sleep(Duration::from_millis(30));
        counters.mark_finished(0, 10);
        counters.mark_finished(1, 10);

        let returned = reporter.stop().unwrap();

        assert_eq!(returned.last_text(EventKind::Percent), Some("1.0"));
        let events = receiver.drain();
        assert_eq!(
            events.first(),
            Some(&ProgressEvent::new(EventKind::Percent, "0.0"))
        );
    }
}
