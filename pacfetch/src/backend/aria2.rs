//! Backend driving the external `aria2c` download manager.
//!
//! Files that cannot be reused from disk are written to an aria2 input file
//! and fetched by a single `aria2c` run. Mirrors become alternative URIs of
//! the same download and checksums are passed through so aria2 verifies
//! them itself. The run only succeeds when every file is present and valid
//! afterwards.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use super::cache::{is_valid_copy, CacheDirs};
use super::error::{BackendError, BackendResult};
use super::progress::ProgressSnapshot;
use super::state::{FetchOutcome, FetchState};
use super::{BackendContext, DownloadBackend};
use crate::download::DownloadSet;
use crate::events::{EventKind, EventReporter};
use crate::metalink::FileEntry;

/// Program run when no other binary is configured.
pub const DEFAULT_ARIA2_BINARY: &str = "aria2c";

/// Name of the input file written into the package cache.
const INPUT_FILE_NAME: &str = ".pacfetch-aria2.input";

/// The `aria2` backend.
#[derive(Debug)]
pub struct Aria2Backend {
    dirs: CacheDirs,
    reporter: EventReporter,
    binary: PathBuf,
    parallel_downloads: usize,
    timeout: Duration,
}

impl Aria2Backend {
    /// Create the backend. Nothing is checked until the first fetch.
    pub fn new(context: BackendContext) -> Self {
        Self {
            dirs: context.dirs,
            reporter: EventReporter::new(context.sink),
            binary: context.options.aria2_binary,
            parallel_downloads: context.options.parallel_downloads.max(1),
            timeout: context.options.timeout,
        }
    }

    /// Program this backend runs.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn emit_progress(&mut self, state: &FetchState, total_bytes: u64) {
        ProgressSnapshot {
            bytes_downloaded: state.bytes_downloaded,
            total_bytes,
            files_done: state.processed_files(),
            total_files: state.total_files,
        }
        .emit(&mut self.reporter);
    }

    fn run(&self, input_file: &Path) -> BackendResult<()> {
        let program = self.binary.display().to_string();
        let output = Command::new(&self.binary)
            .arg(format!("--input-file={}", input_file.display()))
            .arg(format!("--dir={}", self.dirs.pacman_cache_dir.display()))
            .arg(format!(
                "--max-concurrent-downloads={}",
                self.parallel_downloads
            ))
            .arg(format!("--timeout={}", self.timeout.as_secs().max(1)))
            .arg("--check-integrity=true")
            .arg("--allow-overwrite=true")
            .arg("--auto-file-renaming=false")
            .arg("--summary-interval=0")
            .arg("--console-log-level=warn")
            .output()
            .map_err(|e| BackendError::External {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let details = stderr.trim();
        Err(BackendError::External {
            program,
            reason: if details.is_empty() {
                output.status.to_string()
            } else {
                format!("{}: {}", output.status, details)
            },
        })
    }
}

impl DownloadBackend for Aria2Backend {
    fn fetch(&mut self, downloads: &DownloadSet) -> bool {
        let mut state = FetchState::new(downloads.len());
        let total_bytes = downloads.total_size();
        let mut pending = Vec::new();

        for entry in downloads.entries() {
            match self.dirs.reuse(entry) {
                Ok(Some(outcome)) => state.record_success(outcome),
                Ok(None) => pending.push(entry),
                Err(e) => {
                    tracing::warn!(file = %entry.filename, error = %e, "Cache reuse failed");
                    pending.push(entry);
                }
            }
        }
        self.emit_progress(&state, total_bytes);

        if pending.is_empty() {
            return state.is_complete();
        }

        self.reporter.queue_event(
            EventKind::Info,
            format!("Downloading {} packages with aria2...", pending.len()),
        );

        let input_file = self.dirs.pacman_cache_dir.join(INPUT_FILE_NAME);
        let run_result = fs::write(&input_file, input_file_contents(&pending))
            .map_err(|e| BackendError::WriteFailed {
                path: input_file.clone(),
                source: e,
            })
            .and_then(|()| self.run(&input_file));
        if let Err(e) = fs::remove_file(&input_file) {
            tracing::debug!(path = %input_file.display(), error = %e, "Input file not removed");
        }

        if let Err(e) = &run_result {
            tracing::error!(error = %e, "aria2 run failed");
            self.reporter.queue_event(EventKind::Error, e.to_string());
        }

        for entry in pending {
            let dest = self.dirs.destination(entry);
            if run_result.is_ok() && is_valid_copy(&dest, entry) {
                let bytes = fs::metadata(&dest).map(|m| m.len()).unwrap_or(0);
                state.record_success(FetchOutcome::Downloaded(bytes));
            } else {
                if run_result.is_ok() {
                    tracing::error!(file = %entry.filename, "File missing after aria2 run");
                    self.reporter.queue_event(
                        EventKind::Error,
                        format!("{} is missing or invalid", entry.filename),
                    );
                }
                state.record_failure(entry.key.clone());
            }
        }
        self.emit_progress(&state, total_bytes);

        tracing::info!(
            files = state.total_files,
            cached = state.cached_files,
            failed = state.failed.len(),
            bytes = state.bytes_downloaded,
            "aria2 download finished"
        );
        state.is_complete()
    }
}

/// Render entries in aria2's input file format.
///
/// Each download is one line of tab-separated URIs followed by indented
/// options.
pub(crate) fn input_file_contents(entries: &[&FileEntry]) -> String {
    let mut contents = String::new();
    for entry in entries {
        let _ = writeln!(contents, "{}", entry.urls.join("\t"));
        let _ = writeln!(contents, "  out={}", entry.filename);
        if let Some(checksum) = &entry.checksum {
            let _ = writeln!(contents, "  checksum={}", checksum);
        }
    }
    contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendOptions;
    use crate::events::EventSink;
    use crate::metalink::Checksum;
    use tempfile::TempDir;

    fn backend(temp: &TempDir, binary: &Path, sink: Option<EventSink>) -> Aria2Backend {
        let pkg = temp.path().join("pkg");
        let cache = temp.path().join("cache");
        fs::create_dir_all(&pkg).unwrap();
        fs::create_dir_all(&cache).unwrap();
        Aria2Backend::new(BackendContext {
            dirs: CacheDirs::new(pkg, cache),
            sink,
            options: BackendOptions {
                aria2_binary: binary.to_path_buf(),
                ..BackendOptions::default()
            },
        })
    }

    fn remote_set() -> DownloadSet {
        let mut downloads = DownloadSet::new();
        downloads.insert(FileEntry::new(
            "a-1-1-x86_64.pkg.tar.zst",
            vec!["http://127.0.0.1:9/a-1-1-x86_64.pkg.tar.zst".to_string()],
        ));
        downloads
    }

    #[test]
    fn test_input_file_format() {
        let first = FileEntry::new(
            "a.pkg",
            vec!["http://m1/a.pkg".to_string(), "http://m2/a.pkg".to_string()],
        )
        .with_checksum(Checksum::Sha256("abc".to_string()));
        let second = FileEntry::new("b.pkg", vec!["http://m1/b.pkg".to_string()])
            .with_checksum(Checksum::Md5("def".to_string()));
        let third = FileEntry::new("c.pkg", vec!["http://m1/c.pkg".to_string()]);

        let contents = input_file_contents(&[&first, &second, &third]);

        assert_eq!(
            contents,
            "http://m1/a.pkg\thttp://m2/a.pkg\n  out=a.pkg\n  checksum=sha-256=abc\n\
             http://m1/b.pkg\n  out=b.pkg\n  checksum=md5=def\n\
             http://m1/c.pkg\n  out=c.pkg\n"
        );
    }

    #[test]
    fn test_default_binary() {
        let temp = TempDir::new().unwrap();
        let backend = Aria2Backend::new(BackendContext {
            dirs: CacheDirs::new(temp.path(), temp.path()),
            sink: None,
            options: BackendOptions::default(),
        });
        assert_eq!(backend.binary(), Path::new(DEFAULT_ARIA2_BINARY));
    }

    #[test]
    fn test_missing_binary_fails() {
        let temp = TempDir::new().unwrap();
        let (sink, mut receiver) = EventSink::bounded(64);
        let mut backend = backend(&temp, Path::new("/nonexistent/aria2c"), Some(sink));

        assert!(!backend.fetch(&remote_set()));
        assert!(receiver
            .drain()
            .iter()
            .any(|event| event.kind == EventKind::Error));
        assert!(!temp.path().join("pkg").join(INPUT_FILE_NAME).exists());
    }

    #[test]
    fn test_cached_files_skip_the_binary() {
        let temp = TempDir::new().unwrap();
        let mut backend = backend(&temp, Path::new("/nonexistent/aria2c"), None);
        fs::write(
            temp.path().join("cache/a-1-1-x86_64.pkg.tar.zst"),
            b"contents",
        )
        .unwrap();

        assert!(backend.fetch(&remote_set()));
        assert!(temp
            .path()
            .join("pkg/a-1-1-x86_64.pkg.tar.zst")
            .is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_exit_without_files_fails() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join("fake-aria2c");
        fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut backend = backend(&temp, &script, None);
        assert!(!backend.fetch(&remote_set()));
    }
}
