//! Per-file fetch pipeline shared by the HTTP backends.

use super::cache::CacheDirs;
use super::error::{BackendError, BackendResult};
use super::http::{HttpDownloader, ProgressCallback};
use super::state::FetchOutcome;
use crate::metalink::FileEntry;

/// Fetches single entries into the package cache.
///
/// Order of attempts: package cache, generic cache, then every mirror in
/// preference order. A mirror serving a corrupt file is skipped.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    downloader: HttpDownloader,
    dirs: CacheDirs,
}

impl FileFetcher {
    /// Create a fetcher.
    pub fn new(downloader: HttpDownloader, dirs: CacheDirs) -> Self {
        Self { downloader, dirs }
    }

    /// Cache directories this fetcher writes to.
    pub fn dirs(&self) -> &CacheDirs {
        &self.dirs
    }

    /// Fetch one entry.
    ///
    /// `make_progress` builds a fresh progress callback for each mirror
    /// attempt.
    pub fn fetch(
        &self,
        entry: &FileEntry,
        make_progress: impl Fn() -> Option<ProgressCallback>,
    ) -> BackendResult<FetchOutcome> {
        if let Some(outcome) = self.dirs.reuse(entry)? {
            return Ok(outcome);
        }

        let dest = self.dirs.destination(entry);
        let mut last_error: Option<BackendError> = None;

        for url in &entry.urls {
            match self
                .downloader
                .download(
                    url,
                    &dest,
                    entry.size,
                    entry.checksum.as_ref(),
                    make_progress(),
                )
            {
                Ok(bytes) => {
                    tracing::debug!(file = %entry.filename, %url, bytes, "Downloaded");
                    return Ok(FetchOutcome::Downloaded(bytes));
                }
                Err(e) => {
                    tracing::warn!(file = %entry.filename, %url, error = %e, "Mirror failed");
                    last_error = Some(e);
                }
            }
        }

        Err(BackendError::MirrorsExhausted {
            filename: entry.filename.clone(),
            attempts: entry.urls.len(),
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no mirrors listed".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::http::serve_once;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn fetcher(temp: &TempDir) -> FileFetcher {
        let pkg = temp.path().join("pkg");
        let cache = temp.path().join("cache");
        fs::create_dir_all(&pkg).unwrap();
        fs::create_dir_all(&cache).unwrap();
        FileFetcher::new(
            HttpDownloader::unpooled(Duration::from_secs(5)).unwrap(),
            CacheDirs::new(pkg, cache),
        )
    }

    #[test]
    fn test_cached_file_skips_network() {
        let temp = TempDir::new().unwrap();
        let fetcher = fetcher(&temp);
        fs::write(fetcher.dirs().pacman_cache_dir.join("a.pkg"), b"data").unwrap();

        let entry = FileEntry::new("a.pkg", vec!["http://127.0.0.1:9/a.pkg".to_string()])
            .with_size(4);
        let outcome = fetcher.fetch(&entry, || None).unwrap();

        assert_eq!(outcome, FetchOutcome::AlreadyCached);
    }

    #[test]
    fn test_no_mirrors() {
        let temp = TempDir::new().unwrap();
        let fetcher = fetcher(&temp);

        let result = fetcher.fetch(&FileEntry::new("a.pkg", vec![]), || None);

        match result {
            Err(BackendError::MirrorsExhausted {
                attempts,
                last_error,
                ..
            }) => {
                assert_eq!(attempts, 0);
                assert_eq!(last_error, "no mirrors listed");
            }
            other => panic!("Expected MirrorsExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_every_mirror_is_tried() {
        let temp = TempDir::new().unwrap();
        let fetcher = fetcher(&temp);
        let entry = FileEntry::new(
            "a.pkg",
            vec![
                "http://127.0.0.1:9/one/a.pkg".to_string(),
                "http://127.0.0.1:9/two/a.pkg".to_string(),
            ],
        );

        match fetcher.fetch(&entry, || None) {
            Err(BackendError::MirrorsExhausted { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("Expected MirrorsExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_download_of_wrong_size_fails() {
        let temp = TempDir::new().unwrap();
        let fetcher = fetcher(&temp);
        let entry = FileEntry::new("a.pkg", vec![serve_once(b"hello")]).with_size(11);

        let result = fetcher.fetch(&entry, || None);

        assert!(matches!(result, Err(BackendError::MirrorsExhausted { .. })));
        assert!(!fetcher.dirs().pacman_cache_dir.join("a.pkg").exists());
    }

    #[test]
    fn test_download_of_expected_size() {
        let temp = TempDir::new().unwrap();
        let fetcher = fetcher(&temp);
        let entry = FileEntry::new("a.pkg", vec![serve_once(b"hello world")]).with_size(11);

        let outcome = fetcher.fetch(&entry, || None).unwrap();

        assert_eq!(outcome, FetchOutcome::Downloaded(11));
        assert_eq!(
            fs::read(fetcher.dirs().pacman_cache_dir.join("a.pkg")).unwrap(),
            b"hello world"
        );
    }
}
