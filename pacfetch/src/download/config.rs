//! Configuration of a download session.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::{BackendKind, BackendOptions};

/// Default pacman configuration file.
pub const DEFAULT_PACMAN_CONF: &str = "/etc/pacman.conf";

/// Default package cache of the system being installed.
pub const DEFAULT_PACMAN_CACHE_DIR: &str = "/install/var/cache/pacman/pkg";

/// Package cache of the running system, used when no other cache is set.
pub const DEFAULT_CACHE_DIR: &str = "/var/cache/pacman/pkg";

/// Configuration of a download session.
///
/// Immutable once handed to a coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// pacman configuration file the package database is opened with.
    pub pacman_conf_file: PathBuf,

    /// Package cache the downloads end up in.
    ///
    /// Created by the coordinator if missing.
    pub pacman_cache_dir: PathBuf,

    /// Cache checked for existing copies before downloading.
    pub cache_dir: Option<PathBuf>,

    /// Backend identifier. Unknown identifiers fall back to the default.
    pub backend: String,

    /// Backend tuning.
    pub options: BackendOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pacman_conf_file: PathBuf::from(DEFAULT_PACMAN_CONF),
            pacman_cache_dir: PathBuf::from(DEFAULT_PACMAN_CACHE_DIR),
            cache_dir: None,
            backend: BackendKind::DEFAULT.identifier().to_string(),
            options: BackendOptions::default(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pacman configuration file.
    pub fn with_pacman_conf_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pacman_conf_file = path.into();
        self
    }

    /// Set the package cache the downloads go to.
    pub fn with_pacman_cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.pacman_cache_dir = path.into();
        self
    }

    /// Set the cache checked for existing copies.
    pub fn with_cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(path.into());
        self
    }

    /// Set the backend identifier.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Set the number of parallel downloads (at least 1).
    pub fn with_parallel_downloads(mut self, parallel: usize) -> Self {
        self.options.parallel_downloads = parallel.max(1);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set the program run by the aria2 backend.
    pub fn with_aria2_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.aria2_binary = path.into();
        self
    }

    /// Cache directory actually used for lookups.
    ///
    /// Falls back to [`DEFAULT_CACHE_DIR`] when unset or missing on disk.
    pub fn effective_cache_dir(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) if dir.exists() => dir.clone(),
            Some(dir) => {
                tracing::debug!(
                    cache_dir = %dir.display(),
                    fallback = DEFAULT_CACHE_DIR,
                    "Cache directory missing, using fallback"
                );
                PathBuf::from(DEFAULT_CACHE_DIR)
            }
            None => PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }

    /// The pacman configuration file as a path.
    pub fn config_path(&self) -> &Path {
        &self.pacman_conf_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.pacman_conf_file, PathBuf::from("/etc/pacman.conf"));
        assert_eq!(
            config.pacman_cache_dir,
            PathBuf::from("/install/var/cache/pacman/pkg")
        );
        assert!(config.cache_dir.is_none());
        assert_eq!(config.backend, "requests");
        assert_eq!(config.options.parallel_downloads, 4);
        assert_eq!(config.options.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_builder_pattern() {
        let config = SessionConfig::new()
            .with_pacman_conf_file("/tmp/pacman.conf")
            .with_pacman_cache_dir("/tmp/pkg")
            .with_cache_dir("/tmp/cache")
            .with_backend("aria2")
            .with_parallel_downloads(0)
            .with_timeout(Duration::from_secs(60))
            .with_aria2_binary("/usr/local/bin/aria2c");

        assert_eq!(config.config_path(), Path::new("/tmp/pacman.conf"));
        assert_eq!(config.pacman_cache_dir, PathBuf::from("/tmp/pkg"));
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/cache")));
        assert_eq!(config.backend, "aria2");
        assert_eq!(config.options.parallel_downloads, 1);
        assert_eq!(config.options.timeout, Duration::from_secs(60));
        assert_eq!(
            config.options.aria2_binary,
            PathBuf::from("/usr/local/bin/aria2c")
        );
    }

    #[test]
    fn test_effective_cache_dir_existing() {
        let temp = TempDir::new().unwrap();
        let config = SessionConfig::new().with_cache_dir(temp.path());
        assert_eq!(config.effective_cache_dir(), temp.path());
    }

    #[test]
    fn test_effective_cache_dir_fallback() {
        let config = SessionConfig::new().with_cache_dir("/nonexistent/pacfetch/cache");
        assert_eq!(config.effective_cache_dir(), PathBuf::from(DEFAULT_CACHE_DIR));
        assert_eq!(
            SessionConfig::new().effective_cache_dir(),
            PathBuf::from(DEFAULT_CACHE_DIR)
        );
    }
}
