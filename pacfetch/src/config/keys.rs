//! Addressing single configuration values by `section.key` name.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::{parse_number, ConfigFile};
use super::{ConfigError, ConfigResult};

/// A configuration value addressable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    PacmanConfFile,
    PacmanCacheDir,
    DownloadBackend,
    DownloadCacheDir,
    DownloadParallelDownloads,
    DownloadTimeoutSecs,
    DownloadAria2Binary,
    DownloadQueueCapacity,
    MetalinkDir,
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            Self::PacmanConfFile,
            Self::PacmanCacheDir,
            Self::DownloadBackend,
            Self::DownloadCacheDir,
            Self::DownloadParallelDownloads,
            Self::DownloadTimeoutSecs,
            Self::DownloadAria2Binary,
            Self::DownloadQueueCapacity,
            Self::MetalinkDir,
        ]
    }

    /// INI section holding the key.
    pub fn section(&self) -> &'static str {
        match self {
            Self::PacmanConfFile | Self::PacmanCacheDir => "pacman",
            Self::MetalinkDir => "metalink",
            _ => "download",
        }
    }

    /// Key name inside its section.
    pub fn key_name(&self) -> &'static str {
        match self {
            Self::PacmanConfFile => "conf_file",
            Self::PacmanCacheDir | Self::DownloadCacheDir => "cache_dir",
            Self::DownloadBackend => "backend",
            Self::DownloadParallelDownloads => "parallel_downloads",
            Self::DownloadTimeoutSecs => "timeout_secs",
            Self::DownloadAria2Binary => "aria2_binary",
            Self::DownloadQueueCapacity => "queue_capacity",
            Self::MetalinkDir => "dir",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            Self::PacmanConfFile => config.pacman.conf_file.display().to_string(),
            Self::PacmanCacheDir => config.pacman.cache_dir.display().to_string(),
            Self::DownloadBackend => config.download.backend.clone(),
            Self::DownloadCacheDir => config
                .download
                .cache_dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
            Self::DownloadParallelDownloads => config.download.parallel_downloads.to_string(),
            Self::DownloadTimeoutSecs => config.download.timeout_secs.to_string(),
            Self::DownloadAria2Binary => config.download.aria2_binary.display().to_string(),
            Self::DownloadQueueCapacity => config.download.queue_capacity.to_string(),
            Self::MetalinkDir => config.metalink.dir.display().to_string(),
        }
    }

    /// Replace the value from text.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> ConfigResult<()> {
        let name = self.name();
        match self {
            Self::PacmanConfFile => config.pacman.conf_file = PathBuf::from(value),
            Self::PacmanCacheDir => config.pacman.cache_dir = PathBuf::from(value),
            Self::DownloadBackend => config.download.backend = value.trim().to_string(),
            Self::DownloadCacheDir => {
                let value = value.trim();
                config.download.cache_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            Self::DownloadParallelDownloads => {
                config.download.parallel_downloads = parse_number(&name, value)?
            }
            Self::DownloadTimeoutSecs => config.download.timeout_secs = parse_number(&name, value)?,
            Self::DownloadAria2Binary => config.download.aria2_binary = PathBuf::from(value),
            Self::DownloadQueueCapacity => {
                config.download.queue_capacity = parse_number(&name, value)?
            }
            Self::MetalinkDir => config.metalink.dir = PathBuf::from(value),
        }
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_key() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
        assert!(matches!(
            "download.speed".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_same_key_name_in_two_sections() {
        assert_eq!(ConfigKey::PacmanCacheDir.name(), "pacman.cache_dir");
        assert_eq!(ConfigKey::DownloadCacheDir.name(), "download.cache_dir");
    }

    #[test]
    fn test_get_and_set() {
        let mut config = ConfigFile::default();
        assert_eq!(ConfigKey::DownloadCacheDir.get(&config), "");

        ConfigKey::DownloadBackend.set(&mut config, "aria2").unwrap();
        ConfigKey::DownloadParallelDownloads.set(&mut config, "6").unwrap();
        ConfigKey::DownloadCacheDir.set(&mut config, "/srv/cache").unwrap();

        assert_eq!(ConfigKey::DownloadBackend.get(&config), "aria2");
        assert_eq!(config.download.parallel_downloads, 6);
        assert_eq!(ConfigKey::DownloadCacheDir.get(&config), "/srv/cache");
    }

    #[test]
    fn test_set_rejects_bad_number() {
        let mut config = ConfigFile::default();
        let err = ConfigKey::DownloadTimeoutSecs
            .set(&mut config, "soon")
            .unwrap_err();
        assert!(err.to_string().contains("download.timeout_secs"));
        assert_eq!(config.download.timeout_secs, 300);
    }
}
