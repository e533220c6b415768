//! The configuration file and its sections.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;

use super::{config_file_path, ConfigError, ConfigResult};
use crate::backend::{BackendKind, DEFAULT_ARIA2_BINARY, DEFAULT_TIMEOUT_SECS};
use crate::download::{SessionConfig, DEFAULT_PACMAN_CACHE_DIR, DEFAULT_PACMAN_CONF};
use crate::events::DEFAULT_QUEUE_CAPACITY;

/// Directory searched for `<package>.meta4` files.
pub const DEFAULT_METALINK_DIR: &str = "/var/lib/pacfetch/metalinks";

/// `[pacman]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct PacmanSection {
    pub conf_file: PathBuf,
    /// Package cache the downloads go to.
    pub cache_dir: PathBuf,
}

impl Default for PacmanSection {
    fn default() -> Self {
        Self {
            conf_file: PathBuf::from(DEFAULT_PACMAN_CONF),
            cache_dir: PathBuf::from(DEFAULT_PACMAN_CACHE_DIR),
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSection {
    /// Backend identifier.
    pub backend: String,
    /// Cache checked for existing copies.
    pub cache_dir: Option<PathBuf>,
    pub parallel_downloads: usize,
    pub timeout_secs: u64,
    pub aria2_binary: PathBuf,
    /// Capacity of the progress event queue.
    pub queue_capacity: usize,
}

impl Default for DownloadSection {
    fn default() -> Self {
        Self {
            backend: BackendKind::DEFAULT.identifier().to_string(),
            cache_dir: None,
            parallel_downloads: 4,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            aria2_binary: PathBuf::from(DEFAULT_ARIA2_BINARY),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// `[metalink]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct MetalinkSection {
    pub dir: PathBuf,
}

impl Default for MetalinkSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_METALINK_DIR),
        }
    }
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub pacman: PacmanSection,
    pub download: DownloadSection,
    pub metalink: MetalinkSection,
}

impl ConfigFile {
    /// Load the configuration from its default location.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load the configuration from a file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let ini = Ini::load_from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("pacman")) {
            if let Some(v) = section.get("conf_file") {
                config.pacman.conf_file = PathBuf::from(v);
            }
            if let Some(v) = section.get("cache_dir") {
                config.pacman.cache_dir = PathBuf::from(v);
            }
        }

        if let Some(section) = ini.section(Some("download")) {
            if let Some(v) = section.get("backend") {
                config.download.backend = v.trim().to_string();
            }
            if let Some(v) = section.get("cache_dir") {
                let v = v.trim();
                config.download.cache_dir = (!v.is_empty()).then(|| PathBuf::from(v));
            }
            if let Some(v) = section.get("parallel_downloads") {
                config.download.parallel_downloads =
                    parse_number("download.parallel_downloads", v)?;
            }
            if let Some(v) = section.get("timeout_secs") {
                config.download.timeout_secs = parse_number("download.timeout_secs", v)?;
            }
            if let Some(v) = section.get("aria2_binary") {
                config.download.aria2_binary = PathBuf::from(v);
            }
            if let Some(v) = section.get("queue_capacity") {
                config.download.queue_capacity = parse_number("download.queue_capacity", v)?;
            }
        }

        if let Some(section) = ini.section(Some("metalink")) {
            if let Some(v) = section.get("dir") {
                config.metalink.dir = PathBuf::from(v);
            }
        }

        Ok(config)
    }

    /// Save the configuration to its default location.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save the configuration to a file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        self.to_ini()
            .write_to_file(path)
            .map_err(|e| ConfigError::Write {
                path: path.to_path_buf(),
                source: e,
            })
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("pacman"))
            .set("conf_file", self.pacman.conf_file.display().to_string())
            .set("cache_dir", self.pacman.cache_dir.display().to_string());

        let cache_dir = self
            .download
            .cache_dir
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default();
        ini.with_section(Some("download"))
            .set("backend", self.download.backend.as_str())
            .set("cache_dir", cache_dir)
            .set("parallel_downloads", self.download.parallel_downloads.to_string())
            .set("timeout_secs", self.download.timeout_secs.to_string())
            .set("aria2_binary", self.download.aria2_binary.display().to_string())
            .set("queue_capacity", self.download.queue_capacity.to_string());

        ini.with_section(Some("metalink"))
            .set("dir", self.metalink.dir.display().to_string());
        ini
    }

    /// Session configuration described by this file.
    pub fn to_session_config(&self) -> SessionConfig {
        let config = SessionConfig::new()
            .with_pacman_conf_file(&self.pacman.conf_file)
            .with_pacman_cache_dir(&self.pacman.cache_dir)
            .with_backend(self.download.backend.as_str())
            .with_parallel_downloads(self.download.parallel_downloads)
            .with_timeout(Duration::from_secs(self.download.timeout_secs))
            .with_aria2_binary(&self.download.aria2_binary);

        match &self.download.cache_dir {
            Some(dir) => config.with_cache_dir(dir),
            None => config,
        }
    }
}

pub(super) fn parse_number<T>(key: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}
