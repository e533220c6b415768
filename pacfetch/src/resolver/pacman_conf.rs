//! Reader for pacman.conf.

use std::fs;
use std::path::{Path, PathBuf};

use ini::Ini;

use super::{ResolverError, ResolverResult};

/// Section holding pacman's global options.
const OPTIONS_SECTION: &str = "options";

/// Package cache used when pacman.conf sets no `CacheDir`.
const DEFAULT_CACHE_DIR: &str = "/var/cache/pacman/pkg/";

/// Database directory used when pacman.conf sets no `DBPath`.
const DEFAULT_DB_PATH: &str = "/var/lib/pacman/";

/// The parts of a pacman configuration the download path needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PacmanConfig {
    /// Package cache directories, in configuration order.
    pub cache_dirs: Vec<PathBuf>,
    /// Package database directory.
    pub db_path: PathBuf,
    /// Configured architecture, `None` for `auto` or unset.
    pub architecture: Option<String>,
    /// Repository names, in configuration order.
    pub repositories: Vec<String>,
}

impl PacmanConfig {
    /// Load and validate a pacman configuration file.
    ///
    /// `Include` directives are not followed.
    pub fn load(path: &Path) -> ResolverResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ResolverError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &content)
    }

    /// Parse pacman configuration text. `path` is used for error messages.
    pub fn parse(path: &Path, content: &str) -> ResolverResult<Self> {
        let normalized = normalize_flags(content);
        let ini = Ini::load_from_str(&normalized).map_err(|e| ResolverError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let options =
            ini.section(Some(OPTIONS_SECTION))
                .ok_or_else(|| ResolverError::ConfigInvalid {
                    path: path.to_path_buf(),
                    reason: format!("missing [{}] section", OPTIONS_SECTION),
                })?;

        let mut cache_dirs: Vec<PathBuf> = options
            .get_all("CacheDir")
            .flat_map(str::split_whitespace)
            .map(PathBuf::from)
            .collect();
        if cache_dirs.is_empty() {
            cache_dirs.push(PathBuf::from(DEFAULT_CACHE_DIR));
        }

        let db_path = options
            .get("DBPath")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let architecture = options
            .get("Architecture")
            .and_then(|a| a.split_whitespace().next())
            .filter(|a| !a.eq_ignore_ascii_case("auto"))
            .map(str::to_string);

        let mut repositories: Vec<String> = Vec::new();
        for name in ini.sections().flatten() {
            if name != OPTIONS_SECTION && !repositories.iter().any(|r| r == name) {
                repositories.push(name.to_string());
            }
        }

        Ok(Self {
            cache_dirs,
            db_path,
            architecture,
            repositories,
        })
    }
}

/// Rewrite value-less flag options (`Color`, `CheckSpace`) as `Flag = true`.
fn normalize_flags(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            let trimmed = line.trim();
            let keep = trimmed.is_empty()
                || trimmed.starts_with('#')
                || trimmed.starts_with(';')
                || trimmed.starts_with('[')
                || trimmed.contains('=');
            if keep {
                line.to_string()
            } else {
                format!("{} = true", trimmed)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PACMAN_CONF: &str = "\
#
# /etc/pacman.conf
#
[options]
RootDir     = /install
DBPath      = /install/var/lib/pacman/
CacheDir    = /install/var/cache/pacman/pkg/
Architecture = auto
Color
CheckSpace
SigLevel    = Required DatabaseOptional

[core]
Include = /etc/pacman.d/mirrorlist

[extra]
Include = /etc/pacman.d/mirrorlist
";

    #[test]
    fn test_parse_full_config() {
        let config = PacmanConfig::parse(Path::new("pacman.conf"), PACMAN_CONF).unwrap();

        assert_eq!(
            config.cache_dirs,
            vec![PathBuf::from("/install/var/cache/pacman/pkg/")]
        );
        assert_eq!(config.db_path, PathBuf::from("/install/var/lib/pacman/"));
        assert_eq!(config.architecture, None);
        assert_eq!(config.repositories, vec!["core", "extra"]);
    }

    #[test]
    fn test_defaults_when_options_empty() {
        let config = PacmanConfig::parse(Path::new("pacman.conf"), "[options]\n").unwrap();

        assert_eq!(config.cache_dirs, vec![PathBuf::from(DEFAULT_CACHE_DIR)]);
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn test_explicit_architecture() {
        let config = PacmanConfig::parse(
            Path::new("pacman.conf"),
            "[options]\nArchitecture = x86_64\n",
        )
        .unwrap();
        assert_eq!(config.architecture.as_deref(), Some("x86_64"));
    }

    #[test]
    fn test_missing_options_section() {
        let result = PacmanConfig::parse(Path::new("pacman.conf"), "[core]\nServer = http://x\n");
        assert!(matches!(result, Err(ResolverError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = PacmanConfig::load(Path::new("/nonexistent/pacman.conf"));
        assert!(matches!(result, Err(ResolverError::ConfigRead { .. })));
    }

    #[test]
    fn test_load_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pacman.conf");
        fs::write(&path, PACMAN_CONF).unwrap();

        let config = PacmanConfig::load(&path).unwrap();
        assert_eq!(config.repositories.len(), 2);
    }

    #[test]
    fn test_normalize_flags() {
        let out = normalize_flags("[options]\nColor\n# comment\nKey = v");
        assert_eq!(out, "[options]\nColor = true\n# comment\nKey = v");
    }
}
