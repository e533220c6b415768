//! Package database backed by a directory of pre-generated metalinks.
//!
//! Each package has a `<name>.meta4` document listing the package file and
//! every dependency file it needs. The pacman configuration is still loaded
//! and validated on open, so a broken configuration fails the session the
//! same way a real package database would.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{MetalinkResolver, PackageDatabase, PacmanConfig, ResolverError, ResolverResult};
use crate::download::PackageName;
use crate::events::EventSink;
use crate::metalink::MetalinkDescriptor;

/// File extension of metalink documents.
pub const METALINK_EXTENSION: &str = "meta4";

/// Opens [`LocalMetalinkResolver`] handles over a metalink directory.
#[derive(Debug, Clone)]
pub struct LocalMetalinkDatabase {
    metalink_dir: PathBuf,
}

impl LocalMetalinkDatabase {
    /// Create a database reading metalinks from `metalink_dir`.
    pub fn new(metalink_dir: impl Into<PathBuf>) -> Self {
        Self {
            metalink_dir: metalink_dir.into(),
        }
    }

    /// Directory metalinks are read from.
    pub fn metalink_dir(&self) -> &Path {
        &self.metalink_dir
    }
}

impl PackageDatabase for LocalMetalinkDatabase {
    type Handle = LocalMetalinkResolver;

    fn open(&self, config_path: &Path, _sink: Option<&EventSink>) -> ResolverResult<Self::Handle> {
        let pacman = PacmanConfig::load(config_path)?;
        tracing::debug!(
            config = %config_path.display(),
            repositories = pacman.repositories.len(),
            "Opened package database"
        );
        Ok(LocalMetalinkResolver {
            metalink_dir: self.metalink_dir.clone(),
            pacman,
        })
    }
}

/// Open handle of a [`LocalMetalinkDatabase`].
#[derive(Debug)]
pub struct LocalMetalinkResolver {
    metalink_dir: PathBuf,
    pacman: PacmanConfig,
}

impl LocalMetalinkResolver {
    /// The pacman configuration loaded on open.
    pub fn pacman_config(&self) -> &PacmanConfig {
        &self.pacman
    }

    fn metalink_path(&self, package: &PackageName) -> PathBuf {
        self.metalink_dir
            .join(format!("{}.{}", package.as_str(), METALINK_EXTENSION))
    }
}

impl MetalinkResolver for LocalMetalinkResolver {
    fn resolve(
        &mut self,
        package: &PackageName,
        _config_path: &Path,
    ) -> ResolverResult<MetalinkDescriptor> {
        let path = self.metalink_path(package);
        let name = package.as_str();
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(ResolverError::MetalinkNotFound {
                package: package.to_string(),
                path,
            });
        }
        let xml = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ResolverError::MetalinkNotFound {
                package: package.to_string(),
                path: path.clone(),
            },
            _ => ResolverError::MetalinkRead {
                package: package.to_string(),
                source: e,
            },
        })?;

        MetalinkDescriptor::from_xml(&xml).map_err(|e| ResolverError::MetalinkInvalid {
            package: package.to_string(),
            source: e,
        })
    }

    fn release(&mut self) -> ResolverResult<()> {
        tracing::debug!("Released package database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const METALINK: &str = r#"<metalink xmlns="urn:ietf:params:xml:ns:metalink">
  <file name="nano-8.0-1-x86_64.pkg.tar.zst">
    <identity>nano</identity>
    <version>8.0-1</version>
    <url priority="1">http://mirror/extra/nano-8.0-1-x86_64.pkg.tar.zst</url>
  </file>
</metalink>"#;

    fn setup() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let conf = temp.path().join("pacman.conf");
        fs::write(&conf, "[options]\nCacheDir = /tmp/pkg\n[extra]\n").unwrap();
        fs::write(temp.path().join("nano.meta4"), METALINK).unwrap();
        (temp, conf)
    }

    #[test]
    fn test_open_and_resolve() {
        let (temp, conf) = setup();
        let db = LocalMetalinkDatabase::new(temp.path());

        let mut handle = db.open(&conf, None).unwrap();
        let descriptor = handle.resolve(&PackageName::from("nano"), &conf).unwrap();

        assert_eq!(descriptor.len(), 1);
        assert!(descriptor
            .extract_entries()
            .contains_key("nano-8.0-1-x86_64.pkg.tar.zst"));
        assert!(handle.release().is_ok());
    }

    #[test]
    fn test_open_fails_on_missing_config() {
        let temp = TempDir::new().unwrap();
        let db = LocalMetalinkDatabase::new(temp.path());

        let result = db.open(&temp.path().join("missing.conf"), None);
        assert!(matches!(result, Err(ResolverError::ConfigRead { .. })));
    }

    #[test]
    fn test_resolve_unknown_package() {
        let (temp, conf) = setup();
        let db = LocalMetalinkDatabase::new(temp.path());
        let mut handle = db.open(&conf, None).unwrap();

        let result = handle.resolve(&PackageName::from("vim"), &conf);
        match result {
            Err(ResolverError::MetalinkNotFound { package, path }) => {
                assert_eq!(package, "vim");
                assert!(path.ends_with("vim.meta4"));
            }
            other => panic!("Expected MetalinkNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_malformed_metalink() {
        let (temp, conf) = setup();
        fs::write(temp.path().join("broken.meta4"), "<metalink><file").unwrap();
        let db = LocalMetalinkDatabase::new(temp.path());
        let mut handle = db.open(&conf, None).unwrap();

        let result = handle.resolve(&PackageName::from("broken"), &conf);
        assert!(matches!(result, Err(ResolverError::MetalinkInvalid { .. })));
    }

    #[test]
    fn test_pacman_config_is_exposed() {
        let (temp, conf) = setup();
        let handle = LocalMetalinkDatabase::new(temp.path())
            .open(&conf, None)
            .unwrap();

        assert_eq!(handle.pacman_config().repositories, vec!["extra"]);
    }

    #[test]
    fn test_package_names_stay_in_metalink_dir() {
        let (temp, conf) = setup();
        let metalink_dir = temp.path().join("metalinks");
        fs::create_dir(&metalink_dir).unwrap();
        let mut handle = LocalMetalinkDatabase::new(&metalink_dir)
            .open(&conf, None)
            .unwrap();

        for name in ["../nano", "sub/nano", ".."] {
            let result = handle.resolve(&PackageName::from(name), &conf);
            assert!(
                matches!(result, Err(ResolverError::MetalinkNotFound { .. })),
                "{} resolved: {:?}",
                name,
                result
            );
        }
    }
}
