//! The download coordinator.
//!
//! Drives one download session: build the set, pick the backend, fetch.

use std::fs::DirBuilder;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use super::builder;
use super::config::SessionConfig;
use super::error::{BuildResult, InstallError, InstallResult};
use super::set::{DownloadSet, PackageName};
use crate::backend::{BackendContext, BackendFactory, BackendKind, CacheDirs, DefaultBackendFactory};
use crate::events::{EventReporter, EventSink};
use crate::resolver::PackageDatabase;
use crate::settings::{SessionSettings, FAILED_DOWNLOAD};

/// Coordinates the package download step of an installation.
///
/// A coordinator owns its event reporter, so event deduplication is scoped
/// to one coordinator. Its operations take `&mut self` and are never run
/// concurrently.
pub struct DownloadCoordinator {
    config: SessionConfig,
    settings: Arc<dyn SessionSettings>,
    reporter: EventReporter,
    factory: Box<dyn BackendFactory>,
}

impl DownloadCoordinator {
    /// Create a coordinator without an event sink.
    ///
    /// Creates the package cache directory first.
    pub fn new(config: SessionConfig, settings: Arc<dyn SessionSettings>) -> InstallResult<Self> {
        create_cache_dir(&config.pacman_cache_dir).map_err(|e| InstallError::CacheDirCreate {
            path: config.pacman_cache_dir.clone(),
            source: e,
        })?;

        Ok(Self {
            config,
            settings,
            reporter: EventReporter::new(None),
            factory: Box::new(DefaultBackendFactory),
        })
    }

    /// Report progress to an event sink.
    pub fn with_sink(mut self, sink: EventSink) -> Self {
        self.reporter = EventReporter::new(Some(sink));
        self
    }

    /// Use a custom backend factory.
    pub fn with_backend_factory(mut self, factory: impl BackendFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        self
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Event sink, if any.
    pub fn sink(&self) -> Option<&EventSink> {
        self.reporter.sink()
    }

    /// Build the download set for a list of packages.
    pub fn build_download_set<D: PackageDatabase>(
        &mut self,
        package_names: &[PackageName],
        database: &D,
    ) -> BuildResult<DownloadSet> {
        builder::build_download_set(
            package_names,
            database,
            &self.config.pacman_conf_file,
            &mut self.reporter,
        )
    }

    /// Download every file needed by `package_names`.
    ///
    /// A new download set is built for each call. Any failure halts the
    /// session; a backend failure also raises [`FAILED_DOWNLOAD`].
    pub fn start<D: PackageDatabase>(
        &mut self,
        package_names: &[PackageName],
        database: &D,
    ) -> InstallResult<()> {
        let downloads = self
            .build_download_set(package_names, database)
            .map_err(InstallError::DownloadListUnavailable)?;

        let kind = BackendKind::resolve(&self.config.backend);
        tracing::debug!(backend = %kind, files = downloads.len(), "Using backend to download packages");

        let context = BackendContext {
            dirs: CacheDirs::new(
                self.config.pacman_cache_dir.clone(),
                self.config.effective_cache_dir(),
            ),
            sink: self.reporter.sink().cloned(),
            options: self.config.options.clone(),
        };

        let fetched = match self.factory.create(kind, context) {
            Ok(mut backend) => backend.fetch(&downloads),
            Err(e) => {
                tracing::error!(backend = %kind, error = %e, "Can't create backend");
                false
            }
        };

        if !fetched {
            self.settings.set(FAILED_DOWNLOAD, Value::Bool(true));
            tracing::error!(backend = %kind, "Download failed, installation stops");
            return Err(InstallError::DownloadFailed);
        }

        tracing::info!(backend = %kind, files = downloads.len(), "All packages downloaded");
        Ok(())
    }
}

fn create_cache_dir(path: &Path) -> io::Result<()> {
    let mut dir_builder = DirBuilder::new();
    dir_builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        dir_builder.mode(0o755);
    }
    dir_builder.create(path)
}
