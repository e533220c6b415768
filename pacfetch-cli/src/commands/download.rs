//! Download command - fetch the packages of an installation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use pacfetch::config::ConfigFile;
use pacfetch::download::{DownloadCoordinator, PackageName, SessionConfig};
use pacfetch::events::EventSink;
use pacfetch::resolver::LocalMetalinkDatabase;
use pacfetch::settings::SharedSettings;

use crate::error::CliError;
use crate::ui::{EventDisplay, ProgressConsumer};

/// Arguments for the download command.
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Packages to download, dependencies included
    #[arg(required = true)]
    pub packages: Vec<String>,

    /// Download backend: aria2, urllib or requests
    #[arg(long)]
    pub backend: Option<String>,

    /// pacman configuration file
    #[arg(long, value_name = "PATH")]
    pub pacman_conf: Option<PathBuf>,

    /// Package cache to download into
    #[arg(long, value_name = "PATH")]
    pub pacman_cache_dir: Option<PathBuf>,

    /// Existing package cache to copy from
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Directory holding <package>.meta4 files
    #[arg(long, value_name = "PATH")]
    pub metalink_dir: Option<PathBuf>,

    /// Number of parallel downloads
    #[arg(long)]
    pub parallel: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl DownloadArgs {
    /// Session configuration: CLI flags over config file values.
    pub fn session_config(&self, config: &ConfigFile) -> SessionConfig {
        let mut session = config.to_session_config();
        if let Some(path) = &self.pacman_conf {
            session = session.with_pacman_conf_file(path);
        }
        if let Some(path) = &self.pacman_cache_dir {
            session = session.with_pacman_cache_dir(path);
        }
        if let Some(path) = &self.cache_dir {
            session = session.with_cache_dir(path);
        }
        if let Some(backend) = &self.backend {
            session = session.with_backend(backend.as_str());
        }
        if let Some(parallel) = self.parallel {
            session = session.with_parallel_downloads(parallel);
        }
        if let Some(timeout) = self.timeout {
            session = session.with_timeout(std::time::Duration::from_secs(timeout));
        }
        session
    }

    /// Metalink directory: CLI flag over config file value.
    pub fn metalink_dir(&self, config: &ConfigFile) -> PathBuf {
        self.metalink_dir
            .clone()
            .unwrap_or_else(|| config.metalink.dir.clone())
    }
}

/// Run the download command.
pub fn run(args: DownloadArgs, config: &ConfigFile) -> Result<(), CliError> {
    let session = args.session_config(config);
    let database = LocalMetalinkDatabase::new(args.metalink_dir(config));
    let packages: Vec<PackageName> = args
        .packages
        .iter()
        .map(|name| PackageName::from(name.as_str()))
        .collect();

    tracing::info!(
        packages = packages.len(),
        backend = %session.backend,
        cache = %session.pacman_cache_dir.display(),
        "Starting download"
    );

    let (sink, receiver) = EventSink::bounded(config.download.queue_capacity);
    let consumer = ProgressConsumer::spawn(receiver, EventDisplay::new());

    // The coordinator holds the last sender; dropping it ends the consumer.
    let result = DownloadCoordinator::new(session, Arc::new(SharedSettings::new())).and_then(
        |coordinator| {
            let mut coordinator = coordinator.with_sink(sink);
            coordinator.start(&packages, &database)
        },
    );
    let errors = consumer.join();

    result?;
    if errors > 0 {
        tracing::warn!(errors, "Download finished after recoverable errors");
    }
    println!("Downloaded {} package(s).", packages.len());
    Ok(())
}
