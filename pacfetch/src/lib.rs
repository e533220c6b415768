//! Pacfetch - package download step of an installer
//!
//! This library fetches every package file an installation needs before the
//! package manager runs. A list of package names is resolved through the
//! package database into metalink descriptors, merged into one
//! deduplicated [`DownloadSet`](download::DownloadSet) and handed to one of
//! several download backends. Progress is reported as events on a bounded,
//! non-blocking queue.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pacfetch::download::{DownloadCoordinator, PackageName, SessionConfig};
//! use pacfetch::events::EventSink;
//! use pacfetch::resolver::LocalMetalinkDatabase;
//! use pacfetch::settings::SharedSettings;
//!
//! let (sink, mut receiver) = EventSink::bounded(256);
//! let config = SessionConfig::new().with_backend("requests");
//! let mut coordinator = DownloadCoordinator::new(config, Arc::new(SharedSettings::new()))?
//!     .with_sink(sink);
//!
//! let database = LocalMetalinkDatabase::new("/var/lib/pacfetch/metalinks");
//! coordinator.start(&[PackageName::from("base")], &database)?;
//!
//! for event in receiver.drain() {
//!     println!("{}: {}", event.kind, event.text);
//! }
//! # Ok::<(), pacfetch::download::InstallError>(())
//! ```

pub mod backend;
pub mod config;
pub mod download;
pub mod events;
pub mod metalink;
pub mod resolver;
pub mod settings;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
