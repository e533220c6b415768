//! Logging setup.
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `pacfetch=info`).
//! With a log file, a second non-blocking layer writes plain text to it.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "pacfetch=info";

/// Install the global subscriber.
///
/// The returned guard flushes the log file when dropped and must be kept
/// alive until the program exits.
pub fn init(log_file: Option<&Path>) -> Result<Option<WorkerGuard>, CliError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .compact();

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CliError::Logging(format!("{}: {}", path.display(), e)))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    Ok(guard)
}
