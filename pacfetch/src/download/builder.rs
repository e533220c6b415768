//! Construction of a download set from package names.

use std::path::Path;

use super::error::{BuildError, BuildResult};
use super::set::{DownloadSet, PackageName};
use crate::events::{format_ratio, EventKind, EventReporter};
use crate::resolver::{MetalinkResolver, PackageDatabase, ResolverGuard};

/// Status text shown while the set is built.
pub const CREATING_LIST_MESSAGE: &str = "Creating the list of packages to download...";

/// Resolve every package in order and merge the results.
///
/// Packages are resolved one at a time. The first failure aborts the build
/// and no set is returned. The database handle is released on every path;
/// a failed release also fails the build.
///
/// Events: `info` [`CREATING_LIST_MESSAGE`] once the database is open, a
/// `percent` event after each package, and an empty `info` when done.
pub fn build_download_set<D: PackageDatabase>(
    package_names: &[PackageName],
    database: &D,
    config_path: &Path,
    reporter: &mut EventReporter,
) -> BuildResult<DownloadSet> {
    let handle = database
        .open(config_path, reporter.sink())
        .map_err(|e| {
            tracing::error!(config = %config_path.display(), error = %e, "Can't initialize package database");
            BuildError::ResolverInit(e)
        })?;
    let mut guard = ResolverGuard::new(handle);

    reporter.queue_event(EventKind::Info, CREATING_LIST_MESSAGE);

    let total = package_names.len();
    let mut downloads = DownloadSet::new();

    for (index, package) in package_names.iter().enumerate() {
        let descriptor = guard
            .resolver()
            .resolve(package, config_path)
            .map_err(|e| {
                tracing::error!(
                    package = %package,
                    error = %e,
                    "Error creating metalink for package. Installation will stop"
                );
                BuildError::Metalink {
                    package: package.clone(),
                    source: e,
                }
            })?;

        let added = downloads.merge(&descriptor);
        tracing::debug!(
            package = %package,
            files = descriptor.len(),
            added,
            "Merged metalink"
        );

        reporter.queue_event(EventKind::Percent, format_ratio(index + 1, total));
    }

    guard.release().map_err(|e| {
        tracing::error!(error = %e, "Can't release package database");
        BuildError::ResolverRelease(e)
    })?;

    reporter.queue_event(EventKind::Info, "");

    tracing::info!(
        packages = total,
        files = downloads.len(),
        bytes = downloads.total_size(),
        "Download list created"
    );
    Ok(downloads)
}
