//! Package database binding used to turn package names into metalinks.
//!
//! The download coordinator only sees two traits:
//!
//! - [`PackageDatabase`] opens a handle for a pacman configuration file.
//! - [`MetalinkResolver`] is that handle; it resolves one package at a time
//!   and must be released exactly once.
//!
//! [`ResolverGuard`] ties the release to scope so that the handle is freed on
//! every exit path, including early returns and panics.

mod error;
mod local;
mod pacman_conf;

pub use error::{ResolverError, ResolverResult};
pub use local::{LocalMetalinkDatabase, LocalMetalinkResolver, METALINK_EXTENSION};
pub use pacman_conf::PacmanConfig;

use std::path::Path;

use crate::download::PackageName;
use crate::events::EventSink;
use crate::metalink::MetalinkDescriptor;

/// Opens package database handles.
pub trait PackageDatabase {
    /// Handle type produced by [`PackageDatabase::open`].
    type Handle: MetalinkResolver;

    /// Open the package database described by a pacman configuration file.
    fn open(&self, config_path: &Path, sink: Option<&EventSink>) -> ResolverResult<Self::Handle>;
}

/// An open package database handle.
pub trait MetalinkResolver {
    /// Produce the metalink descriptor for a package and its dependencies.
    fn resolve(
        &mut self,
        package: &PackageName,
        config_path: &Path,
    ) -> ResolverResult<MetalinkDescriptor>;

    /// Release the handle. Called exactly once by [`ResolverGuard`].
    fn release(&mut self) -> ResolverResult<()>;
}

/// Scope guard releasing a [`MetalinkResolver`].
///
/// Call [`ResolverGuard::release`] to observe the release result. If the
/// guard is dropped first, the handle is released and any failure is
/// logged.
pub struct ResolverGuard<R: MetalinkResolver> {
    resolver: R,
    released: bool,
}

impl<R: MetalinkResolver> ResolverGuard<R> {
    /// Take ownership of an open handle.
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            released: false,
        }
    }

    /// Access the handle.
    pub fn resolver(&mut self) -> &mut R {
        &mut self.resolver
    }

    /// Release the handle and report the outcome.
    pub fn release(mut self) -> ResolverResult<()> {
        self.released = true;
        self.resolver.release()
    }
}

impl<R: MetalinkResolver> Drop for ResolverGuard<R> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.resolver.release() {
            tracing::warn!(error = %e, "Failed to release package database");
        }
    }
}
