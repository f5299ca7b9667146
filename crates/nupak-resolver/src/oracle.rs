//! Registry access as seen by the resolver.
//!
//! A [`Feed`] answers questions about one source at a time. The resolver
//! talks to a [`PackageOracle`], which takes a whole ordered source list;
//! [`SourceFallback`] bridges the two by trying sources in order and
//! treating any per-source failure as "try the next one".

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use nupak_core::name::PackageName;
use nupak_core::range::VersionRange;
use nupak_core::source::PackageSource;
use nupak_core::version::SemVer;

use crate::error::ResolveError;

/// A failed lookup against a single source.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum FeedError {
    #[error("'{package}' is not available from {location}")]
    NotFound { package: String, location: String },

    #[error("{location} is unavailable: {message}")]
    Unavailable { location: String, message: String },
}

/// What one source knows about one version of a package.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedMetadata {
    /// The package name as the source spells it.
    pub canonical_name: PackageName,
    pub dependencies: Vec<(PackageName, VersionRange)>,
}

/// A single package source.
#[async_trait]
pub trait Feed: Send + Sync {
    /// Every published version of `name` on `source`, in any order.
    async fn versions(
        &self,
        source: &PackageSource,
        name: &PackageName,
    ) -> Result<Vec<SemVer>, FeedError>;

    async fn metadata(
        &self,
        source: &PackageSource,
        name: &PackageName,
        version: &SemVer,
    ) -> Result<FeedMetadata, FeedError>;
}

/// Versions of a package and the source that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionListing {
    pub source: PackageSource,
    pub versions: Vec<SemVer>,
}

/// Dependencies of a concrete package version.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageMetadata {
    pub canonical_name: PackageName,
    pub source: PackageSource,
    pub dependencies: Vec<(PackageName, VersionRange)>,
}

/// The resolver's view of the registry: lookups over an ordered source list.
#[async_trait]
pub trait PackageOracle: Send + Sync {
    /// Versions from the first source that has the package.
    async fn list_versions(
        &self,
        name: &PackageName,
        sources: &[PackageSource],
    ) -> Result<VersionListing, ResolveError>;

    /// Metadata for `version` from the first source that can serve it.
    async fn get_dependencies(
        &self,
        name: &PackageName,
        version: &SemVer,
        sources: &[PackageSource],
    ) -> Result<PackageMetadata, ResolveError>;
}

/// Tries each source in order and moves on when one fails.
///
/// Once every source has failed the lookup is reported as
/// [`ResolveError::UnknownPackage`] naming all of them.
pub struct SourceFallback<F> {
    feed: F,
}

impl<F: Feed> SourceFallback<F> {
    pub fn new(feed: F) -> Self {
        Self { feed }
    }
}

#[async_trait]
impl<F: Feed> PackageOracle for SourceFallback<F> {
    async fn list_versions(
        &self,
        name: &PackageName,
        sources: &[PackageSource],
    ) -> Result<VersionListing, ResolveError> {
        for source in sources {
            match self.feed.versions(source, name).await {
                Ok(versions) if !versions.is_empty() => {
                    tracing::debug!("{name}: {} versions on {source}", versions.len());
                    return Ok(VersionListing {
                        source: source.clone(),
                        versions,
                    });
                }
                Ok(_) => tracing::warn!("{name}: no versions published on {source}"),
                Err(e) => tracing::warn!("{name}: {e}"),
            }
        }
        Err(ResolveError::UnknownPackage {
            package: name.clone(),
            tried: sources.to_vec(),
        })
    }

    async fn get_dependencies(
        &self,
        name: &PackageName,
        version: &SemVer,
        sources: &[PackageSource],
    ) -> Result<PackageMetadata, ResolveError> {
        for source in sources {
            match self.feed.metadata(source, name, version).await {
                Ok(meta) => {
                    return Ok(PackageMetadata {
                        canonical_name: meta.canonical_name,
                        source: source.clone(),
                        dependencies: meta.dependencies,
                    });
                }
                Err(e) => tracing::warn!("{name} {version}: {e}"),
            }
        }
        Err(ResolveError::UnknownPackage {
            package: name.clone(),
            tried: sources.to_vec(),
        })
    }
}
