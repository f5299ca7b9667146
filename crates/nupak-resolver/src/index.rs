//! An in-memory package feed loaded from TOML index files.
//!
//! ```toml
//! [[package]]
//! name = "Castle.Windsor"
//! version = "3.2.1"
//! dependencies = [["Castle.Core", ">= 3.2.0"]]
//! ```
//!
//! Each file is attached to one [`PackageSource`]. Lookups are
//! case-insensitive; metadata reports the spelling the entry was published
//! under, so two entries for the same package may disagree on casing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use async_trait::async_trait;
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use nupak_core::name::{PackageKey, PackageName};
use nupak_core::range::VersionRange;
use nupak_core::source::PackageSource;
use nupak_core::version::SemVer;

use crate::oracle::{Feed, FeedError, FeedMetadata};

#[derive(Debug, Error, Diagnostic)]
pub enum IndexError {
    #[error("invalid index: {0}")]
    #[diagnostic(code(nupak::index::toml))]
    Toml(#[from] toml::de::Error),

    #[error("{package}: {reason}")]
    #[diagnostic(code(nupak::index::entry))]
    Entry { package: String, reason: String },
}

#[derive(Debug, Deserialize)]
struct IndexFile {
    #[serde(default)]
    package: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    name: String,
    version: String,
    #[serde(default)]
    dependencies: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct IndexedVersion {
    name: PackageName,
    version: SemVer,
    dependencies: Vec<(PackageName, VersionRange)>,
}

/// Packages per source, keyed by normalized name.
#[derive(Debug, Default)]
pub struct StaticIndex {
    sources: BTreeMap<PackageSource, BTreeMap<PackageKey, Vec<IndexedVersion>>>,
    unavailable: BTreeSet<PackageSource>,
}

impl StaticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish one package version on `source`. A version that is already
    /// present (by precedence) is replaced.
    pub fn add(
        &mut self,
        source: &PackageSource,
        name: PackageName,
        version: SemVer,
        dependencies: Vec<(PackageName, VersionRange)>,
    ) {
        let versions = self
            .sources
            .entry(source.clone())
            .or_default()
            .entry(name.key().clone())
            .or_default();
        versions.retain(|v| v.version != version);
        versions.push(IndexedVersion {
            name,
            version,
            dependencies,
        });
    }

    /// Builder form of [`add`](Self::add) taking textual versions and ranges.
    pub fn with_package(
        mut self,
        source: &PackageSource,
        name: &str,
        version: &str,
        dependencies: &[(&str, &str)],
    ) -> Result<Self, IndexError> {
        let entry = IndexEntry {
            name: name.to_string(),
            version: version.to_string(),
            dependencies: dependencies
                .iter()
                .map(|(n, r)| (n.to_string(), r.to_string()))
                .collect(),
        };
        self.add_entry(source, entry)?;
        Ok(self)
    }

    /// Load every `[[package]]` from TOML text into `source`, returning how many were added.
    pub fn load_toml(&mut self, source: &PackageSource, text: &str) -> Result<usize, IndexError> {
        let file: IndexFile = toml::from_str(text)?;
        let count = file.package.len();
        for entry in file.package {
            self.add_entry(source, entry)?;
        }
        Ok(count)
    }

    pub fn load_file(&mut self, source: &PackageSource, path: &Path) -> miette::Result<usize> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            nupak_util::errors::NupakError::Generic {
                message: format!("Failed to read index {}: {e}", path.display()),
            }
        })?;
        let count = self.load_toml(source, &text).map_err(|e| {
            nupak_util::errors::NupakError::Generic {
                message: format!("{}: {e}", path.display()),
            }
        })?;
        tracing::debug!("Loaded {count} packages for {source} from {}", path.display());
        Ok(count)
    }

    /// Make every lookup against `source` fail, as an unreachable registry would.
    pub fn mark_unavailable(&mut self, source: &PackageSource) {
        self.unavailable.insert(source.clone());
    }

    pub fn package_count(&self) -> usize {
        self.sources
            .values()
            .flat_map(|packages| packages.values())
            .map(Vec::len)
            .sum()
    }

    fn add_entry(&mut self, source: &PackageSource, entry: IndexEntry) -> Result<(), IndexError> {
        let fail = |reason: String| IndexError::Entry {
            package: entry.name.clone(),
            reason,
        };
        let version = SemVer::parse(&entry.version).map_err(|e| fail(e.to_string()))?;
        let dependencies = entry
            .dependencies
            .iter()
            .map(|(name, range)| {
                VersionRange::parse(range)
                    .map(|range| (PackageName::new(name.as_str()), range))
                    .map_err(|e| fail(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.add(source, PackageName::new(entry.name.as_str()), version, dependencies);
        Ok(())
    }

    fn lookup(
        &self,
        source: &PackageSource,
        name: &PackageName,
    ) -> Result<&[IndexedVersion], FeedError> {
        if self.unavailable.contains(source) {
            return Err(FeedError::Unavailable {
                location: source.to_string(),
                message: "source marked unavailable".to_string(),
            });
        }
        self.sources
            .get(source)
            .and_then(|packages| packages.get(name.key()))
            .map(Vec::as_slice)
            .ok_or_else(|| FeedError::NotFound {
                package: name.to_string(),
                location: source.to_string(),
            })
    }
}

#[async_trait]
impl Feed for StaticIndex {
    async fn versions(
        &self,
        source: &PackageSource,
        name: &PackageName,
    ) -> Result<Vec<SemVer>, FeedError> {
        Ok(self
            .lookup(source, name)?
            .iter()
            .map(|v| v.version.clone())
            .collect())
    }

    async fn metadata(
        &self,
        source: &PackageSource,
        name: &PackageName,
        version: &SemVer,
    ) -> Result<FeedMetadata, FeedError> {
        self.lookup(source, name)?
            .iter()
            .find(|v| &v.version == version)
            .map(|v| FeedMetadata {
                canonical_name: v.name.clone(),
                dependencies: v.dependencies.clone(),
            })
            .ok_or_else(|| FeedError::NotFound {
                package: format!("{name} {version}"),
                location: source.to_string(),
            })
    }
}
