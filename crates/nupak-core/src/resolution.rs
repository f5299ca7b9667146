//! The result of dependency resolution: one concrete version per package.

use std::collections::BTreeMap;
use std::fmt;

use crate::name::{PackageKey, PackageName};
use crate::range::VersionRange;
use crate::source::PackageSource;
use crate::version::SemVer;

/// A package pinned to a concrete version from a specific source.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPackage {
    /// Display casing as reported by the registry.
    pub name: PackageName,
    pub version: SemVer,
    pub source: PackageSource,
    /// Dependencies as declared by this version, in declaration order.
    pub dependencies: Vec<(PackageName, VersionRange)>,
}

impl fmt::Display for ResolvedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Resolved packages keyed by normalized name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageResolution {
    packages: BTreeMap<PackageKey, ResolvedPackage>,
}

impl PackageResolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for the package's key, returning the old one.
    pub fn insert(&mut self, package: ResolvedPackage) -> Option<ResolvedPackage> {
        self.packages.insert(package.name.key().clone(), package)
    }

    pub fn get(&self, key: &PackageKey) -> Option<&ResolvedPackage> {
        self.packages.get(key)
    }

    /// Look a package up by any spelling of its name.
    pub fn find(&self, name: &str) -> Option<&ResolvedPackage> {
        self.packages.get(&PackageKey::new(name))
    }

    pub fn contains(&self, key: &PackageKey) -> bool {
        self.packages.contains_key(key)
    }

    /// Entries in normalized-key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PackageKey, &ResolvedPackage)> {
        self.packages.iter()
    }

    pub fn packages(&self) -> impl Iterator<Item = &ResolvedPackage> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl FromIterator<ResolvedPackage> for PackageResolution {
    fn from_iter<I: IntoIterator<Item = ResolvedPackage>>(iter: I) -> Self {
        let mut resolution = Self::new();
        for package in iter {
            resolution.insert(package);
        }
        resolution
    }
}
