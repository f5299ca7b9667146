//! The requirement pool: everything known about each package key while
//! resolution runs.
//!
//! A key's range only ever narrows. When it narrows past the version already
//! chosen for the key, the choice is dropped and the key goes back on the
//! pending queue. Ranges contributed by a dropped choice's dependencies stay
//! in the pool.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use nupak_core::name::{PackageKey, PackageName};
use nupak_core::range::VersionRange;
use nupak_core::requirement::PackageRequirement;
use nupak_core::resolution::{PackageResolution, ResolvedPackage};
use nupak_core::source::PackageSource;
use nupak_core::version::SemVer;

use crate::conflict::{ConstraintOrigin, Contribution, ContributionList};
use crate::error::ResolveError;
use crate::oracle::{PackageMetadata, VersionListing};

/// State for one normalized package key.
#[derive(Debug, Clone)]
pub struct PoolEntry {
    /// Spelling of the first requirement seen; used for lookups and errors.
    pub name: PackageName,
    pub contributions: ContributionList,
    /// Intersection of the binding contributions.
    pub range: VersionRange,
    /// Sources to search, in priority order.
    pub sources: Vec<PackageSource>,
    /// Cached version listing, fetched once per key.
    pub listing: Option<VersionListing>,
    /// Registry spelling, fixed by the first successful metadata lookup.
    pub canonical: Option<PackageName>,
    pub resolved: Option<ResolvedPackage>,
    /// How many times a version has been selected for this key.
    pub attempts: usize,
}

impl PoolEntry {
    fn new(name: &PackageName) -> Self {
        Self {
            name: name.clone(),
            contributions: ContributionList::default(),
            range: VersionRange::NoRestriction,
            sources: Vec::new(),
            listing: None,
            canonical: None,
            resolved: None,
            attempts: 0,
        }
    }

    /// Lowest listed version inside the current range.
    pub fn lowest_candidate(&self) -> Option<&SemVer> {
        self.listing
            .as_ref()?
            .versions
            .iter()
            .filter(|v| self.range.contains(v))
            .min()
    }
}

#[derive(Debug, Default)]
pub struct RequirementPool {
    entries: BTreeMap<PackageKey, PoolEntry>,
    discovery: Vec<PackageKey>,
    pending: BTreeSet<PackageKey>,
    /// Keys named by a direct requirement.
    direct: BTreeSet<PackageKey>,
}

impl RequirementPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the pool with the direct requirements.
    pub fn from_requirements(requirements: &[PackageRequirement]) -> Result<Self, ResolveError> {
        let mut pool = Self::new();
        for requirement in requirements {
            pool.add(
                &requirement.name,
                requirement.range.clone(),
                &requirement.sources,
                ConstraintOrigin::Direct,
                requirement.overrides,
            )?;
        }
        Ok(pool)
    }

    /// Record a range on `name`, creating the entry on first sight.
    ///
    /// Fails with [`ResolveError::UnsatisfiableConstraint`] when the binding
    /// ranges no longer intersect.
    pub fn add(
        &mut self,
        name: &PackageName,
        range: VersionRange,
        sources: &[PackageSource],
        origin: ConstraintOrigin,
        overrides: bool,
    ) -> Result<(), ResolveError> {
        let key = name.key().clone();
        if !self.entries.contains_key(&key) {
            tracing::trace!("Discovered {name}");
            self.entries.insert(key.clone(), PoolEntry::new(name));
            self.discovery.push(key.clone());
            self.pending.insert(key.clone());
        }
        if matches!(origin, ConstraintOrigin::Direct) {
            self.direct.insert(key.clone());
        }
        let Some(entry) = self.entries.get_mut(&key) else {
            return Ok(());
        };

        entry.contributions.push(Contribution {
            origin,
            range,
            overrides,
        });
        for source in sources {
            if !entry.sources.contains(source) {
                entry.sources.push(source.clone());
            }
        }

        entry.range = entry.contributions.effective_range().ok_or_else(|| {
            ResolveError::UnsatisfiableConstraint {
                package: entry.name.clone(),
                contributions: entry.contributions.clone(),
            }
        })?;

        let invalidated = entry
            .resolved
            .as_ref()
            .is_some_and(|r| !entry.range.contains(&r.version));
        if invalidated {
            if let Some(previous) = entry.resolved.take() {
                tracing::debug!(
                    "{} no longer satisfies '{}', re-resolving",
                    previous,
                    entry.range
                );
            }
            self.pending.insert(key);
        }
        Ok(())
    }

    /// Drain the pending keys in discovery order.
    pub fn take_pending(&mut self) -> Vec<PackageKey> {
        let batch = self
            .discovery
            .iter()
            .filter(|k| self.pending.contains(*k))
            .cloned()
            .collect();
        self.pending.clear();
        batch
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn entry(&self, key: &PackageKey) -> Option<&PoolEntry> {
        self.entries.get(key)
    }

    pub fn entry_mut(&mut self, key: &PackageKey) -> Option<&mut PoolEntry> {
        self.entries.get_mut(key)
    }

    /// Apply the metadata fetched for `version` of `key`.
    ///
    /// The registry spelling is captured the first time metadata arrives for
    /// the key. If the range moved past `version` since it was selected, the
    /// key is queued again instead. Otherwise the package is resolved and its
    /// dependencies are added with the package's sources.
    pub fn record(
        &mut self,
        key: &PackageKey,
        version: SemVer,
        metadata: PackageMetadata,
    ) -> Result<(), ResolveError> {
        let Some(entry) = self.entries.get_mut(key) else {
            return Ok(());
        };
        let canonical = entry
            .canonical
            .get_or_insert_with(|| metadata.canonical_name.clone())
            .clone();

        if !entry.range.contains(&version) {
            tracing::debug!("{canonical} {version} left '{}' before it was applied", entry.range);
            self.pending.insert(key.clone());
            return Ok(());
        }

        tracing::debug!("Resolved {canonical} {version} from {}", metadata.source);
        let sources = entry.sources.clone();
        entry.resolved = Some(ResolvedPackage {
            name: canonical.clone(),
            version: version.clone(),
            source: metadata.source,
            dependencies: metadata.dependencies.clone(),
        });

        for (dependency, range) in metadata.dependencies {
            self.add(
                &dependency,
                range,
                &sources,
                ConstraintOrigin::Dependency {
                    parent: canonical.clone(),
                    version: version.clone(),
                },
                false,
            )?;
        }
        Ok(())
    }

    /// The resolved packages reachable from the direct requirements; call
    /// once nothing is pending.
    ///
    /// A package pulled in only by a version that was later replaced is left
    /// out, even though its ranges still shaped the rest of the pool.
    pub fn into_resolution(mut self) -> PackageResolution {
        let mut resolution = PackageResolution::new();
        let mut queue: VecDeque<PackageKey> = self.direct.iter().cloned().collect();
        let mut seen = BTreeSet::new();
        while let Some(key) = queue.pop_front() {
            if !seen.insert(key.clone()) {
                continue;
            }
            let Some(package) = self.entries.get_mut(&key).and_then(|e| e.resolved.take())
            else {
                continue;
            };
            queue.extend(package.dependencies.iter().map(|(name, _)| name.key().clone()));
            resolution.insert(package);
        }

        let orphaned = self
            .entries
            .values()
            .filter(|e| e.resolved.is_some())
            .count();
        if orphaned > 0 {
            tracing::debug!("Dropped {orphaned} packages no longer required by any resolved package");
        }
        resolution
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
