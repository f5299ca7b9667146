//! Fixpoint resolution over the requirement pool.
//!
//! Each round drains the pending keys, fetches version listings and then
//! metadata for the selected versions concurrently, and applies the results
//! in ascending key order. A round can discover new keys or tighten ranges
//! past earlier choices; resolution ends when a round leaves nothing pending.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use nupak_core::name::{PackageKey, PackageName};
use nupak_core::requirement::PackageRequirement;
use nupak_core::resolution::PackageResolution;
use nupak_core::source::PackageSource;
use nupak_core::version::SemVer;

use crate::error::ResolveError;
use crate::oracle::{PackageMetadata, PackageOracle, VersionListing};
use crate::pool::RequirementPool;

pub const MAX_CONCURRENT_FETCHES: usize = 8;

/// A version picked for a key, waiting for its metadata.
#[derive(Debug, Clone)]
struct Selection {
    key: PackageKey,
    name: PackageName,
    version: SemVer,
    sources: Vec<PackageSource>,
}

pub struct Resolver {
    oracle: Arc<dyn PackageOracle>,
    max_concurrent_fetches: usize,
    max_attempts: Option<usize>,
}

impl Resolver {
    pub fn new(oracle: Arc<dyn PackageOracle>) -> Self {
        Self {
            oracle,
            max_concurrent_fetches: MAX_CONCURRENT_FETCHES,
            max_attempts: None,
        }
    }

    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit.max(1);
        self
    }

    /// Cap selections per key below the number of listed versions.
    pub fn with_max_attempts(mut self, limit: usize) -> Self {
        self.max_attempts = Some(limit.max(1));
        self
    }

    /// Resolve `requirements` to one version per package, choosing the
    /// lowest version that satisfies every binding range.
    pub async fn resolve(
        &self,
        requirements: &[PackageRequirement],
    ) -> Result<PackageResolution, ResolveError> {
        let mut pool = RequirementPool::from_requirements(requirements)?;
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_fetches));
        let mut round = 0usize;

        loop {
            let batch = pool.take_pending();
            if batch.is_empty() {
                break;
            }
            round += 1;
            tracing::debug!("Resolution round {round}: {} pending", batch.len());

            self.fetch_listings(&mut pool, &batch, &semaphore).await?;
            let selections = self.select_versions(&mut pool, &batch)?;
            let fetched = self.fetch_metadata(selections, &semaphore).await?;
            for (selection, metadata) in fetched {
                pool.record(&selection.key, selection.version, metadata)?;
            }
        }

        let resolution = pool.into_resolution();
        tracing::info!(
            "Resolved {} packages in {round} rounds",
            resolution.len()
        );
        Ok(resolution)
    }

    /// Fetch listings for keys that have none yet. The first failure in key
    /// order wins.
    async fn fetch_listings(
        &self,
        pool: &mut RequirementPool,
        batch: &[PackageKey],
        semaphore: &Arc<Semaphore>,
    ) -> Result<(), ResolveError> {
        let mut join_set = JoinSet::new();
        for key in batch {
            let Some(entry) = pool.entry(key) else {
                continue;
            };
            if entry.listing.is_some() {
                continue;
            }
            let oracle = self.oracle.clone();
            let sem = semaphore.clone();
            let key = key.clone();
            let name = entry.name.clone();
            let sources = entry.sources.clone();
            join_set.spawn(async move {
                let _permit = sem.acquire().await;
                let result = oracle.list_versions(&name, &sources).await;
                (key, result)
            });
        }

        let mut results: Vec<(PackageKey, Result<VersionListing, ResolveError>)> = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            results.push(joined.map_err(|e| ResolveError::TaskFailed(e.to_string()))?);
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));

        for (key, result) in results {
            let listing = result?;
            if let Some(entry) = pool.entry_mut(&key) {
                entry.listing = Some(listing);
            }
        }
        Ok(())
    }

    fn select_versions(
        &self,
        pool: &mut RequirementPool,
        batch: &[PackageKey],
    ) -> Result<Vec<Selection>, ResolveError> {
        let mut keys = batch.to_vec();
        keys.sort();

        let mut selections = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(entry) = pool.entry_mut(&key) else {
                continue;
            };
            let Some(listing) = entry.listing.as_ref() else {
                continue;
            };
            let Some(version) = entry.lowest_candidate().cloned() else {
                return Err(ResolveError::UnsatisfiableConstraint {
                    package: entry.name.clone(),
                    contributions: entry.contributions.clone(),
                });
            };

            let cap = match self.max_attempts {
                Some(limit) => limit.min(listing.versions.len()),
                None => listing.versions.len(),
            };
            if entry.attempts >= cap {
                return Err(ResolveError::ResolutionDivergence {
                    package: entry.name.clone(),
                    attempts: entry.attempts,
                });
            }
            entry.attempts += 1;

            let mut sources = vec![listing.source.clone()];
            sources.extend(
                entry
                    .sources
                    .iter()
                    .filter(|s| **s != listing.source)
                    .cloned(),
            );
            tracing::trace!("Selected {} {version} for '{}'", entry.name, entry.range);
            selections.push(Selection {
                key,
                name: entry.name.clone(),
                version,
                sources,
            });
        }
        Ok(selections)
    }

    /// Fetch metadata for every selection, returned in ascending key order.
    async fn fetch_metadata(
        &self,
        selections: Vec<Selection>,
        semaphore: &Arc<Semaphore>,
    ) -> Result<Vec<(Selection, PackageMetadata)>, ResolveError> {
        let mut join_set = JoinSet::new();
        for selection in selections {
            let oracle = self.oracle.clone();
            let sem = semaphore.clone();
            join_set.spawn(async move {
                let _permit = sem.acquire().await;
                let result = oracle
                    .get_dependencies(&selection.name, &selection.version, &selection.sources)
                    .await;
                (selection, result)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            results.push(joined.map_err(|e| ResolveError::TaskFailed(e.to_string()))?);
        }
        results.sort_by(|a, b| a.0.key.cmp(&b.0.key));

        results
            .into_iter()
            .map(|(selection, result)| result.map(|metadata| (selection, metadata)))
            .collect()
    }
}
