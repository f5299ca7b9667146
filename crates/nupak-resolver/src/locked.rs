//! Reusing an existing lock file instead of resolving again.

use std::collections::{BTreeSet, VecDeque};

use miette::Diagnostic;
use thiserror::Error;

use nupak_core::lockfile::LockFile;
use nupak_core::name::{PackageKey, PackageName};
use nupak_core::range::VersionRange;
use nupak_core::requirement::PackageRequirement;
use nupak_core::resolution::PackageResolution;
use nupak_core::version::SemVer;

/// Why a lock file no longer matches the requirements.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq)]
pub enum StaleLock {
    #[error("'{0}' is required but not locked")]
    #[diagnostic(code(nupak::lock::missing))]
    Missing(PackageName),

    #[error("locked {package} {version} does not satisfy '{range}'")]
    #[diagnostic(code(nupak::lock::out_of_range))]
    OutOfRange {
        package: PackageName,
        version: SemVer,
        range: VersionRange,
    },

    #[error("locked {package} comes from {location}, which is not a declared source")]
    #[diagnostic(code(nupak::lock::source))]
    UndeclaredSource { package: PackageName, location: String },

    #[error("{parent} depends on '{dependency}', which is not locked")]
    #[diagnostic(code(nupak::lock::dangling))]
    DanglingDependency {
        parent: PackageName,
        dependency: PackageName,
    },
}

/// Verify `lock` against the direct requirements.
///
/// Every requirement must be locked at a version inside its range and from
/// one of its sources, and every dependency edge reachable from them must
/// point at a locked version inside the edge's range. Edges onto an
/// overridden package are checked against the override instead. The returned
/// resolution holds only the reachable packages.
pub fn check(
    lock: &LockFile,
    requirements: &[PackageRequirement],
) -> Result<PackageResolution, StaleLock> {
    let locked = &lock.resolution;
    let overridden: BTreeSet<&PackageKey> = requirements
        .iter()
        .filter(|r| r.overrides)
        .map(|r| r.name.key())
        .collect();

    let mut queue = VecDeque::new();
    for requirement in requirements {
        let package = locked
            .get(requirement.name.key())
            .ok_or_else(|| StaleLock::Missing(requirement.name.clone()))?;
        if !requirement.range.contains(&package.version) {
            return Err(StaleLock::OutOfRange {
                package: package.name.clone(),
                version: package.version.clone(),
                range: requirement.range.clone(),
            });
        }
        if !requirement.sources.is_empty() && !requirement.sources.contains(&package.source) {
            return Err(StaleLock::UndeclaredSource {
                package: package.name.clone(),
                location: package.source.to_string(),
            });
        }
        queue.push_back(requirement.name.key().clone());
    }

    let mut reachable = PackageResolution::new();
    let mut seen = BTreeSet::new();
    while let Some(key) = queue.pop_front() {
        if !seen.insert(key.clone()) {
            continue;
        }
        let Some(package) = locked.get(&key) else {
            continue;
        };
        for (dependency, range) in &package.dependencies {
            let target = locked
                .get(dependency.key())
                .ok_or_else(|| StaleLock::DanglingDependency {
                    parent: package.name.clone(),
                    dependency: dependency.clone(),
                })?;
            if !overridden.contains(dependency.key()) && !range.contains(&target.version) {
                return Err(StaleLock::OutOfRange {
                    package: target.name.clone(),
                    version: target.version.clone(),
                    range: range.clone(),
                });
            }
            queue.push_back(dependency.key().clone());
        }
        reachable.insert(package.clone());
    }

    let dropped = locked.len() - reachable.len();
    if dropped > 0 {
        tracing::debug!("{dropped} locked packages are no longer required");
    }
    Ok(reachable)
}

/// The lock's resolution if it still satisfies `requirements`.
pub fn reuse(lock: &LockFile, requirements: &[PackageRequirement]) -> Option<PackageResolution> {
    match check(lock, requirements) {
        Ok(resolution) => {
            tracing::info!("Reusing {} locked packages", resolution.len());
            Some(resolution)
        }
        Err(reason) => {
            tracing::info!("Lock file is out of date: {reason}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nupak_core::resolution::ResolvedPackage;
    use nupak_core::source::PackageSource;

    fn range(text: &str) -> VersionRange {
        VersionRange::parse(text).unwrap()
    }

    fn package(name: &str, version: &str, deps: &[(&str, &str)]) -> ResolvedPackage {
        ResolvedPackage {
            name: PackageName::new(name),
            version: SemVer::parse(version).unwrap(),
            source: PackageSource::nuget_org(),
            dependencies: deps
                .iter()
                .map(|(n, r)| (PackageName::new(*n), range(r)))
                .collect(),
        }
    }

    fn lock(packages: Vec<ResolvedPackage>) -> LockFile {
        LockFile::new(false, packages.into_iter().collect(), vec![])
    }

    fn require(name: &str, text: &str) -> PackageRequirement {
        PackageRequirement::new(name, range(text), vec![PackageSource::nuget_org()])
    }

    fn windsor_lock() -> LockFile {
        lock(vec![
            package(
                "Nancy.Bootstrappers.Windsor",
                "0.23",
                &[("Castle.Windsor", ">= 3.2.1")],
            ),
            package("Castle.Windsor", "3.2.1", &[]),
            package("Unused", "1.0", &[]),
        ])
    }

    #[test]
    fn valid_lock_is_reused_without_unreachable_entries() {
        let reused = reuse(
            &windsor_lock(),
            &[require("nancy.bootstrappers.windsor", "~> 0.23")],
        )
        .unwrap();
        assert_eq!(reused.len(), 2);
        assert!(reused.find("castle.windsor").is_some());
        assert!(reused.find("unused").is_none());
    }

    #[test]
    fn missing_and_out_of_range_requirements_are_stale() {
        let lock = windsor_lock();
        assert_eq!(
            check(&lock, &[require("Serilog", "")]).unwrap_err(),
            StaleLock::Missing(PackageName::new("Serilog"))
        );
        let err = check(&lock, &[require("Castle.Windsor", ">= 3.3")]).unwrap_err();
        assert!(matches!(err, StaleLock::OutOfRange { .. }));
        assert!(reuse(&lock, &[require("Castle.Windsor", ">= 3.3")]).is_none());
    }

    #[test]
    fn undeclared_source_is_stale() {
        let requirement = PackageRequirement::new(
            "Castle.Windsor",
            VersionRange::NoRestriction,
            vec![PackageSource::parse("./elsewhere")],
        );
        let err = check(&windsor_lock(), &[requirement]).unwrap_err();
        assert!(matches!(err, StaleLock::UndeclaredSource { .. }));
    }

    #[test]
    fn broken_edges_are_stale() {
        let dangling = lock(vec![package("A", "1.0", &[("B", ">= 1.0")])]);
        let err = check(&dangling, &[require("A", "")]).unwrap_err();
        assert!(matches!(err, StaleLock::DanglingDependency { .. }));

        let outdated = lock(vec![
            package("A", "1.0", &[("B", ">= 2.0")]),
            package("B", "1.0", &[]),
        ]);
        let err = check(&outdated, &[require("A", "")]).unwrap_err();
        assert_eq!(err.to_string(), "locked B 1.0 does not satisfy '>= 2.0'");
    }

    #[test]
    fn overrides_skip_edge_ranges() {
        let locked = lock(vec![
            package("A", "1.0", &[("B", ">= 2.0")]),
            package("B", "1.0", &[]),
        ]);
        let requirements = [require("A", ""), require("B", "1.0").overriding()];
        assert_eq!(check(&locked, &requirements).unwrap().len(), 2);
    }
}
