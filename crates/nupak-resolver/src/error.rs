use miette::Diagnostic;
use thiserror::Error;

use nupak_core::name::PackageName;
use nupak_core::source::PackageSource;

use crate::conflict::ContributionList;

/// Ways resolution can fail. Any of these aborts the whole run.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("no version of '{package}' satisfies {contributions}")]
    #[diagnostic(
        code(nupak::resolve::unsatisfiable),
        help("Relax one of the listed constraints or pin the package with an override (`!`)")
    )]
    UnsatisfiableConstraint {
        package: PackageName,
        contributions: ContributionList,
    },

    #[error("package '{package}' was not found on any source (tried: {})", join_sources(.tried))]
    #[diagnostic(
        code(nupak::resolve::unknown_package),
        help("Check the package name and the `source` lines in nupak.dependencies")
    )]
    UnknownPackage {
        package: PackageName,
        tried: Vec<PackageSource>,
    },

    #[error("resolution of '{package}' did not settle after {attempts} attempts")]
    #[diagnostic(code(nupak::resolve::divergence))]
    ResolutionDivergence { package: PackageName, attempts: usize },

    #[error("registry lookup task failed: {0}")]
    #[diagnostic(code(nupak::resolve::task))]
    TaskFailed(String),
}

fn join_sources(sources: &[PackageSource]) -> String {
    if sources.is_empty() {
        return "no sources configured".to_string();
    }
    sources
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
