//! Version constraints placed on a package, with the sources to search.

use std::fmt;

use crate::name::PackageName;
use crate::range::VersionRange;
use crate::source::PackageSource;

/// A single version constraint on a package, with the sources to search.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageRequirement {
    pub name: PackageName,
    pub range: VersionRange,
    /// Sources in priority order.
    pub sources: Vec<PackageSource>,
    /// When set, this requirement replaces constraints that dependencies
    /// place on the same package instead of being intersected with them.
    pub overrides: bool,
}

impl PackageRequirement {
    pub fn new(
        name: impl Into<PackageName>,
        range: VersionRange,
        sources: Vec<PackageSource>,
    ) -> Self {
        Self {
            name: name.into(),
            range,
            sources,
            overrides: false,
        }
    }

    /// Mark this requirement as an override.
    pub fn overriding(mut self) -> Self {
        self.overrides = true;
        self
    }
}

impl fmt::Display for PackageRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bang = if self.overrides { "!" } else { "" };
        match self.range {
            VersionRange::NoRestriction => write!(f, "{}", self.name),
            _ => write!(f, "{} {bang}{}", self.name, self.range),
        }
    }
}
