//! Bookkeeping for where a package's range constraints came from, so an
//! unsatisfiable pool can be reported with every contributing range.

use std::fmt;

use nupak_core::name::PackageName;
use nupak_core::range::VersionRange;
use nupak_core::version::SemVer;

/// Who asked for a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintOrigin {
    /// Declared in the dependencies file.
    Direct,
    /// Declared by a resolved package.
    Dependency { parent: PackageName, version: SemVer },
}

impl fmt::Display for ConstraintOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintOrigin::Direct => write!(f, "direct"),
            ConstraintOrigin::Dependency { parent, version } => {
                write!(f, "from {parent} {version}")
            }
        }
    }
}

/// One range placed on a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub origin: ConstraintOrigin,
    pub range: VersionRange,
    pub overrides: bool,
}

impl fmt::Display for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = match &self.range {
            VersionRange::NoRestriction => "any version".to_string(),
            other => format!("'{other}'"),
        };
        let marker = if self.overrides { ", override" } else { "" };
        write!(f, "{range} ({}{marker})", self.origin)
    }
}

/// Every range contributed for one package, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionList(pub Vec<Contribution>);

impl ContributionList {
    pub fn push(&mut self, contribution: Contribution) {
        self.0.push(contribution);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contribution> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The ranges that bound the package: the override contributions when
    /// any exist, otherwise all of them.
    pub fn binding(&self) -> impl Iterator<Item = &Contribution> {
        let any_override = self.0.iter().any(|c| c.overrides);
        self.0.iter().filter(move |c| !any_override || c.overrides)
    }

    /// Intersection of the binding ranges, `None` when they are disjoint.
    pub fn effective_range(&self) -> Option<VersionRange> {
        self.binding()
            .try_fold(VersionRange::NoRestriction, |acc, c| acc.intersect(&c.range))
    }
}

impl fmt::Display for ContributionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, contribution) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{contribution}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(text: &str) -> VersionRange {
        VersionRange::parse(text).unwrap()
    }

    fn direct(text: &str) -> Contribution {
        Contribution {
            origin: ConstraintOrigin::Direct,
            range: range(text),
            overrides: false,
        }
    }

    #[test]
    fn empty_list_is_unrestricted() {
        let list = ContributionList::default();
        assert!(list.is_empty());
        assert_eq!(list.effective_range(), Some(VersionRange::NoRestriction));
    }

    #[test]
    fn effective_range_intersects_everything() {
        let mut list = ContributionList::default();
        list.push(direct(">= 1.0"));
        list.push(Contribution {
            origin: ConstraintOrigin::Dependency {
                parent: PackageName::new("Parent"),
                version: SemVer::parse("2.0").unwrap(),
            },
            range: range("< 3.0"),
            overrides: false,
        });
        assert_eq!(list.effective_range(), Some(range(">= 1.0, < 3.0")));
        let text = list.to_string();
        assert!(text.contains("'>= 1.0' (direct)"), "{text}");
        assert!(text.contains("'< 3.0' (from Parent 2.0)"), "{text}");
    }

    #[test]
    fn disjoint_ranges_have_no_effective_range() {
        let mut list = ContributionList::default();
        list.push(direct(">= 2.0"));
        list.push(direct("<= 1.0"));
        assert_eq!(list.effective_range(), None);
    }

    #[test]
    fn overrides_shadow_other_contributions() {
        let mut list = ContributionList::default();
        list.push(Contribution {
            overrides: true,
            ..direct(">= 1.2.10")
        });
        list.push(direct("< 1.0"));
        assert_eq!(list.binding().count(), 1);
        assert_eq!(list.effective_range(), Some(range(">= 1.2.10")));
        assert!(list.to_string().contains("override"));
    }
}
