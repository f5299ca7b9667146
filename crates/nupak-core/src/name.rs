//! Case-insensitive package identity.
//!
//! Registries and users spell the same package differently
//! (`Castle.Windsor`, `castle.windsor`). A [`PackageName`] keeps the spelling
//! it was created with for output and carries a [`PackageKey`] computed once
//! at construction; all comparison, hashing and map lookups go through the key.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Normalized (lowercased) package name used for identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageKey(String);

impl PackageKey {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A package name with its display casing and normalized key.
#[derive(Debug, Clone)]
pub struct PackageName {
    display: String,
    key: PackageKey,
}

impl PackageName {
    pub fn new(name: impl Into<String>) -> Self {
        let display = name.into().trim().to_string();
        let key = PackageKey::new(&display);
        Self { display, key }
    }

    /// The spelling used in output.
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn key(&self) -> &PackageKey {
        &self.key
    }

    /// Whether both names spell the identity identically, not just equivalently.
    pub fn same_spelling(&self, other: &PackageName) -> bool {
        self.display == other.display
    }
}

impl PartialEq for PackageName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PackageName {}

impl Hash for PackageName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl Ord for PackageName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for PackageName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl From<&str> for PackageName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PackageName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn casing_variants_are_one_identity() {
        let a = PackageName::new("Castle.Windsor");
        let b = PackageName::new("castle.windsor");
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
        assert!(!a.same_spelling(&b));

        let set: HashSet<PackageName> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn display_keeps_spelling() {
        let name = PackageName::new("Nancy.Bootstrappers.Windsor");
        assert_eq!(name.to_string(), "Nancy.Bootstrappers.Windsor");
        assert_eq!(name.key().as_str(), "nancy.bootstrappers.windsor");
    }

    #[test]
    fn ordering_ignores_case() {
        let mut names = vec![
            PackageName::new("nunit"),
            PackageName::new("Castle.Core"),
            PackageName::new("FAKE"),
        ];
        names.sort();
        let shown: Vec<_> = names.iter().map(|n| n.display()).collect();
        assert_eq!(shown, ["Castle.Core", "FAKE", "nunit"]);
    }
}
