//! Package sources: remote registries and local feed directories.

use std::fmt;

/// The public NuGet v2 registry.
pub const NUGET_ORG_URL: &str = "https://nuget.org/api/v2";

/// Where package versions and metadata come from.
///
/// Build values with [`PackageSource::parse`], [`PackageSource::nuget`] or
/// [`PackageSource::local`] so that equal locations compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PackageSource {
    /// A remote registry endpoint.
    Nuget(String),
    /// A directory of packages on the local filesystem.
    LocalFeed(String),
}

impl PackageSource {
    /// Classify a `remote:` / `source` value: `http(s)://` is a registry,
    /// anything else a local path. Trailing slashes on URLs are dropped.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.starts_with("http://") || text.starts_with("https://") {
            Self::nuget(text)
        } else {
            Self::local(text)
        }
    }

    /// A registry at `url`, without trailing slashes.
    pub fn nuget(url: &str) -> Self {
        PackageSource::Nuget(url.trim().trim_end_matches('/').to_string())
    }

    pub fn local(path: &str) -> Self {
        PackageSource::LocalFeed(path.trim().to_string())
    }

    pub fn nuget_org() -> Self {
        Self::nuget(NUGET_ORG_URL)
    }

    /// The URL or path as written in files.
    pub fn location(&self) -> &str {
        match self {
            PackageSource::Nuget(url) => url,
            PackageSource::LocalFeed(path) => path,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, PackageSource::Nuget(_))
    }
}

impl fmt::Display for PackageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.location())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_urls_survive_a_text_round_trip() {
        let src = PackageSource::nuget("https://nuget.example.com/api/v2//");
        assert_eq!(src.location(), "https://nuget.example.com/api/v2");
        assert_eq!(PackageSource::parse(&src.to_string()), src);
    }

    #[test]
    fn urls_are_registries() {
        let src = PackageSource::parse("https://nuget.org/api/v2/");
        assert_eq!(src, PackageSource::nuget_org());
        assert!(src.is_remote());
        assert_eq!(src.to_string(), "https://nuget.org/api/v2");
    }

    #[test]
    fn paths_are_local_feeds() {
        let src = PackageSource::parse("./packages");
        assert_eq!(src, PackageSource::LocalFeed("./packages".to_string()));
        assert!(!src.is_remote());
    }
}
