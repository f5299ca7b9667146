//! Building the package feed for a project.
//!
//! Index files are given per source with `--index SOURCE=FILE`. A local feed
//! directory without an explicit index is read from its own `index.toml`.

use std::path::PathBuf;
use std::str::FromStr;

use nupak_core::source::PackageSource;
use nupak_resolver::index::StaticIndex;

use crate::project::Project;

/// Index file name inside a local feed directory.
pub const FEED_INDEX_FILE: &str = "index.toml";

/// `SOURCE=FILE`: serve `SOURCE` from the TOML index at `FILE`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub source: PackageSource,
    pub path: PathBuf,
}

impl FromStr for IndexSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, path) = s
            .rsplit_once('=')
            .filter(|(source, path)| !source.trim().is_empty() && !path.trim().is_empty())
            .ok_or_else(|| format!("expected SOURCE=FILE, got '{s}'"))?;
        Ok(Self {
            source: PackageSource::parse(source),
            path: PathBuf::from(path.trim()),
        })
    }
}

/// Load every explicit index, then the `index.toml` of any local feed the
/// project uses that was not given one.
pub fn build_index(project: &Project, specs: &[IndexSpec]) -> miette::Result<StaticIndex> {
    let mut index = StaticIndex::new();
    for spec in specs {
        index.load_file(&spec.source, &spec.path)?;
    }

    for source in project.sources() {
        if source.is_remote() || specs.iter().any(|s| s.source == source) {
            continue;
        }
        let path = project.root.join(source.location()).join(FEED_INDEX_FILE);
        if path.is_file() {
            index.load_file(&source, &path)?;
        } else {
            tracing::debug!("No {FEED_INDEX_FILE} in local feed {source}");
        }
    }

    tracing::debug!("Feed holds {} package versions", index.package_count());
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nupak_core::config::GlobalConfig;
    use nupak_core::DEPENDENCIES_FILE;

    #[test]
    fn parse_index_spec() {
        let spec: IndexSpec = "https://nuget.org/api/v2/=registry.toml".parse().unwrap();
        assert_eq!(spec.source, PackageSource::nuget_org());
        assert_eq!(spec.path, PathBuf::from("registry.toml"));

        let spec: IndexSpec = "./feed=feed.toml".parse().unwrap();
        assert_eq!(spec.source, PackageSource::local("./feed"));

        assert!("registry.toml".parse::<IndexSpec>().is_err());
        assert!("=registry.toml".parse::<IndexSpec>().is_err());
    }

    #[test]
    fn local_feeds_load_their_own_index() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(DEPENDENCIES_FILE),
            "source ./feed\nsource ./empty\nnuget Foo\n",
        )
        .unwrap();
        std::fs::create_dir_all(tmp.path().join("feed")).unwrap();
        std::fs::write(
            tmp.path().join("feed").join(FEED_INDEX_FILE),
            "[[package]]\nname = \"Foo\"\nversion = \"1.0\"\n",
        )
        .unwrap();

        let project = Project::load(tmp.path(), GlobalConfig::default()).unwrap();
        let index = build_index(&project, &[]).unwrap();
        assert_eq!(index.package_count(), 1);
    }

    #[test]
    fn missing_explicit_index_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(DEPENDENCIES_FILE), "nuget Foo\n").unwrap();
        let project = Project::load(tmp.path(), GlobalConfig::default()).unwrap();
        let spec = IndexSpec {
            source: PackageSource::nuget_org(),
            path: tmp.path().join("nope.toml"),
        };
        assert!(build_index(&project, &[spec]).is_err());
    }
}
