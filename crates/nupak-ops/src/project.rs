//! The project being operated on: its dependencies file, lock file location
//! and the global configuration that fills in defaults.

use std::path::{Path, PathBuf};

use nupak_core::config::GlobalConfig;
use nupak_core::dependencies::DependenciesFile;
use nupak_core::lockfile::LockFile;
use nupak_core::requirement::PackageRequirement;
use nupak_core::source::PackageSource;
use nupak_core::{DEPENDENCIES_FILE, LOCK_FILE};
use nupak_util::errors::NupakError;

pub struct Project {
    pub root: PathBuf,
    pub dependencies: DependenciesFile,
    pub config: GlobalConfig,
}

impl Project {
    /// Find the nearest directory at or above `start` holding a dependencies
    /// file and load it with the user's global configuration.
    pub fn discover(start: &Path) -> miette::Result<Self> {
        let root = nupak_util::fs::find_ancestor_with(start, DEPENDENCIES_FILE).ok_or_else(|| {
            NupakError::Dependencies {
                message: format!(
                    "No {DEPENDENCIES_FILE} found in {} or any parent directory",
                    start.display()
                ),
            }
        })?;
        Self::load(&root, GlobalConfig::load()?)
    }

    pub fn load(root: &Path, config: GlobalConfig) -> miette::Result<Self> {
        let dependencies = DependenciesFile::from_path(&root.join(DEPENDENCIES_FILE))?
            .with_default_sources(&config.default_sources());
        tracing::debug!(
            root = %root.display(),
            requirements = dependencies.requirements.len(),
            "loaded project"
        );
        Ok(Self {
            root: root.to_path_buf(),
            dependencies,
            config,
        })
    }

    pub fn requirements(&self) -> &[PackageRequirement] {
        &self.dependencies.requirements
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Whether the lock file should carry `REFERENCES: STRICT`.
    pub fn strict(&self) -> bool {
        self.dependencies.strict || self.config.lock.strict_default
    }

    /// Every source any requirement searches, in first-use order.
    pub fn sources(&self) -> Vec<PackageSource> {
        let mut sources: Vec<PackageSource> = Vec::new();
        for source in self.requirements().iter().flat_map(|r| r.sources.iter()) {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }
        sources
    }

    /// The existing lock file, if there is one. A lock file that exists but
    /// does not parse is an error.
    pub fn read_lock(&self) -> miette::Result<Option<LockFile>> {
        let path = self.lock_path();
        if !path.is_file() {
            return Ok(None);
        }
        LockFile::from_path(&path).map(Some)
    }

    /// A lock file for `resolution` with this project's settings and GitHub files.
    pub fn lock_file(&self, resolution: nupak_core::resolution::PackageResolution) -> LockFile {
        LockFile::new(
            self.strict(),
            resolution,
            self.dependencies.remote_files.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_walks_up_and_applies_default_sources() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(DEPENDENCIES_FILE),
            "nuget Foo >= 1.0\nsource ./feed\nnuget Bar\n",
        )
        .unwrap();
        let nested = tmp.path().join("src").join("app");
        std::fs::create_dir_all(&nested).unwrap();

        let root = nupak_util::fs::find_ancestor_with(&nested, DEPENDENCIES_FILE).unwrap();
        let project = Project::load(&root, GlobalConfig::default()).unwrap();
        assert_eq!(project.root, tmp.path());
        assert_eq!(project.requirements().len(), 2);
        assert_eq!(
            project.requirements()[0].sources,
            vec![PackageSource::nuget_org()]
        );
        assert_eq!(
            project.sources(),
            vec![PackageSource::nuget_org(), PackageSource::parse("./feed")]
        );
        assert!(project.read_lock().unwrap().is_none());
    }

    #[test]
    fn strict_comes_from_file_or_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(DEPENDENCIES_FILE), "nuget Foo\n").unwrap();
        let project = Project::load(tmp.path(), GlobalConfig::default()).unwrap();
        assert!(!project.strict());

        let mut config = GlobalConfig::default();
        config.lock.strict_default = true;
        let project = Project::load(tmp.path(), config).unwrap();
        assert!(project.strict());
    }

    #[test]
    fn corrupt_lock_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(DEPENDENCIES_FILE), "nuget Foo\n").unwrap();
        std::fs::write(tmp.path().join(LOCK_FILE), "NUGET\n    Foo (1.0)\n").unwrap();
        let project = Project::load(tmp.path(), GlobalConfig::default()).unwrap();
        assert!(project.read_lock().is_err());
    }
}
