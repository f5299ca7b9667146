//! Operation: verify nupak.lock against nupak.dependencies without resolving.

use nupak_core::lockfile::LockFile;
use nupak_core::resolution::PackageResolution;
use nupak_core::{DEPENDENCIES_FILE, LOCK_FILE};
use nupak_resolver::locked;
use nupak_util::errors::NupakError;
use nupak_util::progress;

use crate::project::Project;

/// Check that the lock file exists, parses, and still satisfies every
/// requirement and GitHub file. Returns the number of packages checked.
pub fn check(project: &Project) -> miette::Result<usize> {
    let lock = project.read_lock()?.ok_or_else(|| NupakError::LockFile {
        message: format!("No {LOCK_FILE} found next to {DEPENDENCIES_FILE}"),
    })?;

    let resolution = locked::check(&lock, project.requirements()).map_err(|e| {
        NupakError::LockFile {
            message: format!("{LOCK_FILE} is out of date: {e}"),
        }
    })?;

    let expected = LockFile::new(
        lock.strict,
        PackageResolution::new(),
        project.dependencies.remote_files.clone(),
    );
    if expected.source_files() != lock.source_files() {
        return Err(NupakError::LockFile {
            message: format!("{LOCK_FILE} is out of date: GitHub files differ from {DEPENDENCIES_FILE}"),
        }
        .into());
    }

    let unused = lock.resolution.len() - resolution.len();
    if unused > 0 {
        progress::status_warn("Unused", &format!("{unused} locked packages are no longer required"));
    }
    progress::status(
        "Checked",
        &format!("{} packages satisfy {DEPENDENCIES_FILE}", resolution.len()),
    );
    Ok(resolution.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nupak_core::config::GlobalConfig;

    const LOCK: &str = "\
NUGET
  remote: https://nuget.org/api/v2
  specs:
    Castle.Windsor (3.2.1)
    Nancy.Bootstrappers.Windsor (0.23)
      Castle.Windsor (>= 3.2.1)
GITHUB
  remote: fsharp/FAKE
  specs:
    src/app/FAKE/Cli.fs (0bd81e3)
";

    fn project(dependencies: &str, lock: Option<&str>) -> (tempfile::TempDir, Project) {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(DEPENDENCIES_FILE), dependencies).unwrap();
        if let Some(lock) = lock {
            std::fs::write(tmp.path().join(LOCK_FILE), lock).unwrap();
        }
        let project = Project::load(tmp.path(), GlobalConfig::default()).unwrap();
        (tmp, project)
    }

    #[test]
    fn satisfied_lock_passes() {
        let (_tmp, project) = project(
            "nuget nancy.bootstrappers.windsor ~> 0.23\ngithub fsharp/FAKE:0bd81e3 src/app/FAKE/Cli.fs\n",
            Some(LOCK),
        );
        assert_eq!(check(&project).unwrap(), 2);
    }

    #[test]
    fn missing_lock_fails() {
        let (_tmp, project) = project("nuget Foo\n", None);
        let err = check(&project).unwrap_err();
        assert!(err.to_string().contains("No nupak.lock"), "{err}");
    }

    #[test]
    fn out_of_range_requirement_fails() {
        let (_tmp, project) = project(
            "nuget Castle.Windsor >= 3.3\ngithub fsharp/FAKE:0bd81e3 src/app/FAKE/Cli.fs\n",
            Some(LOCK),
        );
        let err = check(&project).unwrap_err();
        assert!(err.to_string().contains("out of date"), "{err}");
    }

    #[test]
    fn changed_github_pin_fails() {
        let (_tmp, project) = project(
            "nuget Castle.Windsor\ngithub fsharp/FAKE:1234567 src/app/FAKE/Cli.fs\n",
            Some(LOCK),
        );
        let err = check(&project).unwrap_err();
        assert!(err.to_string().contains("GitHub files"), "{err}");
    }
}
