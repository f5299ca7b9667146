//! Operation: resolve the project's requirements and write nupak.lock.

use std::sync::Arc;

use nupak_core::LOCK_FILE;
use nupak_resolver::locked;
use nupak_resolver::oracle::SourceFallback;
use nupak_resolver::resolver::Resolver;
use nupak_util::progress;

use crate::project::Project;
use crate::registry::{self, IndexSpec};

/// Options for `nupak lock`.
#[derive(Debug, Default)]
pub struct LockOptions {
    pub indexes: Vec<IndexSpec>,
    /// Resolve from scratch even if the existing lock is still valid.
    pub force: bool,
}

/// What `lock` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// The existing lock file already matched.
    Fresh,
    /// The existing lock file was still valid and was rewritten with its
    /// unreachable packages or changed settings dropped.
    Pruned,
    /// A full resolution ran.
    Resolved,
}

pub async fn lock(project: &Project, opts: &LockOptions) -> miette::Result<LockOutcome> {
    let requirements = project.requirements();
    let lock_path = project.lock_path();

    if !opts.force {
        if let Some(existing) = project.read_lock()? {
            if let Some(resolution) = locked::reuse(&existing, requirements) {
                let lock = project.lock_file(resolution);
                if lock == existing {
                    progress::status_info("Fresh", &format!("{LOCK_FILE} is up to date"));
                    return Ok(LockOutcome::Fresh);
                }
                lock.write_to(&lock_path)?;
                progress::status(
                    "Updated",
                    &format!("{LOCK_FILE} ({} packages)", lock.resolution.len()),
                );
                return Ok(LockOutcome::Pruned);
            }
        }
    }

    let index = registry::build_index(project, &opts.indexes)?;
    let resolver = Resolver::new(Arc::new(SourceFallback::new(index)))
        .with_max_concurrent_fetches(project.config.resolver.max_concurrent_fetches);

    let pb = progress::spinner("Resolving", &format!("{} requirements", requirements.len()));
    let result = resolver.resolve(requirements).await;
    pb.finish_and_clear();
    let resolution = result?;

    let lock = project.lock_file(resolution);
    lock.write_to(&lock_path)?;
    progress::status(
        "Locked",
        &format!("{} packages to {LOCK_FILE}", lock.resolution.len()),
    );
    Ok(LockOutcome::Resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nupak_core::config::GlobalConfig;
    use nupak_core::DEPENDENCIES_FILE;

    const FEED: &str = r#"
[[package]]
name = "Nancy.Bootstrappers.Windsor"
version = "0.23"
dependencies = [["castle.windsor", ">= 3.2.1"]]

[[package]]
name = "Castle.Windsor"
version = "3.2.1"

[[package]]
name = "Castle.Windsor"
version = "3.3.0"
"#;

    fn project(dependencies: &str) -> (tempfile::TempDir, Project) {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(DEPENDENCIES_FILE), dependencies).unwrap();
        std::fs::create_dir_all(tmp.path().join("feed")).unwrap();
        std::fs::write(tmp.path().join("feed").join("index.toml"), FEED).unwrap();
        let project = Project::load(tmp.path(), GlobalConfig::default()).unwrap();
        (tmp, project)
    }

    #[tokio::test]
    async fn resolves_then_reuses() {
        let (_tmp, project) = project(
            "source ./feed\nnuget Nancy.bootstrappers.windsor ~> 0.23\ngithub fsharp/FAKE src/app/FAKE/Cli.fs\n",
        );
        let opts = LockOptions::default();

        assert_eq!(lock(&project, &opts).await.unwrap(), LockOutcome::Resolved);
        let text = std::fs::read_to_string(project.lock_path()).unwrap();
        assert_eq!(
            text,
            "NUGET\n  remote: ./feed\n  specs:\n    Castle.Windsor (3.2.1)\n    \
             Nancy.Bootstrappers.Windsor (0.23)\n      castle.windsor (>= 3.2.1)\n\
             GITHUB\n  remote: fsharp/FAKE\n  specs:\n    src/app/FAKE/Cli.fs\n"
        );

        assert_eq!(lock(&project, &opts).await.unwrap(), LockOutcome::Fresh);

        let forced = LockOptions {
            force: true,
            ..LockOptions::default()
        };
        assert_eq!(lock(&project, &forced).await.unwrap(), LockOutcome::Resolved);
    }

    #[tokio::test]
    async fn dropped_requirement_prunes_the_lock() {
        let (tmp, project) = project(
            "source ./feed\nnuget Nancy.Bootstrappers.Windsor\nnuget Castle.Windsor\n",
        );
        assert_eq!(
            lock(&project, &LockOptions::default()).await.unwrap(),
            LockOutcome::Resolved
        );

        std::fs::write(tmp.path().join(DEPENDENCIES_FILE), "source ./feed\nnuget Castle.Windsor\n")
            .unwrap();
        let project = Project::load(tmp.path(), GlobalConfig::default()).unwrap();
        assert_eq!(
            lock(&project, &LockOptions::default()).await.unwrap(),
            LockOutcome::Pruned
        );
        let written = project.read_lock().unwrap().unwrap();
        assert_eq!(written.resolution.len(), 1);
        assert!(written.resolution.find("nancy.bootstrappers.windsor").is_none());
    }

    #[tokio::test]
    async fn unknown_package_fails_without_writing() {
        let (_tmp, project) = project("source ./feed\nnuget Missing\n");
        let err = lock(&project, &LockOptions::default()).await.unwrap_err();
        assert!(err.to_string().contains("Missing"), "{err}");
        assert!(!project.lock_path().exists());
    }
}
