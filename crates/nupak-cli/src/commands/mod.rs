//! Command dispatch and handler modules.

mod check;
mod lock;
mod tree;

use std::path::PathBuf;

use miette::Result;

use nupak_ops::project::Project;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Lock { indexes, force } => lock::exec(indexes, force).await,
        Command::Check => check::exec(),
        Command::Tree { depth, why, invert } => tree::exec(depth, why, invert),
    }
}

fn current_project() -> Result<Project> {
    let cwd: PathBuf = std::env::current_dir().map_err(nupak_util::errors::NupakError::Io)?;
    Project::discover(&cwd)
}
