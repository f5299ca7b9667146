//! CLI argument definitions for nupak.

use clap::{Parser, Subcommand};

use nupak_ops::registry::IndexSpec;

#[derive(Parser, Debug)]
#[command(
    name = "nupak",
    version,
    about = "Resolve NuGet-style package dependencies into a lock file",
    long_about = "nupak reads nupak.dependencies, picks the lowest version of every package \
                  that satisfies all constraints, and records the result in nupak.lock."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve dependencies and write nupak.lock
    Lock {
        /// Serve a source from a TOML index file (SOURCE=FILE); repeatable
        #[arg(long = "index", value_name = "SOURCE=FILE")]
        indexes: Vec<IndexSpec>,
        /// Resolve again even if nupak.lock is still valid
        #[arg(long)]
        force: bool,
    },

    /// Verify nupak.lock satisfies nupak.dependencies
    Check,

    /// Display the locked dependency tree
    Tree {
        /// Maximum depth
        #[arg(long)]
        depth: Option<usize>,
        /// Explain why a package is included
        #[arg(long)]
        why: Option<String>,
        /// Show what depends on a package
        #[arg(long, value_name = "PACKAGE")]
        invert: Option<String>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
