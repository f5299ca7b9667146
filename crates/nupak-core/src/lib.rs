//! Core data types for nupak.
//!
//! This crate defines the fundamental types that every other nupak crate
//! shares: semantic versions and the version range algebra, case-insensitive
//! package identity, package sources, requirements, resolutions, the lock
//! file codec, the `nupak.dependencies` grammar, and global configuration.
//!
//! This crate is intentionally free of async code and network I/O.

/// Name of the requirement file read from the project root.
pub const DEPENDENCIES_FILE: &str = "nupak.dependencies";

/// Name of the lock file written next to the requirement file.
pub const LOCK_FILE: &str = "nupak.lock";

pub mod config;
pub mod dependencies;
pub mod lockfile;
pub mod name;
pub mod range;
pub mod requirement;
pub mod resolution;
pub mod source;
pub mod version;
