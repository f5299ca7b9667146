//! Shared utilities for nupak.
//!
//! This crate provides cross-cutting concerns used by all other nupak crates:
//! the unified error type, filesystem helpers, and terminal status output.

pub mod errors;
pub mod fs;
pub mod progress;
