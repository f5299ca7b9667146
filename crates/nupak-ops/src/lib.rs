//! High-level nupak operations, one module per command.

pub mod ops_check;
pub mod ops_lock;
pub mod ops_tree;
pub mod project;
pub mod registry;
