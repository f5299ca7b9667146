//! Dependency resolution engine: lowest-satisfying version selection over a
//! monotonically tightening requirement pool, registry lookups with ordered
//! source fallback, lock file reuse, and dependency graph queries.

pub mod conflict;
pub mod error;
pub mod graph;
pub mod index;
pub mod locked;
pub mod oracle;
pub mod pool;
pub mod resolver;
