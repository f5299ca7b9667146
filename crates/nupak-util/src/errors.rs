use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for nupak operations.
#[derive(Debug, Error, Diagnostic)]
pub enum NupakError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable configuration (e.g. `~/.nupak/config.toml`).
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check ~/.nupak/config.toml for syntax errors"))]
    Config { message: String },

    /// Invalid requirement file (`nupak.dependencies`).
    #[error("Dependencies file error: {message}")]
    #[diagnostic(help("Check nupak.dependencies for syntax errors"))]
    Dependencies { message: String },

    /// The lock file could not be read, parsed, or written.
    #[error("Lock file error: {message}")]
    #[diagnostic(help("Run `nupak lock --force` to regenerate nupak.lock"))]
    LockFile { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}
