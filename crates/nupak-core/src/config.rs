use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::source::PackageSource;

/// Global user configuration loaded from `~/.nupak/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Named sources used when a dependencies file declares none.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,

    #[serde(default)]
    pub lock: LockConfig,
}

/// Resolution settings from `[resolver]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Upper bound on registry lookups in flight at once.
    #[serde(
        default = "default_max_concurrent_fetches",
        rename = "max-concurrent-fetches"
    )]
    pub max_concurrent_fetches: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

fn default_max_concurrent_fetches() -> usize {
    8
}

/// Lock file settings from `[lock]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockConfig {
    /// Write `REFERENCES: STRICT` even when the dependencies file does not ask for it.
    #[serde(default, rename = "strict-default")]
    pub strict_default: bool,
}

impl GlobalConfig {
    /// Load the global configuration from `~/.nupak/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            nupak_util::errors::NupakError::Config {
                message: format!("Failed to read global config: {e}"),
            }
        })?;
        toml::from_str(&content).map_err(|e| {
            nupak_util::errors::NupakError::Config {
                message: format!("Failed to parse global config: {e}"),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Configured default sources in name order, falling back to nuget.org.
    pub fn default_sources(&self) -> Vec<PackageSource> {
        if self.sources.is_empty() {
            return vec![PackageSource::nuget_org()];
        }
        self.sources.values().map(|s| PackageSource::parse(s)).collect()
    }
}

/// Returns the path to the nupak data directory (`~/.nupak/`).
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".nupak")
}
