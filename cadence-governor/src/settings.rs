//! Runtime settings, loaded from a RON file.
//!
//! ```ron
//! (
//!     store: File((
//!         path: "/var/lib/cadence",
//!     )),
//!     defaults: (
//!         per_hour: 40,
//!         per_day: 400,
//!         warmup_schedule: [20, 50, 100, 200, 400],
//!     ),
//!     warmup_advance: PerElapsedDay,
//! )
//! ```
//!
//! Every field is optional; an empty `()` gives an in-memory store with the
//! default policy.

use std::path::{Path, PathBuf};

use anyhow::Context;
use cadence_common::{RateConfig, WarmupAdvance};
use cadence_store::StoreConfig;
use serde::Deserialize;

const CONFIG_ENV: &str = "CADENCE_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GovernorSettings {
    /// Where campaign records live
    #[serde(default)]
    pub store: StoreConfig,

    /// Policy for campaigns accessed for the first time
    #[serde(default)]
    pub defaults: RateConfig,

    #[serde(default)]
    pub warmup_advance: WarmupAdvance,
}

impl GovernorSettings {
    /// Parse settings from RON text.
    ///
    /// # Errors
    /// If the text is not valid RON or a value fails validation
    pub fn from_ron_str(source: &str) -> anyhow::Result<Self> {
        ron::from_str(source).context("Invalid governor settings")
    }

    /// Read settings from a RON file.
    ///
    /// # Errors
    /// If the file cannot be read or parsed
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::from_ron_str(&source).with_context(|| format!("In {}", path.display()))
    }

    /// Find and load the settings file using the following precedence:
    /// 1. `CADENCE_CONFIG` environment variable
    /// 2. ./cadence.config.ron (current working directory)
    /// 3. /etc/cadence/cadence.config.ron (system-wide config)
    ///
    /// # Errors
    /// If no file is found, `CADENCE_CONFIG` names a missing file, or the
    /// file cannot be loaded
    pub fn load() -> anyhow::Result<Self> {
        let path = find_config_file()?;
        tracing::info!(path = %path.display(), "Loading governor settings");

        Self::from_path(&path)
    }
}

fn find_config_file() -> anyhow::Result<PathBuf> {
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!("{CONFIG_ENV} points to non-existent file: {}", path.display());
    }

    let default_paths = [
        PathBuf::from("./cadence.config.ron"),
        PathBuf::from("/etc/cadence/cadence.config.ron"),
    ];

    if let Some(path) = default_paths.iter().find(|path| path.exists()) {
        return Ok(path.clone());
    }

    let paths_tried = default_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - {CONFIG_ENV} environment variable\n{paths_tried}"
    )
}
