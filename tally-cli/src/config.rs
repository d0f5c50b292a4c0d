use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Optional `tally.toml` next to the working directory. Command-line flags
/// always win over config values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub reconcile: ReconcileSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsSection {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub overrides: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileSection {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for ReconcileSection {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
        }
    }
}

fn default_tolerance() -> f64 {
    0.02
}

pub fn config_path() -> PathBuf {
    PathBuf::from("tally.toml")
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}
