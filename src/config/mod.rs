//! Configuration system - YAML-based config loading.
//!
//! Loaded in layers: built-in defaults, then `config.yml`, then
//! `environments/deployment.yml`, then environment variable overrides.

pub mod settings;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

pub use settings::*;

pub fn load_config(config_dir: Option<&Path>) -> Result<DiscoveryConfig> {
    let home = config_dir
        .map(PathBuf::from)
        .or_else(|| std::env::var("NETDISCOVERY_HOME").ok().map(PathBuf::from))
        .or_else(dirs::home_dir)
        .context("cannot determine home directory")?;

    let default_config_path = home.join("config.yml");
    let mut config = if default_config_path.exists() {
        let contents = std::fs::read_to_string(&default_config_path)
            .with_context(|| format!("failed to read {}", default_config_path.display()))?;
        serde_yaml::from_str::<DiscoveryConfig>(&contents)
            .with_context(|| format!("failed to parse {}", default_config_path.display()))?
    } else {
        DiscoveryConfig::default()
    };

    let env_config_path = home.join("environments").join("deployment.yml");
    if env_config_path.exists() {
        let contents = std::fs::read_to_string(&env_config_path)
            .with_context(|| format!("failed to read {}", env_config_path.display()))?;
        let overrides: serde_yaml::Value = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", env_config_path.display()))?;
        config.apply_overrides(&overrides)?;
        info!("loaded config overrides from {}", env_config_path.display());
    }

    config.apply_env_overrides();

    Ok(config)
}
