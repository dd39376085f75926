//! Config file load logic.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::types::DeployConfig;

pub const CONFIG_FILE_NAME: &str = "billboard-deploy.json";

fn default_config_path() -> Result<PathBuf> {
    let exe_dir = std::env::current_exe()?
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine executable directory"))?
        .to_path_buf();
    Ok(exe_dir.join(CONFIG_FILE_NAME))
}

/// Load the deploy configuration. Falls back to built-in defaults when no
/// config file exists, so a stock Raspberry Pi install needs no file at all.
pub async fn load_config(path: Option<&str>) -> Result<DeployConfig> {
    let config_path = match path {
        Some(p) => PathBuf::from(p),
        None => default_config_path()?,
    };

    if config_path.exists() {
        let content = tokio::fs::read_to_string(&config_path).await?;
        let config: DeployConfig = serde_json::from_str(&content)?;
        info!("Loaded configuration from: {:?}", config_path);
        Ok(config)
    } else {
        debug!("No config file at {:?}, using defaults", config_path);
        Ok(DeployConfig::default())
    }
}
