use crate::config::{CONFIG_FILE_NAME, DEFAULT_CONFIG_TEMPLATE};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Write the default `.ccov.toml` into `root`, returning its path.
pub fn init_config(root: &Path, force: bool) -> Result<PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created {CONFIG_FILE_NAME} configuration file");

    Ok(config_path)
}
