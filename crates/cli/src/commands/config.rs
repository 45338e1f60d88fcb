//! `config`: show or update the CLI configuration file

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::output::{print_info, print_json, print_success, OutputFormat};

/// Values to store; `None` leaves the current value untouched
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub api_url: Option<String>,
    pub artifact_dir: Option<PathBuf>,
    pub model_name: Option<String>,
    pub default_format: Option<OutputFormat>,
}

fn config_path() -> Result<PathBuf> {
    Config::config_path().context("Could not determine the user configuration directory")
}

/// Print the configuration file contents
pub fn show(format: OutputFormat) -> Result<()> {
    let path = config_path()?;
    let config = Config::load_from(&path)?;

    match format {
        OutputFormat::Json => print_json(&config)?,
        OutputFormat::Table => {
            print_info(&format!("Configuration file: {}", path.display()));
            print_json(&config)?;
        }
    }
    Ok(())
}

/// Merge `update` into the configuration file
pub fn set(update: ConfigUpdate) -> Result<()> {
    let path = config_path()?;
    apply(&path, update)?;
    print_success(&format!("Saved {}", path.display()));
    Ok(())
}

fn apply(path: &Path, update: ConfigUpdate) -> Result<Config> {
    let mut config = Config::load_from(path)?;

    if update.api_url.is_some() {
        config.api_url = update.api_url;
    }
    if update.artifact_dir.is_some() {
        config.artifact_dir = update.artifact_dir;
    }
    if update.model_name.is_some() {
        config.model_name = update.model_name;
    }
    if update.default_format.is_some() {
        config.default_format = update.default_format;
    }

    config.save_to(path)?;
    Ok(config)
}
