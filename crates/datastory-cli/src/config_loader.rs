//! Configuration loading for CLI commands

use anyhow::{Context, Result};
use datastory_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "datastory.toml";

/// Resolve configuration: defaults, then the config file, then the
/// environment, then command-line flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let config = match &cli.config {
        Some(path) => LayeredConfig::with_defaults()
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration file: {}", path.display()))?,
        None => LayeredConfig::with_defaults()
            .load_from_optional_file(default_config_path())
            .context("Failed to load configuration file")?,
    };

    let mut config = config.load_from_env();
    config.update_from_cli(overrides(cli));
    config.validate().context("Invalid configuration")?;

    tracing::debug!(
        analysis_api_url = %config.analysis_api_url.value,
        catalog_url = %config.catalog_url.value,
        "Configuration resolved"
    );
    Ok(config)
}

fn default_config_path() -> PathBuf {
    Path::new(".").join(DEFAULT_CONFIG_FILE)
}

fn overrides(cli: &Cli) -> CliConfigOverrides {
    CliConfigOverrides {
        analysis_api_url: cli.api_url.clone(),
        catalog_url: cli.catalog_url.clone(),
        access_token: cli.token.clone(),
        ..Default::default()
    }
}
