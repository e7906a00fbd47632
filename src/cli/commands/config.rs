//! Implementation of the `ppm-sentinel config` command.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::Path;

use crate::cli::load_config;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

/// Arguments of `ppm-sentinel config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// What to do with the configuration.
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Subcommands of `ppm-sentinel config`.
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigCommands {
    /// Print the effective configuration after merging files and environment
    Show,
    /// Load and validate the configuration without printing it
    Validate,
}

/// Result of `config show`.
#[derive(Debug, Serialize)]
pub struct ConfigShowOutput {
    pub config: Config,
}

impl CommandOutput for ConfigShowOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config)
            .unwrap_or_else(|e| format!("Failed to render configuration: {e}"))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

/// Result of `config validate`.
#[derive(Debug, Serialize)]
pub struct ConfigValidateOutput {
    pub valid: bool,
    pub helper_mode: bool,
    pub interval_s: u64,
}

impl CommandOutput for ConfigValidateOutput {
    fn to_human(&self) -> String {
        format!(
            "Configuration is valid (interval {}s, helper mode {})",
            self.interval_s,
            if self.helper_mode { "on" } else { "off" }
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run `ppm-sentinel config`.
pub fn execute(args: &ConfigArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path).context("Configuration is invalid")?;
    match args.command {
        ConfigCommands::Show => output(&ConfigShowOutput { config }, json_mode),
        ConfigCommands::Validate => output(
            &ConfigValidateOutput {
                valid: true,
                helper_mode: config.bot.helper_mode(),
                interval_s: config.timing.interval().as_secs(),
            },
            json_mode,
        ),
    }
    Ok(())
}
