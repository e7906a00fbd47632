use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("bot.{0} cannot be empty")]
    EmptyIdentifier(&'static str),

    #[error("timing.{field} must be at least {min_ms}ms, got {value_ms}ms")]
    TimingTooShort {
        field: &'static str,
        min_ms: u64,
        value_ms: u64,
    },

    #[error("Invalid max_queue_len: {0}. Must be at least 1")]
    InvalidQueueLength(usize),

    #[error(
        "Invalid backoff configuration: rate_limit_backoff_ms ({0}) must not exceed max_rate_limit_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .ppm-sentinel/config.yaml
    /// 3. .ppm-sentinel/local.yaml (optional overrides)
    /// 4. Environment variables (`PPM_SENTINEL_*`, `__` separates sections)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".ppm-sentinel/config.yaml"))
            .merge(Yaml::file(".ppm-sentinel/local.yaml"))
            .merge(Env::prefixed("PPM_SENTINEL_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring the
    /// environment overrides.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("PPM_SENTINEL_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        for (field, value) in [
            ("application_id", &config.bot.application_id),
            ("channel_id", &config.bot.channel_id),
            ("guild_id", &config.bot.guild_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyIdentifier(field));
            }
        }

        let timing = &config.timing;
        for (field, value_ms, min_ms) in [
            ("interval_ms", timing.interval_ms, 1000),
            ("check_timeout_ms", timing.check_timeout_ms, 1),
            ("start_ack_timeout_ms", timing.start_ack_timeout_ms, 1),
            ("anti_idle_interval_ms", timing.anti_idle_interval_ms, 1000),
        ] {
            if value_ms < min_ms {
                return Err(ConfigError::TimingTooShort {
                    field,
                    min_ms,
                    value_ms,
                });
            }
        }

        if timing.check_timeout_ms >= timing.interval_ms {
            return Err(ConfigError::ValidationFailed(format!(
                "timing.check_timeout_ms ({}) must be shorter than timing.interval_ms ({})",
                timing.check_timeout_ms, timing.interval_ms
            )));
        }

        let notifications = &config.notifications;
        if notifications.max_queue_len == 0 {
            return Err(ConfigError::InvalidQueueLength(notifications.max_queue_len));
        }
        if notifications.rate_limit_backoff_ms > notifications.max_rate_limit_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                notifications.rate_limit_backoff_ms,
                notifications.max_rate_limit_backoff_ms,
            ));
        }

        Ok(())
    }
}
