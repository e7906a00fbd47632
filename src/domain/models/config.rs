use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::settings::{SettingKey, SettingValue};

/// Main configuration structure for the sentinel
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Bot, channel and role identifiers
    #[serde(default)]
    pub bot: BotConfig,

    /// Delays and timeouts of the check and recovery sequences
    #[serde(default)]
    pub timing: TimingConfig,

    /// Outbound notification queue
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Seed values for the runtime settings store
    #[serde(default)]
    pub settings: SettingsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LogConfig,
}

/// Identifiers of the bot and where it is talked to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BotConfig {
    /// Application (and author) id of the status bot
    #[serde(default = "default_application_id")]
    pub application_id: String,

    /// Channel where commands are issued and replies arrive
    #[serde(default = "default_channel_id")]
    pub channel_id: String,

    /// Guild owning `channel_id`
    #[serde(default = "default_guild_id")]
    pub guild_id: String,

    /// Channel receiving group-level commands; falls back to `channel_id`
    #[serde(default)]
    pub secondary_channel_id: String,

    /// Role enabling group remediation; empty disables helper mode
    #[serde(default)]
    pub helper_role_id: String,
}

fn default_application_id() -> String {
    "1334630845574676520".to_string()
}

fn default_channel_id() -> String {
    "1343184699018842202".to_string()
}

fn default_guild_id() -> String {
    "1334603881652555896".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            application_id: default_application_id(),
            channel_id: default_channel_id(),
            guild_id: default_guild_id(),
            secondary_channel_id: String::new(),
            helper_role_id: String::new(),
        }
    }
}

impl BotConfig {
    /// Channel for group-level commands.
    pub fn group_channel_id(&self) -> &str {
        if self.secondary_channel_id.is_empty() {
            &self.channel_id
        } else {
            &self.secondary_channel_id
        }
    }

    /// Helper mode is on when a helper role is configured.
    pub fn helper_mode(&self) -> bool {
        !self.helper_role_id.is_empty()
    }
}

/// Timing of the check cycle, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimingConfig {
    /// Period of the scheduled check
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Pause between `/clear` and `/ppm`
    #[serde(default = "default_clear_delay_ms")]
    pub clear_delay_ms: u64,

    /// Pause between `/stop` and `/start`
    #[serde(default = "default_reload_delay_ms")]
    pub reload_delay_ms: u64,

    /// Wait for the status reply
    #[serde(default = "default_check_timeout_ms")]
    pub check_timeout_ms: u64,

    /// Warm-up before the verification check
    #[serde(default = "default_verify_wait_ms")]
    pub verify_wait_ms: u64,

    /// Wait for the start acknowledgement
    #[serde(default = "default_start_ack_timeout_ms")]
    pub start_ack_timeout_ms: u64,

    /// Added to a reported cooldown before retrying `/start`
    #[serde(default = "default_cooldown_buffer_ms")]
    pub cooldown_buffer_ms: u64,

    /// Pause between individual helper stops
    #[serde(default = "default_helper_stop_delay_ms")]
    pub helper_stop_delay_ms: u64,

    /// Period of the anti-idle typing indicator
    #[serde(default = "default_anti_idle_interval_ms")]
    pub anti_idle_interval_ms: u64,

    /// Delay before rejoining after an auto-kick
    #[serde(default = "default_auto_rejoin_delay_ms")]
    pub auto_rejoin_delay_ms: u64,
}

const fn default_interval_ms() -> u64 {
    15 * 60 * 1000
}

const fn default_clear_delay_ms() -> u64 {
    10 * 1000
}

const fn default_reload_delay_ms() -> u64 {
    6 * 60 * 1000
}

const fn default_check_timeout_ms() -> u64 {
    15 * 1000
}

const fn default_verify_wait_ms() -> u64 {
    2 * 60 * 1000
}

const fn default_start_ack_timeout_ms() -> u64 {
    10 * 1000
}

const fn default_cooldown_buffer_ms() -> u64 {
    5 * 1000
}

const fn default_helper_stop_delay_ms() -> u64 {
    2 * 1000
}

const fn default_anti_idle_interval_ms() -> u64 {
    4 * 60 * 1000
}

const fn default_auto_rejoin_delay_ms() -> u64 {
    60 * 1000
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            clear_delay_ms: default_clear_delay_ms(),
            reload_delay_ms: default_reload_delay_ms(),
            check_timeout_ms: default_check_timeout_ms(),
            verify_wait_ms: default_verify_wait_ms(),
            start_ack_timeout_ms: default_start_ack_timeout_ms(),
            cooldown_buffer_ms: default_cooldown_buffer_ms(),
            helper_stop_delay_ms: default_helper_stop_delay_ms(),
            anti_idle_interval_ms: default_anti_idle_interval_ms(),
            auto_rejoin_delay_ms: default_auto_rejoin_delay_ms(),
        }
    }
}

impl TimingConfig {
    /// Period between scheduled checks.
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Pause between `/clear` and `/ppm`.
    pub const fn clear_delay(&self) -> Duration {
        Duration::from_millis(self.clear_delay_ms)
    }

    /// Pause between `/stop` and `/start`.
    pub const fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload_delay_ms)
    }

    /// How long to wait for a status reply.
    pub const fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    /// Pause before the verification check.
    pub const fn verify_wait(&self) -> Duration {
        Duration::from_millis(self.verify_wait_ms)
    }

    /// How long to wait for a `/start` reply.
    pub const fn start_ack_timeout(&self) -> Duration {
        Duration::from_millis(self.start_ack_timeout_ms)
    }

    /// Extra wait added to a reported cooldown.
    pub const fn cooldown_buffer(&self) -> Duration {
        Duration::from_millis(self.cooldown_buffer_ms)
    }

    /// Spacing between helper-mode member stops.
    pub const fn helper_stop_delay(&self) -> Duration {
        Duration::from_millis(self.helper_stop_delay_ms)
    }

    /// Period of the anti-idle typing indicator.
    pub const fn anti_idle_interval(&self) -> Duration {
        Duration::from_millis(self.anti_idle_interval_ms)
    }

    /// Delay before rejoining after an auto-kick.
    pub const fn auto_rejoin_delay(&self) -> Duration {
        Duration::from_millis(self.auto_rejoin_delay_ms)
    }
}

/// Outbound notification queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NotificationConfig {
    /// Maximum unsent messages kept; the oldest are dropped beyond this
    #[serde(default = "default_max_queue_len")]
    pub max_queue_len: usize,

    /// Minimum delay between two sends
    #[serde(default = "default_min_send_interval_ms")]
    pub min_send_interval_ms: u64,

    /// First backoff after a rate-limit signal
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,

    /// Ceiling for repeated rate-limit backoffs
    #[serde(default = "default_max_rate_limit_backoff_ms")]
    pub max_rate_limit_backoff_ms: u64,
}

const fn default_max_queue_len() -> usize {
    20
}

const fn default_min_send_interval_ms() -> u64 {
    1500
}

const fn default_rate_limit_backoff_ms() -> u64 {
    10_000
}

const fn default_max_rate_limit_backoff_ms() -> u64 {
    120_000
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_queue_len: default_max_queue_len(),
            min_send_interval_ms: default_min_send_interval_ms(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            max_rate_limit_backoff_ms: default_max_rate_limit_backoff_ms(),
        }
    }
}

/// Initial values of the runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SettingsConfig {
    #[serde(default)]
    pub notification_channel_id: String,

    #[serde(default)]
    pub user_channel_id: String,

    #[serde(default = "default_true")]
    pub send_clear_command: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub anti_idle: bool,

    #[serde(default)]
    pub force_individual_stops: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            notification_channel_id: String::new(),
            user_channel_id: String::new(),
            send_clear_command: true,
            verbose: false,
            anti_idle: false,
            force_individual_stops: false,
        }
    }
}

impl SettingsConfig {
    /// Flatten into store entries.
    pub fn entries(&self) -> Vec<(SettingKey, SettingValue)> {
        vec![
            (
                SettingKey::NotificationChannelId,
                SettingValue::Text(self.notification_channel_id.clone()),
            ),
            (
                SettingKey::UserChannelId,
                SettingValue::Text(self.user_channel_id.clone()),
            ),
            (
                SettingKey::SendClearCommand,
                SettingValue::Flag(self.send_clear_command),
            ),
            (SettingKey::Verbose, SettingValue::Flag(self.verbose)),
            (SettingKey::AntiIdle, SettingValue::Flag(self.anti_idle)),
            (
                SettingKey::ForceIndividualStops,
                SettingValue::Flag(self.force_individual_stops),
            ),
        ]
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (json, pretty)
    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// Directory for log files (optional, if None logs only to stderr)
    pub log_dir: Option<PathBuf>,

    /// Enable console logging
    #[serde(default = "default_true")]
    pub enable_console: bool,

    /// Log rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// When log files roll over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            log_dir: None,
            enable_console: true,
            rotation: RotationPolicy::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_format() -> LogFormat {
    LogFormat::Pretty
}
