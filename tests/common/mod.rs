//! Common test utilities for integration tests
//!
//! Builds sessions against the in-memory host with short, deterministic
//! timings. Tests using these helpers run on a paused tokio clock.

use std::sync::Arc;
use std::time::Duration;

use ppm_sentinel::domain::models::{Config, SettingKey, SettingValue};
use ppm_sentinel::{InMemoryHost, Session, StaticSettings};

pub const IDENTITY: &str = "42";
pub const NOTIFY_CHANNEL: &str = "notify";

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Config with round-number delays so paused-clock assertions are exact.
pub fn test_config() -> Config {
    let mut config = Config::default();
    let timing = &mut config.timing;
    timing.interval_ms = 60_000;
    timing.clear_delay_ms = 1_000;
    timing.reload_delay_ms = 6_000;
    timing.check_timeout_ms = 2_000;
    timing.verify_wait_ms = 3_000;
    timing.start_ack_timeout_ms = 1_000;
    timing.cooldown_buffer_ms = 500;
    timing.helper_stop_delay_ms = 200;
    timing.anti_idle_interval_ms = 10_000;
    timing.auto_rejoin_delay_ms = 5_000;
    config.notifications.min_send_interval_ms = 0;
    config.notifications.rate_limit_backoff_ms = 1_000;
    config.notifications.max_rate_limit_backoff_ms = 4_000;
    config
}

/// A session, its host and its settings, wired together.
pub struct Harness {
    pub session: Session,
    pub host: InMemoryHost,
    pub settings: Arc<StaticSettings>,
}

#[allow(dead_code)]
pub fn harness(config: Config) -> Harness {
    let host = InMemoryHost::new(&config.bot).with_identity(IDENTITY);
    let settings = Arc::new(StaticSettings::from_config(&config.settings));
    settings.set(
        SettingKey::NotificationChannelId,
        SettingValue::Text(NOTIFY_CHANNEL.to_string()),
    );
    settings.set(SettingKey::SendClearCommand, SettingValue::Flag(false));
    let session = Session::new(config, Arc::new(host.clone()), settings.clone());
    Harness {
        session,
        host,
        settings,
    }
}

/// Wait for a condition to be true with timeout
///
/// Polls every 10ms of (possibly paused) tokio time.
#[allow(dead_code)]
pub async fn wait_for<F>(mut predicate: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    while tokio::time::Instant::now() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    predicate()
}

/// Offsets of every command from the first one, in milliseconds.
#[allow(dead_code)]
pub fn command_offsets(host: &InMemoryHost) -> Vec<(String, u128)> {
    let commands = host.commands();
    let Some(first) = commands.first().map(|c| c.at) else {
        return Vec::new();
    };
    commands
        .into_iter()
        .map(|c| (c.name, c.at.duration_since(first).as_millis()))
        .collect()
}
