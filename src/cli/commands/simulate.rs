//! Implementation of the `ppm-sentinel simulate` command.
//!
//! Runs one manual cycle against [`InMemoryHost`] with scripted bot
//! replies and compressed delays, then prints what the sentinel did.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::adapters::memory::InMemoryHost;
use crate::application::Session;
use crate::cli::load_config;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, CycleReport, OptionValues, SettingKey, SettingValue, TimingConfig};
use crate::infrastructure::settings::StaticSettings;

const SIMULATED_NOTIFICATION_CHANNEL: &str = "simulated-notifications";

/// Arguments of `ppm-sentinel simulate`.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Bot reply to the first /ppm
    #[arg(short, long)]
    pub reply: String,

    /// Bot reply to the verification /ppm
    #[arg(long)]
    pub verify_reply: Option<String>,

    /// Bot reply to /start (a cooldown refusal triggers one retry)
    #[arg(long)]
    pub start_reply: Option<String>,

    /// Bot reply to the retried /start
    #[arg(long)]
    pub retry_start_reply: Option<String>,

    /// Identity the sentinel tracks
    #[arg(short, long, default_value = "42")]
    pub identity: String,

    /// Enable helper mode with this role id and grant it to the identity
    #[arg(long)]
    pub helper_role: Option<String>,

    /// Notify every captured value and non-action
    #[arg(short, long)]
    pub verbose: bool,

    /// Skip the /clear before the check
    #[arg(long)]
    pub no_clear: bool,

    /// Length of every compressed delay, in milliseconds
    #[arg(long, default_value = "200")]
    pub step_ms: u64,
}

/// A command issued during the simulation.
#[derive(Debug, Serialize)]
pub struct CommandRecord {
    pub at_ms: u128,
    pub name: String,
    pub options: OptionValues,
    pub channel_id: String,
}

/// A message posted during the simulation.
#[derive(Debug, Serialize)]
pub struct NotificationRecord {
    pub at_ms: u128,
    pub channel_id: String,
    pub content: String,
}

/// Everything one simulated cycle did.
#[derive(Debug, Serialize)]
pub struct SimulateOutput {
    pub report: CycleReport,
    pub commands: Vec<CommandRecord>,
    pub notifications: Vec<NotificationRecord>,
    pub unsent: Vec<String>,
    #[serde(skip)]
    command_table: String,
}

impl CommandOutput for SimulateOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Cycle {} ({:?})", self.report.cycle.id, self.report.cycle.trigger),
            format!("Outcome: {:?}", self.report.outcome),
        ];
        if let Some(remediation) = &self.report.remediation {
            lines.push(format!("Remediation: {remediation:?}"));
        }
        lines.push(String::new());
        lines.push(self.command_table.clone());

        if !self.notifications.is_empty() {
            lines.push("\nMessages sent:".to_string());
            for n in &self.notifications {
                lines.push(format!("  [{}ms #{}] {}", n.at_ms, n.channel_id, n.content));
            }
        }
        if !self.unsent.is_empty() {
            lines.push(format!("\n{} notification(s) still queued", self.unsent.len()));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Shrink every delay to `step`. Timeouts get twice the step so scripted
/// replies, delivered after a quarter step, always land first.
pub fn compress_timing(timing: &mut TimingConfig, step: Duration) {
    let step_ms = u64::try_from(step.as_millis()).unwrap_or(u64::MAX).max(1);
    timing.clear_delay_ms = step_ms;
    timing.reload_delay_ms = step_ms;
    timing.verify_wait_ms = step_ms;
    timing.cooldown_buffer_ms = step_ms;
    timing.helper_stop_delay_ms = step_ms;
    timing.auto_rejoin_delay_ms = step_ms;
    timing.check_timeout_ms = step_ms * 2;
    timing.start_ack_timeout_ms = step_ms * 2;
}

fn prepare(mut config: Config, args: &SimulateArgs) -> Config {
    compress_timing(&mut config.timing, Duration::from_millis(args.step_ms));
    config.notifications.min_send_interval_ms = 0;
    if let Some(role) = &args.helper_role {
        config.bot.helper_role_id.clone_from(role);
    }
    config
}

fn build_host(config: &Config, args: &SimulateArgs) -> InMemoryHost {
    let host = InMemoryHost::new(&config.bot).with_identity(args.identity.clone());
    let delay = Duration::from_millis((args.step_ms / 4).max(1));

    host.script_reply_after("ppm", args.reply.clone(), delay);
    if let Some(reply) = &args.verify_reply {
        host.script_reply_after("ppm", reply.clone(), delay);
    }
    for reply in [&args.start_reply, &args.retry_start_reply].into_iter().flatten() {
        host.script_reply_after("start", reply.clone(), delay);
    }
    if let Some(role) = &args.helper_role {
        host.grant_role(&args.identity, role);
    }
    host
}

fn build_settings(config: &Config, args: &SimulateArgs) -> StaticSettings {
    let settings = StaticSettings::from_config(&config.settings);
    if config.settings.notification_channel_id.trim().is_empty() {
        settings.set(
            SettingKey::NotificationChannelId,
            SettingValue::Text(SIMULATED_NOTIFICATION_CHANNEL.to_string()),
        );
    }
    if args.verbose {
        settings.set(SettingKey::Verbose, SettingValue::Flag(true));
    }
    if args.no_clear {
        settings.set(SettingKey::SendClearCommand, SettingValue::Flag(false));
    }
    settings
}

/// Run `ppm-sentinel simulate`.
pub async fn execute(args: SimulateArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = prepare(load_config(config_path)?, &args);
    let host = build_host(&config, &args);
    let settings = build_settings(&config, &args);
    let session = Session::new(config, Arc::new(host.clone()), Arc::new(settings));

    let origin = Instant::now();
    let report = session
        .run_check_now()
        .await
        .context("Simulated cycle could not start")?;

    // Let the drain flush what the cycle queued.
    tokio::time::sleep(Duration::from_millis(args.step_ms)).await;
    let unsent = session.pending_notifications().await;
    session.stop().await;

    let executed = host.commands();
    let result = SimulateOutput {
        report,
        command_table: TableFormatter::new().format_commands(&executed, origin),
        commands: executed
            .into_iter()
            .map(|c| CommandRecord {
                at_ms: c.at.saturating_duration_since(origin).as_millis(),
                name: c.name,
                options: c.options,
                channel_id: c.channel_id,
            })
            .collect(),
        notifications: host
            .sent_messages()
            .into_iter()
            .map(|m| NotificationRecord {
                at_ms: m.at.saturating_duration_since(origin).as_millis(),
                channel_id: m.channel_id,
                content: m.content,
            })
            .collect(),
        unsent,
    };
    output(&result, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_timing_keeps_timeouts_longer_than_replies() {
        let mut timing = TimingConfig::default();
        compress_timing(&mut timing, Duration::from_millis(100));
        assert_eq!(timing.reload_delay_ms, 100);
        assert_eq!(timing.check_timeout_ms, 200);
        assert!(timing.check_timeout() > Duration::from_millis(25));
    }

    #[test]
    fn test_prepare_enables_helper_mode() {
        let args = SimulateArgs {
            reply: String::new(),
            verify_reply: None,
            start_reply: None,
            retry_start_reply: None,
            identity: "42".to_string(),
            helper_role: Some("999".to_string()),
            verbose: false,
            no_clear: false,
            step_ms: 50,
        };
        let config = prepare(Config::default(), &args);
        assert!(config.bot.helper_mode());
        assert_eq!(config.notifications.min_send_interval_ms, 0);
    }
}
