//! The check and recovery state machine.
//!
//! One cycle: optional `/clear`, `/ppm` and wait for the reply, optional
//! group remediation on the same reply, then act on the tracked identity's
//! verdict:
//!
//! | verdict            | action                                   |
//! |--------------------|------------------------------------------|
//! | value > 0          | nothing                                  |
//! | value 0            | stop, reload delay, start, verify        |
//! | offline            | start, verify                            |
//! | missing identity   | same as value 0                          |
//! | timeout            | nothing (verbose: notify)                |
//! | race               | skip silently                            |
//!
//! Every command is best-effort; a failed send is logged and the sequence
//! carries on. Every delay is interrupted by the session's stop signal.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::domain::models::command::{CLEAR, PPM, START, STOP};
use crate::domain::models::{
    CheckResult, CooldownOutcome, CycleOutcome, CycleReport, CycleTrigger, RecoveryTrigger,
    ScheduleCycle, Settings, StartOutcome, StatusReply, TimingConfig, VerifyOutcome,
};
use crate::services::command_dispatch::CommandDispatch;
use crate::services::correlator::{CooldownCorrelator, StatusCorrelator};
use crate::services::group_remediation::GroupRemediator;
use crate::services::notification_queue::NotificationQueue;
use crate::services::shutdown::ShutdownSignal;

/// Sent when our value reads zero.
pub const ZERO_VALUE_ALERT: &str =
    "⚠️ **PPM Sentinel Alert!** ⚠️\n\nYOUR PPM is **0**. Restarting cluster...";
/// Sent when the cluster reports offline.
pub const OFFLINE_ALERT: &str =
    "❌ **PPM Sentinel Alert!** ❌\n\nCluster \"Not Started\". Sending /start.";
/// Sent when the reply does not list us.
pub const MISSING_IDENTITY_ALERT: &str =
    "❓ **PPM Sentinel Alert!** ❓\n\nYour ID was not found in the list. Restarting cluster...";
/// Sent in verbose mode when the bot stays silent.
pub const TIMEOUT_NOTICE: &str = "⏱️ PPM check timed out (bot did not reply). Taking no action.";
/// Sent when the post-restart check is healthy.
pub const VERIFY_SUCCESS: &str =
    "✅ **Restart Successful**\nCluster is back online and PPM is healthy.";
/// Sent when the post-restart check is not.
pub const VERIFY_FAILURE: &str =
    "🚨 **Restart FAILED**\nCluster is still offline. Manual check required.";

fn cooldown_notice(wait: Duration) -> String {
    format!(
        "⏳ /start is on cooldown for {}s. Retrying once it expires.",
        wait.as_secs()
    )
}

fn cooldown_escalation(wait: Duration) -> String {
    format!(
        "🚨 **Start still on cooldown** ({}s left). Not retrying again, manual check required.",
        wait.as_secs()
    )
}

fn value_notice(value: f64) -> String {
    let icon = if value > 0.0 { "✅" } else { "❌" };
    format!("{icon} My PPM: **{value}**")
}

/// Collaborators of one session's cycles.
pub struct OrchestratorParts {
    pub dispatch: CommandDispatch,
    pub status: StatusCorrelator,
    pub start_ack: CooldownCorrelator,
    pub notifications: Arc<NotificationQueue>,
    pub settings: Settings,
    pub timing: TimingConfig,
    pub remediator: GroupRemediator,
    pub identity: Option<String>,
    pub shutdown: ShutdownSignal,
}

/// Drives check cycles and recovery sequences.
pub struct RecoveryOrchestrator {
    dispatch: CommandDispatch,
    status: StatusCorrelator,
    start_ack: CooldownCorrelator,
    notifications: Arc<NotificationQueue>,
    settings: Settings,
    timing: TimingConfig,
    remediator: GroupRemediator,
    identity: Option<String>,
    shutdown: ShutdownSignal,
}

impl RecoveryOrchestrator {
    /// Orchestrator over `parts`.
    pub fn new(parts: OrchestratorParts) -> Self {
        Self {
            dispatch: parts.dispatch,
            status: parts.status,
            start_ack: parts.start_ack,
            notifications: parts.notifications,
            settings: parts.settings,
            timing: parts.timing,
            remediator: parts.remediator,
            identity: parts.identity,
            shutdown: parts.shutdown,
        }
    }

    /// Command dispatch shared with the session.
    pub fn dispatch(&self) -> &CommandDispatch {
        &self.dispatch
    }

    /// Run one full cycle.
    #[instrument(skip(self), fields(cycle_id = tracing::field::Empty))]
    pub async fn run_cycle(&self, trigger: CycleTrigger) -> CycleReport {
        let cycle = ScheduleCycle::begin(trigger);
        tracing::Span::current().record("cycle_id", tracing::field::display(cycle.id));
        info!("Running check cycle");

        let mut shutdown = self.shutdown.clone();
        let mut remediation = None;

        let outcome = 'cycle: {
            if shutdown.is_triggered() {
                break 'cycle CycleOutcome::Stopped;
            }

            if self.settings.send_clear_command() {
                self.dispatch.send(&CLEAR).await;
                if !shutdown.sleep(self.timing.clear_delay()).await {
                    break 'cycle CycleOutcome::Stopped;
                }
            }

            let reply = self.check().await;

            if let Some(roster) = reply.roster.as_ref().filter(|r| !r.is_empty()) {
                if self.remediator.enabled() {
                    remediation = Some(
                        self.remediator
                            .run(roster, self.identity.as_deref(), &mut shutdown)
                            .await,
                    );
                }
            }

            self.classify(reply.result, &mut shutdown).await
        };

        info!(outcome = ?outcome, "Cycle finished");
        CycleReport {
            cycle,
            outcome,
            remediation,
        }
    }

    async fn classify(&self, result: CheckResult, shutdown: &mut ShutdownSignal) -> CycleOutcome {
        match result {
            CheckResult::Value(value) if value > 0.0 => {
                info!(value, "PPM healthy");
                if self.settings.verbose() {
                    self.notifications.enqueue(value_notice(value));
                }
                CycleOutcome::Healthy { value }
            }
            CheckResult::Value(value) => {
                warn!(value, "PPM is zero, restarting");
                if self.settings.verbose() {
                    self.notifications.enqueue(value_notice(value));
                }
                self.notifications.enqueue(ZERO_VALUE_ALERT);
                self.restart(RecoveryTrigger::ZeroValue, shutdown).await
            }
            CheckResult::Offline => {
                warn!("Cluster offline, sending start");
                self.notifications.enqueue(OFFLINE_ALERT);
                let start = self.start_with_cooldown().await;
                self.finish_recovery(RecoveryTrigger::Offline, start).await
            }
            CheckResult::MissingIdentity => {
                warn!("Bot replied without our identity, restarting");
                self.notifications.enqueue(MISSING_IDENTITY_ALERT);
                self.restart(RecoveryTrigger::MissingIdentity, shutdown).await
            }
            CheckResult::Timeout => {
                warn!("Bot did not reply, doing nothing until next cycle");
                if self.settings.verbose() {
                    self.notifications.enqueue(TIMEOUT_NOTICE);
                }
                CycleOutcome::NoReply
            }
            CheckResult::RaceCondition => {
                warn!("Another check is in flight, skipping");
                CycleOutcome::Skipped
            }
            CheckResult::Stopped => CycleOutcome::Stopped,
        }
    }

    async fn restart(&self, trigger: RecoveryTrigger, shutdown: &mut ShutdownSignal) -> CycleOutcome {
        self.dispatch.send(&STOP).await;
        info!(
            delay_s = self.timing.reload_delay().as_secs(),
            "Waiting before start"
        );
        if !shutdown.sleep(self.timing.reload_delay()).await {
            return CycleOutcome::Stopped;
        }
        let start = self.start_with_cooldown().await;
        self.finish_recovery(trigger, start).await
    }

    async fn finish_recovery(&self, trigger: RecoveryTrigger, start: StartOutcome) -> CycleOutcome {
        let verify = if start.accepted() {
            Some(self.verify().await)
        } else {
            None
        };
        CycleOutcome::Recovery {
            trigger,
            start,
            verify,
        }
    }

    /// Send `/ppm` and wait for the verdict. The wait is armed before the
    /// command goes out so a fast reply cannot slip past.
    pub async fn check(&self) -> StatusReply {
        let wait = self.status.begin_wait(self.timing.check_timeout());
        self.dispatch.send(&PPM).await;
        let reply = wait.await;
        info!(result = %reply.result, "Status check resolved");
        reply
    }

    /// Send `/start`, retrying once after a reported cooldown.
    pub async fn start_with_cooldown(&self) -> StartOutcome {
        let mut shutdown = self.shutdown.clone();
        match self.start_once().await {
            CooldownOutcome::Cooldown(wait) => {
                info!(wait_s = wait.as_secs(), "Start on cooldown");
                self.notifications.enqueue(cooldown_notice(wait));
                if !shutdown.sleep(wait + self.timing.cooldown_buffer()).await {
                    return StartOutcome::Skipped;
                }
                match self.start_once().await {
                    CooldownOutcome::Cooldown(again) => {
                        error!(wait_s = again.as_secs(), "Start still on cooldown, giving up");
                        self.notifications.enqueue(cooldown_escalation(again));
                        StartOutcome::CooldownEscalated
                    }
                    CooldownOutcome::Success | CooldownOutcome::Timeout => {
                        if self.settings.verbose() {
                            self.notifications.enqueue("▶️ /start accepted after cooldown.");
                        }
                        StartOutcome::AcceptedAfterCooldown
                    }
                    CooldownOutcome::RaceCondition | CooldownOutcome::Stopped => StartOutcome::Skipped,
                }
            }
            outcome @ (CooldownOutcome::Success | CooldownOutcome::Timeout) => {
                if self.settings.verbose() {
                    let text = if outcome == CooldownOutcome::Success {
                        "▶️ /start acknowledged."
                    } else {
                        "▶️ No reply to /start, assuming it went through."
                    };
                    self.notifications.enqueue(text);
                }
                StartOutcome::Accepted
            }
            CooldownOutcome::RaceCondition | CooldownOutcome::Stopped => StartOutcome::Skipped,
        }
    }

    async fn start_once(&self) -> CooldownOutcome {
        let wait = self.start_ack.begin_wait(self.timing.start_ack_timeout());
        self.dispatch.send(&START).await;
        let outcome = wait.await;
        info!(outcome = %outcome, "Start acknowledgement resolved");
        outcome
    }

    /// Wait for the cluster to warm up, then check again.
    pub async fn verify(&self) -> VerifyOutcome {
        let mut shutdown = self.shutdown.clone();
        info!(
            delay_s = self.timing.verify_wait().as_secs(),
            "Waiting for warm-up before verification"
        );
        if !shutdown.sleep(self.timing.verify_wait()).await {
            return VerifyOutcome::Aborted;
        }

        let reply = self.check().await;
        match reply.result {
            CheckResult::Value(value) if value > 0.0 => {
                info!(value, "Verification passed");
                self.notifications.enqueue(VERIFY_SUCCESS);
                VerifyOutcome::Passed { value }
            }
            CheckResult::Stopped => VerifyOutcome::Aborted,
            other => {
                error!(result = %other, "Verification failed");
                self.notifications.enqueue(VERIFY_FAILURE);
                VerifyOutcome::Failed
            }
        }
    }
}
