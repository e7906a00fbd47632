//! Anti-idle and auto-rejoin timers.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::domain::models::Settings;
use crate::domain::ports::TypingIndicator;
use crate::services::notification_queue::NotificationQueue;
use crate::services::recovery_orchestrator::RecoveryOrchestrator;
use crate::services::shutdown::ShutdownSignal;

/// Notification queued when an auto-kick is detected.
pub const AUTO_KICK_NOTICE: &str = "👢 **Auto-kick detected.** Rejoining shortly...";

/// Periodically shows the typing indicator while the `anti_idle` setting is
/// on. The setting is read on every tick.
pub fn spawn_anti_idle(
    typing: Arc<dyn TypingIndicator>,
    settings: Settings,
    channel_id: String,
    period: Duration,
    mut shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if settings.anti_idle() {
                        debug!(channel_id = %channel_id, "Anti-idle typing");
                        typing.start_typing(&channel_id);
                    }
                }
                () = shutdown.triggered() => break,
            }
        }
    })
}

/// Single pending rejoin after an auto-kick.
pub struct AutoRejoin {
    orchestrator: Arc<RecoveryOrchestrator>,
    notifications: Arc<NotificationQueue>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl AutoRejoin {
    /// Rejoin helper restarting through `orchestrator` after `delay`.
    pub fn new(
        orchestrator: Arc<RecoveryOrchestrator>,
        notifications: Arc<NotificationQueue>,
        delay: Duration,
    ) -> Self {
        Self {
            orchestrator,
            notifications,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule a rejoin, replacing any rejoin still pending.
    pub fn schedule(&self, mut shutdown: ShutdownSignal) {
        info!(delay_s = self.delay.as_secs(), "Auto-kick detected, scheduling rejoin");
        self.notifications.enqueue(AUTO_KICK_NOTICE);

        let orchestrator = Arc::clone(&self.orchestrator);
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            if !shutdown.sleep(delay).await {
                return;
            }
            let outcome = orchestrator.start_with_cooldown().await;
            info!(outcome = ?outcome, "Auto-rejoin finished");
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Abort the pending rejoin, if any.
    pub fn cancel(&self) {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = pending {
            handle.abort();
            debug!("Pending auto-rejoin cancelled");
        }
    }

    /// Whether a rejoin is scheduled.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}
