//! Periodic driver of check cycles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::domain::models::{CycleReport, CycleTrigger};
use crate::services::recovery_orchestrator::RecoveryOrchestrator;
use crate::services::shutdown::ShutdownSignal;

/// Fires a cycle immediately, then every `interval`.
///
/// Each tick runs its cycle in its own task, so a slow cycle never delays
/// the next tick. Overlapping cycles contend for the status slot and the
/// later one reports a race.
pub struct CycleScheduler {
    orchestrator: Arc<RecoveryOrchestrator>,
    interval: Duration,
    reports: broadcast::Sender<CycleReport>,
    running: Arc<AtomicBool>,
}

impl CycleScheduler {
    /// Scheduler running a cycle every `interval`.
    pub fn new(
        orchestrator: Arc<RecoveryOrchestrator>,
        interval: Duration,
        reports: broadcast::Sender<CycleReport>,
    ) -> Self {
        Self {
            orchestrator,
            interval,
            reports,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the tick loop. Cycles still running when `shutdown` fires are
    /// aborted with the loop.
    pub fn start(&self, mut shutdown: ShutdownSignal) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        let orchestrator = Arc::clone(&self.orchestrator);
        let reports = self.reports.clone();
        let running = Arc::clone(&self.running);
        let period = self.interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut cycles = JoinSet::new();
            let mut trigger = CycleTrigger::Startup;

            info!(interval_s = period.as_secs(), "Scheduler started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let orchestrator = Arc::clone(&orchestrator);
                        let reports = reports.clone();
                        cycles.spawn(async move {
                            let report = orchestrator.run_cycle(trigger).await;
                            // No subscribers is fine.
                            let _ = reports.send(report);
                        });
                        trigger = CycleTrigger::Scheduled;
                    }
                    Some(_) = cycles.join_next(), if !cycles.is_empty() => {}
                    () = shutdown.triggered() => break,
                }
            }

            cycles.abort_all();
            running.store(false, Ordering::SeqCst);
            debug!("Scheduler stopped");
        })
    }

    /// Whether the tick loop is alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
