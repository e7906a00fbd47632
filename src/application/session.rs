//! One running instance of the sentinel.
//!
//! A [`Session`] owns every piece of mutable state: the correlator slots,
//! the notification queue, the timers and the event subscription. All of it
//! is created lazily by the first operation that needs it and torn down by
//! [`Session::stop`]; the next operation bootstraps again from scratch.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::application::event_pump::{spawn_event_pump, EventRoutes};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::command::STOP;
use crate::domain::models::{Config, CycleReport, CycleTrigger, Settings, StartOutcome};
use crate::domain::ports::{
    EventSource, HostBindings, SettingsStore, SubscriptionId, TypingIndicator,
};
use crate::services::auxiliary::{spawn_anti_idle, AutoRejoin};
use crate::services::command_dispatch::CommandDispatch;
use crate::services::correlator::{
    CooldownCorrelator, CooldownProtocol, Correlator, StatusCorrelator, StatusProtocol,
};
use crate::services::cycle_scheduler::CycleScheduler;
use crate::services::group_remediation::GroupRemediator;
use crate::services::notification_queue::NotificationQueue;
use crate::services::recovery_orchestrator::{OrchestratorParts, RecoveryOrchestrator};
use crate::services::response_matcher::{ResponseMatcher, GRAMMAR_VERSION};
use crate::services::shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};

const REPORT_CAPACITY: usize = 16;

/// Startup notification sent once per bootstrap.
pub fn startup_message(identity: Option<&str>) -> String {
    format!(
        "✅ **PPM Sentinel (v{})** Started. Monitoring for user ID: {}",
        env!("CARGO_PKG_VERSION"),
        identity.unwrap_or("unknown")
    )
}

/// State that exists between bootstrap and stop.
struct SessionRuntime {
    orchestrator: Arc<RecoveryOrchestrator>,
    scheduler: CycleScheduler,
    status: StatusCorrelator,
    start_ack: CooldownCorrelator,
    notifications: Arc<NotificationQueue>,
    auto_rejoin: Arc<AutoRejoin>,
    shutdown_trigger: ShutdownTrigger,
    shutdown: ShutdownSignal,
    typing_channel: String,
    typing: Option<Arc<dyn TypingIndicator>>,
    subscription: Option<(Arc<dyn EventSource>, SubscriptionId)>,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
    identity: Option<String>,
}

impl SessionRuntime {
    fn track(&self, handle: JoinHandle<()>) {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    async fn teardown(&self) {
        // Unblock waiters first so sequences see `stopped` right away.
        let status_pending = self.status.force_stop();
        let start_pending = self.start_ack.force_stop();
        self.shutdown_trigger.trigger();
        self.auto_rejoin.cancel();

        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in &tasks {
            task.abort();
        }

        self.notifications.clear();

        if let Some((source, id)) = &self.subscription {
            if let Err(e) = source.unsubscribe(*id).await {
                warn!(error = %e, "Failed to release event subscription");
            }
        }
        debug!(status_pending, start_pending, aborted = tasks.len(), "Session torn down");
    }
}

/// Public entry point: `start`, `stop` and the manual triggers.
pub struct Session {
    config: Config,
    host: Arc<dyn HostBindings>,
    settings: Settings,
    matcher: Arc<ResponseMatcher>,
    runtime: Mutex<Option<Arc<SessionRuntime>>>,
    reports: broadcast::Sender<CycleReport>,
}

impl Session {
    /// Idle session over `host`. Nothing runs until [`Session::start`].
    pub fn new(
        config: Config,
        host: Arc<dyn HostBindings>,
        settings_store: Arc<dyn SettingsStore>,
    ) -> Self {
        let (reports, _) = broadcast::channel(REPORT_CAPACITY);
        Self {
            config,
            host,
            settings: Settings::new(settings_store),
            matcher: Arc::new(ResponseMatcher::new()),
            runtime: Mutex::new(None),
            reports,
        }
    }

    /// Configuration the session was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reports of every finished cycle, scheduled or manual.
    pub fn subscribe_reports(&self) -> broadcast::Receiver<CycleReport> {
        self.reports.subscribe()
    }

    /// Bootstrap if needed and start the periodic scheduler.
    ///
    /// The first cycle runs immediately. Calling `start` on a running
    /// session is a no-op. A bootstrap failure leaves no timer running.
    pub async fn start(&self) -> DomainResult<()> {
        let runtime = match self.runtime().await {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "Bootstrap failed, scheduler not started");
                return Err(e);
            }
        };

        if runtime.scheduler.is_running() {
            debug!("Scheduler already running");
            return Ok(());
        }

        runtime.track(runtime.scheduler.start(runtime.shutdown.clone()));
        if let Some(typing) = runtime.typing.clone() {
            runtime.track(spawn_anti_idle(
                typing,
                self.settings.clone(),
                runtime.typing_channel.clone(),
                self.config.timing.anti_idle_interval(),
                runtime.shutdown.clone(),
            ));
        }
        info!(
            interval_s = self.config.timing.interval().as_secs(),
            identity = runtime.identity.as_deref().unwrap_or("unknown"),
            "Sentinel started"
        );
        Ok(())
    }

    /// Tear everything down. Pending waits resolve with `stopped`.
    pub async fn stop(&self) {
        let runtime = self.runtime.lock().await.take();
        match runtime {
            Some(runtime) => {
                runtime.teardown().await;
                info!("Sentinel stopped");
            }
            None => debug!("Stop requested but session was not running"),
        }
    }

    /// Whether a bootstrapped runtime exists.
    pub async fn is_active(&self) -> bool {
        self.runtime.lock().await.is_some()
    }

    /// Whether the periodic scheduler is running.
    pub async fn is_scheduled(&self) -> bool {
        self.runtime
            .lock()
            .await
            .as_ref()
            .is_some_and(|rt| rt.scheduler.is_running())
    }

    /// Run one cycle now and return its report.
    pub async fn run_check_now(&self) -> DomainResult<CycleReport> {
        let runtime = self.runtime().await?;
        let report = runtime.orchestrator.run_cycle(CycleTrigger::Manual).await;
        let _ = self.reports.send(report.clone());
        Ok(report)
    }

    /// Send a bare `/stop`. Returns whether the executor accepted it.
    pub async fn send_stop_now(&self) -> DomainResult<bool> {
        let runtime = self.runtime().await?;
        Ok(runtime.orchestrator.dispatch().send(&STOP).await)
    }

    /// Run the start-with-cooldown sequence now.
    pub async fn send_start_now(&self) -> DomainResult<StartOutcome> {
        let runtime = self.runtime().await?;
        Ok(runtime.orchestrator.start_with_cooldown().await)
    }

    /// Unsent notifications, oldest first. Empty when not bootstrapped.
    pub async fn pending_notifications(&self) -> Vec<String> {
        self.runtime
            .lock()
            .await
            .as_ref()
            .map(|rt| rt.notifications.pending())
            .unwrap_or_default()
    }

    async fn runtime(&self) -> DomainResult<Arc<SessionRuntime>> {
        let mut guard = self.runtime.lock().await;
        if let Some(runtime) = guard.as_ref() {
            return Ok(Arc::clone(runtime));
        }
        let runtime = Arc::new(self.bootstrap().await?);
        *guard = Some(Arc::clone(&runtime));
        Ok(runtime)
    }

    async fn bootstrap(&self) -> DomainResult<SessionRuntime> {
        info!(grammar_version = GRAMMAR_VERSION, "Bootstrapping session");

        let executor = self.host.command_executor().await.ok_or_else(|| {
            DomainError::BootstrapFailed("command executor not available".to_string())
        })?;

        let identity = match self.host.identity_provider().await {
            Some(provider) => match provider.current_identity().await {
                Ok(identity) => Some(identity.id),
                Err(e) => {
                    error!(error = %e, "Could not resolve current identity");
                    None
                }
            },
            None => {
                error!("Identity provider not available");
                None
            }
        };

        let sender = self.host.message_sender().await;
        if sender.is_none() {
            warn!("Message sender not available, notifications will be dropped");
        }
        let roles = self.host.role_directory().await;
        let typing = self.host.typing_indicator().await;

        let (shutdown_trigger, shutdown) = shutdown_channel();
        let notifications = Arc::new(NotificationQueue::new(
            self.config.notifications.max_queue_len,
        ));
        let drain = notifications.spawn_drain(
            sender.clone(),
            self.settings.clone(),
            &self.config.notifications,
            shutdown.clone(),
        );

        let status = Correlator::new(StatusProtocol::new(
            Arc::clone(&self.matcher),
            identity.clone(),
        ));
        let start_ack = Correlator::new(CooldownProtocol::new(Arc::clone(&self.matcher)));

        let dispatch = CommandDispatch::new(executor, &self.config.bot);
        let remediator = GroupRemediator::new(
            dispatch.clone(),
            roles,
            sender,
            Arc::clone(&notifications),
            self.settings.clone(),
            self.config.bot.clone(),
            self.config.timing.helper_stop_delay(),
        );
        let orchestrator = Arc::new(RecoveryOrchestrator::new(OrchestratorParts {
            dispatch,
            status: status.clone(),
            start_ack: start_ack.clone(),
            notifications: Arc::clone(&notifications),
            settings: self.settings.clone(),
            timing: self.config.timing.clone(),
            remediator,
            identity: identity.clone(),
            shutdown: shutdown.clone(),
        }));
        let auto_rejoin = Arc::new(AutoRejoin::new(
            Arc::clone(&orchestrator),
            Arc::clone(&notifications),
            self.config.timing.auto_rejoin_delay(),
        ));
        let scheduler = CycleScheduler::new(
            Arc::clone(&orchestrator),
            self.config.timing.interval(),
            self.reports.clone(),
        );

        let mut tasks = vec![drain];
        let subscription = match self.host.event_source().await {
            Some(source) => match source.subscribe().await {
                Ok(sub) => {
                    let routes = EventRoutes {
                        bot_id: self.config.bot.application_id.clone(),
                        channel_id: self.config.bot.channel_id.clone(),
                        matcher: Arc::clone(&self.matcher),
                        status: status.clone(),
                        start_ack: start_ack.clone(),
                        auto_rejoin: Arc::clone(&auto_rejoin),
                    };
                    tasks.push(spawn_event_pump(routes, sub.events, shutdown.clone()));
                    Some((source, sub.id))
                }
                Err(e) => {
                    error!(error = %e, "Event subscription failed, replies will time out");
                    None
                }
            },
            None => {
                error!("Event source not available, replies will time out");
                None
            }
        };

        if self.settings.notification_channel_id().is_some() {
            notifications.enqueue(startup_message(identity.as_deref()));
        }
        info!(identity = identity.as_deref().unwrap_or("unknown"), "Session bootstrapped");

        Ok(SessionRuntime {
            orchestrator,
            scheduler,
            status,
            start_ack,
            notifications,
            auto_rejoin,
            shutdown_trigger,
            shutdown,
            typing_channel: self.config.bot.channel_id.clone(),
            typing,
            subscription,
            tasks: StdMutex::new(tasks),
            identity,
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("channel_id", &self.config.bot.channel_id)
            .finish_non_exhaustive()
    }
}
