//! Outbound notification queue.
//!
//! Messages are sent in FIFO order to the configured notification channel,
//! at most one per `min_send_interval`. The backlog is bounded; overflow
//! drops the oldest unsent message. A rate-limit signal from the sender puts
//! the message back at the head and pauses draining with exponential
//! backoff. A message put back is never the one trimmed for it.

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::models::{NotificationConfig, Settings};
use crate::domain::ports::MessageSender;
use crate::services::shutdown::ShutdownSignal;

/// Bounded FIFO of unsent notifications.
#[derive(Debug)]
pub struct NotificationQueue {
    entries: Mutex<VecDeque<String>>,
    max_len: usize,
    wakeup: Notify,
}

impl NotificationQueue {
    /// Empty queue holding at most `max_len` messages (at least one).
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            max_len: max_len.max(1),
            wakeup: Notify::new(),
        }
    }

    /// Append a message, dropping the oldest entries past capacity.
    pub fn enqueue(&self, message: impl Into<String>) {
        let mut entries = self.lock();
        entries.push_back(message.into());
        self.trim(&mut entries);
        drop(entries);
        self.wakeup.notify_one();
    }

    /// Snapshot of unsent messages, oldest first.
    pub fn pending(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    /// Number of unsent messages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is waiting to be sent.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Discard every unsent message.
    pub fn clear(&self) {
        let dropped = {
            let mut entries = self.lock();
            let n = entries.len();
            entries.clear();
            n
        };
        if dropped > 0 {
            debug!(dropped, "Notification queue cleared");
        }
    }

    fn pop(&self) -> Option<String> {
        self.lock().pop_front()
    }

    /// Put a message that could not be sent back at the head. If the
    /// backlog filled up meanwhile, the oldest entry behind it is dropped.
    fn requeue_front(&self, message: String) {
        let mut entries = self.lock();
        entries.push_front(message);
        while entries.len() > self.max_len {
            if let Some(dropped) = entries.remove(1) {
                warn!(max_len = self.max_len, dropped = %dropped, "Notification queue full, dropping oldest");
            }
        }
    }

    fn trim(&self, entries: &mut VecDeque<String>) {
        while entries.len() > self.max_len {
            if let Some(dropped) = entries.pop_front() {
                warn!(max_len = self.max_len, dropped = %dropped, "Notification queue full, dropping oldest");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the drain loop. It runs until `shutdown` fires.
    pub fn spawn_drain(
        self: &Arc<Self>,
        sender: Option<Arc<dyn MessageSender>>,
        settings: Settings,
        config: &NotificationConfig,
        shutdown: ShutdownSignal,
    ) -> JoinHandle<()> {
        let drain = Drain {
            queue: Arc::clone(self),
            sender,
            settings,
            limiter: Quota::with_period(Duration::from_millis(config.min_send_interval_ms))
                .map(RateLimiter::direct),
            backoff: rate_limit_backoff(config),
            shutdown,
        };
        tokio::spawn(drain.run())
    }
}

fn rate_limit_backoff(config: &NotificationConfig) -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(config.rate_limit_backoff_ms))
        .with_max_interval(Duration::from_millis(
            config.max_rate_limit_backoff_ms.max(config.rate_limit_backoff_ms),
        ))
        .with_multiplier(2.0)
        .with_randomization_factor(0.0)
        .with_max_elapsed_time(None)
        .build()
}

struct Drain {
    queue: Arc<NotificationQueue>,
    sender: Option<Arc<dyn MessageSender>>,
    settings: Settings,
    limiter: Option<DefaultDirectRateLimiter>,
    backoff: ExponentialBackoff,
    shutdown: ShutdownSignal,
}

impl Drain {
    async fn run(mut self) {
        debug!("Notification drain started");
        loop {
            let Some(message) = self.queue.pop() else {
                tokio::select! {
                    () = self.queue.wakeup.notified() => {}
                    () = self.shutdown.triggered() => break,
                }
                continue;
            };

            if let Some(limiter) = &self.limiter {
                tokio::select! {
                    () = limiter.until_ready() => {}
                    () = self.shutdown.triggered() => break,
                }
            }

            let Some(channel_id) = self.settings.notification_channel_id() else {
                warn!("No notification channel configured, dropping notification");
                continue;
            };
            let Some(sender) = self.sender.as_ref() else {
                warn!("No message sender available, dropping notification");
                continue;
            };

            match sender.send(&channel_id, &message).await {
                Ok(()) => {
                    self.backoff.reset();
                    info!(channel_id = %channel_id, "Notification sent");
                }
                Err(e) if e.is_rate_limited() => {
                    self.queue.requeue_front(message);
                    let delay = match e {
                        DomainError::RateLimited {
                            retry_after_ms: Some(ms),
                        } => Duration::from_millis(ms),
                        _ => self
                            .backoff
                            .next_backoff()
                            .unwrap_or(self.backoff.max_interval),
                    };
                    warn!(
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Rate limited, pausing notifications"
                    );
                    if !self.shutdown.sleep(delay).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, channel_id = %channel_id, "Failed to send notification");
                }
            }
        }
        debug!("Notification drain stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainResult;
    use crate::domain::models::{SettingKey, SettingValue};
    use crate::infrastructure::settings::StaticSettings;
    use crate::services::shutdown::shutdown_channel;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Fills the queue during its first send, then reports a rate limit.
    struct FillingSender {
        queue: Arc<NotificationQueue>,
        limited: AtomicBool,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageSender for FillingSender {
        async fn send(&self, _channel_id: &str, content: &str) -> DomainResult<()> {
            if !self.limited.swap(true, Ordering::SeqCst) {
                self.queue.enqueue("b");
                self.queue.enqueue("c");
                return Err(DomainError::RateLimited {
                    retry_after_ms: Some(1_000),
                });
            }
            self.sent.lock().unwrap().push(content.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_overflow_keeps_most_recent_in_order() {
        let queue = NotificationQueue::new(20);
        for i in 0..25 {
            queue.enqueue(format!("msg {i}"));
        }
        let pending = queue.pending();
        assert_eq!(pending.len(), 20);
        assert_eq!(pending.first().map(String::as_str), Some("msg 5"));
        assert_eq!(pending.last().map(String::as_str), Some("msg 24"));
        assert!(pending.windows(2).all(|w| {
            let a: u32 = w[0].trim_start_matches("msg ").parse().unwrap();
            let b: u32 = w[1].trim_start_matches("msg ").parse().unwrap();
            a + 1 == b
        }));
    }

    #[test]
    fn test_requeue_goes_to_front() {
        let queue = NotificationQueue::new(5);
        queue.enqueue("b");
        queue.enqueue("c");
        queue.requeue_front("a".to_string());
        assert_eq!(queue.pending(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_requeue_into_full_queue_keeps_requeued_message() {
        let queue = NotificationQueue::new(2);
        queue.enqueue("a");
        queue.enqueue("b");
        let in_flight = queue.pop().unwrap();
        queue.enqueue("c");
        queue.requeue_front(in_flight);
        assert_eq!(queue.pending(), vec!["a", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_message_survives_overflow_during_send() {
        let queue = Arc::new(NotificationQueue::new(2));
        let sender = Arc::new(FillingSender {
            queue: Arc::clone(&queue),
            limited: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        });
        let store = StaticSettings::new();
        store.set(
            SettingKey::NotificationChannelId,
            SettingValue::Text("notify".to_string()),
        );
        let config = NotificationConfig {
            max_queue_len: 2,
            min_send_interval_ms: 0,
            ..Default::default()
        };
        let (trigger, signal) = shutdown_channel();
        let drain = queue.spawn_drain(
            Some(sender.clone() as Arc<dyn MessageSender>),
            Settings::new(Arc::new(store)),
            &config,
            signal,
        );

        queue.enqueue("a");
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(*sender.sent.lock().unwrap(), vec!["a", "c"]);
        assert!(queue.is_empty());
        trigger.trigger();
        drain.await.unwrap();
    }

    #[test]
    fn test_clear_empties() {
        let queue = NotificationQueue::new(5);
        queue.enqueue("x");
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_backoff_doubles_up_to_ceiling() {
        let config = NotificationConfig {
            rate_limit_backoff_ms: 10_000,
            max_rate_limit_backoff_ms: 30_000,
            ..Default::default()
        };
        let mut backoff = rate_limit_backoff(&config);
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(10)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(20)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(30)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(30)));
    }
}
