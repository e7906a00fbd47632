//! Session-wide stop signal.

use std::time::Duration;
use tokio::sync::watch;

/// Fires the stop signal for every [`ShutdownSignal`] cloned from it.
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    /// Fire the signal.
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

/// Observes the stop signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

/// A fresh, untriggered signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), ShutdownSignal(rx))
}

impl ShutdownSignal {
    /// Whether the signal has fired.
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Completes once the signal fires or its trigger is dropped.
    pub async fn triggered(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }

    /// Sleep for `duration`. Returns false if interrupted by the signal.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        tokio::select! {
            () = tokio::time::sleep(duration) => true,
            () = self.triggered() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_trigger() {
        let (_trigger, mut signal) = shutdown_channel();
        assert!(signal.sleep(Duration::from_secs(60)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_interrupts_sleep() {
        let (trigger, mut signal) = shutdown_channel();
        let sleeper = tokio::spawn(async move { signal.sleep(Duration::from_secs(3600)).await });
        tokio::task::yield_now().await;
        trigger.trigger();
        assert!(!sleeper.await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_trigger_counts_as_triggered() {
        let (trigger, mut signal) = shutdown_channel();
        drop(trigger);
        signal.triggered().await;
    }
}
