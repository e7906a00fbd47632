//! Single-slot correlation of a command with the bot's asynchronous reply.
//!
//! A [`Correlator`] holds at most one pending wait. The wait completes
//! exactly once, from whichever comes first:
//! - a candidate event the protocol can extract an outcome from,
//! - the timeout, classified by whether any candidate event was seen,
//! - an explicit [`Correlator::force_resolve`] (session stop).
//!
//! A second `begin_wait` while the slot is armed completes immediately with
//! the protocol's race outcome and leaves the armed slot untouched.
//!
//! Dropping a wait future before it completes disarms its slot, so an
//! aborted caller never leaves the correlator busy.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::domain::models::{CheckResult, CooldownOutcome, StatusReply};
use crate::services::response_matcher::{MatchOutcome, ResponseMatcher};

/// How a correlator turns candidate events into outcomes.
pub trait ReplyProtocol: Send + Sync + 'static {
    /// What a completed wait yields.
    type Outcome: Send + 'static;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Outcome carried by one event, or `None` to keep waiting.
    ///
    /// `spans` are the event's separately rendered parts in reading order.
    fn extract(&self, spans: &[&str]) -> Option<Self::Outcome>;

    /// Outcome when the timer fires. `last_seen` is the most recent
    /// candidate event text, if any arrived.
    fn timed_out(&self, last_seen: Option<&str>) -> Self::Outcome;

    /// Outcome for a wait begun while another one is armed.
    fn race(&self) -> Self::Outcome;

    /// Outcome for a wait ended by shutdown.
    fn stopped(&self) -> Self::Outcome;
}

struct PendingSlot<O> {
    generation: u64,
    resolver: oneshot::Sender<O>,
    last_seen: Option<String>,
    timer: Option<JoinHandle<()>>,
}

impl<O> PendingSlot<O> {
    fn resolve(self, outcome: O) {
        if let Some(timer) = self.timer {
            timer.abort();
        }
        // The waiter may have been dropped; nothing to do then.
        let _ = self.resolver.send(outcome);
    }
}

struct SlotState<O> {
    slot: Option<PendingSlot<O>>,
    next_generation: u64,
}

/// Disarms the slot of a wait whose future is dropped before completion.
struct ReleaseOnDrop<O> {
    state: Arc<Mutex<SlotState<O>>>,
    generation: u64,
    name: &'static str,
}

impl<O> Drop for ReleaseOnDrop<O> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.slot.as_ref().map(|s| s.generation) != Some(self.generation) {
            return;
        }
        if let Some(slot) = state.slot.take() {
            drop(state);
            if let Some(timer) = slot.timer {
                timer.abort();
            }
            debug!(protocol = self.name, generation = self.generation, "Waiter dropped, slot released");
        }
    }
}

/// Single-slot pending-result primitive.
pub struct Correlator<P: ReplyProtocol> {
    protocol: Arc<P>,
    state: Arc<Mutex<SlotState<P::Outcome>>>,
}

impl<P: ReplyProtocol> Clone for Correlator<P> {
    fn clone(&self) -> Self {
        Self {
            protocol: Arc::clone(&self.protocol),
            state: Arc::clone(&self.state),
        }
    }
}

impl<P: ReplyProtocol> Correlator<P> {
    /// Idle correlator driven by `protocol`.
    pub fn new(protocol: P) -> Self {
        Self {
            protocol: Arc::new(protocol),
            state: Arc::new(Mutex::new(SlotState {
                slot: None,
                next_generation: 0,
            })),
        }
    }

    /// The protocol this correlator was built with.
    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    /// Arm the slot and return a future completing with its outcome.
    ///
    /// The slot is armed before this returns, so events delivered before
    /// the future is first polled are not lost. Must be called inside a
    /// Tokio runtime.
    pub fn begin_wait(&self, timeout: Duration) -> impl Future<Output = P::Outcome> + Send + 'static {
        let stopped = self.protocol.stopped();
        let armed = self.arm(timeout);

        async move {
            match armed {
                Ok((receiver, _release)) => receiver.await.unwrap_or(stopped),
                Err(race) => race,
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn arm(
        &self,
        timeout: Duration,
    ) -> Result<(oneshot::Receiver<P::Outcome>, ReleaseOnDrop<P::Outcome>), P::Outcome> {
        let mut state = self.lock();
        if state.slot.is_some() {
            debug!(protocol = self.protocol.name(), "Wait already pending, reporting race");
            return Err(self.protocol.race());
        }

        let generation = state.next_generation;
        state.next_generation = state.next_generation.wrapping_add(1);

        let (resolver, receiver) = oneshot::channel();
        let timer = tokio::spawn(Self::expire_after(
            Arc::clone(&self.state),
            Arc::clone(&self.protocol),
            generation,
            timeout,
        ));

        state.slot = Some(PendingSlot {
            generation,
            resolver,
            last_seen: None,
            timer: Some(timer),
        });
        trace!(
            protocol = self.protocol.name(),
            generation,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "Armed wait"
        );
        let release = ReleaseOnDrop {
            state: Arc::clone(&self.state),
            generation,
            name: self.protocol.name(),
        };
        Ok((receiver, release))
    }

    async fn expire_after(
        state: Arc<Mutex<SlotState<P::Outcome>>>,
        protocol: Arc<P>,
        generation: u64,
        timeout: Duration,
    ) {
        tokio::time::sleep(timeout).await;

        let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
        let current = guard.slot.as_ref().map(|s| s.generation);
        if current != Some(generation) {
            return;
        }
        if let Some(mut slot) = guard.slot.take() {
            drop(guard);
            let outcome = protocol.timed_out(slot.last_seen.as_deref());
            debug!(protocol = protocol.name(), generation, seen = slot.last_seen.is_some(), "Wait timed out");
            // Resolving from inside the timer task; aborting ourselves is pointless.
            slot.timer = None;
            slot.resolve(outcome);
        }
    }

    /// Offer an inbound event that passed the channel and author filter.
    ///
    /// `spans` are the message parts from [`InboundMessage::text_spans`].
    /// Marks the slot as having seen a reply even when nothing can be
    /// extracted. Returns true if the event resolved the slot.
    ///
    /// [`InboundMessage::text_spans`]: crate::domain::models::InboundMessage::text_spans
    pub fn on_candidate_event(&self, spans: &[&str]) -> bool {
        let mut state = self.lock();
        let Some(slot) = state.slot.as_mut() else {
            return false;
        };
        slot.last_seen = Some(spans.join("\n"));

        let Some(outcome) = self.protocol.extract(spans) else {
            return false;
        };
        if let Some(slot) = state.slot.take() {
            drop(state);
            debug!(protocol = self.protocol.name(), generation = slot.generation, "Wait resolved by event");
            slot.resolve(outcome);
        }
        true
    }

    /// Resolve any armed slot with `outcome`. No-op when nothing is pending.
    pub fn force_resolve(&self, outcome: P::Outcome) -> bool {
        let taken = self.lock().slot.take();
        let Some(slot) = taken else {
            return false;
        };
        debug!(protocol = self.protocol.name(), generation = slot.generation, "Wait force-resolved");
        slot.resolve(outcome);
        true
    }

    /// Resolve any armed slot with the stopped outcome.
    pub fn force_stop(&self) -> bool {
        self.force_resolve(self.protocol.stopped())
    }

    /// Whether a wait is armed.
    pub fn is_pending(&self) -> bool {
        self.lock().slot.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState<P::Outcome>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Waits for the status reply to `/ppm`.
#[derive(Debug, Clone)]
pub struct StatusProtocol {
    matcher: Arc<ResponseMatcher>,
    identity: Option<String>,
}

impl StatusProtocol {
    /// Without an identity only the offline sentinel can resolve a wait.
    pub fn new(matcher: Arc<ResponseMatcher>, identity: Option<String>) -> Self {
        Self { matcher, identity }
    }

    fn reply(&self, result: CheckResult, text: &str) -> StatusReply {
        StatusReply {
            result,
            roster: self.matcher.match_roster(text),
        }
    }
}

impl ReplyProtocol for StatusProtocol {
    type Outcome = StatusReply;

    fn name(&self) -> &'static str {
        "status"
    }

    /// The offline sentinel anywhere in the event wins. Otherwise the
    /// first span holding our mention and a value decides; a mention in
    /// one span never pairs with a value from another.
    fn extract(&self, spans: &[&str]) -> Option<StatusReply> {
        let text = spans.join("\n");
        if self.matcher.is_offline(&text) {
            return Some(self.reply(CheckResult::Offline, &text));
        }

        let identity = self.identity.as_deref().unwrap_or("");
        spans.iter().find_map(|span| match self.matcher.match_status(span, identity) {
            MatchOutcome::Value(v) => Some(self.reply(CheckResult::Value(v), &text)),
            MatchOutcome::Offline | MatchOutcome::NoMatch => None,
        })
    }

    fn timed_out(&self, last_seen: Option<&str>) -> StatusReply {
        match last_seen {
            Some(text) => self.reply(CheckResult::MissingIdentity, text),
            None => StatusReply::bare(CheckResult::Timeout),
        }
    }

    fn race(&self) -> StatusReply {
        StatusReply::bare(CheckResult::RaceCondition)
    }

    fn stopped(&self) -> StatusReply {
        StatusReply::bare(CheckResult::Stopped)
    }
}

/// Waits for the bot to acknowledge `/start`.
///
/// Any reply resolves the wait: with the cooldown it asks for, or success.
#[derive(Debug, Clone)]
pub struct CooldownProtocol {
    matcher: Arc<ResponseMatcher>,
}

impl CooldownProtocol {
    /// Protocol reading cooldowns with `matcher`.
    pub fn new(matcher: Arc<ResponseMatcher>) -> Self {
        Self { matcher }
    }
}

impl ReplyProtocol for CooldownProtocol {
    type Outcome = CooldownOutcome;

    fn name(&self) -> &'static str {
        "start_ack"
    }

    fn extract(&self, spans: &[&str]) -> Option<CooldownOutcome> {
        Some(
            self.matcher
                .match_cooldown(&spans.join("\n"))
                .map_or(CooldownOutcome::Success, CooldownOutcome::Cooldown),
        )
    }

    fn timed_out(&self, _last_seen: Option<&str>) -> CooldownOutcome {
        CooldownOutcome::Timeout
    }

    fn race(&self) -> CooldownOutcome {
        CooldownOutcome::RaceCondition
    }

    fn stopped(&self) -> CooldownOutcome {
        CooldownOutcome::Stopped
    }
}

/// Correlator for status replies.
pub type StatusCorrelator = Correlator<StatusProtocol>;

/// Correlator for start acknowledgements.
pub type CooldownCorrelator = Correlator<CooldownProtocol>;
