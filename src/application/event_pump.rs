//! Routes inbound messages to the correlators and the auto-kick watcher.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::domain::models::InboundMessage;
use crate::services::auxiliary::AutoRejoin;
use crate::services::correlator::{CooldownCorrelator, StatusCorrelator};
use crate::services::response_matcher::ResponseMatcher;
use crate::services::shutdown::ShutdownSignal;

/// Everything the pump hands events to.
pub struct EventRoutes {
    pub bot_id: String,
    pub channel_id: String,
    pub matcher: Arc<ResponseMatcher>,
    pub status: StatusCorrelator,
    pub start_ack: CooldownCorrelator,
    pub auto_rejoin: Arc<AutoRejoin>,
}

impl EventRoutes {
    /// Handle one message.
    ///
    /// Only the bot's own messages count. Direct messages are checked for
    /// an auto-kick notice; messages in the command channel are offered to
    /// both correlators.
    pub fn route(&self, message: &InboundMessage, shutdown: &ShutdownSignal) {
        if message.author_id != self.bot_id {
            return;
        }

        if message.is_direct {
            if self
                .matcher
                .match_auto_kick(message.title(), &message.body())
            {
                self.auto_rejoin.schedule(shutdown.clone());
            }
            return;
        }

        if message.channel_id != self.channel_id {
            return;
        }

        let spans = message.text_spans();
        trace!(kind = ?message.kind, spans = spans.len(), "Candidate bot message");
        let resolved_status = self.status.on_candidate_event(&spans);
        let resolved_start = self.start_ack.on_candidate_event(&spans);
        if resolved_status || resolved_start {
            debug!(resolved_status, resolved_start, "Bot message resolved a wait");
        }
    }
}

/// Drain `events` into `routes` until the stream ends or `shutdown` fires.
pub fn spawn_event_pump(
    routes: EventRoutes,
    mut events: mpsc::Receiver<InboundMessage>,
    mut shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                message = events.recv() => match message {
                    Some(message) => routes.route(&message, &shutdown),
                    None => {
                        debug!("Event stream closed");
                        break;
                    }
                },
                () = shutdown.triggered() => break,
            }
        }
    })
}
