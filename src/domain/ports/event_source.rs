//! Inbound message subscription port.

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::InboundMessage;

/// Handle identifying one subscription.
pub type SubscriptionId = Uuid;

/// A live subscription to the host's message stream.
///
/// Events stop arriving once the source drops its sender, which happens on
/// [`EventSource::unsubscribe`].
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub events: mpsc::Receiver<InboundMessage>,
}

/// Source of message-created and message-updated events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Start receiving every inbound message event.
    async fn subscribe(&self) -> DomainResult<Subscription>;

    /// Release a subscription. Unknown ids are ignored.
    async fn unsubscribe(&self, id: SubscriptionId) -> DomainResult<()>;
}
