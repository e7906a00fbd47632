//! Outbound text message port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Posts plain text to a channel.
///
/// A throttled send must fail with `DomainError::RateLimited` so the
/// notification queue can back off instead of dropping the message.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, channel_id: &str, content: &str) -> DomainResult<()>;
}
