//! Lookup of host collaborators.

use async_trait::async_trait;
use std::sync::Arc;

use super::{
    CommandExecutor, EventSource, IdentityProvider, MessageSender, RoleDirectory, TypingIndicator,
};

/// Locates the host's collaborators at bootstrap.
///
/// Any of them may be missing. Only a missing command executor is fatal;
/// the session degrades gracefully without the others.
#[async_trait]
pub trait HostBindings: Send + Sync {
    async fn command_executor(&self) -> Option<Arc<dyn CommandExecutor>>;
    async fn message_sender(&self) -> Option<Arc<dyn MessageSender>>;
    async fn event_source(&self) -> Option<Arc<dyn EventSource>>;
    async fn identity_provider(&self) -> Option<Arc<dyn IdentityProvider>>;
    async fn role_directory(&self) -> Option<Arc<dyn RoleDirectory>>;
    async fn typing_indicator(&self) -> Option<Arc<dyn TypingIndicator>>;
}
