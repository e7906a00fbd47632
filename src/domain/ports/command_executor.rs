//! Command execution port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CommandDescriptor, CommandTarget, OptionValues};

/// Issues a slash command to the bot on behalf of the current user.
///
/// Implementations may fail for any reason; callers log and continue.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(
        &self,
        command: &CommandDescriptor,
        options: &OptionValues,
        target: &CommandTarget,
    ) -> DomainResult<()>;
}
