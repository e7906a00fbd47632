//! Best-effort command issuing.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::command::option_values;
use crate::domain::models::{BotConfig, CommandDescriptor, CommandTarget, OptionValues};
use crate::domain::ports::CommandExecutor;

/// Issues commands and swallows failures after logging them.
///
/// A failed command never aborts the sequence that issued it; the next cycle
/// retries anyway.
#[derive(Clone)]
pub struct CommandDispatch {
    executor: Arc<dyn CommandExecutor>,
    primary: CommandTarget,
    group: CommandTarget,
}

impl CommandDispatch {
    /// Dispatch through `executor` to the channels named in `bot`.
    pub fn new(executor: Arc<dyn CommandExecutor>, bot: &BotConfig) -> Self {
        Self {
            executor,
            primary: CommandTarget {
                channel_id: bot.channel_id.clone(),
                guild_id: bot.guild_id.clone(),
            },
            group: CommandTarget {
                channel_id: bot.group_channel_id().to_string(),
                guild_id: bot.guild_id.clone(),
            },
        }
    }

    /// Command channel target.
    pub fn primary(&self) -> &CommandTarget {
        &self.primary
    }

    /// Target for group-level commands.
    pub fn group(&self) -> &CommandTarget {
        &self.group
    }

    /// Issue `command` without options in the command channel.
    pub async fn send(&self, command: &CommandDescriptor) -> bool {
        self.send_with(command, &OptionValues::new(), &self.primary).await
    }

    /// Issue `command` with a single option.
    pub async fn send_option(
        &self,
        command: &CommandDescriptor,
        name: &str,
        value: &str,
        target: &CommandTarget,
    ) -> bool {
        self.send_with(command, &option_values([(name, value)]), target)
            .await
    }

    /// Issue `command`. Returns whether the executor accepted it.
    pub async fn send_with(
        &self,
        command: &CommandDescriptor,
        options: &OptionValues,
        target: &CommandTarget,
    ) -> bool {
        info!(command = command.name, channel_id = %target.channel_id, "Executing command");
        match self.executor.execute(command, options, target).await {
            Ok(()) => true,
            Err(e) => {
                warn!(command = command.name, error = %e, "Command failed, continuing");
                false
            }
        }
    }
}

impl std::fmt::Debug for CommandDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatch")
            .field("primary", &self.primary)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}
