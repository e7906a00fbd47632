//! In-process host for tests and the simulator.
//!
//! Implements every port against shared in-memory state: commands and sent
//! messages are recorded, scripted bot replies are delivered to subscribers
//! after a delay, and faults can be injected per command or per send.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    BotConfig, CommandDescriptor, CommandTarget, Embed, InboundMessage, MessageEventKind,
    OptionValues,
};
use crate::domain::ports::{
    CommandExecutor, EventSource, HostBindings, Identity, IdentityProvider, MessageSender,
    RoleDirectory, Subscription, SubscriptionId, TypingIndicator,
};

const SUBSCRIBER_BUFFER: usize = 64;

/// Default delay before a scripted reply shows up.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(500);

/// A bot message delivered some time after a command runs.
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    /// Time between the command and the reply.
    pub delay: Duration,
    /// The reply itself.
    pub message: InboundMessage,
}

/// A command the sentinel issued.
#[derive(Debug, Clone)]
pub struct ExecutedCommand {
    /// Slash command name without the slash.
    pub name: String,
    /// Option values passed with it.
    pub options: OptionValues,
    /// Channel the command ran in.
    pub channel_id: String,
    /// When it ran.
    pub at: Instant,
}

/// A message the sentinel posted.
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Destination channel.
    pub channel_id: String,
    /// Message text.
    pub content: String,
    /// When it was accepted.
    pub at: Instant,
}

/// Injected outcome for the next send.
#[derive(Debug, Clone)]
pub enum SendFault {
    /// Report a rate limit, optionally with the server's retry hint.
    RateLimited {
        /// Suggested wait before retrying.
        retry_after_ms: Option<u64>,
    },
    /// Fail with this reason.
    Fail(String),
}

#[derive(Debug)]
struct HostState {
    executor_available: bool,
    sender_available: bool,
    events_available: bool,
    identity: Option<String>,
    roles: HashSet<(String, String)>,
    failing_commands: HashSet<String>,
    replies: HashMap<String, VecDeque<ScriptedReply>>,
    send_faults: VecDeque<SendFault>,
    subscribers: HashMap<SubscriptionId, mpsc::Sender<InboundMessage>>,
    commands: Vec<ExecutedCommand>,
    sent: Vec<SentMessage>,
    typing: Vec<String>,
}

/// Shared in-memory host. Clones share state.
#[derive(Debug, Clone)]
pub struct InMemoryHost {
    bot_id: String,
    channel_id: String,
    state: Arc<Mutex<HostState>>,
}

impl InMemoryHost {
    /// Host for the bot and channel named in `bot`, with every port up.
    pub fn new(bot: &BotConfig) -> Self {
        Self {
            bot_id: bot.application_id.clone(),
            channel_id: bot.channel_id.clone(),
            state: Arc::new(Mutex::new(HostState {
                executor_available: true,
                sender_available: true,
                events_available: true,
                identity: None,
                roles: HashSet::new(),
                failing_commands: HashSet::new(),
                replies: HashMap::new(),
                send_faults: VecDeque::new(),
                subscribers: HashMap::new(),
                commands: Vec::new(),
                sent: Vec::new(),
                typing: Vec::new(),
            })),
        }
    }

    /// Set the identity the sentinel runs as.
    #[must_use]
    pub fn with_identity(self, id: impl Into<String>) -> Self {
        self.lock().identity = Some(id.into());
        self
    }

    /// Toggle the command executor port.
    pub fn set_executor_available(&self, available: bool) {
        self.lock().executor_available = available;
    }

    /// Toggle the message sender port.
    pub fn set_sender_available(&self, available: bool) {
        self.lock().sender_available = available;
    }

    /// Toggle the event source port.
    pub fn set_events_available(&self, available: bool) {
        self.lock().events_available = available;
    }

    /// Give `identity` the role `role`.
    pub fn grant_role(&self, identity: &str, role: &str) {
        self.lock()
            .roles
            .insert((identity.to_string(), role.to_string()));
    }

    /// Take the role `role` away from `identity`.
    pub fn revoke_role(&self, identity: &str, role: &str) {
        self.lock()
            .roles
            .remove(&(identity.to_string(), role.to_string()));
    }

    /// Make every execution of `command` fail.
    pub fn fail_command(&self, command: &str) {
        self.lock().failing_commands.insert(command.to_string());
    }

    /// Queue a bot reply in the command channel for the next `command`.
    pub fn script_reply(&self, command: &str, content: impl Into<String>) {
        self.script_reply_after(command, content, DEFAULT_REPLY_DELAY);
    }

    /// Like [`Self::script_reply`] with an explicit delay.
    pub fn script_reply_after(&self, command: &str, content: impl Into<String>, delay: Duration) {
        let message = self.bot_message(content);
        self.script_message(command, message, delay);
    }

    /// Queue an arbitrary message for the next `command`. Replies are
    /// consumed in order, one per execution.
    pub fn script_message(&self, command: &str, message: InboundMessage, delay: Duration) {
        self.lock()
            .replies
            .entry(command.to_string())
            .or_default()
            .push_back(ScriptedReply { delay, message });
    }

    /// Fail the next send with `fault`.
    pub fn push_send_fault(&self, fault: SendFault) {
        self.lock().send_faults.push_back(fault);
    }

    /// A message from the bot in the command channel.
    pub fn bot_message(&self, content: impl Into<String>) -> InboundMessage {
        InboundMessage {
            kind: MessageEventKind::Created,
            channel_id: self.channel_id.clone(),
            author_id: self.bot_id.clone(),
            is_direct: false,
            content: content.into(),
            embeds: Vec::new(),
        }
    }

    /// A direct message from the bot carrying one embed.
    pub fn direct_message(&self, title: &str, description: &str) -> InboundMessage {
        InboundMessage {
            kind: MessageEventKind::Created,
            channel_id: "dm".to_string(),
            author_id: self.bot_id.clone(),
            is_direct: true,
            content: String::new(),
            embeds: vec![Embed {
                title: Some(title.to_string()),
                description: Some(description.to_string()),
                fields: Vec::new(),
            }],
        }
    }

    /// Push `message` to every live subscriber.
    pub fn deliver(&self, message: &InboundMessage) {
        let subscribers: Vec<mpsc::Sender<InboundMessage>> =
            self.lock().subscribers.values().cloned().collect();
        for tx in subscribers {
            if let Err(e) = tx.try_send(message.clone()) {
                debug!(error = %e, "Subscriber did not take message");
            }
        }
    }

    /// Every command issued so far, in order.
    pub fn commands(&self) -> Vec<ExecutedCommand> {
        self.lock().commands.clone()
    }

    /// Names of the commands issued so far.
    pub fn command_names(&self) -> Vec<String> {
        self.lock().commands.iter().map(|c| c.name.clone()).collect()
    }

    /// Every message posted so far.
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.lock().sent.clone()
    }

    /// Contents posted to `channel_id`, in order.
    pub fn sent_to(&self, channel_id: &str) -> Vec<String> {
        self.lock()
            .sent
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .map(|m| m.content.clone())
            .collect()
    }

    /// Channels a typing indicator was shown in, one entry per call.
    pub fn typing_channels(&self) -> Vec<String> {
        self.lock().typing.clone()
    }

    /// Live event subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CommandExecutor for InMemoryHost {
    async fn execute(
        &self,
        command: &CommandDescriptor,
        options: &OptionValues,
        target: &CommandTarget,
    ) -> DomainResult<()> {
        let (failing, reply) = {
            let mut state = self.lock();
            state.commands.push(ExecutedCommand {
                name: command.name.to_string(),
                options: options.clone(),
                channel_id: target.channel_id.clone(),
                at: Instant::now(),
            });
            let failing = state.failing_commands.contains(command.name);
            let reply = state
                .replies
                .get_mut(command.name)
                .and_then(VecDeque::pop_front);
            (failing, reply)
        };
        trace!(command = command.name, "In-memory command executed");

        if failing {
            return Err(DomainError::CommandFailed {
                command: command.name.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        if let Some(reply) = reply {
            let host = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(reply.delay).await;
                host.deliver(&reply.message);
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EventSource for InMemoryHost {
    async fn subscribe(&self) -> DomainResult<Subscription> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = Uuid::new_v4();
        self.lock().subscribers.insert(id, tx);
        Ok(Subscription { id, events: rx })
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> DomainResult<()> {
        self.lock().subscribers.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl MessageSender for InMemoryHost {
    async fn send(&self, channel_id: &str, content: &str) -> DomainResult<()> {
        let mut state = self.lock();
        match state.send_faults.pop_front() {
            Some(SendFault::RateLimited { retry_after_ms }) => {
                Err(DomainError::RateLimited { retry_after_ms })
            }
            Some(SendFault::Fail(reason)) => Err(DomainError::SendFailed {
                channel_id: channel_id.to_string(),
                reason,
            }),
            None => {
                state.sent.push(SentMessage {
                    channel_id: channel_id.to_string(),
                    content: content.to_string(),
                    at: Instant::now(),
                });
                Ok(())
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryHost {
    async fn current_identity(&self) -> DomainResult<Identity> {
        self.lock()
            .identity
            .clone()
            .map(|id| Identity { id })
            .ok_or_else(|| DomainError::IdentityUnavailable("no identity configured".to_string()))
    }
}

#[async_trait]
impl RoleDirectory for InMemoryHost {
    async fn has_role(&self, identity_id: &str, role_id: &str) -> DomainResult<bool> {
        Ok(self
            .lock()
            .roles
            .contains(&(identity_id.to_string(), role_id.to_string())))
    }
}

impl TypingIndicator for InMemoryHost {
    fn start_typing(&self, channel_id: &str) {
        self.lock().typing.push(channel_id.to_string());
    }
}

#[async_trait]
impl HostBindings for InMemoryHost {
    async fn command_executor(&self) -> Option<Arc<dyn CommandExecutor>> {
        let available = self.lock().executor_available;
        available.then(|| Arc::new(self.clone()) as Arc<dyn CommandExecutor>)
    }

    async fn message_sender(&self) -> Option<Arc<dyn MessageSender>> {
        let available = self.lock().sender_available;
        available.then(|| Arc::new(self.clone()) as Arc<dyn MessageSender>)
    }

    async fn event_source(&self) -> Option<Arc<dyn EventSource>> {
        let available = self.lock().events_available;
        available.then(|| Arc::new(self.clone()) as Arc<dyn EventSource>)
    }

    async fn identity_provider(&self) -> Option<Arc<dyn IdentityProvider>> {
        Some(Arc::new(self.clone()))
    }

    async fn role_directory(&self) -> Option<Arc<dyn RoleDirectory>> {
        Some(Arc::new(self.clone()))
    }

    async fn typing_indicator(&self) -> Option<Arc<dyn TypingIndicator>> {
        Some(Arc::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::command::{PPM, STOP};

    fn host() -> InMemoryHost {
        InMemoryHost::new(&BotConfig::default()).with_identity("42")
    }

    fn target() -> CommandTarget {
        CommandTarget {
            channel_id: BotConfig::default().channel_id,
            guild_id: BotConfig::default().guild_id,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_reply_reaches_subscriber() {
        let host = host();
        host.script_reply("ppm", "<@42> 🎁 **3**");
        let mut sub = host.subscribe().await.unwrap();

        host.execute(&PPM, &OptionValues::new(), &target()).await.unwrap();
        let message = sub.events.recv().await.unwrap();
        assert_eq!(message.content, "<@42> 🎁 **3**");
        assert_eq!(host.command_names(), vec!["ppm"]);
    }

    #[tokio::test]
    async fn test_injected_command_failure_is_recorded() {
        let host = host();
        host.fail_command("stop");
        let result = host.execute(&STOP, &OptionValues::new(), &target()).await;
        assert!(matches!(result, Err(DomainError::CommandFailed { .. })));
        assert_eq!(host.command_names(), vec!["stop"]);
    }

    #[tokio::test]
    async fn test_send_faults_are_consumed_in_order() {
        let host = host();
        host.push_send_fault(SendFault::RateLimited {
            retry_after_ms: Some(10),
        });
        assert!(host.send("c", "one").await.unwrap_err().is_rate_limited());
        host.send("c", "two").await.unwrap();
        assert_eq!(host.sent_to("c"), vec!["two"]);
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_stream() {
        let host = host();
        let mut sub = host.subscribe().await.unwrap();
        host.unsubscribe(sub.id).await.unwrap();
        assert_eq!(host.subscriber_count(), 0);
        assert!(sub.events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_missing_executor() {
        let host = host();
        host.set_executor_available(false);
        assert!(host.command_executor().await.is_none());
        assert!(host.message_sender().await.is_some());
    }
}
