//! Port trait definitions (Hexagonal Architecture)
//!
//! The host chat client is reached only through these traits:
//! - CommandExecutor: issue slash commands to the bot
//! - EventSource: subscribe to inbound messages
//! - MessageSender: post notifications
//! - IdentityProvider / RoleDirectory: who we are and what we may do
//! - TypingIndicator: anti-idle presence
//! - SettingsStore: runtime toggles and channel ids
//! - HostBindings: bootstrap-time lookup of all of the above

pub mod command_executor;
pub mod event_source;
pub mod host;
pub mod identity;
pub mod message_sender;
pub mod settings_store;
pub mod typing;

pub use command_executor::CommandExecutor;
pub use event_source::{EventSource, Subscription, SubscriptionId};
pub use host::HostBindings;
pub use identity::{Identity, IdentityProvider, RoleDirectory};
pub use message_sender::MessageSender;
pub use settings_store::SettingsStore;
pub use typing::TypingIndicator;
