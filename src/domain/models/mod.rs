pub mod check;
pub mod command;
pub mod config;
pub mod cycle;
pub mod message;
pub mod roster;
pub mod settings;

pub use check::{CheckResult, CooldownOutcome, StatusReply};
pub use command::{CommandDescriptor, CommandTarget, OptionValues};
pub use config::{
    BotConfig, Config, LogConfig, LogFormat, NotificationConfig, RotationPolicy, SettingsConfig,
    TimingConfig,
};
pub use cycle::{
    CycleOutcome, CycleReport, CycleTrigger, RecoveryTrigger, RemediationOutcome, ScheduleCycle,
    StartOutcome, VerifyOutcome,
};
pub use message::{Embed, EmbedField, InboundMessage, MessageEventKind};
pub use roster::{Roster, RosterEntry};
pub use settings::{SettingKey, SettingValue, Settings};
