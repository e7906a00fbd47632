//! Runtime settings keys and typed, read-per-access accessors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::ports::SettingsStore;

/// Keys recognised in the flat settings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    /// Channel receiving alerts and verbose logs.
    NotificationChannelId,
    /// User-facing channel for roster reports.
    UserChannelId,
    /// Send `/clear` before every check.
    SendClearCommand,
    /// Notify every captured value and non-actions.
    Verbose,
    /// Periodic typing indicator.
    AntiIdle,
    /// Always stop members one by one instead of closing the group.
    ForceIndividualStops,
}

impl SettingKey {
    /// Every key, in display order.
    pub const ALL: [Self; 6] = [
        Self::NotificationChannelId,
        Self::UserChannelId,
        Self::SendClearCommand,
        Self::Verbose,
        Self::AntiIdle,
        Self::ForceIndividualStops,
    ];

    /// Stable name used in configuration and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotificationChannelId => "notification_channel_id",
            Self::UserChannelId => "user_channel_id",
            Self::SendClearCommand => "send_clear_command",
            Self::Verbose => "verbose",
            Self::AntiIdle => "anti_idle",
            Self::ForceIndividualStops => "force_individual_stops",
        }
    }

    /// Whether the key holds a boolean.
    pub fn is_flag(&self) -> bool {
        !matches!(self, Self::NotificationChannelId | Self::UserChannelId)
    }

    /// Value used when the store has nothing for this key.
    pub fn default_value(&self) -> SettingValue {
        match self {
            Self::NotificationChannelId | Self::UserChannelId => SettingValue::Text(String::new()),
            Self::SendClearCommand => SettingValue::Flag(true),
            Self::Verbose | Self::AntiIdle | Self::ForceIndividualStops => {
                SettingValue::Flag(false)
            }
        }
    }

    /// Parse a raw string into this key's value type.
    pub fn parse_value(&self, raw: &str) -> Result<SettingValue, DomainError> {
        if !self.is_flag() {
            return Ok(SettingValue::Text(raw.trim().to_string()));
        }
        match raw.trim().to_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(SettingValue::Flag(true)),
            "false" | "off" | "no" | "0" => Ok(SettingValue::Flag(false)),
            other => Err(DomainError::InvalidSetting {
                key: self.as_str().to_string(),
                reason: format!("expected a boolean, got '{other}'"),
            }),
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DomainError::InvalidSetting {
                key: s.to_string(),
                reason: "unknown setting".to_string(),
            })
    }
}

/// A stored setting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// On/off setting.
    Flag(bool),
    /// Free-text setting.
    Text(String),
}

impl SettingValue {
    /// The boolean, if this is a flag.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Text(_) => None,
        }
    }

    /// The text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Flag(_) => None,
        }
    }
}

/// Typed view over a [`SettingsStore`].
///
/// Every accessor reads the store again; nothing is cached, so changes made
/// through the host's settings UI apply to the next access.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn SettingsStore>,
}

impl Settings {
    /// View over `store`.
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Where notifications go; `None` disables them.
    pub fn notification_channel_id(&self) -> Option<String> {
        self.text(SettingKey::NotificationChannelId)
    }

    /// Channel of the user, if set.
    pub fn user_channel_id(&self) -> Option<String> {
        self.text(SettingKey::UserChannelId)
    }

    /// Whether each check starts with `/clear`.
    pub fn send_clear_command(&self) -> bool {
        self.flag(SettingKey::SendClearCommand)
    }

    /// Whether routine results are notified too.
    pub fn verbose(&self) -> bool {
        self.flag(SettingKey::Verbose)
    }

    /// Whether the typing indicator keeps the session awake.
    pub fn anti_idle(&self) -> bool {
        self.flag(SettingKey::AntiIdle)
    }

    /// Whether helper mode never closes whole groups.
    pub fn force_individual_stops(&self) -> bool {
        self.flag(SettingKey::ForceIndividualStops)
    }

    fn flag(&self, key: SettingKey) -> bool {
        self.store
            .get(key)
            .and_then(|v| v.as_flag())
            .or_else(|| key.default_value().as_flag())
            .unwrap_or(false)
    }

    fn text(&self, key: SettingKey) -> Option<String> {
        self.store
            .get(key)
            .and_then(|v| v.as_text().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings").finish_non_exhaustive()
    }
}
