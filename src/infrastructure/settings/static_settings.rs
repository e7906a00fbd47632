//! In-process settings store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::domain::errors::DomainResult;
use crate::domain::models::{SettingKey, SettingValue, SettingsConfig};
use crate::domain::ports::SettingsStore;

/// Settings held in memory, seeded from configuration and changeable at
/// runtime. Readers always see the latest value.
#[derive(Debug, Default)]
pub struct StaticSettings {
    values: RwLock<HashMap<SettingKey, SettingValue>>,
}

impl StaticSettings {
    /// Empty store; every key reads its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded from the configuration file.
    pub fn from_config(config: &SettingsConfig) -> Self {
        Self {
            values: RwLock::new(config.entries().into_iter().collect()),
        }
    }

    /// Overwrite `key`.
    pub fn set(&self, key: SettingKey, value: SettingValue) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    /// Parse `raw` for `key` and store it.
    pub fn set_raw(&self, key: SettingKey, raw: &str) -> DomainResult<()> {
        let value = key.parse_value(raw)?;
        self.set(key, value);
        Ok(())
    }

    /// Forget `key` so it reads its default again.
    pub fn unset(&self, key: SettingKey) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
    }
}

impl SettingsStore for StaticSettings {
    fn get(&self, key: SettingKey) -> Option<SettingValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Settings;
    use std::sync::Arc;

    #[test]
    fn test_seeded_from_config() {
        let config = SettingsConfig {
            notification_channel_id: "555".to_string(),
            verbose: true,
            ..Default::default()
        };
        let settings = Settings::new(Arc::new(StaticSettings::from_config(&config)));
        assert_eq!(settings.notification_channel_id().as_deref(), Some("555"));
        assert!(settings.verbose());
        assert!(settings.send_clear_command());
        assert!(settings.user_channel_id().is_none());
    }

    #[test]
    fn test_changes_are_visible_on_next_read() {
        let store = Arc::new(StaticSettings::new());
        let settings = Settings::new(store.clone());
        assert!(!settings.anti_idle());

        store.set_raw(SettingKey::AntiIdle, "on").unwrap();
        assert!(settings.anti_idle());

        store.unset(SettingKey::AntiIdle);
        assert!(!settings.anti_idle());
    }

    #[test]
    fn test_unset_flag_falls_back_to_default() {
        let settings = Settings::new(Arc::new(StaticSettings::new()));
        assert!(settings.send_clear_command());
        assert!(!settings.force_individual_stops());
    }

    #[test]
    fn test_rejects_bad_flag() {
        let store = StaticSettings::new();
        assert!(store.set_raw(SettingKey::Verbose, "sometimes").is_err());
    }
}
