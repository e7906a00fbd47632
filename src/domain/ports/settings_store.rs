//! Runtime settings port.

use crate::domain::models::{SettingKey, SettingValue};

/// Flat key/value settings, read on every access.
pub trait SettingsStore: Send + Sync {
    /// Current value for `key`, or `None` when unset.
    fn get(&self, key: SettingKey) -> Option<SettingValue>;
}
