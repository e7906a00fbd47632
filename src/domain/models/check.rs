//! Correlated outcomes of a status check and of a start acknowledgement.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::roster::Roster;

/// Outcome of waiting for the bot's reply to a status check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CheckResult {
    /// Numeric status reported for the tracked identity.
    Value(f64),
    /// The bot reported the cluster as not started.
    Offline,
    /// The bot replied, but never listed the tracked identity.
    MissingIdentity,
    /// No qualifying reply arrived within the wait window.
    Timeout,
    /// Another wait already held the slot.
    RaceCondition,
    /// The session was stopped while waiting.
    Stopped,
}

impl CheckResult {
    /// True only for a strictly positive value.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Value(v) if *v > 0.0)
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "value({v})"),
            Self::Offline => write!(f, "offline"),
            Self::MissingIdentity => write!(f, "missing_identity"),
            Self::Timeout => write!(f, "timeout"),
            Self::RaceCondition => write!(f, "race_condition"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// A resolved status wait: the verdict plus any roster parsed from the
/// same reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReply {
    pub result: CheckResult,
    pub roster: Option<Roster>,
}

impl StatusReply {
    /// A reply carrying no roster.
    pub fn bare(result: CheckResult) -> Self {
        Self {
            result,
            roster: None,
        }
    }
}

/// Outcome of waiting for the bot to acknowledge a start command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownOutcome {
    /// The bot refused the start and asked to wait this long.
    Cooldown(Duration),
    /// The bot replied without a cooldown phrase.
    Success,
    /// No reply within the acknowledgement window.
    Timeout,
    /// Another start acknowledgement wait held the slot.
    RaceCondition,
    /// The session was stopped while waiting.
    Stopped,
}

impl fmt::Display for CooldownOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cooldown(wait) => write!(f, "cooldown({}ms)", wait.as_millis()),
            Self::Success => write!(f, "success"),
            Self::Timeout => write!(f, "timeout"),
            Self::RaceCondition => write!(f, "race_condition"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_positive_values_are_healthy() {
        assert!(CheckResult::Value(0.5).is_healthy());
        assert!(!CheckResult::Value(0.0).is_healthy());
        assert!(!CheckResult::Offline.is_healthy());
        assert!(!CheckResult::MissingIdentity.is_healthy());
        assert!(!CheckResult::Timeout.is_healthy());
    }

    #[test]
    fn test_check_result_serializes_tagged() {
        let json = serde_json::to_value(CheckResult::Value(3.5)).unwrap();
        assert_eq!(json["kind"], "value");
        assert_eq!(json["value"], 3.5);

        let json = serde_json::to_value(CheckResult::MissingIdentity).unwrap();
        assert_eq!(json["kind"], "missing_identity");
    }
}
