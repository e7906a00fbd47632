//! Records describing one run of the check cycle and what it did.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// What started a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleTrigger {
    /// The first tick right after `start()`.
    Startup,
    /// A periodic tick.
    Scheduled,
    /// `run_check_now()`.
    Manual,
}

/// One run of the periodic check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleCycle {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub trigger: CycleTrigger,
}

impl ScheduleCycle {
    /// New cycle stamped now.
    pub fn begin(trigger: CycleTrigger) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            trigger,
        }
    }
}

/// Why a recovery was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryTrigger {
    ZeroValue,
    Offline,
    MissingIdentity,
}

impl fmt::Display for RecoveryTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroValue => write!(f, "zero value"),
            Self::Offline => write!(f, "cluster offline"),
            Self::MissingIdentity => write!(f, "identity missing from reply"),
        }
    }
}

/// Result of the start-with-cooldown sub-protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    /// First start was acknowledged, or not refused before the timeout.
    Accepted,
    /// The retry after a cooldown went through.
    AcceptedAfterCooldown,
    /// The retry hit a cooldown again; no further attempts.
    CooldownEscalated,
    /// Another acknowledgement wait held the slot, or the session stopped.
    Skipped,
}

impl StartOutcome {
    /// Whether the start can be assumed to have taken effect.
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Accepted | Self::AcceptedAfterCooldown)
    }
}

/// Result of the post-restart verification check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerifyOutcome {
    Passed { value: f64 },
    Failed,
    /// The session stopped while verifying.
    Aborted,
}

/// What group remediation did with a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemediationOutcome {
    /// Helper role missing or no role directory available.
    NotEligible,
    /// No zero-valued members besides ourselves.
    NothingToDo,
    GroupClosed { group_id: String },
    MembersStopped { identities: Vec<String> },
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CycleOutcome {
    Healthy {
        value: f64,
    },
    Recovery {
        trigger: RecoveryTrigger,
        start: StartOutcome,
        verify: Option<VerifyOutcome>,
    },
    /// The bot never replied.
    NoReply,
    /// Another cycle held the status slot.
    Skipped,
    Stopped,
}

/// Summary of one finished cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: ScheduleCycle,
    pub outcome: CycleOutcome,
    pub remediation: Option<RemediationOutcome>,
}
