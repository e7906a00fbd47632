//! Group roster parsed from a helper-mode status reply.

use serde::Serialize;

/// One member line of a group status listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub identity: String,
    pub display_name: String,
    pub is_leader: bool,
    pub value: f64,
}

impl RosterEntry {
    /// Whether this member reports zero.
    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }

    /// Chat mention for this member.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.identity)
    }
}

/// Every member listed in one reply, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
    pub group_id: Option<String>,
    pub group_name: Option<String>,
}

impl Roster {
    /// Whether no member was listed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of listed members.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when every listed member reports zero.
    pub fn all_zero(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(RosterEntry::is_zero)
    }

    /// Zero-valued members other than `self_id`.
    pub fn zero_entries_excluding(&self, self_id: &str) -> Vec<&RosterEntry> {
        self.entries
            .iter()
            .filter(|e| e.is_zero() && e.identity != self_id)
            .collect()
    }

    /// The member marked as leader, if any.
    pub fn leader(&self) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.is_leader)
    }
}
