//! Free-text grammar of the status bot's replies.
//!
//! Everything here is pure: the matcher reads text and returns what it
//! found. Deciding what to do with a match belongs to the correlators.
//!
//! The bot's output format is outside our control, so the grammar carries a
//! version number. Bump [`GRAMMAR_VERSION`] whenever a pattern changes so
//! logs tell which grammar produced a verdict.

use regex::Regex;
use std::time::Duration;

use crate::domain::models::{Roster, RosterEntry};

/// Version of the reply grammar implemented below.
pub const GRAMMAR_VERSION: u32 = 1;

/// Substring the bot uses when the caller's cluster is not running.
pub const OFFLINE_SENTINEL: &str = "Cluster not started";

/// Title marker of the auto-kick direct message (case-insensitive).
pub const AUTO_KICK_TITLE_MARKER: &str = "auto-kick";

/// Body phrase of the auto-kick direct message (case-insensitive).
pub const AUTO_KICK_BODY_PHRASE: &str = "kicked from the group";

const LEADER_MARKER: char = '👑';

/// What a status reply says about one identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    /// The offline sentinel is present.
    Offline,
    /// Gift value following a mention of the identity.
    Value(f64),
    /// Neither the sentinel nor a value for the identity.
    NoMatch,
}

/// Compiled reply patterns.
#[derive(Debug, Clone)]
pub struct ResponseMatcher {
    mention: Regex,
    gift_value: Regex,
    roster_line: Regex,
    leader_suffix: Regex,
    group_line: Regex,
    cooldown: Regex,
}

impl Default for ResponseMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseMatcher {
    /// Compile the reply grammar.
    pub fn new() -> Self {
        Self {
            mention: Regex::new(r"<@!?([^>\s]+)>").expect("mention pattern"),
            gift_value: Regex::new(r"🎁\s*\*\*(\d+(?:\.\d+)?)\*\*").expect("gift pattern"),
            roster_line: Regex::new(
                r"<@!?([^>\s]+)>[ \t]*([^\n]*?)[ \t]*[—–-][ \t]*🎁[ \t]*\*\*(\d+(?:\.\d+)?)\*\*",
            )
            .expect("roster pattern"),
            leader_suffix: Regex::new(r"\s*👑\s*(?:Leader\b)?").expect("leader pattern"),
            group_line: Regex::new(r"\bGroup\s+[*`]*([^\s:*`]+:[^\s*`]*)").expect("group pattern"),
            cooldown: Regex::new(r"(?i)wait\s+(\d{1,3}):([0-5]\d)\s+before\s+starting\s+again")
                .expect("cooldown pattern"),
        }
    }

    /// Whether `text` carries the offline sentinel.
    pub fn is_offline(&self, text: &str) -> bool {
        text.contains(OFFLINE_SENTINEL)
    }

    /// Classify `text` for `identity`.
    ///
    /// The offline sentinel wins over any value in the same text. The value
    /// is the first gift token following a mention of `identity`, possibly
    /// several lines later.
    pub fn match_status(&self, text: &str, identity: &str) -> MatchOutcome {
        if self.is_offline(text) {
            return MatchOutcome::Offline;
        }

        for mention in self.mention.captures_iter(text) {
            if mention.get(1).map(|m| m.as_str()) != Some(identity) {
                continue;
            }
            let Some(whole) = mention.get(0) else {
                continue;
            };
            let rest = &text[whole.end()..];
            if let Some(value) = self.first_value(rest) {
                return MatchOutcome::Value(value);
            }
        }

        MatchOutcome::NoMatch
    }

    /// Every `<mention> name — 🎁 **n**` line, in document order.
    ///
    /// Returns `None` when no member line is present.
    pub fn match_roster(&self, text: &str) -> Option<Roster> {
        let entries: Vec<RosterEntry> = self
            .roster_line
            .captures_iter(text)
            .filter_map(|caps| {
                let identity = caps.get(1)?.as_str().to_string();
                let raw_name = caps.get(2).map_or("", |m| m.as_str());
                let value = caps.get(3)?.as_str().parse::<f64>().ok()?;
                let is_leader = raw_name.contains(LEADER_MARKER);
                let display_name = self.leader_suffix.replace_all(raw_name, "").trim().to_string();
                Some(RosterEntry {
                    identity,
                    display_name,
                    is_leader,
                    value,
                })
            })
            .collect();

        if entries.is_empty() {
            return None;
        }

        let group_id = self
            .group_line
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        let group_name = group_id
            .as_deref()
            .and_then(|id| id.split(':').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Some(Roster {
            entries,
            group_id,
            group_name,
        })
    }

    /// Parse a "wait MM:SS before starting again" refusal.
    pub fn match_cooldown(&self, text: &str) -> Option<Duration> {
        let caps = self.cooldown.captures(text)?;
        let minutes: u64 = caps.get(1)?.as_str().parse().ok()?;
        let seconds: u64 = caps.get(2)?.as_str().parse().ok()?;
        Some(Duration::from_millis((minutes * 60 + seconds) * 1000))
    }

    /// An auto-kick notice needs both the title marker and the body phrase.
    pub fn match_auto_kick(&self, title: Option<&str>, body: &str) -> bool {
        let title_hit = title.is_some_and(|t| t.to_lowercase().contains(AUTO_KICK_TITLE_MARKER));
        title_hit && body.to_lowercase().contains(AUTO_KICK_BODY_PHRASE)
    }

    fn first_value(&self, text: &str) -> Option<f64> {
        self.gift_value
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}
