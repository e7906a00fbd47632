//! Implementation of the `ppm-sentinel parse` command.
//!
//! Runs every matcher over one captured bot message so the reply grammar
//! can be checked against real traffic without a live session.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::Roster;
use crate::services::group_remediation::{plan, RemediationPlan};
use crate::services::response_matcher::{MatchOutcome, ResponseMatcher, GRAMMAR_VERSION};

/// Arguments of `ppm-sentinel parse`.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Identity whose status should be extracted
    #[arg(short, long)]
    pub identity: Option<String>,

    /// File holding the message text (reads stdin when omitted)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Embed title, used for auto-kick detection
    #[arg(short, long)]
    pub title: Option<String>,

    /// Plan individual stops even when the whole group is at zero
    #[arg(long)]
    pub force_individual: bool,
}

/// What the matchers found in one message.
#[derive(Debug, Serialize)]
pub struct ParseOutput {
    pub grammar_version: u32,
    pub status: Option<String>,
    pub value: Option<f64>,
    pub cooldown_s: Option<u64>,
    pub auto_kick: bool,
    pub roster: Option<Roster>,
    pub remediation: Option<String>,
    #[serde(skip)]
    roster_table: Option<String>,
}

impl CommandOutput for ParseOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Grammar version: {}", self.grammar_version)];
        match (&self.status, self.value) {
            (Some(status), Some(value)) => lines.push(format!("Status: {status} ({value})")),
            (Some(status), None) => lines.push(format!("Status: {status}")),
            (None, _) => lines.push("Status: - (no identity given)".to_string()),
        }
        lines.push(format!(
            "Cooldown: {}",
            self.cooldown_s
                .map_or_else(|| "-".to_string(), |s| format!("{s}s"))
        ));
        lines.push(format!(
            "Auto-kick: {}",
            if self.auto_kick { "yes" } else { "no" }
        ));
        if let Some(roster) = &self.roster {
            lines.push(format!(
                "\nRoster: {} member(s), group {}",
                roster.len(),
                roster.group_id.as_deref().unwrap_or("-")
            ));
            if let Some(table) = &self.roster_table {
                lines.push(table.clone());
            }
            if let Some(remediation) = &self.remediation {
                lines.push(format!("Remediation: {remediation}"));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Human summary of a remediation plan.
pub fn describe_plan(plan: &RemediationPlan) -> String {
    match plan {
        RemediationPlan::CloseGroup { group_id, .. } => format!("close group {group_id}"),
        RemediationPlan::StopMembers(members) => format!(
            "stop {}",
            members
                .iter()
                .map(|m| m.identity.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        RemediationPlan::Nothing => "nothing to do".to_string(),
    }
}

/// Run every matcher over `text`.
pub fn analyze(
    matcher: &ResponseMatcher,
    text: &str,
    identity: Option<&str>,
    title: Option<&str>,
    force_individual: bool,
) -> ParseOutput {
    let (status, value) = match identity.map(|id| matcher.match_status(text, id)) {
        Some(MatchOutcome::Offline) => (Some("offline".to_string()), None),
        Some(MatchOutcome::Value(v)) => (Some("value".to_string()), Some(v)),
        Some(MatchOutcome::NoMatch) => (Some("no_match".to_string()), None),
        None => (None, None),
    };

    let roster = matcher.match_roster(text);
    let (remediation, roster_table) = match &roster {
        Some(roster) => {
            let plan = plan(roster, identity, force_individual);
            (
                Some(describe_plan(&plan)),
                Some(TableFormatter::new().format_roster(roster, &plan)),
            )
        }
        None => (None, None),
    };

    ParseOutput {
        grammar_version: GRAMMAR_VERSION,
        status,
        value,
        cooldown_s: matcher.match_cooldown(text).map(|d| d.as_secs()),
        auto_kick: matcher.match_auto_kick(title, text),
        roster,
        remediation,
        roster_table,
    }
}

/// Run `ppm-sentinel parse`.
pub async fn execute(args: ParseArgs, json_mode: bool) -> Result<()> {
    let text = match &args.file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read message from stdin")?;
            buf
        }
    };

    let result = analyze(
        &ResponseMatcher::new(),
        &text,
        args.identity.as_deref(),
        args.title.as_deref(),
        args.force_individual,
    );
    output(&result, json_mode);
    Ok(())
}
