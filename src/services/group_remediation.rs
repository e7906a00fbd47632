//! Helper-mode remediation of a whole group.
//!
//! When the bot's reply lists several members, a helper can act on the ones
//! reporting zero: close the whole group when everybody is at zero, or stop
//! the zero members one by one otherwise.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::models::command::{GROUP_CLOSE, HELPER_STOP};
use crate::domain::models::{BotConfig, RemediationOutcome, Roster, RosterEntry, Settings};
use crate::domain::ports::{MessageSender, RoleDirectory};
use crate::services::command_dispatch::CommandDispatch;
use crate::services::notification_queue::NotificationQueue;
use crate::services::shutdown::ShutdownSignal;

/// What to do with a roster.
#[derive(Debug, Clone, PartialEq)]
pub enum RemediationPlan {
    /// Every member is at zero: close the group in one command.
    CloseGroup {
        group_id: String,
        group_name: Option<String>,
    },
    /// Stop these members individually.
    StopMembers(Vec<RosterEntry>),
    Nothing,
}

/// Decide how to remediate `roster`.
///
/// `self_id` is never stopped individually. Closing needs a group id and is
/// skipped when `force_individual` is set.
pub fn plan(roster: &Roster, self_id: Option<&str>, force_individual: bool) -> RemediationPlan {
    if roster.all_zero() && !force_individual {
        if let Some(group_id) = roster.group_id.clone() {
            return RemediationPlan::CloseGroup {
                group_id,
                group_name: roster.group_name.clone(),
            };
        }
    }

    let targets: Vec<RosterEntry> = roster
        .zero_entries_excluding(self_id.unwrap_or_default())
        .into_iter()
        .cloned()
        .collect();
    if targets.is_empty() {
        RemediationPlan::Nothing
    } else {
        RemediationPlan::StopMembers(targets)
    }
}

/// Render the roster report posted to the user-facing channel.
pub fn roster_report(roster: &Roster, plan: &RemediationPlan) -> String {
    let mut out = String::from("🛠️ **Group Remediation**");
    if let Some(name) = &roster.group_name {
        let _ = write!(out, " ({name})");
    }
    out.push('\n');

    let stopped: Vec<&str> = match plan {
        RemediationPlan::CloseGroup { group_id, .. } => {
            let _ = writeln!(out, "Closed group `{group_id}`: every member reported 0.");
            Vec::new()
        }
        RemediationPlan::StopMembers(entries) => {
            let _ = writeln!(out, "Stopped {} member(s) reporting 0.", entries.len());
            entries.iter().map(|e| e.identity.as_str()).collect()
        }
        RemediationPlan::Nothing => {
            out.push_str("No action needed.\n");
            Vec::new()
        }
    };

    for entry in &roster.entries {
        let leader = if entry.is_leader { " 👑" } else { "" };
        let marker = if stopped.contains(&entry.identity.as_str()) {
            " ⛔ stopped"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{} {}{} — 🎁 **{}**{}",
            entry.mention(),
            entry.display_name,
            leader,
            entry.value,
            marker
        );
    }
    out.trim_end().to_string()
}

/// Carries out remediation plans.
pub struct GroupRemediator {
    dispatch: CommandDispatch,
    roles: Option<Arc<dyn RoleDirectory>>,
    sender: Option<Arc<dyn MessageSender>>,
    notifications: Arc<NotificationQueue>,
    settings: Settings,
    bot: BotConfig,
    helper_stop_delay: Duration,
}

impl GroupRemediator {
    /// Remediator issuing its stops through `dispatch`.
    pub fn new(
        dispatch: CommandDispatch,
        roles: Option<Arc<dyn RoleDirectory>>,
        sender: Option<Arc<dyn MessageSender>>,
        notifications: Arc<NotificationQueue>,
        settings: Settings,
        bot: BotConfig,
        helper_stop_delay: Duration,
    ) -> Self {
        Self {
            dispatch,
            roles,
            sender,
            notifications,
            settings,
            bot,
            helper_stop_delay,
        }
    }

    /// Helper mode is configured at all.
    pub fn enabled(&self) -> bool {
        self.bot.helper_mode()
    }

    /// Remediate `roster` if the acting identity currently holds the helper
    /// role. The role is looked up on every call.
    pub async fn run(
        &self,
        roster: &Roster,
        self_id: Option<&str>,
        shutdown: &mut ShutdownSignal,
    ) -> RemediationOutcome {
        if roster.is_empty() || !self.eligible(self_id).await {
            return RemediationOutcome::NotEligible;
        }

        let plan = plan(roster, self_id, self.settings.force_individual_stops());
        let outcome = match &plan {
            RemediationPlan::Nothing => {
                debug!(members = roster.len(), "No zero members to remediate");
                return RemediationOutcome::NothingToDo;
            }
            RemediationPlan::CloseGroup {
                group_id,
                group_name,
            } => {
                info!(group_id = %group_id, "All members at zero, closing group");
                self.dispatch
                    .send_option(&GROUP_CLOSE, "group", group_id, self.dispatch.group())
                    .await;
                self.notifications.enqueue(format!(
                    "🛠️ Closed group **{}**: all {} members at 0 PPM.",
                    group_name.as_deref().unwrap_or(group_id),
                    roster.len()
                ));
                RemediationOutcome::GroupClosed {
                    group_id: group_id.clone(),
                }
            }
            RemediationPlan::StopMembers(entries) => {
                let mut stopped = Vec::with_capacity(entries.len());
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 && !shutdown.sleep(self.helper_stop_delay).await {
                        break;
                    }
                    info!(member = %entry.identity, "Stopping member at zero");
                    self.dispatch
                        .send_option(&HELPER_STOP, "user", &entry.identity, self.dispatch.primary())
                        .await;
                    stopped.push(entry.identity.clone());
                }
                let mentions: Vec<String> = stopped.iter().map(|id| format!("<@{id}>")).collect();
                self.notifications.enqueue(format!(
                    "🛠️ Stopped {} member(s) at 0 PPM: {}",
                    stopped.len(),
                    mentions.join(", ")
                ));
                RemediationOutcome::MembersStopped { identities: stopped }
            }
        };

        self.post_report(roster, &plan).await;
        outcome
    }

    async fn eligible(&self, self_id: Option<&str>) -> bool {
        if !self.enabled() {
            return false;
        }
        let (Some(roles), Some(self_id)) = (self.roles.as_ref(), self_id) else {
            debug!("Role directory or identity unavailable, skipping remediation");
            return false;
        };
        match roles.has_role(self_id, &self.bot.helper_role_id).await {
            Ok(has) => has,
            Err(e) => {
                warn!(error = %e, "Role lookup failed, skipping remediation");
                false
            }
        }
    }

    /// First configured of: user channel, notification channel, command
    /// channel.
    fn report_channel(&self) -> String {
        self.settings
            .user_channel_id()
            .or_else(|| self.settings.notification_channel_id())
            .unwrap_or_else(|| self.bot.channel_id.clone())
    }

    async fn post_report(&self, roster: &Roster, plan: &RemediationPlan) {
        let Some(sender) = self.sender.as_ref() else {
            warn!("No message sender available, roster report not posted");
            return;
        };
        let channel_id = self.report_channel();
        if let Err(e) = sender.send(&channel_id, &roster_report(roster, plan)).await {
            warn!(error = %e, channel_id = %channel_id, "Failed to post roster report");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, value: f64) -> RosterEntry {
        RosterEntry {
            identity: id.to_string(),
            display_name: format!("user{id}"),
            is_leader: false,
            value,
        }
    }

    fn roster(entries: Vec<RosterEntry>, group: Option<&str>) -> Roster {
        Roster {
            entries,
            group_id: group.map(str::to_string),
            group_name: group.and_then(|g| g.split(':').next()).map(str::to_string),
        }
    }

    #[test]
    fn test_all_zero_closes_group() {
        let r = roster(vec![entry("1", 0.0), entry("2", 0.0)], Some("En:1:1"));
        assert_eq!(
            plan(&r, Some("1"), false),
            RemediationPlan::CloseGroup {
                group_id: "En:1:1".to_string(),
                group_name: Some("En".to_string()),
            }
        );
    }

    #[test]
    fn test_force_individual_overrides_close() {
        let r = roster(vec![entry("1", 0.0), entry("2", 0.0)], Some("En:1:1"));
        assert_eq!(
            plan(&r, Some("1"), true),
            RemediationPlan::StopMembers(vec![entry("2", 0.0)])
        );
    }

    #[test]
    fn test_all_zero_without_group_falls_back_to_stops() {
        let r = roster(vec![entry("1", 0.0), entry("2", 0.0)], None);
        assert_eq!(
            plan(&r, Some("9"), false),
            RemediationPlan::StopMembers(vec![entry("1", 0.0), entry("2", 0.0)])
        );
    }

    #[test]
    fn test_healthy_group_needs_nothing() {
        let r = roster(vec![entry("1", 3.0), entry("2", 1.5)], Some("En:1:1"));
        assert_eq!(plan(&r, Some("1"), false), RemediationPlan::Nothing);
    }

    #[test]
    fn test_report_marks_stopped_members() {
        let r = roster(vec![entry("1", 2.0), entry("2", 0.0)], Some("En:1:1"));
        let p = plan(&r, Some("1"), false);
        let report = roster_report(&r, &p);
        assert!(report.starts_with("🛠️ **Group Remediation** (En)"));
        assert!(report.contains("<@2> user2 — 🎁 **0** ⛔ stopped"));
        assert!(!report.contains("<@1> user1 — 🎁 **2** ⛔"));
    }
}
