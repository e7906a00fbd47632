//! Table output for rosters and recorded commands, using comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;
use tokio::time::Instant;

use crate::adapters::memory::ExecutedCommand;
use crate::domain::models::Roster;
use crate::services::group_remediation::RemediationPlan;

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Formatter using colors when the terminal supports them.
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Formatter with explicit color and width settings.
    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// One row per member, marking who the plan would stop.
    pub fn format_roster(&self, roster: &Roster, plan: &RemediationPlan) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("Member").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Leader").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
            Cell::new("Action").add_attribute(Attribute::Bold),
        ]);

        for entry in &roster.entries {
            let action = match plan {
                RemediationPlan::CloseGroup { .. } => "close",
                RemediationPlan::StopMembers(members)
                    if members.iter().any(|m| m.identity == entry.identity) =>
                {
                    "stop"
                }
                _ => "-",
            };

            let value = entry.value.to_string();
            let value_cell = if self.use_colors {
                Cell::new(value).fg(if entry.is_zero() {
                    Color::Red
                } else {
                    Color::Green
                })
            } else {
                Cell::new(value)
            };

            table.add_row(vec![
                Cell::new(&entry.identity),
                Cell::new(&entry.display_name),
                Cell::new(if entry.is_leader { "👑" } else { "" }),
                value_cell,
                Cell::new(action),
            ]);
        }

        table.to_string()
    }

    /// Commands in execution order with their offset from `origin`.
    pub fn format_commands(&self, commands: &[ExecutedCommand], origin: Instant) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("At (ms)").add_attribute(Attribute::Bold),
            Cell::new("Command").add_attribute(Attribute::Bold),
            Cell::new("Options").add_attribute(Attribute::Bold),
            Cell::new("Channel").add_attribute(Attribute::Bold),
        ]);

        for command in commands {
            let options = if command.options.is_empty() {
                "-".to_string()
            } else {
                command
                    .options
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            let name = format!("/{}", command.name);
            let name_cell = if self.use_colors {
                Cell::new(name).fg(Color::Cyan)
            } else {
                Cell::new(name)
            };
            table.add_row(vec![
                Cell::new(command.at.saturating_duration_since(origin).as_millis()),
                name_cell,
                Cell::new(options),
                Cell::new(&command.channel_id),
            ]);
        }

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if let Some(width) = self.max_width {
            table.set_width(width);
        }
        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Respect `NO_COLOR` and dumb terminals.
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::RosterEntry;

    fn roster() -> Roster {
        Roster {
            entries: vec![
                RosterEntry {
                    identity: "1".to_string(),
                    display_name: "alpha".to_string(),
                    is_leader: true,
                    value: 4.0,
                },
                RosterEntry {
                    identity: "2".to_string(),
                    display_name: "beta".to_string(),
                    is_leader: false,
                    value: 0.0,
                },
            ],
            group_id: Some("g:1".to_string()),
            group_name: None,
        }
    }

    #[test]
    fn test_roster_table_marks_stopped_members() {
        let roster = roster();
        let plan = RemediationPlan::StopMembers(vec![roster.entries[1].clone()]);
        let rendered = TableFormatter::with_config(false, None).format_roster(&roster, &plan);

        assert!(rendered.contains("alpha"));
        assert!(rendered.contains("👑"));
        let beta_line = rendered.lines().find(|l| l.contains("beta")).unwrap();
        assert!(beta_line.contains("stop"));
    }

    #[test]
    fn test_empty_command_table_has_header() {
        let rendered =
            TableFormatter::with_config(false, None).format_commands(&[], Instant::now());
        assert!(rendered.contains("Command"));
    }
}
