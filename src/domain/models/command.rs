//! Slash command catalog for the status bot.
//!
//! Descriptors mirror what the host's command executor needs to build an
//! application-command invocation: the registered id and version, display
//! text, popularity rank and option schema.

use serde::Serialize;
use std::collections::BTreeMap;

/// Parameter values passed alongside a command, keyed by option name.
pub type OptionValues = BTreeMap<String, String>;

/// Option type codes understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    String,
    Boolean,
    User,
}

/// One declared command option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOption {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub required: bool,
}

/// A registered slash command of the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub command_id: &'static str,
    pub command_version: &'static str,
    pub description: &'static str,
    pub rank: u32,
    pub options: &'static [CommandOption],
}

impl CommandDescriptor {
    /// Whether the command declares option `name`.
    pub fn has_option(&self, name: &str) -> bool {
        self.options.iter().any(|o| o.name == name)
    }
}

/// `/clear` - clears the friends list before a check.
pub const CLEAR: CommandDescriptor = CommandDescriptor {
    name: "clear",
    command_id: "1416039398792888330",
    command_version: "1433501849713115315",
    description: "Clear your friends list",
    rank: 3,
    options: &[CommandOption {
        name: "force-remove-all",
        description: "If true, removes all friends - keep only favs",
        kind: OptionKind::Boolean,
        required: false,
    }],
};

/// `/ppm` - status check.
pub const PPM: CommandDescriptor = CommandDescriptor {
    name: "ppm",
    command_id: "1414334983707033774",
    command_version: "1414334983707033780",
    description: "Check your current PackPerMinute",
    rank: 1,
    options: &[],
};

/// `/stop` - stop the caller's cluster.
pub const STOP: CommandDescriptor = CommandDescriptor {
    name: "stop",
    command_id: "1414334983707033773",
    command_version: "1414334983707033779",
    description: "Stop your cluster",
    rank: 4,
    options: &[],
};

/// `/start` - start the caller's cluster.
pub const START: CommandDescriptor = CommandDescriptor {
    name: "start",
    command_id: "1414334983707033772",
    command_version: "1414334983707033778",
    description: "Start your cluster",
    rank: 2,
    options: &[],
};

/// `/stop user:<member>` - helper-only stop of another member's cluster.
pub const HELPER_STOP: CommandDescriptor = CommandDescriptor {
    name: "stop",
    command_id: "1414334983707033773",
    command_version: "1414334983707033779",
    description: "Stop a member's cluster",
    rank: 4,
    options: &[CommandOption {
        name: "user",
        description: "Member whose cluster should be stopped",
        kind: OptionKind::User,
        required: true,
    }],
};

/// `/close group:<id>` - helper-only close of a whole group.
pub const GROUP_CLOSE: CommandDescriptor = CommandDescriptor {
    name: "close",
    command_id: "1414334983707033776",
    command_version: "1414334983707033782",
    description: "Close a group",
    rank: 5,
    options: &[CommandOption {
        name: "group",
        description: "Group identifier",
        kind: OptionKind::String,
        required: true,
    }],
};

/// Where a command is issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandTarget {
    pub channel_id: String,
    pub guild_id: String,
}

/// Build option values from `(name, value)` pairs.
pub fn option_values<I, K, V>(pairs: I) -> OptionValues
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
