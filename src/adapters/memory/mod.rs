//! In-memory host adapter.

pub mod host;

pub use host::{
    ExecutedCommand, InMemoryHost, ScriptedReply, SendFault, SentMessage, DEFAULT_REPLY_DELAY,
};
