//! Typing indicator port.

/// Shows the "is typing" indicator in a channel. Fire and forget.
pub trait TypingIndicator: Send + Sync {
    fn start_typing(&self, channel_id: &str);
}
