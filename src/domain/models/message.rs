//! Inbound chat messages delivered by the host's event stream.

use serde::{Deserialize, Serialize};

/// Whether the host saw the message being created or edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageEventKind {
    #[default]
    Created,
    Updated,
}

/// A name/value pair inside an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// Structured excerpt attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
}

/// A message-like event from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InboundMessage {
    #[serde(default)]
    pub kind: MessageEventKind,
    pub channel_id: String,
    pub author_id: String,
    /// Direct message to the current user, outside any guild channel.
    #[serde(default)]
    pub is_direct: bool,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<Embed>,
}

impl InboundMessage {
    /// Each independently rendered part of the message, in reading order.
    ///
    /// Order: content, then per embed its description, title and field
    /// values. Empty parts are skipped.
    pub fn text_spans(&self) -> Vec<&str> {
        let mut spans: Vec<&str> = Vec::new();
        if !self.content.is_empty() {
            spans.push(&self.content);
        }
        for embed in &self.embeds {
            if let Some(description) = embed.description.as_deref() {
                spans.push(description);
            }
            if let Some(title) = embed.title.as_deref() {
                spans.push(title);
            }
            spans.extend(embed.fields.iter().map(|f| f.value.as_str()));
        }
        spans.retain(|s| !s.is_empty());
        spans
    }

    /// Every span joined one per line.
    pub fn raw_text(&self) -> String {
        self.text_spans().join("\n")
    }

    /// First embed title, if any.
    pub fn title(&self) -> Option<&str> {
        self.embeds.iter().find_map(|e| e.title.as_deref())
    }

    /// Message content plus embed descriptions and field values, without
    /// titles.
    pub fn body(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.content.is_empty() {
            parts.push(&self.content);
        }
        for embed in &self.embeds {
            if let Some(description) = embed.description.as_deref() {
                parts.push(description);
            }
            parts.extend(embed.fields.iter().map(|f| f.value.as_str()));
        }
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InboundMessage {
        InboundMessage {
            channel_id: "c".to_string(),
            author_id: "bot".to_string(),
            content: "hello".to_string(),
            embeds: vec![Embed {
                title: Some("Status".to_string()),
                description: Some("desc".to_string()),
                fields: vec![EmbedField {
                    name: "f".to_string(),
                    value: "field value".to_string(),
                }],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_raw_text_orders_segments() {
        assert_eq!(sample().raw_text(), "hello\ndesc\nStatus\nfield value");
    }

    #[test]
    fn test_text_spans_keep_parts_apart() {
        let msg = sample();
        assert_eq!(msg.text_spans(), vec!["hello", "desc", "Status", "field value"]);

        let bare = InboundMessage {
            embeds: vec![Embed {
                title: Some(String::new()),
                description: Some("<@7> — 🎁 **5**".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(bare.text_spans(), vec!["<@7> — 🎁 **5**"]);
    }

    #[test]
    fn test_body_excludes_titles() {
        let msg = sample();
        assert_eq!(msg.body(), "hello\ndesc\nfield value");
        assert_eq!(msg.title(), Some("Status"));
    }

    #[test]
    fn test_empty_content_is_skipped() {
        let msg = InboundMessage {
            embeds: vec![Embed {
                description: Some("only".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(msg.raw_text(), "only");
    }
}
