//! Message and tool-call data model

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Role of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Human,
    Assistant,
    Tool,
    System,
}

/// Message content, either a single text block or an ordered list of parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<String>),
}

impl MessageContent {
    /// Flattened text view; parts are joined with newlines
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            MessageContent::Text(t) => Cow::Borrowed(t),
            MessageContent::Parts(parts) => Cow::Owned(parts.join("\n")),
        }
    }

    pub fn byte_size(&self) -> usize {
        match self {
            MessageContent::Text(t) => t.len(),
            MessageContent::Parts(parts) => parts.iter().map(|p| p.len()).sum(),
        }
    }
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

/// One tool invocation recorded on an assistant message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub name: String,
    /// Structured arguments as passed to the tool
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub arguments: serde_json::Map<String, serde_json::Value>,
    /// File-like target, when the tool operates on one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Primary content payload (new text, patch text, or command)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ToolCallRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn argument(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.arguments.insert(key.into(), value);
        self
    }

    /// The payload worth analyzing: explicit content first, then the
    /// conventional argument names tools use for it
    pub fn primary_content(&self) -> Option<&str> {
        if let Some(c) = self.content.as_deref() {
            return Some(c);
        }
        for key in ["new_string", "content", "patch", "command"] {
            if let Some(v) = self.arguments.get(key).and_then(|v| v.as_str()) {
                return Some(v);
            }
        }
        None
    }

    pub fn byte_size(&self) -> usize {
        let args: usize = self
            .arguments
            .iter()
            .map(|(k, v)| k.len() + v.to_string().len())
            .sum();
        self.name.len()
            + args
            + self.path.as_deref().map_or(0, str::len)
            + self.content.as_deref().map_or(0, str::len)
    }
}

/// Ordered element of the agent's conversation log
///
/// Messages are appended by graph nodes and never mutated in place; only the
/// streaming reducer may drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Message {
    pub fn new(kind: MessageKind, content: impl Into<MessageContent>) -> Self {
        Self {
            kind,
            content: content.into(),
            tool_calls: Vec::new(),
            id: None,
        }
    }

    pub fn human(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageKind::Human, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageKind::Assistant, content)
    }

    pub fn tool(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageKind::Tool, content)
    }

    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageKind::System, content)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tool_calls(mut self, calls: Vec<ToolCallRecord>) -> Self {
        self.tool_calls = calls;
        self
    }

    /// Flattened text of the content
    pub fn text(&self) -> Cow<'_, str> {
        self.content.as_text()
    }

    /// Derived byte size: content plus tool-call payloads
    pub fn byte_size(&self) -> usize {
        self.content.byte_size() + self.tool_calls.iter().map(ToolCallRecord::byte_size).sum::<usize>()
    }

    /// Case-insensitive substring check against the flattened content
    pub fn content_contains(&self, needle: &str) -> bool {
        self.text().to_lowercase().contains(&needle.to_lowercase())
    }
}
