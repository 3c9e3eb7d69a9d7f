//! Provider role formats

use retentive_core::{Message, MessageContent, MessageKind};
use serde::{Deserialize, Serialize};

/// Target LLM provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAi,
    Google,
}

/// Role constraints a provider imposes on the message list
#[derive(Debug, Clone, Copy)]
pub struct ProviderProfile {
    /// The system message must be the first entry
    pub system_first: bool,
    /// Whether more than one system message is permitted
    pub multiple_system_messages: bool,
    /// Role a synthesized summary message must adopt
    pub summary_kind: MessageKind,
    /// Advertised context length in tokens; informational only
    pub max_context_tokens: usize,
}

impl Provider {
    pub fn profile(&self) -> ProviderProfile {
        match self {
            Provider::Anthropic => ProviderProfile {
                system_first: true,
                multiple_system_messages: false,
                summary_kind: MessageKind::Human,
                max_context_tokens: 200_000,
            },
            Provider::OpenAi => ProviderProfile {
                system_first: true,
                multiple_system_messages: false,
                summary_kind: MessageKind::Human,
                max_context_tokens: 128_000,
            },
            Provider::Google => ProviderProfile {
                system_first: true,
                multiple_system_messages: true,
                summary_kind: MessageKind::System,
                max_context_tokens: 1_000_000,
            },
        }
    }
}

/// Reorder and fold messages so the list satisfies the provider's role
/// constraints: system message first, and extra system messages merged into
/// the first where only one is allowed
pub fn format_for_provider(messages: Vec<Message>, provider: Provider) -> Vec<Message> {
    let profile = provider.profile();
    let mut messages = messages;

    if profile.system_first {
        if let Some(pos) = messages.iter().position(|m| m.kind == MessageKind::System) {
            if pos > 0 {
                let system = messages.remove(pos);
                messages.insert(0, system);
            }
        }
    }

    if !profile.multiple_system_messages {
        let system_count = messages.iter().filter(|m| m.kind == MessageKind::System).count();
        if system_count > 1 {
            let mut folded = String::new();
            let mut seen_first = false;
            messages.retain(|m| {
                if m.kind != MessageKind::System {
                    return true;
                }
                if !seen_first {
                    seen_first = true;
                    return true;
                }
                if !folded.is_empty() {
                    folded.push_str("\n\n");
                }
                folded.push_str(&m.text());
                false
            });
            if let Some(first) = messages.iter_mut().find(|m| m.kind == MessageKind::System) {
                let merged = format!("{}\n\n{}", first.text(), folded);
                first.content = MessageContent::Text(merged);
            }
        }
    }

    messages
}
