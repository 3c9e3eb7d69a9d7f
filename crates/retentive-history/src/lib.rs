//! Streaming message reducer
//!
//! Keeps the agent's message log within count and byte bounds. Retention is
//! biased: human turns and error-bearing tool results outrank routine tool
//! chatter, so the window slides over the noise first.

use retentive_core::config::MessageSettings;
use retentive_core::{Message, MessageKind};
use std::collections::HashMap;

/// Importance score threshold separating the retained-first tier
const IMPORTANT_THRESHOLD: u8 = 7;

const BOOST_MARKERS: [&str; 3] = ["task completed", "plan:", "summary:"];
const ERROR_MARKERS: [&str; 2] = ["error", "failed"];

/// Score a message for retention. Higher survives longer.
pub fn importance(message: &Message) -> u8 {
    let base = match message.kind {
        MessageKind::Human => 9,
        MessageKind::Tool => {
            if ERROR_MARKERS.iter().any(|m| message.content_contains(m)) {
                8
            } else {
                6
            }
        }
        MessageKind::Assistant if !message.tool_calls.is_empty() => 7,
        _ => 5,
    };
    if BOOST_MARKERS.iter().any(|m| message.content_contains(m)) {
        (base + 2).min(10)
    } else {
        base
    }
}

/// Bounded reducer over ordered messages
pub struct HistoryReducer {
    settings: MessageSettings,
}

impl HistoryReducer {
    pub fn new(settings: MessageSettings) -> Self {
        Self { settings }
    }

    /// Append `update` to `prev` (merging by id) and prune to bounds,
    /// preserving relative order. Pure: same inputs, same output.
    pub fn reduce(&self, prev: Vec<Message>, update: Vec<Message>) -> Vec<Message> {
        let mut merged = merge_by_id(prev, update);

        let total: usize = merged.iter().map(Message::byte_size).sum();
        if merged.len() <= self.settings.max_count && total <= self.settings.max_total_bytes {
            return merged;
        }

        tracing::debug!(
            count = merged.len(),
            bytes = total,
            "message history over bounds; pruning"
        );

        if self.settings.preserve_important {
            merged = self.prune_by_importance(merged);
        } else {
            let excess = merged.len().saturating_sub(self.settings.max_count);
            merged.drain(..excess);
        }

        self.prune_bytes(merged)
    }

    /// Important messages first (newest of them), then the freshest regular
    /// messages fill whatever window space remains
    fn prune_by_importance(&self, messages: Vec<Message>) -> Vec<Message> {
        let max = self.settings.max_count;
        let scored: Vec<(usize, u8)> = messages
            .iter()
            .enumerate()
            .map(|(i, m)| (i, importance(m)))
            .collect();

        let important: Vec<usize> = scored
            .iter()
            .filter(|(_, s)| *s >= IMPORTANT_THRESHOLD)
            .map(|(i, _)| *i)
            .collect();
        let regular: Vec<usize> = scored
            .iter()
            .filter(|(_, s)| *s < IMPORTANT_THRESHOLD)
            .map(|(i, _)| *i)
            .collect();

        let important_kept: Vec<usize> = last_n(&important, max);
        let regular_quota = max - important_kept.len();
        let regular_kept: Vec<usize> = last_n(&regular, regular_quota);

        let mut keep: Vec<usize> = important_kept.into_iter().chain(regular_kept).collect();
        keep.sort_unstable();

        let mut messages = messages;
        let mut keep_iter = keep.into_iter().peekable();
        let mut index = 0;
        messages.retain(|_| {
            let kept = keep_iter.peek() == Some(&index);
            if kept {
                keep_iter.next();
            }
            index += 1;
            kept
        });
        messages
    }

    /// Byte-bound enforcement after count pruning: lowest importance goes
    /// first, oldest first within a score
    fn prune_bytes(&self, mut messages: Vec<Message>) -> Vec<Message> {
        let mut total: usize = messages.iter().map(Message::byte_size).sum();
        while total > self.settings.max_total_bytes && messages.len() > 1 {
            let victim = messages
                .iter()
                .enumerate()
                .min_by_key(|(i, m)| (importance(m), *i))
                .map(|(i, _)| i)
                .unwrap();
            total -= messages[victim].byte_size();
            messages.remove(victim);
        }
        messages
    }
}

/// Append new messages, folding any whose id matches an existing entry;
/// newer non-empty fields overwrite
fn merge_by_id(prev: Vec<Message>, update: Vec<Message>) -> Vec<Message> {
    let mut merged = prev;
    let mut by_id: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .filter_map(|(i, m)| m.id.clone().map(|id| (id, i)))
        .collect();

    for message in update {
        match message.id.as_ref().and_then(|id| by_id.get(id)).copied() {
            Some(at) => {
                let existing = &mut merged[at];
                existing.kind = message.kind;
                if message.content.byte_size() > 0 {
                    existing.content = message.content;
                }
                if !message.tool_calls.is_empty() {
                    existing.tool_calls = message.tool_calls;
                }
            }
            None => {
                if let Some(id) = message.id.clone() {
                    by_id.insert(id, merged.len());
                }
                merged.push(message);
            }
        }
    }
    merged
}

fn last_n(indices: &[usize], n: usize) -> Vec<usize> {
    indices[indices.len().saturating_sub(n)..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use retentive_core::ToolCallRecord;

    fn reducer(max_count: usize, max_total_bytes: usize) -> HistoryReducer {
        HistoryReducer::new(MessageSettings {
            max_count,
            max_total_bytes,
            preserve_important: true,
        })
    }

    #[test]
    fn test_importance_scores() {
        assert_eq!(importance(&Message::human("hi")), 9);
        assert_eq!(importance(&Message::tool("all good")), 6);
        assert_eq!(importance(&Message::tool("build failed hard")), 8);
        assert_eq!(
            importance(&Message::assistant("run").with_tool_calls(vec![ToolCallRecord::new("bash")])),
            7
        );
        assert_eq!(importance(&Message::assistant("thinking")), 5);
        assert_eq!(importance(&Message::system("be useful")), 5);
    }

    #[test]
    fn test_importance_boost_capped() {
        assert_eq!(importance(&Message::assistant("summary: did things")), 7);
        assert_eq!(importance(&Message::human("plan: do it")), 10, "capped at 10");
        assert_eq!(importance(&Message::tool("task completed, error gone")), 10);
    }

    #[test]
    fn test_under_bounds_is_identity() {
        let reducer = reducer(10, 10_000);
        let prev = vec![Message::human("a"), Message::tool("b")];
        let out = reducer.reduce(prev.clone(), vec![]);
        assert_eq!(out, prev);
    }

    #[test]
    fn test_pruning_preserves_human_and_tool_caller() {
        let reducer = reducer(3, 10_000);
        let messages = vec![
            Message::human("do the thing"),
            Message::tool("out 1"),
            Message::tool("out 2"),
            Message::tool("out 3"),
            Message::assistant("calling").with_tool_calls(vec![ToolCallRecord::new("bash")]),
            Message::tool("out 4"),
        ];
        let out = reducer.reduce(messages, vec![]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].text(), "do the thing");
        assert_eq!(out[1].text(), "calling");
        assert_eq!(out[2].text(), "out 4");
    }

    #[test]
    fn test_exactly_at_max_no_pruning() {
        let reducer = reducer(4, 10_000);
        let messages: Vec<Message> = (0..4).map(|i| Message::tool(format!("t{i}"))).collect();
        let out = reducer.reduce(messages.clone(), vec![]);
        assert_eq!(out, messages);
    }

    #[test]
    fn test_one_over_max_prunes_to_max() {
        let reducer = reducer(4, 10_000);
        let prev: Vec<Message> = (0..4).map(|i| Message::tool(format!("t{i}"))).collect();
        let out = reducer.reduce(prev, vec![Message::tool("t4")]);
        assert_eq!(out.len(), 4);
        assert_eq!(out.last().unwrap().text(), "t4");
    }

    #[test]
    fn test_byte_bound_enforced() {
        let reducer = reducer(100, 50);
        let messages: Vec<Message> = (0..10)
            .map(|i| Message::tool(format!("{i}-{}", "x".repeat(10))))
            .collect();
        let out = reducer.reduce(messages, vec![]);
        let total: usize = out.iter().map(Message::byte_size).sum();
        assert!(total <= 50);
        assert!(!out.is_empty());
    }

    #[test]
    fn test_byte_pruning_drops_routine_before_human() {
        let reducer = reducer(100, 120);
        let messages = vec![
            Message::human(format!("important: {}", "h".repeat(40))),
            Message::tool("r".repeat(50)),
            Message::tool("s".repeat(50)),
        ];
        let out = reducer.reduce(messages, vec![]);
        assert!(out.iter().any(|m| m.kind == MessageKind::Human));
    }

    #[test]
    fn test_merge_by_id_overwrites() {
        let reducer = reducer(10, 10_000);
        let prev = vec![
            Message::assistant("draft").with_id("m1"),
            Message::tool("keep"),
        ];
        let update = vec![Message::assistant("final").with_id("m1")];
        let out = reducer.reduce(prev, update);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text(), "final");
        assert_eq!(out[0].id.as_deref(), Some("m1"));
    }

    #[test]
    fn test_merge_keeps_position_of_updated_message() {
        let reducer = reducer(10, 10_000);
        let prev = vec![
            Message::tool("first"),
            Message::assistant("middle").with_id("m"),
            Message::tool("last"),
        ];
        let out = reducer.reduce(prev, vec![Message::assistant("updated").with_id("m")]);
        assert_eq!(out[1].text(), "updated");
        assert_eq!(out[2].text(), "last");
    }

    #[test]
    fn test_plain_window_when_importance_disabled() {
        let reducer = HistoryReducer::new(MessageSettings {
            max_count: 2,
            max_total_bytes: 10_000,
            preserve_important: false,
        });
        let messages = vec![
            Message::human("dropped despite importance"),
            Message::tool("kept"),
            Message::tool("kept too"),
        ];
        let out = reducer.reduce(messages, vec![]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text(), "kept");
    }

    #[test]
    fn test_relative_order_always_preserved() {
        let reducer = reducer(5, 10_000);
        let messages: Vec<Message> = (0..20)
            .map(|i| {
                if i % 4 == 0 {
                    Message::human(format!("h{i}"))
                } else {
                    Message::tool(format!("t{i}"))
                }
            })
            .collect();
        let out = reducer.reduce(messages.clone(), vec![]);
        let positions: Vec<usize> = out
            .iter()
            .map(|m| {
                messages
                    .iter()
                    .position(|orig| orig.text() == m.text())
                    .unwrap()
            })
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted, "output must keep original order");
    }

    #[test]
    fn test_reduce_is_deterministic() {
        let reducer = reducer(3, 10_000);
        let messages: Vec<Message> = (0..10).map(|i| Message::tool(format!("t{i}"))).collect();
        let a = reducer.reduce(messages.clone(), vec![]);
        let b = reducer.reduce(messages, vec![]);
        assert_eq!(a, b);
    }
}
