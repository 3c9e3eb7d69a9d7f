//! Synthesis of the context-summary message

use regex::Regex;
use retentive_analysis::{AnalyzedCall, CriticalityReport};
use retentive_core::{Message, MessageKind};
use std::sync::OnceLock;

const MAX_EXTRACTED_ITEMS: usize = 10;
const MAX_ITEM_CHARS: usize = 160;

static DECISION_RE: OnceLock<Regex> = OnceLock::new();
static ERROR_RE: OnceLock<Regex> = OnceLock::new();
static PROGRESS_RE: OnceLock<Regex> = OnceLock::new();

fn decision_re() -> &'static Regex {
    DECISION_RE
        .get_or_init(|| Regex::new(r"(?i)\b(decided|decision|chose|chosen|going with|settled on)\b").unwrap())
}

fn error_re() -> &'static Regex {
    ERROR_RE.get_or_init(|| Regex::new(r"(?i)\b(fixed|resolved|worked around)\b").unwrap())
}

fn progress_re() -> &'static Regex {
    PROGRESS_RE
        .get_or_init(|| Regex::new(r"(?i)\b(completed|implemented|added|created|finished)\b").unwrap())
}

/// Counters describing what a summary folded away
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats {
    pub messages_folded: usize,
    pub decisions: usize,
    pub errors_resolved: usize,
    pub progress_items: usize,
    pub important_calls: usize,
    pub routine_calls: usize,
}

/// Build the single summary message covering the non-essential old turns
pub(crate) fn synthesize_summary(
    old: &[Message],
    folded_indices: &[usize],
    report: &CriticalityReport,
    kind: MessageKind,
) -> (Message, SummaryStats) {
    let folded: Vec<&Message> = folded_indices.iter().map(|&i| &old[i]).collect();

    let decisions = extract_matching(&folded, decision_re());
    let errors = extract_matching(&folded, error_re());
    let progress = extract_matching(&folded, progress_re());

    let folded_set: std::collections::HashSet<usize> = folded_indices.iter().copied().collect();
    let important: Vec<&AnalyzedCall> = report
        .important
        .iter()
        .filter(|c| folded_set.contains(&c.message_index))
        .collect();
    let routine: Vec<&AnalyzedCall> = report
        .routine
        .iter()
        .filter(|c| folded_set.contains(&c.message_index))
        .collect();

    let mut body = format!(
        "[Context summary: {} earlier messages condensed]\n",
        folded.len()
    );
    if !important.is_empty() {
        body.push_str("\n## Important operations\n");
        for call in &important {
            if let Some(summary) = call.summary.as_deref() {
                body.push_str("- ");
                body.push_str(summary);
                body.push('\n');
            }
        }
    }
    if !routine.is_empty() {
        body.push_str("\n## Routine operations\n");
        for call in &routine {
            body.push_str(&format!(
                "- {} -> {}\n",
                call.name,
                call.path.as_deref().unwrap_or("-")
            ));
        }
    }
    push_section(&mut body, "Decisions", &decisions);
    push_section(&mut body, "Errors resolved", &errors);
    push_section(&mut body, "Progress", &progress);

    let stats = SummaryStats {
        messages_folded: folded.len(),
        decisions: decisions.len(),
        errors_resolved: errors.len(),
        progress_items: progress.len(),
        important_calls: important.len(),
        routine_calls: routine.len(),
    };
    (Message::new(kind, body), stats)
}

fn push_section(body: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    body.push_str(&format!("\n## {title}\n"));
    for item in items {
        body.push_str("- ");
        body.push_str(item);
        body.push('\n');
    }
}

/// Lines matching a heuristic, trimmed and capped
fn extract_matching(messages: &[&Message], re: &Regex) -> Vec<String> {
    let mut items = Vec::new();
    for message in messages {
        for line in message.text().lines() {
            if items.len() >= MAX_EXTRACTED_ITEMS {
                return items;
            }
            if re.is_match(line) {
                let trimmed = line.trim();
                let mut item: String = trimmed.chars().take(MAX_ITEM_CHARS).collect();
                if trimmed.chars().count() > MAX_ITEM_CHARS {
                    item.push_str("...");
                }
                items.push(item);
            }
        }
    }
    items
}
