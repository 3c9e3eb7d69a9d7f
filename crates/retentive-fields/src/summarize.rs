//! Field-specific summarizers
//!
//! Each summarizer is lossy on purpose; the goal is to keep the lines an
//! agent will actually act on, not to reproduce the original.

use regex::Regex;
use std::sync::OnceLock;

const TREE_LINE_CAP: usize = 2_000;
const NOTES_SECTION_CAP: usize = 20;
const GENERIC_EDGE_LINES: usize = 50;
const GENERIC_KEYWORD_LINES: usize = 100;

/// Budget handed to the tree truncator for trees past the 10 MB mark
const GIANT_TREE_BUDGET: usize = 1024 * 1024;
const GIANT_TREE_THRESHOLD: usize = 10 * 1024 * 1024;

static PRIORITY_FILE_RE: OnceLock<Regex> = OnceLock::new();
static KEYWORD_LINE_RE: OnceLock<Regex> = OnceLock::new();

fn priority_file_re() -> &'static Regex {
    PRIORITY_FILE_RE.get_or_init(|| {
        Regex::new(
            r"(?i)(\.(rs|ts|tsx|js|jsx|py|go|java|rb|c|h|cpp|cs)\b|package\.json|cargo\.toml|go\.mod|pyproject\.toml|pom\.xml|readme|makefile|dockerfile|build\.gradle|cmakelists)",
        )
        .unwrap()
    })
}

fn keyword_line_re() -> &'static Regex {
    KEYWORD_LINE_RE
        .get_or_init(|| Regex::new(r"(?i)\b(error|warning|todo|fixme|important|critical)\b").unwrap())
}

const NOTE_SECTION_MARKERS: [&str; 7] = [
    "task:",
    "plan:",
    "error:",
    "completed:",
    "todo:",
    "issue:",
    "fix:",
];

/// Which summarizer a named field gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    CodebaseTree,
    ContextNotes,
    Generic,
}

impl FieldKind {
    pub fn for_field(name: &str) -> Self {
        match name {
            "codebase_tree" | "codebaseTree" => FieldKind::CodebaseTree,
            "context_notes" | "contextNotes" => FieldKind::ContextNotes,
            _ => FieldKind::Generic,
        }
    }
}

pub(crate) fn summarize(kind: FieldKind, text: &str) -> String {
    match kind {
        FieldKind::CodebaseTree => summarize_tree(text),
        FieldKind::ContextNotes => summarize_notes(text),
        FieldKind::Generic => summarize_generic(text),
    }
}

/// Keep the lines that matter in a codebase tree: source files, manifests,
/// readmes, build files. Trees past 10 MB skip straight to depth sampling.
fn summarize_tree(text: &str) -> String {
    if text.len() > GIANT_TREE_THRESHOLD {
        if let Ok(outcome) = retentive_truncate::truncate(
            text,
            GIANT_TREE_BUDGET,
            Some(retentive_truncate::ContentType::Tree),
        ) {
            return outcome.content;
        }
    }

    let total = text.lines().count();
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| priority_file_re().is_match(line))
        .take(TREE_LINE_CAP)
        .collect();
    let mut out = format!("# codebase tree: {} of {} entries retained\n", kept.len(), total);
    out.push_str(&kept.join("\n"));
    out
}

/// Keep note sections that carry task state, newest last
fn summarize_notes(text: &str) -> String {
    let sections: Vec<&str> = text.split("\n\n").collect();
    let total = sections.len();
    let mut kept: Vec<&str> = sections
        .into_iter()
        .filter(|section| {
            let lowered = section.to_lowercase();
            NOTE_SECTION_MARKERS.iter().any(|m| lowered.contains(m))
        })
        .collect();
    if kept.len() > NOTES_SECTION_CAP {
        kept = kept.split_off(kept.len() - NOTES_SECTION_CAP);
    }
    let mut out = format!("# notes: {} of {} sections retained\n\n", kept.len(), total);
    out.push_str(&kept.join("\n\n"));
    out
}

/// Head, tail, and flagged middle lines with bracketing markers
fn summarize_generic(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= GENERIC_EDGE_LINES * 2 {
        return text.to_string();
    }

    let head = &lines[..GENERIC_EDGE_LINES];
    let tail = &lines[lines.len() - GENERIC_EDGE_LINES..];
    let flagged: Vec<&str> = lines[GENERIC_EDGE_LINES..lines.len() - GENERIC_EDGE_LINES]
        .iter()
        .copied()
        .filter(|line| keyword_line_re().is_match(line))
        .take(GENERIC_KEYWORD_LINES)
        .collect();

    let mut out = format!("=== summarized from {} lines ===\n", lines.len());
    out.push_str(&head.join("\n"));
    if !flagged.is_empty() {
        out.push_str("\n--- flagged lines ---\n");
        out.push_str(&flagged.join("\n"));
    }
    out.push_str("\n--- tail ---\n");
    out.push_str(&tail.join("\n"));
    out.push_str("\n=== end summary ===");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_kind_mapping() {
        assert_eq!(FieldKind::for_field("codebase_tree"), FieldKind::CodebaseTree);
        assert_eq!(FieldKind::for_field("codebaseTree"), FieldKind::CodebaseTree);
        assert_eq!(FieldKind::for_field("context_notes"), FieldKind::ContextNotes);
        assert_eq!(FieldKind::for_field("scratch"), FieldKind::Generic);
    }

    #[test]
    fn test_tree_summary_keeps_priority_files() {
        let tree = "\
src
├── lib.rs
├── notes.txt
├── Cargo.toml
├── image.png
└── README.md";
        let summary = summarize_tree(tree);
        assert!(summary.contains("lib.rs"));
        assert!(summary.contains("Cargo.toml"));
        assert!(summary.contains("README.md"));
        assert!(!summary.contains("image.png"));
        assert!(summary.starts_with("# codebase tree:"));
    }

    #[test]
    fn test_tree_summary_caps_lines() {
        let tree: String = (0..5_000).map(|i| format!("├── file_{i}.rs\n")).collect();
        let summary = summarize_tree(&tree);
        assert!(summary.lines().count() <= TREE_LINE_CAP + 1);
    }

    #[test]
    fn test_notes_summary_filters_sections() {
        let notes = "random musing\n\ntask: fix the cache\n\nweather is nice\n\nerror: test flake in ci";
        let summary = summarize_notes(notes);
        assert!(summary.contains("task: fix the cache"));
        assert!(summary.contains("error: test flake"));
        assert!(!summary.contains("weather"));
        assert!(summary.contains("2 of 4 sections"));
    }

    #[test]
    fn test_notes_summary_keeps_last_twenty() {
        let notes: String = (0..50)
            .map(|i| format!("task: item {i}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        let summary = summarize_notes(&notes);
        assert!(!summary.contains("task: item 29\n"));
        assert!(summary.contains("task: item 30"));
        assert!(summary.contains("task: item 49"));
    }

    #[test]
    fn test_generic_summary_keeps_edges_and_flags() {
        let mut lines: Vec<String> = (0..300).map(|i| format!("line {i}")).collect();
        lines[150] = "ERROR: something broke".to_string();
        let text = lines.join("\n");
        let summary = summarize_generic(&text);
        assert!(summary.contains("line 0"));
        assert!(summary.contains("line 299"));
        assert!(summary.contains("ERROR: something broke"));
        assert!(!summary.contains("line 150\n"));
    }

    #[test]
    fn test_generic_summary_short_input_untouched() {
        let text = "only\na few\nlines";
        assert_eq!(summarize_generic(text), text);
    }
}
