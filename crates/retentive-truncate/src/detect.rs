//! Content type detection

use crate::ContentType;
use regex::Regex;
use std::sync::OnceLock;

static CODE_RE: OnceLock<Regex> = OnceLock::new();

fn code_re() -> &'static Regex {
    CODE_RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(?:export\s+|import\s+|function\s+\w+|class\s+\w+|interface\s+\w+|const\s+\w+\s*=|let\s+\w+\s*=)|=>",
        )
        .unwrap()
    })
}

/// Detect the content type of a text, in the fixed order JSON, code,
/// markup, tree, generic text
pub fn detect_content_type(text: &str) -> ContentType {
    let trimmed = text.trim_start();

    if looks_like_json(trimmed) {
        return ContentType::Json;
    }
    if code_re().is_match(text) {
        return ContentType::Code;
    }
    if trimmed.starts_with('<') {
        return ContentType::Markup;
    }
    if text.contains('├') || text.contains('└') || text.contains('│') {
        return ContentType::Tree;
    }
    ContentType::Text
}

/// A JSON candidate either parses outright or opens with a container and
/// has balanced delimiters (good enough to hand to the repair pass)
fn looks_like_json(trimmed: &str) -> bool {
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return false;
    }
    if serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return true;
    }
    delimiters_balanced(trimmed)
}

fn delimiters_balanced(text: &str) -> bool {
    let mut braces = 0i64;
    let mut brackets = 0i64;
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => braces += 1,
            '}' if !in_string => braces -= 1,
            '[' if !in_string => brackets += 1,
            ']' if !in_string => brackets -= 1,
            _ => {}
        }
        if braces < 0 || brackets < 0 {
            return false;
        }
    }
    braces == 0 && brackets == 0
}
