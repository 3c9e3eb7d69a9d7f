//! JSON validation, repair, and safe truncation points
//!
//! Repairs are modeled as a sequence of (attempt, verify) steps over the
//! text; each candidate is re-parsed before it is accepted. No attempt is
//! ever trusted without a successful parse.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static TRAILING_COMMA_RE: OnceLock<Regex> = OnceLock::new();
static UNQUOTED_KEY_RE: OnceLock<Regex> = OnceLock::new();

/// Outcome of `validate_and_fix`
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// Whether the input parsed as-is
    pub valid: bool,
    /// Parse error for invalid input
    pub error: Option<String>,
    /// Repaired text, when a repair (or the skeleton fallback) was applied
    pub fixed: Option<String>,
    /// Human-readable description of the repairs applied
    pub suggestions: Vec<String>,
}

impl RepairOutcome {
    /// The best parseable text available: the input if valid, else the fix
    pub fn best(&self) -> Option<&str> {
        if self.valid {
            None
        } else {
            self.fixed.as_deref()
        }
    }
}

/// Validate a JSON text and, when invalid, try a fixed sequence of repairs
pub fn validate_and_fix(text: &str) -> RepairOutcome {
    let parse_error = match serde_json::from_str::<Value>(text) {
        Ok(_) => {
            return RepairOutcome {
                valid: true,
                error: None,
                fixed: None,
                suggestions: Vec::new(),
            }
        }
        Err(e) => e.to_string(),
    };

    let steps: [(&str, fn(&str) -> String); 4] = [
        ("removed trailing commas", remove_trailing_commas),
        ("quoted unquoted object keys", quote_unquoted_keys),
        ("balanced braces and brackets", balance_delimiters),
        ("closed unterminated string", close_unterminated_string),
    ];

    // Each repair is tried on its own first; a single fault needs a single
    // fix, and independent attempts cannot corrupt each other.
    for (description, step) in steps {
        let candidate = step(text);
        if candidate != text && serde_json::from_str::<Value>(&candidate).is_ok() {
            return RepairOutcome {
                valid: false,
                error: Some(parse_error),
                fixed: Some(candidate),
                suggestions: vec![description.to_string()],
            };
        }
    }

    // Compound faults: apply the repairs cumulatively. String closing runs
    // before delimiter balancing so closers never land inside an open
    // string.
    let combined: [(&str, fn(&str) -> String); 4] = [
        ("removed trailing commas", remove_trailing_commas),
        ("quoted unquoted object keys", quote_unquoted_keys),
        ("closed unterminated string", close_unterminated_string),
        ("balanced braces and brackets", balance_delimiters),
    ];
    let mut candidate = text.to_string();
    let mut suggestions = Vec::new();
    for (description, step) in combined {
        let next = step(&candidate);
        if next != candidate {
            suggestions.push(description.to_string());
            candidate = next;
        }
        if serde_json::from_str::<Value>(&candidate).is_ok() {
            return RepairOutcome {
                valid: false,
                error: Some(parse_error),
                fixed: Some(candidate),
                suggestions,
            };
        }
    }

    // Every repair failed; fall back to a tagged minimal skeleton keyed on
    // the root character.
    let skeleton = match text.trim_start().chars().next() {
        Some('{') => r#"{"data":"<truncated>","error":"truncated"}"#.to_string(),
        Some('[') => r#"["<truncated>"]"#.to_string(),
        _ => "\"<content>\"".to_string(),
    };
    suggestions.push("unrepairable input replaced by minimal skeleton".to_string());
    RepairOutcome {
        valid: false,
        error: Some(parse_error),
        fixed: Some(skeleton),
        suggestions,
    }
}

/// Parse text directly or through the repair sequence, rejecting the
/// skeleton fallback (callers that reach the skeleton have lost the data
/// and should treat the input as unparseable)
pub(crate) fn parse_or_repair(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    let outcome = validate_and_fix(text);
    if outcome
        .suggestions
        .iter()
        .any(|s| s.contains("minimal skeleton"))
    {
        return None;
    }
    outcome.fixed.and_then(|f| serde_json::from_str(&f).ok())
}

fn remove_trailing_commas(text: &str) -> String {
    let re = TRAILING_COMMA_RE.get_or_init(|| Regex::new(r",\s*([}\]])").unwrap());
    re.replace_all(text, "$1").into_owned()
}

fn quote_unquoted_keys(text: &str) -> String {
    let re = UNQUOTED_KEY_RE
        .get_or_init(|| Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:"#).unwrap());
    re.replace_all(text, "$1\"$2\":").into_owned()
}

/// Append missing closers in stack order and strip excess closers from the
/// end of the text
fn balance_delimiters(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut excess_from = None;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => stack.push(c),
            '}' if !in_string => {
                if stack.last() == Some(&'{') {
                    stack.pop();
                } else {
                    excess_from = Some(i);
                    break;
                }
            }
            ']' if !in_string => {
                if stack.last() == Some(&'[') {
                    stack.pop();
                } else {
                    excess_from = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }

    let mut fixed = match excess_from {
        Some(i) => text[..i].to_string(),
        None => text.to_string(),
    };
    for opener in stack.iter().rev() {
        fixed.push(if *opener == '{' { '}' } else { ']' });
    }
    fixed
}

/// If the last quote is unescaped and unmatched, close the string and
/// rebalance
fn close_unterminated_string(text: &str) -> String {
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
            _ => {}
        }
    }
    if in_string {
        let mut fixed = text.to_string();
        fixed.push('"');
        balance_delimiters(&fixed)
    } else {
        text.to_string()
    }
}

/// Result of a safe-truncation-point scan
#[derive(Debug, Clone)]
pub struct TruncationPoint {
    pub can_truncate: bool,
    /// Byte offset of the cut, when one exists
    pub point: Option<usize>,
    pub reason: Option<String>,
}

/// Find a newline-aligned byte offset at which a JSON container can be cut
/// and then re-closed. The scan budgets at 80% of `max_bytes` to leave room
/// for the closers.
pub fn safe_truncation_point(text: &str, max_bytes: usize) -> TruncationPoint {
    let trimmed = text.trim_start();
    let is_array = trimmed.starts_with('[');
    let is_object = trimmed.starts_with('{');
    if !is_array && !is_object {
        return TruncationPoint {
            can_truncate: false,
            point: None,
            reason: Some("not a JSON container".to_string()),
        };
    }

    let budget = max_bytes * 8 / 10;
    let mut consumed = 0usize;
    let mut last_safe = None;

    for line in text.split_inclusive('\n') {
        if consumed + line.len() > budget {
            break;
        }
        consumed += line.len();
        let tail = line.trim_end();
        let safe_end = if is_array {
            tail.ends_with(',') || tail.ends_with(']')
        } else {
            tail.ends_with(',') || tail.ends_with('}')
        };
        if safe_end {
            last_safe = Some(consumed);
        }
    }

    match last_safe {
        Some(point) => TruncationPoint {
            can_truncate: true,
            point: Some(point),
            reason: None,
        },
        None => TruncationPoint {
            can_truncate: false,
            point: None,
            reason: Some("no newline-aligned element boundary within budget".to_string()),
        },
    }
}
