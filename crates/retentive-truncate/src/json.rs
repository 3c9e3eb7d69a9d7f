//! JSON truncation strategy
//!
//! Works on a parsed (or repaired) value and applies increasingly lossy
//! passes, re-encoding and re-measuring after each one: array truncation,
//! unimportant-property removal, leaf-string truncation, minimal skeleton.
//! Output always parses.

use crate::repair;
use crate::{TruncateOptions, TruncateOutcome};
use retentive_core::{MemoryError, MemoryResult};
use serde_json::Value;

pub(crate) fn truncate_json(
    text: &str,
    max_bytes: usize,
    options: &TruncateOptions,
) -> MemoryResult<TruncateOutcome> {
    let original = repair::parse_or_repair(text)
        .ok_or_else(|| MemoryError::Parse("input is not repairable JSON".to_string()))?;
    let original_size = text.len();

    let mut value = original;
    let passes: [(&'static str, fn(&mut Value, &TruncateOptions)); 3] = [
        ("array-truncation", limit_arrays),
        ("property-removal", drop_unimportant_properties),
        ("string-truncation", shorten_leaf_strings),
    ];

    for (method, pass) in passes {
        pass(&mut value, options);
        let encoded = value.to_string();
        if encoded.len() <= max_bytes {
            return Ok(done(encoded, original_size, method));
        }
    }

    let skeleton = minimal_skeleton(&value, max_bytes, options);
    Ok(done(skeleton, original_size, "minimal-json"))
}

fn done(content: String, original_size: usize, method: &'static str) -> TruncateOutcome {
    let final_size = content.len();
    TruncateOutcome {
        content,
        truncated: true,
        original_size,
        final_size,
        syntax_valid: true,
        method,
    }
}

/// Keep the first N elements of every array, appending a placeholder
/// element that records the elided count
fn limit_arrays(value: &mut Value, options: &TruncateOptions) {
    match value {
        Value::Array(items) => {
            if items.len() > options.max_array_items {
                let elided = items.len() - options.max_array_items;
                items.truncate(options.max_array_items);
                items.push(Value::String(format!("[{elided} items truncated]")));
            }
            for item in items.iter_mut() {
                limit_arrays(item, options);
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                limit_arrays(v, options);
            }
        }
        _ => {}
    }
}

/// Remove object properties whose keys are on the denylist
fn drop_unimportant_properties(value: &mut Value, options: &TruncateOptions) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| {
                let lowered = key.to_lowercase();
                !options.unimportant_keys.iter().any(|deny| lowered == *deny)
            });
            for (_, v) in map.iter_mut() {
                drop_unimportant_properties(v, options);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                drop_unimportant_properties(item, options);
            }
        }
        _ => {}
    }
}

/// Cap every leaf string at the configured length
fn shorten_leaf_strings(value: &mut Value, options: &TruncateOptions) {
    match value {
        Value::String(s) => {
            if s.len() > options.max_leaf_string {
                let cut = floor_char_boundary(s, options.max_leaf_string);
                let mut shortened = s[..cut].to_string();
                shortened.push_str("...[truncated]");
                *s = shortened;
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                shorten_leaf_strings(item, options);
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                shorten_leaf_strings(v, options);
            }
        }
        _ => {}
    }
}

/// Last resort: a tiny object or array keeping the first three retained
/// keys (or first element) plus an ellipsis marker, shrinking further if
/// even that overflows
fn minimal_skeleton(value: &Value, max_bytes: usize, options: &TruncateOptions) -> String {
    const VALUE_CAP: usize = 40;

    let candidate = match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, v) in map.iter() {
                if options.unimportant_keys.contains(&key.to_lowercase()) {
                    continue;
                }
                out.insert(key.clone(), cap_value(v, VALUE_CAP));
                if out.len() == 3 {
                    break;
                }
            }
            out.insert("...".to_string(), Value::String("truncated".to_string()));
            Value::Object(out)
        }
        Value::Array(items) => {
            let mut out = Vec::new();
            if let Some(first) = items.first() {
                out.push(cap_value(first, VALUE_CAP));
            }
            out.push(Value::String(format!(
                "[{} items truncated]",
                items.len().saturating_sub(1)
            )));
            Value::Array(out)
        }
        other => cap_value(other, VALUE_CAP),
    };

    let mut encoded = candidate.to_string();
    if encoded.len() > max_bytes {
        // Shrink key by key until it fits.
        if let Value::Object(mut map) = candidate {
            while encoded.len() > max_bytes && map.len() > 1 {
                let victim = map
                    .keys()
                    .find(|k| k.as_str() != "...")
                    .cloned();
                match victim {
                    Some(k) => {
                        map.remove(&k);
                    }
                    None => break,
                }
                encoded = Value::Object(map.clone()).to_string();
            }
        }
    }
    if encoded.len() > max_bytes {
        encoded = if value.is_array() { "[]".into() } else { "{}".into() };
    }
    encoded
}

fn cap_value(value: &Value, cap: usize) -> Value {
    let encoded = value.to_string();
    if encoded.len() <= cap {
        value.clone()
    } else {
        Value::String("...".to_string())
    }
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut i = index.min(s.len());
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
