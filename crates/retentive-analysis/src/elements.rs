//! Key-element extraction from tool-call content
//!
//! Regex line scans pulling the identifiers worth mentioning in a one-line
//! summary: function names, type names, exported symbols. Patterns compile
//! once and cover the JS/TS-family plus Rust and Python shapes agents edit
//! most.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const MAX_FUNCTIONS: usize = 10;
const MAX_TYPES: usize = 8;
const MAX_EXPORTS: usize = 6;

static FUNCTION_RE: OnceLock<Regex> = OnceLock::new();
static ARROW_RE: OnceLock<Regex> = OnceLock::new();
static TYPE_RE: OnceLock<Regex> = OnceLock::new();
static EXPORT_RE: OnceLock<Regex> = OnceLock::new();
static EXPORT_LIST_RE: OnceLock<Regex> = OnceLock::new();

fn function_re() -> &'static Regex {
    FUNCTION_RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:export\s+)?(?:pub\s+)?(?:async\s+)?(?:function|fn|def)\s+(\w+)")
            .unwrap()
    })
}

fn arrow_re() -> &'static Regex {
    ARROW_RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:export\s+)?const\s+(\w+)\s*=\s*(?:async\s*)?\([^)]*\)\s*(?::[^=]+)?=>")
            .unwrap()
    })
}

fn type_re() -> &'static Regex {
    TYPE_RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(?:export\s+)?(?:pub\s+)?(?:abstract\s+)?(?:class|interface|enum|struct|trait|type)\s+(\w+)",
        )
        .unwrap()
    })
}

fn export_re() -> &'static Regex {
    EXPORT_RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*export\s+(?:default\s+)?(?:async\s+)?(?:function|class|interface|enum|type|const|let|var)\s+(\w+)")
            .unwrap()
    })
}

fn export_list_re() -> &'static Regex {
    EXPORT_LIST_RE.get_or_init(|| Regex::new(r"(?m)^\s*export\s*\{([^}]+)\}").unwrap())
}

/// Identifier lists extracted from a content fragment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyElements {
    pub functions: Vec<String>,
    pub types: Vec<String>,
    pub exports: Vec<String>,
}

impl KeyElements {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.types.is_empty() && self.exports.is_empty()
    }
}

/// Language-aware extraction: picks a pattern set from the path's
/// extension, falling back to the generic multi-language scan
pub fn extract_key_elements_for_path(content: &str, path: Option<&str>) -> KeyElements {
    let ext = path
        .and_then(|p| std::path::Path::new(p).extension())
        .and_then(|e| e.to_str())
        .unwrap_or("");
    match ext {
        "rs" => extract_rust_elements(content),
        "py" => extract_python_elements(content),
        "go" => extract_go_elements(content),
        _ => extract_key_elements(content),
    }
}

static RUST_FN_RE: OnceLock<Regex> = OnceLock::new();
static RUST_TYPE_RE: OnceLock<Regex> = OnceLock::new();
static RUST_PUB_RE: OnceLock<Regex> = OnceLock::new();

fn extract_rust_elements(content: &str) -> KeyElements {
    let fn_re = RUST_FN_RE
        .get_or_init(|| Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+(\w+)").unwrap());
    let type_re = RUST_TYPE_RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait|type|union)\s+(\w+)").unwrap()
    });
    let pub_re = RUST_PUB_RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*pub(?:\([^)]*\))?\s+(?:async\s+)?(?:fn|struct|enum|trait|type|const|static)\s+(\w+)")
            .unwrap()
    });

    let mut elements = KeyElements::default();
    for caps in fn_re.captures_iter(content) {
        push_unique(&mut elements.functions, &caps[1], MAX_FUNCTIONS);
    }
    for caps in type_re.captures_iter(content) {
        push_unique(&mut elements.types, &caps[1], MAX_TYPES);
    }
    for caps in pub_re.captures_iter(content) {
        push_unique(&mut elements.exports, &caps[1], MAX_EXPORTS);
    }
    elements
}

static PY_DEF_RE: OnceLock<Regex> = OnceLock::new();
static PY_CLASS_RE: OnceLock<Regex> = OnceLock::new();

fn extract_python_elements(content: &str) -> KeyElements {
    let def_re = PY_DEF_RE.get_or_init(|| Regex::new(r"(?m)^\s*(?:async\s+)?def\s+(\w+)").unwrap());
    let class_re = PY_CLASS_RE.get_or_init(|| Regex::new(r"(?m)^\s*class\s+(\w+)").unwrap());

    let mut elements = KeyElements::default();
    for caps in def_re.captures_iter(content) {
        push_unique(&mut elements.functions, &caps[1], MAX_FUNCTIONS);
    }
    for caps in class_re.captures_iter(content) {
        push_unique(&mut elements.types, &caps[1], MAX_TYPES);
    }
    // Python has no export statement; module-level names double as the
    // public surface.
    for name in elements.functions.iter().chain(&elements.types) {
        if !name.starts_with('_') && elements.exports.len() < MAX_EXPORTS {
            elements.exports.push(name.clone());
        }
    }
    elements
}

static GO_FUNC_RE: OnceLock<Regex> = OnceLock::new();
static GO_TYPE_RE: OnceLock<Regex> = OnceLock::new();

fn extract_go_elements(content: &str) -> KeyElements {
    let func_re = GO_FUNC_RE
        .get_or_init(|| Regex::new(r"(?m)^func\s+(?:\([^)]*\)\s+)?(\w+)").unwrap());
    let type_re = GO_TYPE_RE.get_or_init(|| Regex::new(r"(?m)^type\s+(\w+)").unwrap());

    let mut elements = KeyElements::default();
    for caps in func_re.captures_iter(content) {
        push_unique(&mut elements.functions, &caps[1], MAX_FUNCTIONS);
    }
    for caps in type_re.captures_iter(content) {
        push_unique(&mut elements.types, &caps[1], MAX_TYPES);
    }
    // Exported Go identifiers are the capitalized ones.
    for name in elements.functions.iter().chain(&elements.types) {
        if name.chars().next().is_some_and(|c| c.is_uppercase())
            && elements.exports.len() < MAX_EXPORTS
        {
            elements.exports.push(name.clone());
        }
    }
    elements
}

/// Scan content for functions, types, and exports, deduplicated in
/// appearance order and capped per category
pub fn extract_key_elements(content: &str) -> KeyElements {
    let mut functions = Vec::new();
    for caps in function_re().captures_iter(content) {
        push_unique(&mut functions, &caps[1], MAX_FUNCTIONS);
    }
    for caps in arrow_re().captures_iter(content) {
        push_unique(&mut functions, &caps[1], MAX_FUNCTIONS);
    }

    let mut types = Vec::new();
    for caps in type_re().captures_iter(content) {
        push_unique(&mut types, &caps[1], MAX_TYPES);
    }

    let mut exports = Vec::new();
    for caps in export_re().captures_iter(content) {
        push_unique(&mut exports, &caps[1], MAX_EXPORTS);
    }
    for caps in export_list_re().captures_iter(content) {
        for name in caps[1].split(',') {
            let name = name.trim().split_whitespace().next().unwrap_or("");
            if !name.is_empty() {
                push_unique(&mut exports, name, MAX_EXPORTS);
            }
        }
    }

    KeyElements {
        functions,
        types,
        exports,
    }
}

fn push_unique(list: &mut Vec<String>, item: &str, cap: usize) {
    if list.len() < cap && !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}
