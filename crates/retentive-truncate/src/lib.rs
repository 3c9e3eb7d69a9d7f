//! Syntax-aware truncation
//!
//! Cuts text down to a byte budget without breaking the syntax of the
//! declared (or detected) content type: truncated JSON still parses,
//! truncated code contains only whole declarations or comment stubs,
//! truncated trees keep their shallow structure.

mod code;
mod detect;
mod generic;
mod json;
pub mod repair;
mod tree;

pub use detect::detect_content_type;
pub use repair::{safe_truncation_point, validate_and_fix, RepairOutcome, TruncationPoint};

use retentive_core::{MemoryError, MemoryResult};

/// Content type driving strategy dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    /// JavaScript / TypeScript source
    Code,
    /// HTML or XML markup
    Markup,
    /// Box-drawing codebase tree listing
    Tree,
    Text,
}

/// Result of a truncation pass
#[derive(Debug, Clone)]
pub struct TruncateOutcome {
    pub content: String,
    pub truncated: bool,
    pub original_size: usize,
    pub final_size: usize,
    /// Whether the output still parses under the content type
    pub syntax_valid: bool,
    /// Strategy that produced the output
    pub method: &'static str,
}

impl TruncateOutcome {
    fn unchanged(text: &str) -> Self {
        Self {
            content: text.to_string(),
            truncated: false,
            original_size: text.len(),
            final_size: text.len(),
            syntax_valid: true,
            method: "none",
        }
    }
}

/// Tunables shared by the strategies
#[derive(Debug, Clone)]
pub struct TruncateOptions {
    /// Object keys dropped by the JSON property-removal pass
    pub unimportant_keys: Vec<String>,
    /// Array prefix kept by the JSON array pass
    pub max_array_items: usize,
    /// Leaf string cap for the JSON string pass
    pub max_leaf_string: usize,
    /// Bounded attempts before a strategy falls back to generic
    pub max_attempts: usize,
}

impl Default for TruncateOptions {
    fn default() -> Self {
        Self {
            unimportant_keys: [
                "debug",
                "trace",
                "verbose",
                "metadata",
                "stats",
                "cache",
                "logs",
                "history",
                "temp",
                "tmp",
                "deprecated",
                "_id",
                "timestamp",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_array_items: 10,
            max_leaf_string: 1_000,
            max_attempts: 3,
        }
    }
}

/// Truncate with default options
pub fn truncate(
    text: &str,
    max_bytes: usize,
    content_type: Option<ContentType>,
) -> MemoryResult<TruncateOutcome> {
    Truncator::default().truncate(text, max_bytes, content_type)
}

/// Type-dispatched truncator
#[derive(Debug, Clone, Default)]
pub struct Truncator {
    options: TruncateOptions,
}

impl Truncator {
    pub fn new(options: TruncateOptions) -> Self {
        Self { options }
    }

    pub fn truncate(
        &self,
        text: &str,
        max_bytes: usize,
        content_type: Option<ContentType>,
    ) -> MemoryResult<TruncateOutcome> {
        if max_bytes == 0 {
            return Err(MemoryError::Configuration(
                "truncation budget must be positive".to_string(),
            ));
        }
        if text.is_empty() || text.len() <= max_bytes {
            return Ok(TruncateOutcome::unchanged(text));
        }

        let detected = content_type.unwrap_or_else(|| detect::detect_content_type(text));
        tracing::debug!(
            size = text.len(),
            max_bytes,
            ?detected,
            "truncating oversized content"
        );

        let outcome = match detected {
            ContentType::Json => match json::truncate_json(text, max_bytes, &self.options) {
                Ok(outcome) => outcome,
                Err(_) => {
                    // Unrepairable input under explicit JSON semantics: keep
                    // the raw text, cut generically, and flag the syntax.
                    let mut outcome = generic::truncate_generic(text, max_bytes);
                    outcome.syntax_valid = false;
                    outcome.method = "safe-json-fallback";
                    outcome
                }
            },
            ContentType::Code => code::truncate_code(text, max_bytes),
            ContentType::Tree => tree::truncate_tree(text, max_bytes, self.options.max_attempts)
                .unwrap_or_else(|| generic::truncate_generic(text, max_bytes)),
            // Markup truncation cannot be made tag-safe cheaply; the
            // head-and-tail cut at least never splits a line.
            ContentType::Markup | ContentType::Text => generic::truncate_generic(text, max_bytes),
        };

        debug_assert!(!outcome.truncated || outcome.final_size <= max_bytes);
        Ok(outcome)
    }
}
