//! Bounded string storage and the per-field pipeline

use crate::summarize::{self, FieldKind};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use retentive_core::config::FieldSettings;
use retentive_core::{gzip_compress, gzip_decompress, MemoryConfig, MemoryResult};
use retentive_truncate::{ContentType, Truncator};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

/// Fraction of the field cap targeted by the final truncation stage
const TRUNCATE_FRACTION: f64 = 0.80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum FieldData {
    Plain(String),
    Gzipped(Vec<u8>),
}

/// A named state field kept within its byte cap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedString {
    data: FieldData,
    pub summarized: bool,
    pub compressed: bool,
    pub original_size: usize,
    pub current_size: usize,
    pub last_modified: DateTime<Utc>,
}

impl BoundedString {
    pub fn empty() -> Self {
        Self {
            data: FieldData::Plain(String::new()),
            summarized: false,
            compressed: false,
            original_size: 0,
            current_size: 0,
            last_modified: Utc::now(),
        }
    }

    /// Text view; compressed fields are inflated on demand
    pub fn text(&self) -> MemoryResult<Cow<'_, str>> {
        match &self.data {
            FieldData::Plain(s) => Ok(Cow::Borrowed(s)),
            FieldData::Gzipped(bytes) => {
                let inflated = gzip_decompress(bytes)?;
                Ok(Cow::Owned(String::from_utf8_lossy(&inflated).into_owned()))
            }
        }
    }

    /// Bytes held in memory for this field
    pub fn stored_size(&self) -> usize {
        self.current_size
    }
}

/// Per-field pipeline: summarize, compress, truncate
///
/// One instance owns the limits for every named field; writes go through
/// `process` (or the reducer form `reduce`) and always come back within
/// bounds.
pub struct StringFields {
    defaults: FieldSettings,
    overrides: HashMap<String, FieldSettings>,
    truncator: Truncator,
    /// Fields whose overflow has already been logged this session
    overflow_logged: Mutex<HashSet<String>>,
}

impl StringFields {
    pub fn new(defaults: FieldSettings) -> Self {
        Self {
            defaults,
            overrides: HashMap::new(),
            truncator: Truncator::default(),
            overflow_logged: Mutex::new(HashSet::new()),
        }
    }

    pub fn from_config(config: &MemoryConfig) -> Self {
        let mut fields = Self::new(config.fields.clone());
        fields.overrides = config.field_overrides.clone();
        fields
    }

    pub fn with_override(mut self, field: impl Into<String>, settings: FieldSettings) -> Self {
        self.overrides.insert(field.into(), settings);
        self
    }

    fn settings_for(&self, field: &str) -> &FieldSettings {
        self.overrides.get(field).unwrap_or(&self.defaults)
    }

    /// Run the pipeline for one write
    pub fn process(&self, text: &str, field: &str) -> BoundedString {
        let settings = self.settings_for(field);
        let original_size = text.len();
        let kind = FieldKind::for_field(field);

        // 1. Summarize oversized input.
        let mut summarized = false;
        let mut current: Cow<'_, str> = Cow::Borrowed(text);
        if settings.summarize_enabled && original_size > settings.summarize_threshold {
            current = Cow::Owned(summarize::summarize(kind, text));
            summarized = true;
            tracing::debug!(field, from = original_size, to = current.len(), "field summarized");
        }

        // 2. Compress what is still large.
        if settings.compress_enabled && current.len() > settings.compress_threshold {
            if let Ok(packed) = gzip_compress(current.as_bytes()) {
                if packed.len() < current.len() && packed.len() <= settings.max_size {
                    return BoundedString {
                        current_size: packed.len(),
                        data: FieldData::Gzipped(packed),
                        summarized,
                        compressed: true,
                        original_size,
                        last_modified: Utc::now(),
                    };
                }
            }
        }

        // 3. Truncate anything that still overflows the cap. Overflow is
        // absorbed, never rejected; one log line per field per session.
        if current.len() > settings.max_size {
            if self.overflow_logged.lock().insert(field.to_string()) {
                tracing::warn!(
                    field,
                    size = current.len(),
                    cap = settings.max_size,
                    "field overflowed after summarize/compress; truncating"
                );
            }
            let budget = (settings.max_size as f64 * TRUNCATE_FRACTION) as usize;
            let hint = match kind {
                FieldKind::CodebaseTree => Some(ContentType::Tree),
                _ => None,
            };
            let content = match self.truncator.truncate(&current, budget.max(1), hint) {
                Ok(outcome) => outcome.content,
                // A zero budget is unreachable here; keep a hard cut as the
                // spec's placeholder-value fallback.
                Err(_) => current.chars().take(budget.max(1)).collect(),
            };
            return BoundedString {
                current_size: content.len(),
                data: FieldData::Plain(content),
                summarized,
                compressed: false,
                original_size,
                last_modified: Utc::now(),
            };
        }

        BoundedString {
            current_size: current.len(),
            data: FieldData::Plain(current.into_owned()),
            summarized,
            compressed: false,
            original_size,
            last_modified: Utc::now(),
        }
    }

    /// Reducer form: string fields are replace-by-write, and an absent
    /// update leaves the previous value untouched
    pub fn reduce(
        &self,
        prev: Option<BoundedString>,
        update: Option<&str>,
        field: &str,
    ) -> BoundedString {
        match update {
            None => prev.unwrap_or_else(BoundedString::empty),
            Some(text) => self.process(text, field),
        }
    }
}
