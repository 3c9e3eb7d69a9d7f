//! Configuration surface for every bounded component
//!
//! All limits live here so a deployment can tune the subsystem from one
//! JSON file. Components receive their own settings struct at construction;
//! nothing reads configuration lazily.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const KB: usize = 1024;
const MB: usize = 1024 * 1024;

/// Environment knob for the heap ceiling, in megabytes
pub const HEAP_CEILING_ENV: &str = "RETENTIVE_HEAP_MB";

const DEFAULT_HEAP_CEILING_MB: u64 = 8192;

/// Memory monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Sampling interval in milliseconds
    pub interval_ms: u64,
    /// Warning threshold as a fraction of the heap ceiling
    pub warning_ratio: f64,
    /// Critical threshold as a fraction of the heap ceiling
    pub critical_ratio: f64,
    /// Invoke the runtime reclaim hook on critical alerts
    pub enable_forced_reclaim: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            warning_ratio: 0.70,
            critical_ratio: 0.85,
            enable_forced_reclaim: true,
        }
    }
}

/// Document cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    pub max_bytes: usize,
    pub max_entries: usize,
    /// Entries larger than this are stored gzip-compressed
    pub compress_threshold: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_bytes: 500 * MB,
            max_entries: 1_000,
            compress_threshold: MB,
        }
    }
}

/// Message history settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSettings {
    pub max_count: usize,
    pub max_total_bytes: usize,
    /// Bias retention toward important messages instead of a plain window
    pub preserve_important: bool,
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            max_count: 200,
            max_total_bytes: 50 * MB,
            preserve_important: true,
        }
    }
}

/// Per-field bounded string settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSettings {
    pub max_size: usize,
    pub compress_threshold: usize,
    pub summarize_threshold: usize,
    pub summarize_enabled: bool,
    pub compress_enabled: bool,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            max_size: 50 * MB,
            compress_threshold: 5 * MB,
            summarize_threshold: 30 * MB,
            summarize_enabled: true,
            compress_enabled: true,
        }
    }
}

/// Checkpoint serializer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializerSettings {
    /// Strings longer than this are externalized to blobs
    pub max_string_size: usize,
    /// Arrays longer than this are externalized to blobs
    pub max_array_size: usize,
    /// Objects with more keys than this are externalized to blobs
    pub max_object_keys: usize,
    pub blob_dir: String,
    /// Blob I/O operation timeout in milliseconds
    pub io_timeout_ms: u64,
}

impl Default for SerializerSettings {
    fn default() -> Self {
        Self {
            max_string_size: 200 * KB,
            max_array_size: 2_000,
            max_object_keys: 2_000,
            blob_dir: ".lg-blobs".to_string(),
            io_timeout_ms: 30_000,
        }
    }
}

/// What the context manager should do at a given pressure reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressureAction {
    /// Below the first band: provider formatting only
    PassThrough,
    /// Summarize old messages, keeping this fraction of recent ones
    Keep(f64),
    /// At or past 0.90: system + summary + last three non-system messages
    Emergency,
}

/// Keep-ratios for the fixed pressure bands
///
/// The band boundaries (0.60 / 0.70 / 0.80 / 0.90) are part of the contract
/// and not configurable; only the keep-ratios inside them are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PressureTable {
    pub moderate_keep: f64,
    pub elevated_keep: f64,
    pub severe_keep: f64,
}

impl Default for PressureTable {
    fn default() -> Self {
        Self {
            moderate_keep: 0.70,
            elevated_keep: 0.50,
            severe_keep: 0.30,
        }
    }
}

impl PressureTable {
    pub fn action_for(&self, pressure: f64) -> PressureAction {
        if pressure < 0.60 {
            PressureAction::PassThrough
        } else if pressure < 0.70 {
            PressureAction::Keep(self.moderate_keep)
        } else if pressure < 0.80 {
            PressureAction::Keep(self.elevated_keep)
        } else if pressure < 0.90 {
            PressureAction::Keep(self.severe_keep)
        } else {
            PressureAction::Emergency
        }
    }
}

/// Aggregated configuration for the whole subsystem
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Heap ceiling in MB; 0 means discover at startup
    pub heap_ceiling_mb: u64,
    pub monitor: MonitorSettings,
    pub cache: CacheSettings,
    pub messages: MessageSettings,
    pub fields: FieldSettings,
    /// Per-field overrides keyed by field name
    pub field_overrides: HashMap<String, FieldSettings>,
    pub serializer: SerializerSettings,
    pub pressure: PressureTable,
}

impl MemoryConfig {
    /// Load from a JSON file; missing file or unreadable content yields
    /// defaults, never an error
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("invalid config at {}: {e}, using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Defaults proportioned to a heap ceiling. The documented limits
    /// assume the 8192 MB baseline; smaller ceilings shrink every byte
    /// budget in step, with a 1 MB floor.
    pub fn for_heap_ceiling(heap_ceiling_mb: u64) -> Self {
        let mut config = Self {
            heap_ceiling_mb,
            ..Self::default()
        };
        let scale = heap_ceiling_mb as f64 / DEFAULT_HEAP_CEILING_MB as f64;
        let scaled = |bytes: usize| ((bytes as f64 * scale) as usize).max(MB);
        config.cache.max_bytes = scaled(config.cache.max_bytes);
        config.cache.compress_threshold = scaled(config.cache.compress_threshold);
        config.messages.max_total_bytes = scaled(config.messages.max_total_bytes);
        config.fields.max_size = scaled(config.fields.max_size);
        config.fields.compress_threshold = scaled(config.fields.compress_threshold);
        config.fields.summarize_threshold = scaled(config.fields.summarize_threshold);
        config
    }

    /// Effective heap ceiling: explicit value, env knob, system memory,
    /// then the 8192 MB default
    pub fn effective_heap_ceiling_mb(&self) -> u64 {
        if self.heap_ceiling_mb > 0 {
            return self.heap_ceiling_mb;
        }
        discover_heap_ceiling_mb()
    }

    /// Settings for a named field, honoring overrides
    pub fn field_settings(&self, field: &str) -> FieldSettings {
        self.field_overrides
            .get(field)
            .cloned()
            .unwrap_or_else(|| self.fields.clone())
    }
}

/// Heap ceiling discovery: env knob first, then total system memory, then
/// the documented default
pub fn discover_heap_ceiling_mb() -> u64 {
    if let Ok(raw) = std::env::var(HEAP_CEILING_ENV) {
        match raw.trim().parse::<u64>() {
            Ok(mb) if mb > 0 => return mb,
            _ => tracing::warn!("ignoring unparseable {HEAP_CEILING_ENV}={raw}"),
        }
    }
    let total = sysinfo::System::new_all().total_memory() / (1024 * 1024);
    if total > 0 {
        total
    } else {
        DEFAULT_HEAP_CEILING_MB
    }
}
