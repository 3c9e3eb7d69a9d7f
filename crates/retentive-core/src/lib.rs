//! Core types and utilities for the retentive memory subsystem
//!
//! Everything here is shared by the bounded components (cache, history,
//! fields, context): the message/tool-call data model, UTF-8 size and gzip
//! helpers, the aggregated configuration surface, and the error type.

pub mod config;
pub mod error;
pub mod size;
pub mod types;

pub use config::{
    CacheSettings, FieldSettings, MemoryConfig, MessageSettings, MonitorSettings, PressureAction,
    PressureTable, SerializerSettings,
};
pub use error::{MemoryError, MemoryResult};
pub use size::{byte_len, estimate_tokens, format_bytes, gzip_compress, gzip_decompress};
pub use types::{Message, MessageContent, MessageKind, ToolCallRecord};
