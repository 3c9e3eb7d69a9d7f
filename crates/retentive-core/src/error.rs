//! Subsystem error type

use thiserror::Error;

/// Result type for memory-subsystem operations
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Errors that can occur in the memory subsystem
///
/// Size-related conditions inside reducers are handled by placeholder
/// values and never surface through this type; these variants cover the
/// remaining failure kinds.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Invalid threshold or limit supplied by the caller
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Content exceeded an absolute bound after every strategy was tried
    #[error("content overflow: {0}")]
    Overflow(String),

    /// JSON that could not be repaired into a parseable form
    #[error("parse error: {0}")]
    Parse(String),

    /// Blob directory could not be read or written
    #[error("blob storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A monitor sampling tick failed
    #[error("sampler failure: {0}")]
    SamplerFailure(String),

    /// An alert listener raised
    #[error("listener failure: {0}")]
    ListenerFailure(String),

    /// IO error
    #[error("io error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for MemoryError {
    fn from(e: std::io::Error) -> Self {
        MemoryError::Io(e)
    }
}

impl From<serde_json::Error> for MemoryError {
    fn from(e: serde_json::Error) -> Self {
        MemoryError::Parse(e.to_string())
    }
}
