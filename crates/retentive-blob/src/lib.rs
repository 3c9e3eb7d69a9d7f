//! Checkpoint persistence
//!
//! Oversized leaves of a state snapshot are redacted out of the serialized
//! bytes and written to a content-addressed blob directory; the serialized
//! form carries small typed handles instead. Deserialization hands back a
//! checkpoint whose handles resolve lazily on first access.

mod serializer;
mod store;

pub use serializer::{BlobHandle, Checkpoint, HandleKind, RedactingSerializer};
pub use store::BlobStore;
