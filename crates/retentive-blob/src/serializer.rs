//! Redacting serializer and lazy checkpoint handles

use crate::store::BlobStore;
use parking_lot::Mutex;
use retentive_core::config::SerializerSettings;
use retentive_core::{MemoryError, MemoryResult};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Self-describing prefix of serialized checkpoints
pub const MAGIC: [u8; 4] = *b"RTCK";
pub const VERSION: u8 = 1;

/// What an externalized leaf was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Text,
    Array,
    Object,
}

impl HandleKind {
    fn tag(&self) -> &'static str {
        match self {
            HandleKind::Text => "text",
            HandleKind::Array => "array",
            HandleKind::Object => "object",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(HandleKind::Text),
            "array" => Some(HandleKind::Array),
            "object" => Some(HandleKind::Object),
            _ => None,
        }
    }
}

/// Typed reference to an externalized leaf
#[derive(Debug, Clone, PartialEq)]
pub struct BlobHandle {
    pub hash: String,
    pub kind: HandleKind,
    pub size: u64,
}

impl BlobHandle {
    /// Recognize the `{blob, type, size}` shape; anything else is data
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.len() != 3 {
            return None;
        }
        Some(Self {
            hash: map.get("blob")?.as_str()?.to_string(),
            kind: HandleKind::from_tag(map.get("type")?.as_str()?)?,
            size: map.get("size")?.as_u64()?,
        })
    }

    fn to_value(&self) -> Value {
        json!({"blob": self.hash, "type": self.kind.tag(), "size": self.size})
    }
}

/// Serializer that externalizes oversized leaves before encoding
pub struct RedactingSerializer {
    store: Arc<BlobStore>,
    limits: SerializerSettings,
}

impl RedactingSerializer {
    pub fn new(store: Arc<BlobStore>, limits: SerializerSettings) -> Self {
        Self { store, limits }
    }

    /// Encode a state snapshot. Every string, array, or object past its
    /// threshold becomes a handle; the blob write happens before the handle
    /// is emitted, so bytes never reference missing data.
    pub fn serialize(&self, state: &Value) -> MemoryResult<Vec<u8>> {
        let redacted = self.redact(state)?;
        let body = serde_json::to_vec(&redacted)?;
        let mut out = Vec::with_capacity(body.len() + 5);
        out.extend_from_slice(&MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decode checkpoint bytes into a lazily-resolving view
    pub fn deserialize(&self, bytes: &[u8]) -> MemoryResult<Checkpoint> {
        if bytes.len() < 5 || bytes[..4] != MAGIC {
            return Err(MemoryError::Parse("not a checkpoint: bad magic".to_string()));
        }
        if bytes[4] != VERSION {
            return Err(MemoryError::Parse(format!(
                "unsupported checkpoint version {}",
                bytes[4]
            )));
        }
        let value: Value = serde_json::from_slice(&bytes[5..])?;
        Ok(Checkpoint {
            value,
            store: Arc::clone(&self.store),
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn redact(&self, value: &Value) -> MemoryResult<Value> {
        match value {
            Value::String(s) if s.len() > self.limits.max_string_size => {
                self.externalize(s.as_bytes(), HandleKind::Text)
            }
            Value::Array(items) if items.len() > self.limits.max_array_size => {
                let body = serde_json::to_vec(value)?;
                self.externalize(&body, HandleKind::Array)
            }
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.redact(item)?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) if map.len() > self.limits.max_object_keys => {
                let body = serde_json::to_vec(value)?;
                self.externalize(&body, HandleKind::Object)
            }
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.clone(), self.redact(item)?);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other.clone()),
        }
    }

    fn externalize(&self, bytes: &[u8], kind: HandleKind) -> MemoryResult<Value> {
        let hash = self.store.write(bytes)?;
        tracing::debug!(hash = %hash, size = bytes.len(), kind = kind.tag(), "leaf externalized");
        Ok(BlobHandle {
            hash,
            kind,
            size: bytes.len() as u64,
        }
        .to_value())
    }
}

/// A deserialized snapshot whose externalized leaves load on first access
pub struct Checkpoint {
    value: Value,
    store: Arc<BlobStore>,
    cache: Mutex<HashMap<String, Value>>,
}

impl Checkpoint {
    /// Structural view with handles still embedded
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Fetch one handle's content, caching per hash. A missing or corrupt
    /// blob returns an error to the caller; it never panics.
    pub fn fetch(&self, handle: &BlobHandle) -> MemoryResult<Value> {
        if let Some(hit) = self.cache.lock().get(&handle.hash) {
            return Ok(hit.clone());
        }
        let bytes = self.store.read(&handle.hash)?;
        let value = match handle.kind {
            HandleKind::Text => Value::String(
                String::from_utf8(bytes)
                    .map_err(|e| MemoryError::Parse(format!("blob {} not utf-8: {e}", handle.hash)))?,
            ),
            HandleKind::Array | HandleKind::Object => serde_json::from_slice(&bytes)?,
        };
        self.cache.lock().insert(handle.hash.clone(), value.clone());
        Ok(value)
    }

    /// Deep copy with every handle replaced by its content
    pub fn resolve_all(&self) -> MemoryResult<Value> {
        self.resolve(&self.value)
    }

    fn resolve(&self, value: &Value) -> MemoryResult<Value> {
        if let Some(handle) = BlobHandle::from_value(value) {
            return self.fetch(&handle);
        }
        match value {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.resolve(item)?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.clone(), self.resolve(item)?);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other.clone()),
        }
    }
}
