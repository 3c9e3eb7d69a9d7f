//! Serializer externalization scenario: the 300 KB string

use retentive_blob::{BlobHandle, BlobStore, RedactingSerializer};
use retentive_core::config::SerializerSettings;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn three_hundred_kb_string_is_externalized() {
    let temp = TempDir::new().unwrap();
    let blob_root = temp.path().join(".lg-blobs");
    let store = Arc::new(BlobStore::open(&blob_root).unwrap());
    let serializer = RedactingSerializer::new(Arc::clone(&store), SerializerSettings::default());

    let notes = "n".repeat(300 * 1024);
    let state = json!({"notes": notes});

    let bytes = serializer.serialize(&state).unwrap();
    assert!(
        bytes.len() < 1_000,
        "emitted bytes should hold a handle, not the payload"
    );

    let checkpoint = serializer.deserialize(&bytes).unwrap();
    let handle = BlobHandle::from_value(&checkpoint.value()["notes"]).unwrap();

    // Blob file exists under <dir>/<hash[0:2]>/<hash> with exact content.
    let blob_path = blob_root.join(&handle.hash[..2]).join(&handle.hash);
    assert!(blob_path.exists());
    assert_eq!(std::fs::read(&blob_path).unwrap(), notes.as_bytes());

    // The lazy read yields the original bytes.
    assert_eq!(
        checkpoint.fetch(&handle).unwrap(),
        serde_json::Value::String(notes.clone())
    );
    assert_eq!(checkpoint.resolve_all().unwrap(), state);
}

#[test]
fn structural_roundtrip_without_oversize_leaves() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(BlobStore::open(temp.path().join("blobs")).unwrap());
    let serializer = RedactingSerializer::new(store, SerializerSettings::default());

    let state = json!({
        "messages": [{"kind": "human", "content": "hello"}],
        "step": 12,
        "flags": {"resumed": false},
    });
    let bytes = serializer.serialize(&state).unwrap();
    let checkpoint = serializer.deserialize(&bytes).unwrap();
    assert_eq!(checkpoint.value(), &state);
    assert_eq!(checkpoint.resolve_all().unwrap(), state);
}

#[test]
fn serialize_twice_is_deterministic_and_deduplicated() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(BlobStore::open(temp.path().join("blobs")).unwrap());
    let serializer = RedactingSerializer::new(Arc::clone(&store), SerializerSettings::default());

    let state = json!({"big": "b".repeat(250 * 1024)});
    let first = serializer.serialize(&state).unwrap();
    let second = serializer.serialize(&state).unwrap();
    assert_eq!(first, second);
    assert_eq!(store.list().unwrap().len(), 1);
}
