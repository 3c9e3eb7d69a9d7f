use retentive_blob::{BlobHandle, BlobStore, RedactingSerializer};
use retentive_core::{format_bytes, MemoryConfig};
use serde_json::Value;
use std::sync::Arc;

/// Describe a checkpoint file: header, structural size, externalized leaves
pub fn run(file: &str, blob_dir: Option<&str>) -> anyhow::Result<()> {
    let config = MemoryConfig::load_or_default(&super::config_path());
    let dir = blob_dir.unwrap_or(&config.serializer.blob_dir).to_string();
    let store = Arc::new(BlobStore::open(&dir)?);
    let serializer = RedactingSerializer::new(Arc::clone(&store), config.serializer);

    let bytes = std::fs::read(file)?;
    let checkpoint = serializer.deserialize(&bytes)?;

    let mut handles = Vec::new();
    collect_handles(checkpoint.value(), &mut handles);

    println!("checkpoint: {} ({})", file, format_bytes(bytes.len() as u64));
    println!("externalized leaves: {}", handles.len());
    let mut referenced = 0u64;
    for handle in &handles {
        let present = store.contains(&handle.hash);
        referenced += handle.size;
        println!(
            "  {}  {:>9}  {:?}{}",
            &handle.hash[..12.min(handle.hash.len())],
            format_bytes(handle.size),
            handle.kind,
            if present { "" } else { "  (MISSING)" }
        );
    }
    println!(
        "referenced bytes: {} across {}",
        format_bytes(referenced),
        dir
    );

    let missing = handles.iter().filter(|h| !store.contains(&h.hash)).count();
    if missing > 0 {
        anyhow::bail!("{missing} referenced blob(s) missing from {dir}");
    }
    Ok(())
}

fn collect_handles(value: &Value, out: &mut Vec<BlobHandle>) {
    if let Some(handle) = BlobHandle::from_value(value) {
        out.push(handle);
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                collect_handles(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_handles(item, out);
            }
        }
        _ => {}
    }
}
