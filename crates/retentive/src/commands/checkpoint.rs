use retentive_blob::{BlobStore, RedactingSerializer};
use retentive_core::MemoryConfig;
use std::sync::Arc;

fn serializer(blob_dir: Option<&str>) -> anyhow::Result<RedactingSerializer> {
    let config = MemoryConfig::load_or_default(&super::config_path());
    let dir = blob_dir.unwrap_or(&config.serializer.blob_dir).to_string();
    let store = Arc::new(BlobStore::open(dir)?);
    Ok(RedactingSerializer::new(store, config.serializer))
}

pub fn save(input: &str, output: &str, blob_dir: Option<&str>) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(input)?;
    let state: serde_json::Value = serde_json::from_str(&text)?;

    let bytes = serializer(blob_dir)?.serialize(&state)?;
    std::fs::write(output, &bytes)?;
    println!(
        "checkpointed {} ({} bytes in, {} bytes out)",
        input,
        text.len(),
        bytes.len()
    );
    Ok(())
}

pub fn restore(input: &str, output: &str, blob_dir: Option<&str>) -> anyhow::Result<()> {
    let bytes = std::fs::read(input)?;
    let checkpoint = serializer(blob_dir)?.deserialize(&bytes)?;
    let resolved = checkpoint.resolve_all()?;
    std::fs::write(output, serde_json::to_string_pretty(&resolved)?)?;
    println!("restored {} -> {}", input, output);
    Ok(())
}
