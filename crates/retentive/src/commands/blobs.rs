use retentive_blob::BlobStore;
use retentive_core::{format_bytes, MemoryConfig};

pub fn run(dir: Option<&str>, verify: bool) -> anyhow::Result<()> {
    let config = MemoryConfig::load_or_default(&super::config_path());
    let dir = dir.unwrap_or(&config.serializer.blob_dir);
    let store = BlobStore::open(dir)?;

    let hashes = store.list()?;
    for hash in &hashes {
        let size = std::fs::metadata(store.path_for(hash)).map(|m| m.len()).unwrap_or(0);
        println!("{}  {}", &hash[..12.min(hash.len())], format_bytes(size));
    }
    let (count, total) = store.stats()?;
    println!("{} blobs, {}", count, format_bytes(total));

    if verify {
        let corrupt = store.verify()?;
        if corrupt.is_empty() {
            println!("verify: all content hashes match");
        } else {
            for hash in &corrupt {
                eprintln!("corrupt: {hash}");
            }
            anyhow::bail!("{} corrupt blob(s)", corrupt.len());
        }
    }
    Ok(())
}
