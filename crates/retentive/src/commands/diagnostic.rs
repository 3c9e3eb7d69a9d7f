use retentive_blob::BlobStore;
use retentive_core::{gzip_compress, gzip_decompress, MemoryConfig};
use retentive_monitor::{MemoryProbe, SysinfoProbe};

/// Check that every subsystem dependency is usable in this environment
pub fn run() -> anyhow::Result<()> {
    let mut failures = 0usize;

    let config_file = super::config_path();
    let config = MemoryConfig::load_or_default(&config_file);
    report(
        "config",
        config_file.exists(),
        &format!("{} (defaults used when absent)", config_file.display()),
    );

    let thresholds_ok = config.monitor.warning_ratio < config.monitor.critical_ratio;
    if !thresholds_ok {
        failures += 1;
    }
    report(
        "monitor thresholds",
        thresholds_ok,
        &format!(
            "warning {} < critical {}",
            config.monitor.warning_ratio, config.monitor.critical_ratio
        ),
    );

    match SysinfoProbe::new().and_then(|p| p.sample()) {
        Ok(sample) => report("memory probe", true, &format!("rss {} bytes", sample.rss)),
        Err(e) => {
            failures += 1;
            report("memory probe", false, &e.to_string());
        }
    }

    let gzip_ok = gzip_compress(b"diagnostic payload")
        .and_then(|packed| gzip_decompress(&packed))
        .map(|restored| restored == b"diagnostic payload")
        .unwrap_or(false);
    if !gzip_ok {
        failures += 1;
    }
    report("gzip", gzip_ok, "compress/decompress self-test");

    match BlobStore::open(&config.serializer.blob_dir).and_then(|s| s.write(b"diagnostic")) {
        Ok(hash) => report(
            "blob store",
            true,
            &format!("{} writable ({})", config.serializer.blob_dir, &hash[..8]),
        ),
        Err(e) => {
            failures += 1;
            report("blob store", false, &e.to_string());
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} diagnostic check(s) failed");
    }
    println!("\nall checks passed");
    Ok(())
}

fn report(name: &str, ok: bool, detail: &str) {
    let mark = if ok { "ok " } else { "FAIL" };
    println!("[{mark}] {name}: {detail}");
}
