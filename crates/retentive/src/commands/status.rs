use retentive_core::{format_bytes, MemoryConfig};
use retentive_monitor::{MemoryMonitor, MemoryProbe, SysinfoProbe};

pub fn run() -> anyhow::Result<()> {
    let config_file = super::config_path();
    let config = MemoryConfig::load_or_default(&config_file);
    let ceiling_mb = config.effective_heap_ceiling_mb();

    println!("config: {}", config_file.display());
    println!("heap ceiling: {} MB", ceiling_mb);
    println!(
        "document cache: {} / {} entries max",
        format_bytes(config.cache.max_bytes as u64),
        config.cache.max_entries
    );
    println!(
        "message history: {} messages / {} max",
        config.messages.max_count,
        format_bytes(config.messages.max_total_bytes as u64)
    );
    println!(
        "string fields: {} cap, compress over {}",
        format_bytes(config.fields.max_size as u64),
        format_bytes(config.fields.compress_threshold as u64)
    );
    println!(
        "serializer: strings over {} externalized to {}",
        format_bytes(config.serializer.max_string_size as u64),
        config.serializer.blob_dir
    );

    let probe = SysinfoProbe::new()?;
    let sample = probe.sample()?;
    println!();
    println!("rss: {}", format_bytes(sample.rss));
    println!("heap total: {}", format_bytes(sample.heap_total));

    let monitor = MemoryMonitor::new(config.monitor.clone(), ceiling_mb, Box::new(probe));
    monitor.tick_once();
    let thresholds = monitor.thresholds();
    println!(
        "pressure: {:.2} (warning at {}, critical at {})",
        monitor.pressure(),
        format_bytes(thresholds.heap_warning),
        format_bytes(thresholds.heap_critical)
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_status_runs_without_config_file() {
        unsafe { std::env::set_var("RETENTIVE_CONFIG", "/nonexistent/retentive.json") };
        let result = run();
        unsafe { std::env::remove_var("RETENTIVE_CONFIG") };
        assert!(result.is_ok());
    }
}
