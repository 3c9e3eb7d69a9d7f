use retentive_core::{format_bytes, MemoryConfig};
use retentive_monitor::{MemoryMonitor, SysinfoProbe};
use std::time::Duration;

pub fn run(once: bool, interval_ms: Option<u64>) -> anyhow::Result<()> {
    let config = MemoryConfig::load_or_default(&super::config_path());
    let mut settings = config.monitor.clone();
    if let Some(interval) = interval_ms {
        settings.interval_ms = interval;
    }
    let ceiling_mb = config.effective_heap_ceiling_mb();

    let probe = SysinfoProbe::new()?;
    let monitor = MemoryMonitor::new(settings.clone(), ceiling_mb, Box::new(probe));
    monitor.subscribe(|alert| {
        eprintln!("[alert] {}", alert.message);
    });

    if once {
        if let Some(sample) = monitor.tick_once() {
            print_sample(&monitor, &sample);
        }
        monitor.deliver_pending();
        return Ok(());
    }

    println!(
        "sampling every {} ms against a {} MB ceiling (ctrl-c to stop)",
        settings.interval_ms, ceiling_mb
    );
    monitor.start();
    loop {
        std::thread::sleep(Duration::from_millis(settings.interval_ms));
        if let Some(sample) = monitor.history().last() {
            print_sample(&monitor, sample);
        }
        if !monitor.stats().running {
            anyhow::bail!("monitor stopped after repeated sampler failures");
        }
    }
}

fn print_sample(monitor: &MemoryMonitor, sample: &retentive_monitor::MemorySample) {
    println!(
        "rss {} | heap {} | pressure {:.2}",
        format_bytes(sample.rss),
        format_bytes(sample.heap_used),
        monitor.pressure()
    );
}
