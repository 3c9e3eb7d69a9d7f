//! Memory probes
//!
//! The monitor only ever sees the small `MemoryProbe` interface; hosts with
//! richer runtimes (a GC, an external-allocation tracker) supply their own
//! implementation. `SysinfoProbe` is the portable default, `StaticProbe`
//! serves tests and dry runs.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// One process memory reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySample {
    /// Resident set size in bytes
    pub rss: u64,
    pub heap_used: u64,
    pub heap_total: u64,
    /// Allocations outside the managed heap
    pub external: u64,
    pub array_buffers: u64,
    pub timestamp: DateTime<Utc>,
}

impl MemorySample {
    pub fn metric_value(&self, metric: crate::Metric) -> u64 {
        match metric {
            crate::Metric::HeapUsed => self.heap_used,
            crate::Metric::External => self.external,
            crate::Metric::ArrayBuffers => self.array_buffers,
            crate::Metric::Sampler => 0,
        }
    }
}

/// Source of memory readings and the optional reclaim hook
pub trait MemoryProbe: Send + Sync {
    fn sample(&self) -> std::io::Result<MemorySample>;

    /// Ask the runtime to shed memory; returns whether a hook existed
    fn force_reclaim(&self) -> bool {
        false
    }
}

/// Portable probe backed by the `sysinfo` crate
///
/// Without runtime heap introspection, resident memory stands in for the
/// heap figure and the external/array-buffer metrics read zero.
pub struct SysinfoProbe {
    system: Mutex<sysinfo::System>,
    pid: sysinfo::Pid,
}

impl SysinfoProbe {
    pub fn new() -> std::io::Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Unsupported, e))?;
        Ok(Self {
            system: Mutex::new(sysinfo::System::new_all()),
            pid,
        })
    }
}

impl MemoryProbe for SysinfoProbe {
    fn sample(&self) -> std::io::Result<MemorySample> {
        let mut system = self.system.lock();
        system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[self.pid]));
        let process = system.process(self.pid).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "current process not found")
        })?;
        Ok(MemorySample {
            rss: process.memory(),
            heap_used: process.memory(),
            heap_total: system.total_memory(),
            external: 0,
            array_buffers: 0,
            timestamp: Utc::now(),
        })
    }
}

/// Probe returning a programmable sample; used by tests and `--once` runs
pub struct StaticProbe {
    sample: Mutex<MemorySample>,
    reclaim_supported: bool,
    reclaim_invocations: AtomicU64,
    failures_remaining: AtomicU64,
}

impl StaticProbe {
    pub fn new(heap_used: u64) -> Self {
        Self {
            sample: Mutex::new(MemorySample {
                rss: heap_used,
                heap_used,
                heap_total: heap_used * 2,
                external: 0,
                array_buffers: 0,
                timestamp: Utc::now(),
            }),
            reclaim_supported: true,
            reclaim_invocations: AtomicU64::new(0),
            failures_remaining: AtomicU64::new(0),
        }
    }

    pub fn without_reclaim_hook(mut self) -> Self {
        self.reclaim_supported = false;
        self
    }

    pub fn set_heap_used(&self, bytes: u64) {
        let mut sample = self.sample.lock();
        sample.heap_used = bytes;
        sample.rss = bytes;
    }

    pub fn set_external(&self, bytes: u64) {
        self.sample.lock().external = bytes;
    }

    pub fn set_array_buffers(&self, bytes: u64) {
        self.sample.lock().array_buffers = bytes;
    }

    /// Make the next `n` sample calls fail
    pub fn fail_next(&self, n: u64) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    pub fn reclaim_invocations(&self) -> u64 {
        self.reclaim_invocations.load(Ordering::SeqCst)
    }
}

impl MemoryProbe for StaticProbe {
    fn sample(&self) -> std::io::Result<MemorySample> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected sampler failure",
            ));
        }
        let mut sample = self.sample.lock().clone();
        sample.timestamp = Utc::now();
        Ok(sample)
    }

    fn force_reclaim(&self) -> bool {
        if self.reclaim_supported {
            self.reclaim_invocations.fetch_add(1, Ordering::SeqCst);
        }
        self.reclaim_supported
    }
}
