//! Memory monitor
//!
//! Samples process memory on a fixed cadence, keeps a bounded sample
//! history, raises tiered alerts when heap, external, or array-buffer usage
//! crosses derived thresholds, and requests a global reclaim on critical
//! pressure. The sampler is the subsystem's only background actor.

mod alert;
mod monitor;
mod probe;

pub use alert::{Alert, AlertLevel, Metric};
pub use monitor::{ListenerHandle, MemoryMonitor, MonitorStats, Thresholds};
pub use probe::{MemoryProbe, MemorySample, StaticProbe, SysinfoProbe};
