use retentive_core::{Message, ToolCallRecord};
use retentive_monitor::{MemoryMonitor, MemoryProbe, MemorySample, StaticProbe};
use std::sync::Arc;

pub const MB: u64 = 1024 * 1024;

/// A conversation with a system prompt and alternating agent turns
pub fn conversation(turns: usize) -> Vec<Message> {
    let mut messages = vec![Message::system("you are a coding agent")];
    for i in 0..turns {
        match i % 3 {
            0 => messages.push(Message::human(format!("request {i}"))),
            1 => messages.push(Message::assistant(format!("working on {i}"))),
            _ => messages.push(Message::tool(format!("output {i}"))),
        }
    }
    messages
}

pub fn essential_env_write() -> Message {
    Message::assistant("updating environment").with_tool_calls(vec![ToolCallRecord::new("write")
        .path(".env")
        .content("DATABASE_URL=postgres://localhost/app")])
}

/// Probe shared between a monitor and the test body
pub struct SharedProbe(pub Arc<StaticProbe>);

impl MemoryProbe for SharedProbe {
    fn sample(&self) -> std::io::Result<MemorySample> {
        self.0.sample()
    }

    fn force_reclaim(&self) -> bool {
        self.0.force_reclaim()
    }
}

/// Monitor against a programmable probe with an 8192 MB ceiling
pub fn monitor_with_static_probe(heap_used_mb: u64) -> (MemoryMonitor, Arc<StaticProbe>) {
    let probe = Arc::new(StaticProbe::new(heap_used_mb * MB));
    let monitor = MemoryMonitor::new(
        retentive_core::config::MonitorSettings::default(),
        8192,
        Box::new(SharedProbe(Arc::clone(&probe))),
    );
    (monitor, probe)
}
