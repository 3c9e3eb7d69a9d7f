//! Context manager banding, driven both by a fixed source and the monitor

mod common;

use common::{conversation, essential_env_write, monitor_with_static_probe, MB};
use retentive_context::{ContextManager, FixedPressure, Provider};
use retentive_core::MessageKind;
use std::sync::Arc;

#[test]
fn epsilon_below_first_band_is_untouched() {
    let messages = conversation(99);
    let manager = ContextManager::new(Arc::new(FixedPressure(0.5999)));
    let out = manager.adapt(&messages, Provider::Anthropic);
    assert_eq!(out.len(), messages.len());
}

#[test]
fn epsilon_above_first_band_summarizes() {
    let messages = conversation(99);
    let manager = ContextManager::new(Arc::new(FixedPressure(0.6001)));
    let out = manager.adapt(&messages, Provider::Anthropic);
    assert!(out.len() < messages.len());
    assert_eq!(out[0], messages[0]);
}

#[test]
fn moderate_band_keeps_about_seventy_of_one_hundred() {
    // 100 messages at rho=0.65: ~70 recent plus the system message and one
    // summary.
    let messages = conversation(99);
    let manager = ContextManager::new(Arc::new(FixedPressure(0.65)));
    let out = manager.adapt(&messages, Provider::Anthropic);
    assert!((70..=75).contains(&out.len()), "got {}", out.len());
    assert!(out
        .iter()
        .any(|m| m.text().contains("[Context summary")));
}

#[test]
fn emergency_band_keeps_five_at_most() {
    let messages = conversation(99);
    let manager = ContextManager::new(Arc::new(FixedPressure(0.95)));
    let out = manager.adapt(&messages, Provider::Anthropic);
    assert!(out.len() <= 5, "got {}", out.len());
    assert_eq!(out[0].kind, MessageKind::System);
}

#[test]
fn essential_tool_activity_survives_every_band() {
    let mut messages = conversation(80);
    let essential = essential_env_write();
    messages.insert(4, essential.clone());

    for rho in [0.65, 0.75, 0.85] {
        let manager = ContextManager::new(Arc::new(FixedPressure(rho)));
        let out = manager.adapt(&messages, Provider::Anthropic);
        assert!(
            out.iter().any(|m| *m == essential),
            "essential message lost at rho={rho}"
        );
    }
}

#[test]
fn monitor_pressure_drives_the_manager() {
    let (monitor, probe) = monitor_with_static_probe(100);
    let monitor = Arc::new(monitor);
    let source: Arc<dyn retentive_context::PressureSource> = monitor.clone();
    let manager = ContextManager::new(source);
    let messages = conversation(99);

    // Low heap: pass-through.
    monitor.tick_once();
    assert_eq!(manager.adapt(&messages, Provider::Anthropic).len(), messages.len());

    // 65% of the 8192 MB ceiling: the moderate band kicks in.
    probe.set_heap_used(8192 * 65 / 100 * MB);
    monitor.tick_once();
    let out = manager.adapt(&messages, Provider::Anthropic);
    assert!(out.len() < messages.len());
}
