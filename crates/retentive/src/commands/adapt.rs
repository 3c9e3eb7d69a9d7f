use retentive_context::{ContextManager, FixedPressure, Provider};
use retentive_core::{Message, MemoryConfig};
use retentive_monitor::{MemoryMonitor, SysinfoProbe};
use std::sync::Arc;

/// Rewrite a JSON message log the way the context manager would before an
/// LLM call, against the configured limits
pub fn run(file: &str, pressure: Option<f64>, provider: &str) -> anyhow::Result<()> {
    let config = MemoryConfig::load_or_default(&super::config_path());
    let messages: Vec<Message> = serde_json::from_str(&std::fs::read_to_string(file)?)?;
    let provider = parse_provider(provider)?;

    let manager = match pressure {
        Some(value) => ContextManager::from_config(Arc::new(FixedPressure(value)), &config),
        None => {
            // No override: read real pressure from one watchdog tick.
            let monitor = MemoryMonitor::new(
                config.monitor.clone(),
                config.effective_heap_ceiling_mb(),
                Box::new(SysinfoProbe::new()?),
            );
            monitor.tick_once();
            ContextManager::from_config(Arc::new(monitor), &config)
        }
    };

    let (adapted, report) = manager.adapt_with_report(&messages, provider);
    eprintln!(
        "pressure {:.2} | {:?} | {} -> {} messages | ~{} tokens",
        report.pressure, report.action, report.input_count, report.output_count,
        report.estimated_tokens
    );
    if let Some(stats) = &report.summary {
        eprintln!(
            "folded {} messages ({} important, {} routine calls; {} decisions, {} errors, {} progress)",
            stats.messages_folded,
            stats.important_calls,
            stats.routine_calls,
            stats.decisions,
            stats.errors_resolved,
            stats.progress_items
        );
    }
    println!("{}", serde_json::to_string_pretty(&adapted)?);
    Ok(())
}

fn parse_provider(name: &str) -> anyhow::Result<Provider> {
    match name {
        "anthropic" => Ok(Provider::Anthropic),
        "openai" => Ok(Provider::OpenAi),
        "google" => Ok(Provider::Google),
        other => anyhow::bail!("unknown provider: {other}"),
    }
}
