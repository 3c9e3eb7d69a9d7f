//! Pressure-banded adaptation

use crate::provider::{format_for_provider, Provider};
use crate::summary::{synthesize_summary, SummaryStats};
use retentive_analysis::CriticalityAnalyzer;
use retentive_core::config::{MessageSettings, PressureAction, PressureTable};
use retentive_core::{estimate_tokens, Message, MessageKind, MemoryConfig};
use retentive_history::HistoryReducer;
use retentive_monitor::MemoryMonitor;
use std::sync::Arc;

/// How many trailing non-system messages the emergency mode keeps
const EMERGENCY_RECENT: usize = 3;

/// Where the manager reads heap pressure from
pub trait PressureSource: Send + Sync {
    /// Heap in use over the estimated ceiling, 0.0 upward
    fn pressure(&self) -> f64;
}

impl PressureSource for MemoryMonitor {
    fn pressure(&self) -> f64 {
        MemoryMonitor::pressure(self)
    }
}

/// Constant-pressure source for tests and dry runs
pub struct FixedPressure(pub f64);

impl PressureSource for FixedPressure {
    fn pressure(&self) -> f64 {
        self.0
    }
}

/// What an adaptation pass did, for logging and telemetry
#[derive(Debug, Clone)]
pub struct AdaptReport {
    /// Pressure reading the band decision was made on
    pub pressure: f64,
    pub action: PressureAction,
    pub input_count: usize,
    pub output_count: usize,
    /// Counters from the synthesized summary, when one was emitted
    pub summary: Option<SummaryStats>,
    /// Essential old messages carried verbatim
    pub essential_kept: usize,
    /// Rough token estimate of the adapted output
    pub estimated_tokens: usize,
}

/// Rewrites prompts under memory pressure
pub struct ContextManager {
    pressure: Arc<dyn PressureSource>,
    analyzer: CriticalityAnalyzer,
    reducer: HistoryReducer,
    table: PressureTable,
}

impl ContextManager {
    pub fn new(pressure: Arc<dyn PressureSource>) -> Self {
        Self {
            pressure,
            analyzer: CriticalityAnalyzer::default(),
            reducer: HistoryReducer::new(MessageSettings::default()),
            table: PressureTable::default(),
        }
    }

    /// Construct against the deployment configuration: the window reducer
    /// follows `config.messages` and the band ratios follow
    /// `config.pressure` instead of the compiled-in defaults
    pub fn from_config(pressure: Arc<dyn PressureSource>, config: &MemoryConfig) -> Self {
        Self {
            pressure,
            analyzer: CriticalityAnalyzer::default(),
            reducer: HistoryReducer::new(config.messages.clone()),
            table: config.pressure.clone(),
        }
    }

    /// Adapt a message list for the next LLM call. The first system message
    /// always survives at position 0; beyond that, the pressure band
    /// decides how much history is condensed.
    pub fn adapt(&self, messages: &[Message], provider: Provider) -> Vec<Message> {
        self.adapt_with_report(messages, provider).0
    }

    /// Adapt and also describe what happened (band taken, folded counts,
    /// token estimate)
    pub fn adapt_with_report(
        &self,
        messages: &[Message],
        provider: Provider,
    ) -> (Vec<Message>, AdaptReport) {
        let rho = self.pressure.pressure();
        let action = self.table.action_for(rho);
        tracing::debug!(pressure = rho, count = messages.len(), ?action, "adapting context");

        // The window reducer never sees the system message, so its
        // first-system invariant is enforced here.
        let (system, rest) = split_first_system(messages);
        let rest = self.reducer.reduce(rest, Vec::new());

        let mut summary_stats = None;
        let mut essential_kept = 0;
        let adapted = match action {
            PressureAction::PassThrough => rejoin(system.clone(), rest),
            PressureAction::Keep(ratio) => {
                let condensed = self.condense(&system, &rest, ratio, provider, messages.len());
                match condensed {
                    Some((list, stats, essentials)) if list.len() < messages.len() => {
                        summary_stats = Some(stats);
                        essential_kept = essentials;
                        list
                    }
                    // Not strictly shorter: this call escalates to the
                    // emergency path.
                    _ => {
                        let (list, stats) = self.emergency(&system, &rest, provider);
                        summary_stats = stats;
                        list
                    }
                }
            }
            PressureAction::Emergency => {
                let (list, stats) = self.emergency(&system, &rest, provider);
                summary_stats = stats;
                list
            }
        };

        let adapted = format_for_provider(adapted, provider);
        let estimated_tokens = adapted.iter().map(|m| estimate_tokens(&m.text())).sum();
        let report = AdaptReport {
            pressure: rho,
            action,
            input_count: messages.len(),
            output_count: adapted.len(),
            summary: summary_stats,
            essential_kept,
            estimated_tokens,
        };
        (adapted, report)
    }

    /// Summarize old turns, keeping `ratio` of the total as recent
    fn condense(
        &self,
        system: &Option<Message>,
        rest: &[Message],
        ratio: f64,
        provider: Provider,
        total_len: usize,
    ) -> Option<(Vec<Message>, SummaryStats, usize)> {
        let recent_quota = ((total_len as f64 * ratio) as usize).min(rest.len());
        let old_len = rest.len() - recent_quota;
        if old_len == 0 {
            return None;
        }
        let (old, recent) = rest.split_at(old_len);

        let report = self.analyzer.analyze(old);
        let essential_indices = report.essential_message_indices();

        let mut folded_indices = Vec::new();
        let mut essentials = Vec::new();
        for (i, message) in old.iter().enumerate() {
            if essential_indices.contains(&i) {
                essentials.push(message.clone());
            } else {
                folded_indices.push(i);
            }
        }

        let summary_kind = provider.profile().summary_kind;
        let (summary, stats) =
            synthesize_summary(old, &folded_indices, &report, summary_kind);
        tracing::info!(
            folded = stats.messages_folded,
            essential = essentials.len(),
            recent = recent.len(),
            "context condensed"
        );

        let essential_count = essentials.len();
        let mut out = Vec::with_capacity(essential_count + recent.len() + 2);
        if let Some(system) = system {
            out.push(system.clone());
        }
        out.extend(essentials);
        out.push(summary);
        out.extend(recent.iter().cloned());
        Some((out, stats, essential_count))
    }

    /// System + one summary + the last three non-system messages
    fn emergency(
        &self,
        system: &Option<Message>,
        rest: &[Message],
        provider: Provider,
    ) -> (Vec<Message>, Option<SummaryStats>) {
        let recent_start = rest.len().saturating_sub(EMERGENCY_RECENT);
        let (old, recent) = rest.split_at(recent_start);

        let mut stats = None;
        let mut out = Vec::with_capacity(EMERGENCY_RECENT + 2);
        if let Some(system) = system {
            out.push(system.clone());
        }
        if !old.is_empty() {
            let report = self.analyzer.analyze(old);
            let folded: Vec<usize> = (0..old.len()).collect();
            let (summary, summary_stats) =
                synthesize_summary(old, &folded, &report, provider.profile().summary_kind);
            stats = Some(summary_stats);
            out.push(summary);
        }
        out.extend(recent.iter().cloned());
        (out, stats)
    }
}

/// Pull the first system message out, preserving the order of the rest
fn split_first_system(messages: &[Message]) -> (Option<Message>, Vec<Message>) {
    match messages.iter().position(|m| m.kind == MessageKind::System) {
        Some(pos) => {
            let mut rest = Vec::with_capacity(messages.len() - 1);
            rest.extend(messages[..pos].iter().cloned());
            rest.extend(messages[pos + 1..].iter().cloned());
            (Some(messages[pos].clone()), rest)
        }
        None => (None, messages.to_vec()),
    }
}

fn rejoin(system: Option<Message>, rest: Vec<Message>) -> Vec<Message> {
    match system {
        Some(system) => {
            let mut out = Vec::with_capacity(rest.len() + 1);
            out.push(system);
            out.extend(rest);
            out
        }
        None => rest,
    }
}
