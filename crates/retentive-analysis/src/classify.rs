//! The classifier and the per-message analysis pass

use crate::elements::{extract_key_elements, extract_key_elements_for_path, KeyElements};
use crate::rules::{Criticality, CriticalityRules};
use retentive_core::{Message, ToolCallRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Classification of a single tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub criticality: Criticality,
    pub reason: String,
    pub confidence: f64,
    /// Whether summarization must carry the full content verbatim
    pub preserve_full_content: bool,
}

/// One analyzed tool call, tied back to its source message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedCall {
    pub message_index: usize,
    pub call_index: usize,
    pub name: String,
    pub path: Option<String>,
    pub classification: Classification,
    /// One-line structured summary, for IMPORTANT and ROUTINE calls
    pub summary: Option<String>,
    pub elements: KeyElements,
}

/// Tiered analysis result over a message slice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriticalityReport {
    pub essential: Vec<AnalyzedCall>,
    pub important: Vec<AnalyzedCall>,
    pub routine: Vec<AnalyzedCall>,
    pub total_analyzed: usize,
}

impl CriticalityReport {
    /// Indices of messages carrying at least one essential call
    pub fn essential_message_indices(&self) -> HashSet<usize> {
        self.essential.iter().map(|c| c.message_index).collect()
    }
}

/// Rule-driven classifier; pure and deterministic
#[derive(Debug, Clone, Default)]
pub struct CriticalityAnalyzer {
    rules: CriticalityRules,
}

impl CriticalityAnalyzer {
    pub fn new(rules: CriticalityRules) -> Self {
        Self { rules }
    }

    /// Classify one tool call. First matching essential class wins; the
    /// important classes follow; everything else is routine.
    pub fn classify(&self, call: &ToolCallRecord) -> Classification {
        let path = call.path.as_deref().unwrap_or("").to_lowercase();
        let content = call.primary_content().unwrap_or("");
        let content_lower = content.to_lowercase();
        let content_upper = content.to_uppercase();
        let rules = &self.rules;

        let in_path = |markers: &[String]| markers.iter().any(|m| path.contains(&m.to_lowercase()));
        let in_path_or_content = |markers: &[String]| {
            markers.iter().any(|m| {
                let m = m.to_lowercase();
                path.contains(&m) || content_lower.contains(&m)
            })
        };

        if in_path(&rules.config_path_markers) {
            return essential("configuration file", 0.95);
        }
        // Secret markers are uppercase by convention and matched against
        // the uppercased content.
        if rules.secret_markers.iter().any(|m| content_upper.contains(m.as_str())) {
            return essential("secrets or environment wiring", 0.98);
        }
        if in_path_or_content(&rules.database_markers) {
            return essential("database configuration", 0.92);
        }
        if in_path_or_content(&rules.auth_markers) {
            return essential("authentication or authorization code", 0.93);
        }
        if in_path(&rules.route_markers) {
            return essential("API route or middleware", 0.90);
        }
        if in_path(&rules.build_markers) {
            return essential("build or deployment configuration", 0.90);
        }

        if rules.business_markers.iter().any(|m| path.contains(m.as_str())) {
            return important("business logic naming", 0.80);
        }
        let is_component = path.ends_with(".tsx") || path.ends_with(".jsx");
        if is_component && rules.ui_state_markers.iter().any(|m| content.contains(m.as_str())) {
            return important("stateful UI component", 0.75);
        }
        if !extract_key_elements(content).types.is_empty() {
            return important("data model or type definitions", 0.70);
        }
        if rules.utility_markers.iter().any(|m| path.contains(m.as_str())) {
            return important("reusable utility code", 0.65);
        }

        Classification {
            criticality: Criticality::Routine,
            reason: "no critical markers".to_string(),
            confidence: 0.50,
            preserve_full_content: false,
        }
    }

    /// Analyze every tool call carried by a message slice
    pub fn analyze(&self, messages: &[Message]) -> CriticalityReport {
        let mut report = CriticalityReport::default();

        for (message_index, message) in messages.iter().enumerate() {
            for (call_index, call) in message.tool_calls.iter().enumerate() {
                let classification = self.classify(call);
                let essential = classification.criticality == Criticality::Essential;
                let elements = if essential {
                    KeyElements::default()
                } else {
                    extract_key_elements_for_path(
                        call.primary_content().unwrap_or(""),
                        call.path.as_deref(),
                    )
                };
                let summary = if essential {
                    None
                } else {
                    Some(summarize_call(call, &elements))
                };
                let analyzed = AnalyzedCall {
                    message_index,
                    call_index,
                    name: call.name.clone(),
                    path: call.path.clone(),
                    classification,
                    summary,
                    elements,
                };
                report.total_analyzed += 1;
                match analyzed.classification.criticality {
                    Criticality::Essential => report.essential.push(analyzed),
                    Criticality::Important => report.important.push(analyzed),
                    Criticality::Routine => report.routine.push(analyzed),
                }
            }
        }

        tracing::debug!(
            total = report.total_analyzed,
            essential = report.essential.len(),
            important = report.important.len(),
            routine = report.routine.len(),
            "tool calls analyzed"
        );
        report
    }
}

fn essential(reason: &str, confidence: f64) -> Classification {
    Classification {
        criticality: Criticality::Essential,
        reason: reason.to_string(),
        confidence,
        preserve_full_content: true,
    }
}

fn important(reason: &str, confidence: f64) -> Classification {
    Classification {
        criticality: Criticality::Important,
        reason: reason.to_string(),
        confidence,
        preserve_full_content: false,
    }
}

/// `name -> path | Functions: [...] | Types: [...] | Exports: [...]`
fn summarize_call(call: &ToolCallRecord, elements: &KeyElements) -> String {
    format!(
        "{} -> {} | Functions: [{}] | Types: [{}] | Exports: [{}]",
        call.name,
        call.path.as_deref().unwrap_or("-"),
        elements.functions.join(", "),
        elements.types.join(", "),
        elements.exports.join(", ")
    )
}
