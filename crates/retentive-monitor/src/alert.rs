//! Alert types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

/// Metric an alert refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    HeapUsed,
    External,
    ArrayBuffers,
    /// The sampler itself failed repeatedly
    Sampler,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::HeapUsed => "heap-used",
            Metric::External => "external",
            Metric::ArrayBuffers => "array-buffers",
            Metric::Sampler => "sampler",
        }
    }
}

/// One threshold crossing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub metric: Metric,
    /// Observed value in bytes
    pub value: u64,
    /// Threshold that was crossed, in bytes
    pub threshold: u64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(level: AlertLevel, metric: Metric, value: u64, threshold: u64) -> Self {
        let tier = match level {
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        };
        Self {
            level,
            metric,
            value,
            threshold,
            message: format!(
                "{} {}: {} exceeds threshold {}",
                metric.name(),
                tier,
                retentive_core::format_bytes(value),
                retentive_core::format_bytes(threshold)
            ),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_message_names_metric_and_tier() {
        let alert = Alert::new(AlertLevel::Critical, Metric::HeapUsed, 2048, 1024);
        assert!(alert.message.contains("heap-used"));
        assert!(alert.message.contains("critical"));
        assert!(alert.message.contains("2.0 KB"));
    }

    #[test]
    fn test_metric_serializes_kebab_case() {
        let json = serde_json::to_string(&Metric::ArrayBuffers).unwrap();
        assert_eq!(json, "\"array-buffers\"");
    }
}
