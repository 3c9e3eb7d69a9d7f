//! Tool-call criticality analysis
//!
//! Classifies recorded tool calls into ESSENTIAL / IMPORTANT / ROUTINE so
//! the context manager knows what must survive summarization verbatim. The
//! classifier is a pure function over the call; all pattern lists are
//! configuration data, compiled once.

mod classify;
mod elements;
mod rules;

pub use classify::{AnalyzedCall, Classification, CriticalityAnalyzer, CriticalityReport};
pub use elements::{extract_key_elements, KeyElements};
pub use rules::{Criticality, CriticalityRules};
