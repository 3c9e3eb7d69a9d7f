//! Bounded string fields
//!
//! Large free-form state fields (codebase trees, running notes) pass
//! through a three-stage pipeline before they are stored: field-specific
//! summarization, gzip compression, and syntax-aware truncation. The
//! resulting `BoundedString` never exceeds its per-field byte cap.

mod bounded;
mod summarize;

pub use bounded::{BoundedString, StringFields};
pub use summarize::FieldKind;
