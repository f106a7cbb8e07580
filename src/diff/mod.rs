//! Diff reporting utilities
//!
//! Tools for checking reproducibility between two implementations:
//! - Difference statistic records (min / max / mean)
//! - Nested diff trees, parsed from JSON with strict leaf detection
//! - Indented trace output with an aggregate pass/fail verdict

mod reporter;
mod stats;

pub use reporter::{check_and_report, format_stat, Sink, TracingSink};
pub use stats::{DiffStats, DiffTree, Statistic};
