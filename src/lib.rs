//! # reprod-diff
//!
//! Reproducibility checks for numeric outputs produced by two independent
//! implementations of the same model.
//!
//! ## Features
//!
//! - Normalize named tensors between candle, ndarray and plain host arrays
//! - Parse nested min/max/mean diff reports with strict leaf detection
//! - Print an indented trace and a single pass/fail verdict per report
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reprod_diff::{check_and_report, DiffTree, Statistic, TracingSink};
//!
//! reprod_diff::logging::init_logger(Some("logs/diff.log".as_ref()))?;
//! let tree = DiffTree::load("diff.json")?;
//! let passed = check_and_report(&tree, Statistic::Mean, 1e-6, &mut TracingSink, "\t")?;
//! ```

// Require docs for public items
#![warn(missing_docs)]

pub mod array;
pub mod config;
pub mod diff;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use array::{
    candle_to_host, host_to_candle, host_to_ndarray, ndarray_to_host, HostArray, NamedValues,
    Payload, Value,
};
pub use config::CheckConfig;
pub use diff::{check_and_report, DiffStats, DiffTree, Sink, Statistic, TracingSink};
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
