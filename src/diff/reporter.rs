//! Recursive diff reporting
//!
//! Walks a [`DiffTree`] depth-first, writes one line per visited node to a
//! [`Sink`] and folds every leaf verdict into a single pass/fail result.

use indexmap::IndexMap;
use tracing::{debug, info};

use super::stats::{DiffStats, DiffTree, Statistic};
use crate::array::DEFAULT_OUTPUT_KEY;
use crate::error::{Error, Result};

/// Line-oriented output target for the report
pub trait Sink {
    /// Write one line
    fn line(&mut self, line: &str);
}

impl<F: FnMut(&str)> Sink for F {
    fn line(&mut self, line: &str) {
        self(line)
    }
}

/// Sink that forwards every line to `tracing` at INFO level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn line(&mut self, line: &str) {
        info!("{}", line);
    }
}

/// Format a statistic the way Python's `repr(float)` does
///
/// Shortest round-trip digits, exponent notation below 1e-4 and from 1e16 up
/// with a signed two-digit exponent (`1e-07`), a trailing `.0` on integral
/// values (`12.0`), and `nan` / `inf` / `-inf`.
pub fn format_stat(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if value != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{:e}", value);
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        format!("{}e{}{:0>2}", mantissa, sign, digits)
    } else {
        let formatted = format!("{}", value);
        if formatted.contains('.') {
            formatted
        } else {
            formatted + ".0"
        }
    }
}

/// Report every leaf of `tree` and check it against `threshold`
///
/// Each leaf prints `"{indent}{key}:\t{value}"`, followed by
/// `"{indent}diff in {key} failed the acceptance"` when the selected value is
/// above the threshold. Internal nodes print their key and are descended into
/// with one more `indent_unit`. The walk never stops early: the whole tree is
/// reported even after the first failure.
///
/// Returns `Ok(true)` iff every leaf passed; an empty tree passes and prints
/// nothing. A NaN threshold is rejected before anything is written.
pub fn check_and_report<S>(
    tree: &DiffTree,
    statistic: Statistic,
    threshold: f64,
    sink: &mut S,
    indent_unit: &str,
) -> Result<bool>
where
    S: Sink + ?Sized,
{
    if threshold.is_nan() {
        return Err(Error::InvalidArgument(
            "threshold must be a comparable number, got NaN".to_string(),
        ));
    }

    let mut reporter = Reporter {
        statistic,
        threshold,
        indent_unit,
        sink,
        leaves: 0,
        failures: 0,
    };

    let passed = match tree {
        DiffTree::Leaf(stats) => reporter.leaf(DEFAULT_OUTPUT_KEY, stats, ""),
        DiffTree::Node(children) => reporter.walk(children, 0),
    };

    debug!(
        statistic = %statistic,
        threshold,
        leaves = reporter.leaves,
        failures = reporter.failures,
        "diff check finished"
    );

    Ok(passed)
}

struct Reporter<'a, S: Sink + ?Sized> {
    statistic: Statistic,
    threshold: f64,
    indent_unit: &'a str,
    sink: &'a mut S,
    leaves: usize,
    failures: usize,
}

impl<S: Sink + ?Sized> Reporter<'_, S> {
    fn walk(&mut self, children: &IndexMap<String, DiffTree>, depth: usize) -> bool {
        let indent = self.indent_unit.repeat(depth);
        let mut passed = true;

        for (key, child) in children {
            match child {
                DiffTree::Leaf(stats) => {
                    passed &= self.leaf(key, stats, &indent);
                }
                DiffTree::Node(grand) => {
                    self.sink.line(&format!("{}{}", indent, key));
                    // evaluated unconditionally: every subtree is reported
                    passed &= self.walk(grand, depth + 1);
                }
            }
        }

        passed
    }

    fn leaf(&mut self, key: &str, stats: &DiffStats, indent: &str) -> bool {
        self.leaves += 1;
        let value = stats.get(self.statistic);
        self.sink
            .line(&format!("{}{}:\t{}", indent, key, format_stat(value)));

        let passed = stats.passes(self.statistic, self.threshold);
        if !passed {
            self.failures += 1;
            self.sink
                .line(&format!("{}diff in {} failed the acceptance", indent, key));
        }
        passed
    }
}
