//! Check configuration
//!
//! Selector, threshold and indentation used by the diff reporter, loadable from
//! a YAML file. Missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::diff::{check_and_report, DiffTree, Sink, Statistic};
use crate::error::{Error, Result};

/// Default acceptance threshold
pub const DEFAULT_THRESHOLD: f64 = 1e-6;

/// Default indentation unit
pub const DEFAULT_INDENT: &str = "\t";

/// Settings for a diff check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Statistic compared against the threshold
    pub statistic: Statistic,
    /// Acceptance bound (a leaf passes iff its statistic is <= threshold)
    pub threshold: f64,
    /// Indentation added per nesting level
    pub indent: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            statistic: Statistic::Mean,
            threshold: DEFAULT_THRESHOLD,
            indent: DEFAULT_INDENT.to_string(),
        }
    }
}

impl CheckConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CheckConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the reporter cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.threshold.is_nan() {
            return Err(Error::InvalidArgument(
                "threshold must be a comparable number, got NaN".to_string(),
            ));
        }
        Ok(())
    }

    /// Run [`check_and_report`] with these settings
    pub fn check<S: Sink + ?Sized>(&self, tree: &DiffTree, sink: &mut S) -> Result<bool> {
        self.validate()?;
        check_and_report(tree, self.statistic, self.threshold, sink, &self.indent)
    }
}
