//! Difference statistics and the nested report tree

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::array::DEFAULT_OUTPUT_KEY;
use crate::error::{Error, Result};

/// Which field of a [`DiffStats`] record is checked against the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Statistic {
    /// Minimum of the element-wise difference
    Min,
    /// Maximum of the element-wise difference
    Max,
    /// Mean of the element-wise difference
    #[default]
    Mean,
}

impl Statistic {
    /// All selectors, in record field order
    pub const ALL: [Statistic; 3] = [Statistic::Min, Statistic::Max, Statistic::Mean];

    /// Record key for this statistic
    pub fn key(&self) -> &'static str {
        match self {
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Mean => "mean",
        }
    }

    /// Match a record key exactly (short or long spelling)
    fn from_record_key(key: &str) -> Option<Self> {
        match key {
            "min" | "minimum" => Some(Statistic::Min),
            "max" | "maximum" => Some(Statistic::Max),
            "mean" => Some(Statistic::Mean),
            _ => None,
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Statistic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Statistic::from_record_key(&s.trim().to_ascii_lowercase()).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "unknown statistic '{}', expected one of min, max, mean",
                s
            ))
        })
    }
}

impl TryFrom<String> for Statistic {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Statistic> for String {
    fn from(stat: Statistic) -> Self {
        stat.key().to_string()
    }
}

/// Min, max and mean of an element-wise difference between two arrays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffStats {
    min: f64,
    max: f64,
    mean: f64,
}

impl DiffStats {
    /// Create a record
    pub fn new(min: f64, max: f64, mean: f64) -> Self {
        Self { min, max, mean }
    }

    /// Minimum difference
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum difference
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Mean difference
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Select one statistic
    pub fn get(&self, stat: Statistic) -> f64 {
        match stat {
            Statistic::Min => self.min,
            Statistic::Max => self.max,
            Statistic::Mean => self.mean,
        }
    }

    /// Whether the selected statistic is within `threshold`
    ///
    /// NaN never passes.
    pub fn passes(&self, stat: Statistic, threshold: f64) -> bool {
        self.get(stat) <= threshold
    }
}

/// Nested diff report: statistic records at the leaves, named groups above
#[derive(Debug, Clone, PartialEq)]
pub enum DiffTree {
    /// A single statistic record
    Leaf(DiffStats),
    /// Named children, kept in insertion order
    Node(IndexMap<String, DiffTree>),
}

impl Default for DiffTree {
    fn default() -> Self {
        DiffTree::Node(IndexMap::new())
    }
}

impl From<DiffStats> for DiffTree {
    fn from(stats: DiffStats) -> Self {
        DiffTree::Leaf(stats)
    }
}

impl<K: Into<String>> FromIterator<(K, DiffTree)> for DiffTree {
    fn from_iter<I: IntoIterator<Item = (K, DiffTree)>>(iter: I) -> Self {
        DiffTree::Node(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl DiffTree {
    /// Build an internal node from `(key, child)` pairs
    pub fn node<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, DiffTree)>,
    {
        entries.into_iter().collect()
    }

    /// Check if this is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, DiffTree::Leaf(_))
    }

    /// Parse a tree from untyped JSON
    ///
    /// An object is a leaf iff its keys are exactly min, max and mean (long
    /// spellings allowed) with numeric values. Objects that carry some numeric
    /// statistic keys without forming a complete record, and non-object
    /// children, are rejected as malformed.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        parse_node(value, "")
    }

    /// Read and parse a JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        Self::from_json(&value)
    }

    /// All leaves with their slash-joined paths, in report order
    ///
    /// A root leaf is reported under `"output"`.
    pub fn leaves(&self) -> Vec<(String, DiffStats)> {
        let mut out = Vec::new();
        match self {
            DiffTree::Leaf(stats) => out.push((DEFAULT_OUTPUT_KEY.to_string(), *stats)),
            DiffTree::Node(children) => collect_leaves(children, "", &mut out),
        }
        out
    }

    /// Paths of every leaf whose selected statistic exceeds `threshold`
    pub fn failing_leaves(&self, stat: Statistic, threshold: f64) -> Vec<String> {
        self.leaves()
            .into_iter()
            .filter(|(_, stats)| !stats.passes(stat, threshold))
            .map(|(path, _)| path)
            .collect()
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", prefix, key)
    }
}

fn collect_leaves(
    children: &IndexMap<String, DiffTree>,
    prefix: &str,
    out: &mut Vec<(String, DiffStats)>,
) {
    for (key, child) in children {
        let path = join_path(prefix, key);
        match child {
            DiffTree::Leaf(stats) => out.push((path, *stats)),
            DiffTree::Node(grand) => collect_leaves(grand, &path, out),
        }
    }
}

fn malformed(path: &str, reason: String) -> Error {
    let path = if path.is_empty() { "<root>" } else { path };
    Error::MalformedRecord {
        path: path.to_string(),
        reason,
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}

fn parse_node(value: &serde_json::Value, path: &str) -> Result<DiffTree> {
    let obj = value
        .as_object()
        .ok_or_else(|| malformed(path, format!("expected an object, got {}", json_kind(value))))?;

    if let Some(stats) = parse_record(obj, path)? {
        return Ok(DiffTree::Leaf(stats));
    }

    let mut children = IndexMap::with_capacity(obj.len());
    for (key, child) in obj {
        children.insert(key.clone(), parse_node(child, &join_path(path, key))?);
    }
    Ok(DiffTree::Node(children))
}

/// `Some` for a complete record, `None` for an internal node
fn parse_record(
    obj: &serde_json::Map<String, serde_json::Value>,
    path: &str,
) -> Result<Option<DiffStats>> {
    let numeric: Vec<(Statistic, f64)> = obj
        .iter()
        .filter_map(|(k, v)| Some((Statistic::from_record_key(k)?, v.as_f64()?)))
        .collect();

    if numeric.is_empty() {
        return Ok(None);
    }

    let mut fields = [None; 3];
    for (stat, value) in &numeric {
        let slot = &mut fields[*stat as usize];
        if slot.is_some() {
            return Err(malformed(path, format!("statistic '{}' given more than once", stat)));
        }
        *slot = Some(*value);
    }

    let missing: Vec<&str> = Statistic::ALL
        .iter()
        .filter(|s| fields[**s as usize].is_none())
        .map(|s| s.key())
        .collect();
    if !missing.is_empty() {
        return Err(malformed(
            path,
            format!("partial statistic record, missing {}", missing.join(", ")),
        ));
    }

    if obj.len() != numeric.len() {
        let extra: Vec<&str> = obj
            .iter()
            .filter(|(k, v)| Statistic::from_record_key(k).is_none() || !v.is_number())
            .map(|(k, _)| k.as_str())
            .collect();
        return Err(malformed(
            path,
            format!("statistic record has unexpected keys: {}", extra.join(", ")),
        ));
    }

    match fields {
        [Some(min), Some(max), Some(mean)] => Ok(Some(DiffStats::new(min, max, mean))),
        _ => Err(malformed(path, "incomplete statistic record".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(min: f64, max: f64, mean: f64) -> DiffTree {
        DiffTree::Leaf(DiffStats::new(min, max, mean))
    }

    #[test]
    fn test_statistic_from_str() {
        assert_eq!("mean".parse::<Statistic>().unwrap(), Statistic::Mean);
        assert_eq!("MAX".parse::<Statistic>().unwrap(), Statistic::Max);
        assert_eq!(" minimum ".parse::<Statistic>().unwrap(), Statistic::Min);
        assert!(matches!(
            "median".parse::<Statistic>(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_diff_stats_get() {
        let stats = DiffStats::new(0.0, 2e-7, 1e-7);
        assert_eq!(stats.get(Statistic::Min), 0.0);
        assert_eq!(stats.get(Statistic::Max), 2e-7);
        assert_eq!(stats.get(Statistic::Mean), 1e-7);
    }

    #[test]
    fn test_nan_never_passes() {
        let stats = DiffStats::new(0.0, f64::NAN, 0.0);
        assert!(!stats.passes(Statistic::Max, f64::INFINITY));
        assert!(stats.passes(Statistic::Mean, 0.0));
    }

    #[test]
    fn test_exact_record_is_leaf() {
        let tree = DiffTree::from_json(&json!({"mean": 1e-7, "min": 0.0, "max": 2e-7})).unwrap();
        assert_eq!(tree, DiffTree::Leaf(DiffStats::new(0.0, 2e-7, 1e-7)));
    }

    #[test]
    fn test_long_key_spellings_are_accepted() {
        let tree =
            DiffTree::from_json(&json!({"minimum": 1.0, "maximum": 3.0, "mean": 2.0})).unwrap();
        assert!(tree.is_leaf());
    }

    #[test]
    fn test_other_key_sets_are_not_leaves() {
        let partial = DiffTree::from_json(&json!({"min": 0.0, "max": 1.0}));
        assert!(matches!(partial, Err(Error::MalformedRecord { .. })));

        let superset =
            DiffTree::from_json(&json!({"min": 0.0, "max": 1.0, "mean": 0.5, "std": 0.1}));
        assert!(matches!(superset, Err(Error::MalformedRecord { .. })));

        let duplicated =
            DiffTree::from_json(&json!({"min": 0.0, "minimum": 0.0, "max": 1.0, "mean": 0.5}));
        assert!(matches!(duplicated, Err(Error::MalformedRecord { .. })));

        let node = DiffTree::from_json(&json!({"mean": {"min": 0.0, "max": 1.0, "mean": 0.5}}))
            .unwrap();
        assert!(!node.is_leaf());
    }

    #[test]
    fn test_non_object_child_is_malformed() {
        let err = DiffTree::from_json(&json!({"layer1": {"attn": 3}})).unwrap_err();
        match err {
            Error::MalformedRecord { path, .. } => assert_eq!(path, "layer1/attn"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_leaves_and_failing_leaves() {
        let tree = DiffTree::node([
            (
                "encoder",
                DiffTree::node([
                    ("q", leaf(0.0, 1e-8, 1e-9)),
                    ("k", leaf(0.0, 1e-2, 1e-3)),
                ]),
            ),
            ("logits", leaf(0.0, 1e-7, 1e-8)),
        ]);

        let paths: Vec<String> = tree.leaves().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["encoder/q", "encoder/k", "logits"]);
        assert_eq!(tree.failing_leaves(Statistic::Mean, 1e-6), vec!["encoder/k"]);
    }

    #[test]
    fn test_root_leaf_path_is_output() {
        let tree = leaf(0.0, 0.0, 0.0);
        assert_eq!(tree.leaves()[0].0, DEFAULT_OUTPUT_KEY);
    }
}
