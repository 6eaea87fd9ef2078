//! Metric types and line encoding
//!
//! A [`Metric`] renders as a single line:
//!
//! ```text
//! <name>,<label1>=<value1>,<label2>=<value2> metric=<value>
//! ```
//!
//! Labels are written in the order they were inserted. Nothing is escaped;
//! label values are expected to be safe already.

use std::fmt;

/// Metric name for individual test outcomes
pub const GO_TEST: &str = "go_test";

/// Metric name for package coverage percentages
pub const GO_COVERAGE: &str = "go_coverage";

/// A derived measurement ready for transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    /// Metric kind, e.g. [`GO_TEST`]
    pub name: String,
    /// Value, kept as text
    pub value: String,
    /// Label set in insertion order
    pub labels: Labels,
}

impl Metric {
    /// Create a metric with no labels
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            labels: Labels::new(),
        }
    }

    /// Add a label, replacing any existing value under the same key
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key, value);
        self
    }

    /// Look up a label value
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (key, value) in self.labels.iter() {
            write!(f, ",{key}={value}")?;
        }
        write!(f, " metric={}", self.value)
    }
}

/// Label set with unique keys, iterated in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    entries: Vec<(String, String)>,
}

impl Labels {
    /// Create an empty label set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label; an existing key keeps its position and takes the new value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a label value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(key, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of labels
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no labels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Encode a batch of metrics as the push payload
///
/// Lines are joined with `\n` and there is no trailing newline.
#[must_use]
pub fn encode_batch(metrics: &[Metric]) -> String {
    metrics
        .iter()
        .map(Metric::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
