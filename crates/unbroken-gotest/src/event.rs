//! `go test -json` event types
//!
//! Each line of `go test -json` (or `go tool test2json`) output is one
//! [`Event`]. Field names follow the runner's schema (`Time`, `Action`,
//! `Package`, `Test`, `Output`, `Elapsed`). Missing keys and `null` values
//! decode to empty values and unknown keys are ignored, so newer runner
//! versions keep parsing.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// A single event from `go test -json` output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// When the event was recorded
    #[serde(rename = "Time", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<FixedOffset>>,
    /// What happened
    #[serde(rename = "Action", default, deserialize_with = "null_as_default")]
    pub action: Action,
    /// Import path of the package under test
    #[serde(rename = "Package", default, deserialize_with = "null_as_default")]
    pub package: String,
    /// Test name; empty for package-level events
    #[serde(rename = "Test", default, deserialize_with = "null_as_default")]
    pub test: String,
    /// Output text, only set for `output` events
    #[serde(rename = "Output", default, deserialize_with = "null_as_default")]
    pub output: String,
    /// Seconds spent, set on pass/fail/skip events
    #[serde(rename = "Elapsed", default, deserialize_with = "null_as_default")]
    pub elapsed: f64,
}

impl Event {
    /// Create an event with the given action and package
    #[must_use]
    pub fn new(action: Action, package: impl Into<String>) -> Self {
        Self {
            action,
            package: package.into(),
            ..Self::default()
        }
    }

    /// Set the test name
    #[must_use]
    pub fn with_test(mut self, test: impl Into<String>) -> Self {
        self.test = test.into();
        self
    }

    /// Set the output text
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Whether this event belongs to the package rather than a test
    #[must_use]
    pub fn is_package_level(&self) -> bool {
        self.test.is_empty()
    }
}

/// The `Action` of an event
///
/// Only `pass`, `fail` and `output` are acted on downstream; the remaining
/// tags are kept so events round-trip faithfully.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    /// The test binary is about to be executed
    Start,
    /// The test has started running
    Run,
    /// The test has been paused
    Pause,
    /// The test has continued running
    Cont,
    /// The test passed
    Pass,
    /// The benchmark printed log output but did not fail
    Bench,
    /// The test or benchmark failed
    Fail,
    /// The test printed output
    Output,
    /// The test was skipped or the package contained no tests
    Skip,
    /// Any other tag, kept verbatim
    Other(String),
}

impl Action {
    /// The wire spelling of this action
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Run => "run",
            Self::Pause => "pause",
            Self::Cont => "cont",
            Self::Pass => "pass",
            Self::Bench => "bench",
            Self::Fail => "fail",
            Self::Output => "output",
            Self::Skip => "skip",
            Self::Other(tag) => tag,
        }
    }

    /// Whether this action reports a test outcome
    #[must_use]
    pub fn is_outcome(&self) -> bool {
        matches!(self, Self::Pass | Self::Fail)
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Action {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "start" => Self::Start,
            "run" => Self::Run,
            "pause" => Self::Pause,
            "cont" => Self::Cont,
            "pass" => Self::Pass,
            "bench" => Self::Bench,
            "fail" => Self::Fail,
            "output" => Self::Output,
            "skip" => Self::Skip,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for Action {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        match action {
            Action::Other(tag) => tag,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Treat an explicit JSON `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
