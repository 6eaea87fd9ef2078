// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Non-fatal diagnostics raised while deriving metrics
//!
//! Events that cannot be turned into a metric are skipped and reported to a
//! [`DiagnosticSink`] owned by the deriver. Production code uses
//! [`TracingSink`]; tests collect into a `Vec<Diagnostic>`.

use std::fmt;

use tracing::warn;

/// Why an event was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Test name has more than one `/` separator
    NestedTestName {
        /// Package of the event
        package: String,
        /// The full test name
        test: String,
    },
    /// Coverage line could not be split into a value
    MalformedCoverage {
        /// Package of the event
        package: String,
        /// The raw output text
        output: String,
    },
    /// Coverage value is not a number
    InvalidCoverageValue {
        /// Package of the event
        package: String,
        /// The extracted value
        value: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NestedTestName { package, test } => {
                write!(f, "error parsing test {test:?} in {package}")
            }
            Self::MalformedCoverage { package, output } => {
                write!(f, "error parsing coverage {:?} in {package}", output.trim_end())
            }
            Self::InvalidCoverageValue { package, value } => {
                write!(f, "coverage value {value:?} in {package} is not a number")
            }
        }
    }
}

/// Receiver for diagnostics
pub trait DiagnosticSink {
    /// Record a skipped event
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Sink that logs each diagnostic at `warn` level and counts them
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    source: Option<String>,
    count: usize,
}

impl TracingSink {
    /// Create a sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that tags every entry with the input's name
    #[must_use]
    pub fn for_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            count: 0,
        }
    }

    /// Number of diagnostics reported so far
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.count += 1;
        match &self.source {
            Some(source) => warn!(source = %source, "{diagnostic}"),
            None => warn!("{diagnostic}"),
        }
    }
}
