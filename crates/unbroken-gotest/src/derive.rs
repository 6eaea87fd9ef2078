// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Metric derivation from `go test -json` events
//!
//! Every event is classified on its own, in order:
//!
//! - `pass` / `fail` events for a named test become one [`GO_TEST`] metric
//!   (`1` for pass, `0` for fail) labelled `package`, `suite`, `test`.
//!   Package-level results and `...Suite` containers are skipped.
//! - `output` events of the form `ok <pkg> <time> coverage: <n>% ...` become
//!   one [`GO_COVERAGE`] metric labelled `package`.
//! - Everything else is ignored.
//!
//! The `package` label of test metrics has `/` and `.` replaced by `_`; the
//! coverage metric keeps the import path as reported.

use tracing::trace;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::event::{Action, Event};
use crate::metric::{GO_COVERAGE, GO_TEST, Metric};

/// Tunables for derivation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeriveOptions {
    /// Skip coverage values that do not parse as a float
    pub validate_coverage: bool,
}

/// Turns events into metrics, reporting skipped events to a sink
pub struct MetricDeriver<S> {
    sink: S,
    options: DeriveOptions,
}

impl<S: DiagnosticSink> MetricDeriver<S> {
    /// Create a deriver with default options
    pub fn new(sink: S) -> Self {
        Self::with_options(sink, DeriveOptions::default())
    }

    /// Create a deriver with explicit options
    pub fn with_options(sink: S, options: DeriveOptions) -> Self {
        Self { sink, options }
    }

    /// The diagnostic sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the deriver and return its sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Derive metrics for a sequence of events, preserving their order
    pub fn derive_all<'a, I>(&mut self, events: I) -> Vec<Metric>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        events
            .into_iter()
            .filter_map(|event| self.derive(event))
            .collect()
    }

    /// Derive the metric for a single event, if it produces one
    pub fn derive(&mut self, event: &Event) -> Option<Metric> {
        match event.action {
            Action::Pass | Action::Fail => self.test_metric(event),
            Action::Output => self.coverage_metric(event),
            _ => None,
        }
    }

    fn test_metric(&mut self, event: &Event) -> Option<Metric> {
        // Package summaries carry no test name
        if event.test.is_empty() {
            return None;
        }

        if event.test.ends_with("Suite") {
            trace!(test = %event.test, "skipping suite result");
            return None;
        }

        let Some((suite, test)) = split_test_name(&event.test) else {
            self.sink.report(Diagnostic::NestedTestName {
                package: event.package.clone(),
                test: event.test.clone(),
            });
            return None;
        };

        let value = if event.action == Action::Pass { "1" } else { "0" };

        Some(
            Metric::new(GO_TEST, value)
                .with_label("package", normalize_package(&event.package))
                .with_label("suite", suite)
                .with_label("test", test),
        )
    }

    fn coverage_metric(&mut self, event: &Event) -> Option<Metric> {
        if !is_coverage_line(&event.output) {
            return None;
        }

        let Some(value) = extract_coverage(&event.output) else {
            self.sink.report(Diagnostic::MalformedCoverage {
                package: event.package.clone(),
                output: event.output.clone(),
            });
            return None;
        };

        if self.options.validate_coverage && value.trim().parse::<f64>().is_err() {
            self.sink.report(Diagnostic::InvalidCoverageValue {
                package: event.package.clone(),
                value: value.to_string(),
            });
            return None;
        }

        Some(Metric::new(GO_COVERAGE, value).with_label("package", event.package.as_str()))
    }
}

/// Make a package path safe to use as a label value
#[must_use]
pub fn normalize_package(package: &str) -> String {
    package.replace(['/', '.'], "_")
}

/// Split a test name into `(suite, test)`
///
/// `TestFoo` gives `("", "TestFoo")` and `TestFoo/bar` gives
/// `("TestFoo", "bar")`. Deeper nesting returns `None`.
#[must_use]
pub fn split_test_name(name: &str) -> Option<(&str, &str)> {
    let mut parts = name.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(test), None, _) => Some(("", test)),
        (Some(suite), Some(test), None) => Some((suite, test)),
        _ => None,
    }
}

/// Whether an output line is a package result carrying coverage
#[must_use]
pub fn is_coverage_line(output: &str) -> bool {
    output.starts_with("ok") && output.contains("coverage:")
}

/// Pull the percentage text out of a coverage line
///
/// Both the `coverage: ` marker and the `%` sign must occur exactly once.
#[must_use]
pub fn extract_coverage(output: &str) -> Option<&str> {
    let rest = split_exactly_once(output, "coverage: ")?.1;
    Some(split_exactly_once(rest, "%")?.0)
}

fn split_exactly_once<'a>(text: &'a str, separator: &str) -> Option<(&'a str, &'a str)> {
    let mut parts = text.split(separator);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(left), Some(right), None) => Some((left, right)),
        _ => None,
    }
}
