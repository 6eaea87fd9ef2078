// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! unbroken-gotest: `go test -json` processing for unbroken
//!
//! This library crate parses the line-delimited JSON event stream written by
//! `go test -json`, derives test outcome and coverage metrics from it, and
//! renders those metrics in the line format accepted by the push endpoint.
//!
//! # Example
//!
//! ```
//! use unbroken_gotest::{Diagnostic, MetricDeriver, encode_batch, parse_events};
//!
//! let output = br#"{"Action":"fail","Package":"pkg/a","Test":"Foo/Bar"}
//! "#;
//! let events = parse_events(&output[..]).unwrap();
//!
//! let mut deriver = MetricDeriver::new(Vec::<Diagnostic>::new());
//! let metrics = deriver.derive_all(&events);
//!
//! assert_eq!(
//!     encode_batch(&metrics),
//!     "go_test,package=pkg_a,suite=Foo,test=Bar metric=0"
//! );
//! ```

pub mod derive;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod metric;
pub mod parser;

pub use derive::{DeriveOptions, MetricDeriver};
pub use diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
pub use error::GoTestError;
pub use event::{Action, Event};
pub use metric::{GO_COVERAGE, GO_TEST, Labels, Metric, encode_batch};
pub use parser::{EventReader, parse_events};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::derive::{DeriveOptions, MetricDeriver};
    pub use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
    pub use crate::error::GoTestError;
    pub use crate::metric::{Metric, encode_batch};
    pub use crate::parser::parse_events;
}
