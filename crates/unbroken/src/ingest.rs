// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Upload ingestion pipeline
//!
//! This module ties the pieces together for one upload: each `gotest` file
//! is parsed and turned into metrics, in upload order, and the combined
//! batch is optionally pushed. A file that fails to parse fails the whole
//! upload and nothing is pushed.
//!
//! Everything here is synchronous. Call it from `spawn_blocking` when
//! running inside the server.
//!
//! # Example
//!
//! ```no_run
//! use unbroken::ingest::{Ingestor, UploadedFile};
//! use unbroken_gotest::DeriveOptions;
//!
//! let ingestor = Ingestor::new(DeriveOptions::default(), None);
//! let file = UploadedFile::new("go_test.out", std::fs::read("go_test.out").unwrap());
//! let report = ingestor.ingest(&[file]).expect("ingest");
//! println!("derived {} metrics", report.metrics);
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use unbroken_gotest::{
    DeriveOptions, GoTestError, Metric, MetricDeriver, TracingSink, parse_events,
};

use crate::config::PushTarget;
use crate::push::{PushClient, PushError};

// ============================================================================
// Error Types
// ============================================================================

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// An uploaded file is not valid `go test -json` output
    #[error("{file}: {source}")]
    Parse {
        /// Name of the offending file
        file: String,
        /// The parse failure
        #[source]
        source: GoTestError,
    },

    /// Pushing the derived metrics failed
    #[error(transparent)]
    Push(#[from] PushError),
}

// ============================================================================
// Input and Output Types
// ============================================================================

/// One uploaded `go test -json` file
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name
    pub name: String,
    /// Raw file contents
    pub contents: Vec<u8>,
}

impl UploadedFile {
    /// Create an uploaded file
    #[must_use]
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Metrics derived from a set of files
#[derive(Debug, Clone, Default)]
pub struct DerivedBatch {
    /// Metrics in file and event order
    pub metrics: Vec<Metric>,
    /// Number of files processed
    pub files: usize,
    /// Number of events skipped with a diagnostic
    pub diagnostics: usize,
}

/// Summary of one ingestion, returned to the uploader
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Number of files processed
    pub files: usize,
    /// Number of metrics derived
    pub metrics: usize,
    /// Number of events skipped with a diagnostic
    pub diagnostics: usize,
    /// Whether the metrics were pushed
    pub pushed: bool,
    /// Status returned by the push endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_status: Option<u16>,
}

// ============================================================================
// Ingestor
// ============================================================================

/// Runs the parse → derive → push pipeline for uploads
#[derive(Debug, Clone)]
pub struct Ingestor {
    options: DeriveOptions,
    push: Option<PushTarget>,
}

impl Ingestor {
    /// Create an ingestor; metrics are pushed only when `push` is set
    #[must_use]
    pub fn new(options: DeriveOptions, push: Option<PushTarget>) -> Self {
        Self { options, push }
    }

    /// Whether this ingestor pushes metrics
    #[must_use]
    pub fn pushes(&self) -> bool {
        self.push.is_some()
    }

    /// Derive metrics for one file
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Parse` if any line of the file is malformed.
    pub fn derive_file(&self, file: &UploadedFile) -> Result<DerivedBatch, IngestError> {
        info!(file = %file.name, bytes = file.contents.len(), "parsing gotest file");

        let events = parse_events(file.contents.as_slice()).map_err(|source| IngestError::Parse {
            file: file.name.clone(),
            source,
        })?;

        let mut deriver =
            MetricDeriver::with_options(TracingSink::for_source(file.name.as_str()), self.options);
        let metrics = deriver.derive_all(&events);
        let diagnostics = deriver.sink().count();

        debug!(
            file = %file.name,
            events = events.len(),
            metrics = metrics.len(),
            diagnostics,
            "derived metrics"
        );

        Ok(DerivedBatch {
            metrics,
            files: 1,
            diagnostics,
        })
    }

    /// Derive metrics for several files, in order
    ///
    /// # Errors
    ///
    /// Returns the error of the first file that fails to parse; later files
    /// are not read.
    pub fn derive_files(&self, files: &[UploadedFile]) -> Result<DerivedBatch, IngestError> {
        let mut batch = DerivedBatch::default();
        for file in files {
            let derived = self.derive_file(file)?;
            batch.metrics.extend(derived.metrics);
            batch.files += 1;
            batch.diagnostics += derived.diagnostics;
        }
        Ok(batch)
    }

    /// Derive metrics for an upload and push them if configured
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Parse` if a file is malformed (nothing is
    /// pushed) or `IngestError::Push` if the push request fails.
    pub fn ingest(&self, files: &[UploadedFile]) -> Result<IngestReport, IngestError> {
        let batch = self.derive_files(files)?;

        let push_status = match &self.push {
            Some(target) => {
                let client = PushClient::new(target.clone())?;
                Some(client.push(&batch.metrics)?.status)
            }
            None => {
                debug!(metrics = batch.metrics.len(), "metric push disabled");
                None
            }
        };

        Ok(IngestReport {
            files: batch.files,
            metrics: batch.metrics.len(),
            diagnostics: batch.diagnostics,
            pushed: push_status.is_some(),
            push_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use similar_asserts::assert_eq;
    use unbroken_gotest::encode_batch;

    const PASSING: &str = concat!(
        r#"{"Action":"run","Package":"example.com/calc","Test":"TestAdd"}"#,
        "\n",
        r#"{"Action":"pass","Package":"example.com/calc","Test":"TestAdd","Elapsed":0.01}"#,
        "\n",
        r#"{"Action":"output","Package":"example.com/calc","Output":"ok  \texample.com/calc\t0.2s\tcoverage: 66.7% of statements\n"}"#,
        "\n",
    );

    const FAILING: &str = concat!(
        r#"{"Action":"fail","Package":"example.com/web","Test":"TestServe/get"}"#,
        "\n",
        r#"{"Action":"fail","Package":"example.com/web","Test":"TestServe/a/b"}"#,
        "\n",
    );

    fn file(name: &str, contents: &str) -> UploadedFile {
        UploadedFile::new(name, contents.as_bytes().to_vec())
    }

    #[test]
    fn test_derive_file() {
        let ingestor = Ingestor::new(DeriveOptions::default(), None);
        let batch = ingestor
            .derive_file(&file("calc.out", PASSING))
            .expect("Should derive");

        assert_eq!(
            encode_batch(&batch.metrics),
            "go_test,package=example_com_calc,suite=,test=TestAdd metric=1\n\
             go_coverage,package=example.com/calc metric=66.7"
        );
        assert_eq!(batch.diagnostics, 0);
    }

    #[test]
    fn test_derive_files_in_upload_order() {
        let ingestor = Ingestor::new(DeriveOptions::default(), None);
        let batch = ingestor
            .derive_files(&[file("web.out", FAILING), file("calc.out", PASSING)])
            .expect("Should derive");

        assert_eq!(batch.files, 2);
        assert_eq!(batch.metrics.len(), 3);
        assert_eq!(batch.diagnostics, 1);
        assert_eq!(batch.metrics[0].label("package"), Some("example_com_web"));
        assert_eq!(batch.metrics[2].name, "go_coverage");
    }

    #[test]
    fn test_first_bad_file_fails_upload() {
        let ingestor = Ingestor::new(DeriveOptions::default(), None);
        let err = ingestor
            .derive_files(&[
                file("calc.out", PASSING),
                file("broken.out", "{\"Action\":\"pass\"\n"),
                file("web.out", FAILING),
            ])
            .expect_err("Should fail");

        assert!(matches!(&err, IngestError::Parse { file, .. } if file == "broken.out"));
        assert!(err.to_string().starts_with("broken.out: malformed go test output at line 1"));
    }

    #[test]
    fn test_ingest_without_push() {
        let ingestor = Ingestor::new(DeriveOptions::default(), None);
        let report = ingestor
            .ingest(&[file("calc.out", PASSING)])
            .expect("Should ingest");

        assert!(!ingestor.pushes());
        assert_eq!(
            report,
            IngestReport {
                files: 1,
                metrics: 2,
                diagnostics: 0,
                pushed: false,
                push_status: None,
            }
        );
    }

    #[test]
    fn test_ingest_pushes_combined_batch() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/push")
                .header("authorization", "Bearer key")
                .body(
                    "go_test,package=example_com_web,suite=TestServe,test=get metric=0\n\
                     go_test,package=example_com_calc,suite=,test=TestAdd metric=1\n\
                     go_coverage,package=example.com/calc metric=66.7",
                );
            then.status(204);
        });

        let ingestor = Ingestor::new(
            DeriveOptions::default(),
            Some(PushTarget::new(server.url("/push"), "key")),
        );
        let report = ingestor
            .ingest(&[file("web.out", FAILING), file("calc.out", PASSING)])
            .expect("Should ingest");

        mock.assert();
        assert!(report.pushed);
        assert_eq!(report.push_status, Some(204));
    }

    #[test]
    fn test_parse_failure_skips_push() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/push");
            then.status(204);
        });

        let ingestor = Ingestor::new(
            DeriveOptions::default(),
            Some(PushTarget::new(server.url("/push"), "key")),
        );
        let result = ingestor.ingest(&[file("calc.out", PASSING), file("bad.out", "nope")]);

        assert!(matches!(result, Err(IngestError::Parse { .. })));
        mock.assert_hits(0);
    }

    #[test]
    fn test_push_transport_error() {
        let ingestor = Ingestor::new(
            DeriveOptions::default(),
            Some(PushTarget::new("http://127.0.0.1:1/push", "key")),
        );
        let result = ingestor.ingest(&[file("calc.out", PASSING)]);
        assert!(matches!(result, Err(IngestError::Push(PushError::Transport(_)))));
    }

    #[test]
    fn test_report_serializes_without_push_status() {
        let report = IngestReport {
            files: 1,
            metrics: 4,
            diagnostics: 0,
            pushed: false,
            push_status: None,
        };
        assert_eq!(
            serde_json::to_string(&report).expect("serialize"),
            r#"{"files":1,"metrics":4,"diagnostics":0,"pushed":false}"#
        );
    }
}
