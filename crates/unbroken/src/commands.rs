// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Offline subcommands
//!
//! `unbroken derive` runs the same pipeline as the server on a local file
//! or stdin and prints the encoded payload, which is handy for checking
//! what a CI run would push.

use std::io::{Read, Write};
use std::path::Path;

use thiserror::Error;
use tracing::info;
use unbroken_gotest::encode_batch;

use crate::config::{Config, ConfigError};
use crate::ingest::{IngestError, IngestReport, Ingestor, UploadedFile};
use crate::push::{PushClient, PushError};

/// Errors from offline subcommands
#[derive(Debug, Error)]
pub enum CommandError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Parsing or pushing failed
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Reading input or writing output failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PushError> for CommandError {
    fn from(err: PushError) -> Self {
        Self::Ingest(IngestError::Push(err))
    }
}

/// Run `unbroken derive`
///
/// Reads `file` (or `stdin` when `None`), writes the encoded metrics to
/// `out` followed by a newline, and pushes them when `push` is set.
///
/// # Errors
///
/// Returns `CommandError` if the input cannot be read or parsed, the push
/// settings are incomplete, or the push request fails.
pub fn run_derive<R: Read, W: Write>(
    config: &Config,
    file: Option<&Path>,
    mut stdin: R,
    push: bool,
    mut out: W,
) -> Result<IngestReport, CommandError> {
    // Resolve the target first so a bad config fails before any work
    let target = if push {
        Some(config.require_push_target()?)
    } else {
        None
    };

    let upload = match file {
        Some(path) => UploadedFile::new(path.display().to_string(), std::fs::read(path)?),
        None => {
            let mut contents = Vec::new();
            stdin.read_to_end(&mut contents)?;
            UploadedFile::new("<stdin>", contents)
        }
    };

    let ingestor = Ingestor::new(config.derive_options(), None);
    let batch = ingestor.derive_files(std::slice::from_ref(&upload))?;

    let body = encode_batch(&batch.metrics);
    if !body.is_empty() {
        writeln!(out, "{body}")?;
    }

    let push_status = match target {
        Some(target) => {
            let client = PushClient::new(target)?;
            info!(url = client.url(), metrics = batch.metrics.len(), "pushing metrics");
            Some(client.push_body(body)?.status)
        }
        None => None,
    };

    Ok(IngestReport {
        files: batch.files,
        metrics: batch.metrics.len(),
        diagnostics: batch.diagnostics,
        pushed: push_status.is_some(),
        push_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    const INPUT: &str = concat!(
        r#"{"Action":"pass","Package":"pkg/a","Test":"TestOne"}"#,
        "\n",
        r#"{"Action":"fail","Package":"pkg/a","Test":"Foo/Bar"}"#,
        "\n",
    );

    #[test]
    fn test_derive_from_stdin() {
        let mut out = Vec::<u8>::new();
        let report = run_derive(&Config::default(), None, INPUT.as_bytes(), false, &mut out)
            .expect("Should derive");

        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "go_test,package=pkg_a,suite=,test=TestOne metric=1\n\
             go_test,package=pkg_a,suite=Foo,test=Bar metric=0\n"
        );
        assert_eq!(report.metrics, 2);
        assert!(!report.pushed);
    }

    #[test]
    fn test_derive_empty_input_prints_nothing() {
        let mut out = Vec::<u8>::new();
        let report = run_derive(&Config::default(), None, &b""[..], false, &mut out)
            .expect("Should derive");
        assert!(out.is_empty());
        assert_eq!(report.metrics, 0);
    }

    #[test]
    fn test_derive_invalid_input() {
        let mut out = Vec::<u8>::new();
        let result = run_derive(&Config::default(), None, &b"{oops"[..], false, &mut out);
        assert!(matches!(result, Err(CommandError::Ingest(IngestError::Parse { .. }))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_derive_push_requires_target() {
        let mut out = Vec::<u8>::new();
        let result = run_derive(&Config::default(), None, INPUT.as_bytes(), true, &mut out);
        assert!(matches!(
            result,
            Err(CommandError::Config(ConfigError::MissingGrafanaUrl))
        ));
    }

    #[test]
    fn test_derive_missing_file() {
        let mut out = Vec::<u8>::new();
        let result = run_derive(
            &Config::default(),
            Some(Path::new("/nonexistent/go_test.out")),
            &b""[..],
            false,
            &mut out,
        );
        assert!(matches!(result, Err(CommandError::Io(_))));
    }
}
