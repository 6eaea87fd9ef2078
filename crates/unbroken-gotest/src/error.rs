// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for unbroken-gotest

use thiserror::Error;

/// Errors that can occur while reading `go test -json` output
#[derive(Debug, Error)]
pub enum GoTestError {
    /// A line was not a valid test event
    #[error("malformed go test output at line {line}: {source}")]
    Decode {
        /// 1-based line number of the offending line
        line: usize,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Error reading the uploaded stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GoTestError {
    /// Line number of a decode failure, if this is one
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Decode { line, .. } => Some(*line),
            Self::Io(_) => None,
        }
    }
}
