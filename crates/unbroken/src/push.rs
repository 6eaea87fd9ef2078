// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Grafana push client
//!
//! Sends an encoded metric batch in one blocking `POST` with a bearer token.
//! Only transport failures are errors: the response status and body are
//! logged and handed back, never interpreted. There is exactly one attempt.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::{debug, info, warn};
use unbroken_gotest::{Metric, encode_batch};

use crate::config::PushTarget;

/// Push errors
#[derive(Debug, Error)]
pub enum PushError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request could not be sent or the response could not be read
    #[error("Push request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Outcome of a completed push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    /// HTTP status code returned by the endpoint
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl PushReport {
    /// Whether the endpoint answered with a 2xx status
    #[must_use]
    pub fn accepted(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking client for the metric push endpoint
///
/// Must not be created or dropped on an async runtime thread; run it inside
/// `spawn_blocking` when called from async code.
pub struct PushClient {
    client: Client,
    target: PushTarget,
}

impl PushClient {
    /// Create a client for the given target
    ///
    /// # Errors
    ///
    /// Returns `PushError::Client` if the HTTP client cannot be built.
    pub fn new(target: PushTarget) -> Result<Self, PushError> {
        let client = Client::builder()
            .user_agent(concat!("unbroken/", env!("CARGO_PKG_VERSION")))
            .timeout(target.timeout)
            .build()
            .map_err(PushError::Client)?;

        Ok(Self { client, target })
    }

    /// The endpoint this client pushes to
    #[must_use]
    pub fn url(&self) -> &str {
        &self.target.url
    }

    /// Encode and push a batch of metrics
    ///
    /// # Errors
    ///
    /// Returns `PushError::Transport` if the request fails.
    pub fn push(&self, metrics: &[Metric]) -> Result<PushReport, PushError> {
        self.push_body(encode_batch(metrics))
    }

    /// Push an already encoded body
    ///
    /// # Errors
    ///
    /// Returns `PushError::Transport` if the request fails.
    pub fn push_body(&self, body: String) -> Result<PushReport, PushError> {
        debug!(url = %self.target.url, body = %body, "pushing metrics");

        let response = self
            .client
            .post(&self.target.url)
            .header(CONTENT_TYPE, "text/plain")
            .bearer_auth(&self.target.key)
            .body(body)
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if status.is_success() {
            info!(status = %status, body = %body, "grafana push done");
        } else {
            warn!(status = %status, body = %body, "grafana push rejected");
        }

        Ok(PushReport {
            status: status.as_u16(),
            body,
        })
    }
}
