//! HTTP handlers for the unbroken server
//!
//! `POST /go/push` accepts a multipart form with one or more file parts
//! named `gotest`, each holding `go test -json` output. Other parts are
//! ignored.

use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::ingest::{IngestError, IngestReport, Ingestor, UploadedFile};

/// Multipart field carrying `go test -json` output
pub const GOTEST_FIELD: &str = "gotest";

// ============================================================================
// Error Types
// ============================================================================

/// Handler errors
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The request is not a multipart form
    #[error("{}", .0.body_text())]
    Rejection(#[from] MultipartRejection),

    /// The multipart body could not be read
    #[error("{}", .0.body_text())]
    Multipart(#[from] MultipartError),

    /// Parsing or pushing failed
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// The blocking ingestion task did not complete
    #[error("ingestion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl HandlerError {
    /// HTTP status for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejection(rejection) => rejection.status(),
            Self::Multipart(err) => err.status(),
            Self::Ingest(_) => StatusCode::BAD_REQUEST,
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = %status, "{self}");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ============================================================================
// State
// ============================================================================

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    ingestor: Arc<Ingestor>,
}

impl AppState {
    /// Create state around an ingestor
    #[must_use]
    pub fn new(ingestor: Ingestor) -> Self {
        Self {
            ingestor: Arc::new(ingestor),
        }
    }
}

// ============================================================================
// Handler Functions
// ============================================================================

/// Handle `POST /go/push`
///
/// # Errors
///
/// Returns `HandlerError` if the form cannot be read, a file is not valid
/// `go test -json` output, or the push request fails.
pub async fn push_go_test(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestReport>, HandlerError> {
    let files = read_gotest_files(multipart?).await?;
    debug!(files = files.len(), "received upload");

    let ingestor = Arc::clone(&state.ingestor);
    let report = tokio::task::spawn_blocking(move || ingestor.ingest(&files)).await??;

    Ok(Json(report))
}

/// Handle `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// Collect the `gotest` parts of a form, in upload order
async fn read_gotest_files(mut multipart: Multipart) -> Result<Vec<UploadedFile>, HandlerError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(GOTEST_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or(GOTEST_FIELD).to_string();
        let contents = field.bytes().await?;
        files.push(UploadedFile::new(name, contents.to_vec()));
    }

    Ok(files)
}
