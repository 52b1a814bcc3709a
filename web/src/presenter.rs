//! Renders runner results as HTTP responses.
//!
//! [`JsonPresenter`] writes `{result, error, executionTimeMs}` with the
//! status from [`pipeline_core::status`]. [`FilePresenter`] streams file
//! payloads and maps storage misses to `304`/`404` first.

use async_trait::async_trait;
use axum::{
    Json,
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use pipeline_core::{ActionResult, Payload, PipelineError, StorageReason, status};
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Writes an [`ActionResult`] to the wire.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Response for `result`; `status` overrides the mapped status code.
    async fn present(&self, result: ActionResult, status: Option<u16>) -> Response;
}

/// JSON presenter.
///
/// Validation failures additionally carry `param`, `invalidValue` and the
/// rule code (as `reason`) inside `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPresenter;

impl JsonPresenter {
    /// Wire model of `result`.
    #[must_use]
    pub fn to_model(result: &ActionResult) -> Value {
        let mut model = serde_json::to_value(result).unwrap_or_else(|err| {
            tracing::error!(error = %err, "Failed to serialize action result");
            json!({"executionTimeMs": result.execution_time_ms})
        });

        let validation = result.error.as_ref().and_then(|e| match e.source() {
            Some(PipelineError::Validation(v)) => Some(v),
            _ => None,
        });
        let error = model.get_mut("error").and_then(Value::as_object_mut);
        if let (Some(v), Some(error)) = (validation, error) {
            error.insert("param".to_string(), Value::String(v.param.clone()));
            if let Some(invalid) = &v.invalid_value {
                error.insert("invalidValue".to_string(), Value::String(invalid.clone()));
            }
            if !v.reason.is_empty() {
                error.insert("reason".to_string(), Value::String(v.reason.clone()));
            }
        }
        model
    }

    /// Render `result` with `status`, or the status mapped from its reason.
    #[must_use]
    pub fn render(result: &ActionResult, status: Option<u16>) -> Response {
        let code = status::response_status(result, status);
        let code = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, Json(Self::to_model(result))).into_response()
    }
}

#[async_trait]
impl Presenter for JsonPresenter {
    async fn present(&self, result: ActionResult, status: Option<u16>) -> Response {
        Self::render(&result, status)
    }
}

/// Serves [`Payload::File`] results.
///
/// Storage errors become `304 Not Modified` (`NO_UPDATE_NEEDED`) or
/// `404 Not Found`; any other error or a missing file falls back to JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePresenter;

#[async_trait]
impl Presenter for FilePresenter {
    async fn present(&self, result: ActionResult, status: Option<u16>) -> Response {
        if let Some(err) = &result.error {
            let storage_status = match err.source() {
                Some(PipelineError::Storage {
                    reason: StorageReason::NoUpdateNeeded,
                    ..
                }) => Some(status::NOT_MODIFIED),
                Some(PipelineError::Storage {
                    reason: StorageReason::NotFound,
                    ..
                }) => Some(status::NOT_FOUND),
                _ => status,
            };
            return JsonPresenter::render(&result, storage_status);
        }

        let Payload::File(file) = &result.value else {
            return JsonPresenter::render(&result, status);
        };
        if !file.full_path.is_file() {
            tracing::debug!(path = %file.full_path.display(), "File to serve is missing");
            return JsonPresenter::render(&result, Some(status::NOT_FOUND));
        }

        match ServeFile::new(&file.full_path)
            .oneshot(Request::new(Body::empty()))
            .await
        {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        }
    }
}
