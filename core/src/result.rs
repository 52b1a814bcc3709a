//! Runner output: the classified error and the per-invocation result.

use crate::error::{PipelineError, Reason, error_chain};
use crate::payload::Payload;
use serde::Serialize;
use std::sync::Arc;

/// A failure reduced to `{reason, message, details}`.
///
/// The original error stays attached (not serialized) so presenters can
/// special-case structured kinds.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedError {
    /// Stable reason tag.
    pub reason: Reason,
    /// User-facing message.
    pub message: String,
    /// Diagnostic detail (cause chain); suppressed in production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip)]
    source: Option<Arc<PipelineError>>,
}

impl ClassifiedError {
    /// Classified error without an attached source.
    #[must_use]
    pub fn new(reason: Reason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attach diagnostic details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach the error this was classified from.
    #[must_use]
    pub fn with_source(mut self, source: Arc<PipelineError>) -> Self {
        self.source = Some(source);
        self
    }

    /// Policy-free description used inside chains: the error's own reason
    /// (or `INTERNAL`), its display text and full cause chain.
    #[must_use]
    pub fn describe(err: &PipelineError) -> Self {
        Self::new(
            err.carried_reason().unwrap_or(Reason::Internal),
            err.to_string(),
        )
        .with_details(error_chain(err))
    }

    /// The error this was classified from, if still attached.
    #[must_use]
    pub fn source(&self) -> Option<&PipelineError> {
        self.source.as_deref()
    }

    /// Case-insensitive reason comparison.
    #[must_use]
    pub fn is(&self, reason: &Reason) -> bool {
        self.reason.as_str().eq_ignore_ascii_case(reason.as_str())
    }
}

/// Outcome of one runner invocation.
///
/// Serializes as `{result, error, executionTimeMs}`; `result` is omitted
/// when empty and `error` when absent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    /// Action output (empty on failure).
    #[serde(rename = "result", skip_serializing_if = "Payload::is_empty")]
    pub value: Payload,
    /// Classified failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ClassifiedError>,
    /// Wall time spent in the runner.
    pub execution_time_ms: i64,
}

impl ActionResult {
    /// Successful result.
    #[must_use]
    pub fn success(value: Payload) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    /// Failed result.
    #[must_use]
    pub fn failure(error: ClassifiedError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// `true` when no error was recorded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Reason of the recorded error, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&Reason> {
        self.error.as_ref().map(|e| &e.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_json_shape() {
        let mut result = ActionResult::success(Payload::Json(json!({"n": 1})));
        result.execution_time_ms = 7;
        assert_eq!(
            serde_json::to_value(&result).ok(),
            Some(json!({"result": {"n": 1}, "executionTimeMs": 7}))
        );
    }

    #[test]
    fn test_failure_json_shape() {
        let result = ActionResult::failure(ClassifiedError::new(
            Reason::NotFound,
            "no such file",
        ));
        assert_eq!(
            serde_json::to_value(&result).ok(),
            Some(json!({
                "error": {"reason": "NOT_FOUND", "message": "no such file"},
                "executionTimeMs": 0
            }))
        );
    }

    #[test]
    fn test_describe_uses_carried_reason() {
        let err = PipelineError::with_reason("who are you", Reason::AuthorizationRequired);
        let described = ClassifiedError::describe(&err);
        assert_eq!(described.reason, Reason::AuthorizationRequired);
        assert_eq!(described.message, "who are you");
        assert!(described.source().is_none());
    }
}
