//! Error classification.
//!
//! Turns a [`PipelineError`] into a [`ClassifiedError`]. Precedence, first
//! match wins:
//!
//! 1. Known structured kinds with fixed reasons (validation, client update).
//! 2. Storage errors with nested reasons, all reported as `NOT_FOUND`.
//! 3. Business errors with an explicit reason, used verbatim; without one,
//!    `SERVER_RESPONDED_WITH_ERROR`.
//! 4. Anything else is `INTERNAL`.

use crate::error::{PipelineError, Reason, error_chain};
use crate::result::ClassifiedError;
use std::sync::Arc;

/// Message shown for unclassified failures in production.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Classifies failures into the stable reason taxonomy.
pub trait ErrorClassifier: Send + Sync {
    /// Classify `err`.
    fn classify(&self, err: PipelineError) -> ClassifiedError;
}

/// Default classifier.
///
/// In the production profile, unclassified errors get
/// [`INTERNAL_ERROR_MESSAGE`] and `details` is never populated.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorClassifier {
    production: bool,
}

impl DefaultErrorClassifier {
    /// Classifier for the given profile.
    #[must_use]
    pub const fn new(production: bool) -> Self {
        Self { production }
    }

    /// Whether the production profile is active.
    #[must_use]
    pub const fn is_production(&self) -> bool {
        self.production
    }

    fn reason(err: &PipelineError) -> Reason {
        match err {
            PipelineError::Validation(_) => Reason::Validation,
            PipelineError::UpdateRequired { .. } => Reason::AccessDenied,
            PipelineError::Storage { .. } => Reason::NotFound,
            PipelineError::Business { reason, .. } => match reason {
                Some(Reason::Other(tag)) if tag.is_empty() => Reason::ServerRespondedWithError,
                Some(reason) => reason.clone(),
                None => Reason::ServerRespondedWithError,
            },
            PipelineError::UnexpectedPayload { .. } | PipelineError::Internal(_) => {
                Reason::Internal
            }
        }
    }

    fn message(&self, err: &PipelineError) -> String {
        let message = match err {
            PipelineError::Validation(v) => v.message.clone(),
            PipelineError::UpdateRequired { message, .. }
            | PipelineError::Storage { message, .. }
            | PipelineError::Business { message, .. } => message.clone(),
            PipelineError::UnexpectedPayload { .. } | PipelineError::Internal(_) => {
                if self.production {
                    INTERNAL_ERROR_MESSAGE.to_string()
                } else {
                    err.to_string()
                }
            }
        };
        if message.is_empty() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

impl ErrorClassifier for DefaultErrorClassifier {
    fn classify(&self, err: PipelineError) -> ClassifiedError {
        let mut classified = ClassifiedError::new(Self::reason(&err), self.message(&err));
        if !self.production {
            classified = classified.with_details(error_chain(&err));
        }
        classified.with_source(Arc::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Version;
    use crate::error::StorageReason;
    use crate::validation::check_i64;

    fn validation_error() -> PipelineError {
        match check_i64("age", "abc") {
            Ok(_) => PipelineError::internal("unreachable"),
            Err(e) => e.into(),
        }
    }

    #[test]
    fn test_validation_failure() {
        let classified = DefaultErrorClassifier::new(false).classify(validation_error());
        assert_eq!(classified.reason, Reason::Validation);
        assert!(classified.message.contains("age"));
        assert!(classified.details.is_some());
    }

    #[test]
    fn test_production_suppresses_details() {
        let classifier = DefaultErrorClassifier::new(true);
        for err in [
            validation_error(),
            PipelineError::internal("db exploded"),
            PipelineError::with_reason("nope", Reason::AccessDenied),
        ] {
            assert!(classifier.classify(err).details.is_none());
        }
    }

    #[test]
    fn test_update_required_is_access_denied() {
        let err = PipelineError::UpdateRequired {
            message: "update".to_string(),
            required_version: Version::new(10, "1.0"),
            update_url: "https://example.com".to_string(),
        };
        assert_eq!(
            DefaultErrorClassifier::default().classify(err).reason,
            Reason::AccessDenied
        );
    }

    #[test]
    fn test_storage_reasons_are_not_found() {
        let classifier = DefaultErrorClassifier::default();
        for reason in [StorageReason::NotFound, StorageReason::NoUpdateNeeded] {
            let err = PipelineError::storage(reason, "file", None);
            assert_eq!(classifier.classify(err).reason, Reason::NotFound);
        }
    }

    #[test]
    fn test_explicit_reason_verbatim_and_fallback() {
        let classifier = DefaultErrorClassifier::default();
        let custom = classifier.classify(PipelineError::with_reason(
            "quota",
            Reason::Other("QUOTA_EXCEEDED".to_string()),
        ));
        assert_eq!(custom.reason.as_str(), "QUOTA_EXCEEDED");

        let soft = classifier.classify(PipelineError::business("try later"));
        assert_eq!(soft.reason, Reason::ServerRespondedWithError);
        assert_eq!(soft.message, "try later");
    }

    #[test]
    fn test_internal_message_by_profile() {
        let dev = DefaultErrorClassifier::new(false).classify(PipelineError::internal("db exploded"));
        assert_eq!(dev.reason, Reason::Internal);
        assert_eq!(dev.message, "db exploded");

        let prod = DefaultErrorClassifier::new(true).classify(PipelineError::internal("db exploded"));
        assert_eq!(prod.message, INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_empty_message_gets_generic_text() {
        let classified = DefaultErrorClassifier::default()
            .classify(PipelineError::with_reason("", Reason::NotFound));
        assert_eq!(classified.message, INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_source_is_kept() {
        let classified = DefaultErrorClassifier::default().classify(validation_error());
        assert!(matches!(
            classified.source(),
            Some(PipelineError::Validation(v)) if v.param == "age"
        ));
    }
}
