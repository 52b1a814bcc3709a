//! Error taxonomy for the action pipeline.
//!
//! Actions fail with a [`PipelineError`]. The variants form a closed set of
//! structured error kinds; the [`ErrorClassifier`](crate::classifier::ErrorClassifier)
//! matches over them in a fixed order to produce a stable [`Reason`] tag.

use crate::entities::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Stable, machine-readable tag describing why an operation failed.
///
/// Serialized as its upper-case wire tag (e.g. `"VALIDATION"`). Reasons not
/// known to this crate are carried verbatim in [`Reason::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reason {
    /// A request parameter failed validation.
    Validation,
    /// The caller may not perform this operation.
    AccessDenied,
    /// The operation requires an authenticated caller.
    AuthorizationRequired,
    /// The account exists but has not been activated.
    InactiveUser,
    /// The client must be updated before it can talk to this server.
    UpdateRequired,
    /// The requested resource does not exist.
    NotFound,
    /// The caller exceeded a rate or attempt limit.
    TooManyRequests,
    /// The caller's client profile is denied for this action.
    ProfileDenied,
    /// The caller's IP is not allowed for its client profile.
    ProfileDeniedByIp,
    /// The request signature did not match.
    IncorrectSignature,
    /// A resource with the same identity already exists.
    AlreadyExist,
    /// No account with the given username exists.
    UserNotExist,
    /// The supplied password is wrong.
    InvalidPassword,
    /// Business-level soft error: the server answered, but with an error.
    ServerRespondedWithError,
    /// The server cannot serve requests right now.
    ServerUnavailable,
    /// The client did not send its version.
    EmptyVersion,
    /// Unclassified failure.
    Internal,
    /// Any other explicit reason tag, carried verbatim.
    Other(String),
}

impl Reason {
    /// Wire tag for this reason.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Validation => "VALIDATION",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::AuthorizationRequired => "AUTHORIZATION_REQUIRED",
            Self::InactiveUser => "INACTIVE_USER",
            Self::UpdateRequired => "UPDATE_REQUIRED",
            Self::NotFound => "NOT_FOUND",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::ProfileDenied => "PROFILE_DENIED",
            Self::ProfileDeniedByIp => "PROFILE_DENIED_BY_IP",
            Self::IncorrectSignature => "INCORRECT_SIGNATURE",
            Self::AlreadyExist => "ALREADY_EXIST",
            Self::UserNotExist => "USER_NOT_EXIST",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::ServerRespondedWithError => "SERVER_RESPONDED_WITH_ERROR",
            Self::ServerUnavailable => "SERVER_UNAVAILABLE",
            Self::EmptyVersion => "EMPTY_VERSION",
            Self::Internal => "INTERNAL",
            Self::Other(tag) => tag,
        }
    }

    /// Parse a wire tag. Matching is case-insensitive; unknown tags become
    /// [`Reason::Other`].
    ///
    /// # Examples
    ///
    /// ```
    /// use pipeline_core::Reason;
    ///
    /// assert_eq!(Reason::from_tag("validation"), Reason::Validation);
    /// assert_eq!(Reason::from_tag("SERVER_ERROR"), Reason::ServerRespondedWithError);
    /// assert_eq!(Reason::from_tag("QUOTA"), Reason::Other("QUOTA".to_string()));
    /// ```
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "VALIDATION" => Self::Validation,
            "ACCESS_DENIED" => Self::AccessDenied,
            "AUTHORIZATION_REQUIRED" => Self::AuthorizationRequired,
            "INACTIVE_USER" => Self::InactiveUser,
            "UPDATE_REQUIRED" => Self::UpdateRequired,
            "NOT_FOUND" => Self::NotFound,
            "TOO_MANY_REQUESTS" => Self::TooManyRequests,
            "PROFILE_DENIED" => Self::ProfileDenied,
            "PROFILE_DENIED_BY_IP" => Self::ProfileDeniedByIp,
            "INCORRECT_SIGNATURE" => Self::IncorrectSignature,
            "ALREADY_EXIST" => Self::AlreadyExist,
            "USER_NOT_EXIST" => Self::UserNotExist,
            "INVALID_PASSWORD" => Self::InvalidPassword,
            "SERVER_RESPONDED_WITH_ERROR" | "SERVER_ERROR" => Self::ServerRespondedWithError,
            "SERVER_UNAVAILABLE" => Self::ServerUnavailable,
            "EMPTY_VERSION" => Self::EmptyVersion,
            "INTERNAL" => Self::Internal,
            _ => Self::Other(tag.to_string()),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Reason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Reason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// A request parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ValidationError {
    /// Name of the offending parameter.
    pub param: String,
    /// The rejected value, if one was supplied.
    pub invalid_value: Option<String>,
    /// Short machine-readable code for the failed rule (e.g. `NOT_INTEGER`).
    pub reason: String,
    /// Human-readable message naming the parameter.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for `param`.
    #[must_use]
    pub fn new(
        param: impl Into<String>,
        invalid_value: Option<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            param: param.into(),
            invalid_value,
            reason: reason.into(),
            message: message.into(),
        }
    }
}

/// Why a storage lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageReason {
    /// No stored object for the key.
    NotFound,
    /// The client copy is already up to date.
    NoUpdateNeeded,
}

/// Error raised by actions and the collaborators they call.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Parameter validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The client is older than the minimum version the server accepts.
    #[error("{message}")]
    UpdateRequired {
        /// User-facing message.
        message: String,
        /// Minimum version the server accepts.
        required_version: Version,
        /// Where the client can fetch an update.
        update_url: String,
    },

    /// File storage lookup failed.
    #[error("{message}")]
    Storage {
        /// Storage-specific reason.
        reason: StorageReason,
        /// User-facing message.
        message: String,
        /// Path or key that was looked up.
        path: Option<String>,
    },

    /// Business error with an optional explicit reason tag.
    #[error("{message}")]
    Business {
        /// Explicit reason, if the raiser supplied one.
        reason: Option<Reason>,
        /// User-facing message.
        message: String,
    },

    /// An action received a payload of the wrong kind (wiring mistake).
    #[error("expected {expected} payload, got {found}")]
    UnexpectedPayload {
        /// Payload kind the action needs.
        expected: &'static str,
        /// Payload kind it got.
        found: &'static str,
    },

    /// Anything else.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PipelineError {
    /// Business error carrying an explicit reason.
    #[must_use]
    pub fn with_reason(message: impl Into<String>, reason: Reason) -> Self {
        Self::Business {
            reason: Some(reason),
            message: message.into(),
        }
    }

    /// Business error without a reason tag.
    #[must_use]
    pub fn business(message: impl Into<String>) -> Self {
        Self::Business {
            reason: None,
            message: message.into(),
        }
    }

    /// Unclassified internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(anyhow::anyhow!(message.into()))
    }

    /// Storage error.
    #[must_use]
    pub fn storage(reason: StorageReason, message: impl Into<String>, path: Option<String>) -> Self {
        Self::Storage {
            reason,
            message: message.into(),
            path,
        }
    }

    /// Reason carried by the error itself, without any classification policy.
    ///
    /// Unstructured errors carry none.
    #[must_use]
    pub fn carried_reason(&self) -> Option<Reason> {
        match self {
            Self::Validation(_) => Some(Reason::Validation),
            Self::UpdateRequired { .. } => Some(Reason::UpdateRequired),
            Self::Storage { .. } => Some(Reason::NotFound),
            Self::Business { reason, .. } => reason.clone(),
            Self::UnexpectedPayload { .. } | Self::Internal(_) => None,
        }
    }

    /// Returns `true` if this error carries the given reason.
    #[must_use]
    pub fn has_reason(&self, reason: &Reason) -> bool {
        self.carried_reason().as_ref() == Some(reason)
    }
}

/// Render an error and its `source()` chain, outermost first.
#[must_use]
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_tags_round_trip() {
        for reason in [
            Reason::Validation,
            Reason::ProfileDeniedByIp,
            Reason::ServerRespondedWithError,
            Reason::EmptyVersion,
        ] {
            assert_eq!(Reason::from_tag(reason.as_str()), reason);
        }
    }

    #[test]
    fn test_reason_serializes_as_tag() {
        let json = serde_json::to_string(&Reason::TooManyRequests).unwrap_or_default();
        assert_eq!(json, "\"TOO_MANY_REQUESTS\"");
    }

    #[test]
    fn test_carried_reason() {
        let err = PipelineError::with_reason("nope", Reason::AccessDenied);
        assert!(err.has_reason(&Reason::AccessDenied));
        assert_eq!(PipelineError::business("soft").carried_reason(), None);
        assert_eq!(PipelineError::internal("boom").carried_reason(), None);
    }

    #[test]
    fn test_error_chain_includes_causes() {
        let err = PipelineError::Internal(
            anyhow::anyhow!("disk unplugged").context("could not read settings"),
        );
        let chain = error_chain(&err);
        assert!(chain.starts_with("could not read settings"));
        assert!(chain.contains("caused by: disk unplugged"));
    }
}
