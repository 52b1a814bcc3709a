//! Values passed into and out of actions.

use crate::entities::{Account, CallParams, Session};
use crate::error::PipelineError;
use serde::Serialize;
use std::path::PathBuf;

/// A stored file ready to be served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Absolute path on disk.
    pub full_path: PathBuf,
}

/// Input or output of an action.
///
/// Serialized untagged: `Empty` renders as `null`, the other variants as
/// their inner value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// No value.
    #[default]
    Empty,
    /// Parsed request.
    Params(Box<CallParams>),
    /// A session.
    Session(Session),
    /// An account.
    Account(Account),
    /// A file to serve.
    File(FileInfo),
    /// Arbitrary JSON.
    Json(serde_json::Value),
}

impl Payload {
    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Params(_) => "params",
            Self::Session(_) => "session",
            Self::Account(_) => "account",
            Self::File(_) => "file",
            Self::Json(_) => "json",
        }
    }

    /// `true` for `Empty` and JSON `null`.
    ///
    /// Collections are never empty in this sense: an empty JSON array is a
    /// value like any other.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty | Self::Json(serde_json::Value::Null))
    }

    /// Borrow the call params.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnexpectedPayload` for any other variant.
    pub fn as_params(&self) -> Result<&CallParams, PipelineError> {
        match self {
            Self::Params(params) => Ok(params),
            other => Err(unexpected("params", other)),
        }
    }

    /// Take the call params.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnexpectedPayload` for any other variant.
    pub fn into_params(self) -> Result<CallParams, PipelineError> {
        match self {
            Self::Params(params) => Ok(*params),
            other => Err(unexpected("params", &other)),
        }
    }

    /// Take the session.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnexpectedPayload` for any other variant.
    pub fn into_session(self) -> Result<Session, PipelineError> {
        match self {
            Self::Session(session) => Ok(session),
            other => Err(unexpected("session", &other)),
        }
    }
}

impl From<CallParams> for Payload {
    fn from(params: CallParams) -> Self {
        Self::Params(Box::new(params))
    }
}

impl From<Session> for Payload {
    fn from(session: Session) -> Self {
        Self::Session(session)
    }
}

impl From<Account> for Payload {
    fn from(account: Account) -> Self {
        Self::Account(account)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

const fn unexpected(expected: &'static str, found: &Payload) -> PipelineError {
    PipelineError::UnexpectedPayload {
        expected,
        found: found.kind(),
    }
}
