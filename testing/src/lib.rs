//! # Action Pipeline Testing
//!
//! Testing utilities and helpers for the action pipeline.
//!
//! This crate provides:
//! - Instrumented actions with scripted outcomes
//! - A recording alert sink
//! - Builders for request parameters
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```
//! use pipeline_core::{Payload, Reason};
//! use pipeline_runtime::ActionRunner;
//! use pipeline_testing::ScriptedAction;
//!
//! # tokio_test::block_on(async {
//! let action = ScriptedAction::failing("Login", Reason::InvalidPassword, "wrong password");
//! let result = ActionRunner::for_profile(false)
//!     .run(&action, || Ok(Payload::Empty))
//!     .await;
//!
//! assert_eq!(result.reason(), Some(&Reason::InvalidPassword));
//! assert_eq!(action.calls(), 1);
//! # });
//! ```

/// Instrumented test doubles
pub mod mocks;

/// Builders for request parameters
pub mod helpers;

/// Property-based testing utilities using proptest.
pub mod properties {
    use pipeline_core::Reason;
    use proptest::prelude::*;

    /// Any reason from the closed taxonomy.
    pub fn known_reason() -> impl Strategy<Value = Reason> {
        prop_oneof![
            Just(Reason::Validation),
            Just(Reason::AccessDenied),
            Just(Reason::AuthorizationRequired),
            Just(Reason::InactiveUser),
            Just(Reason::UpdateRequired),
            Just(Reason::NotFound),
            Just(Reason::TooManyRequests),
            Just(Reason::ProfileDenied),
            Just(Reason::ProfileDeniedByIp),
            Just(Reason::IncorrectSignature),
            Just(Reason::AlreadyExist),
            Just(Reason::UserNotExist),
            Just(Reason::InvalidPassword),
            Just(Reason::ServerRespondedWithError),
            Just(Reason::ServerUnavailable),
            Just(Reason::EmptyVersion),
            Just(Reason::Internal),
        ]
    }

    /// A short lowercase parameter name.
    pub fn param_name() -> impl Strategy<Value = String> {
        "[a-z]{1,8}"
    }
}

pub use helpers::CallParamsBuilder;
pub use mocks::{RecordingAlertSink, ScriptedAction};
