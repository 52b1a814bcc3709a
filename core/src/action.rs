//! The unit-of-work contract.
//!
//! An [`Action`] runs against a [`Payload`] and either produces a new payload
//! or fails with a [`PipelineError`]. Lifecycle hooks have no-op defaults so
//! concrete actions override only what they need.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use pipeline_core::{Action, ActionContext, Payload, PipelineError};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Action for Echo {
//!     fn name(&self) -> &str {
//!         "Echo"
//!     }
//!
//!     async fn run(&self, ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError> {
//!         ctx.log("echoing");
//!         Ok(arg)
//!     }
//! }
//! ```

use crate::payload::Payload;
use crate::result::{ActionResult, ClassifiedError};
use crate::error::PipelineError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Alert routing decision for one classified error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertParams {
    /// Whether the alert sink should be notified.
    pub send: bool,
}

impl Default for AlertParams {
    fn default() -> Self {
        Self { send: true }
    }
}

/// Request-scoped state threaded through one runner invocation.
///
/// Owns the log buffer, so concurrent requests sharing the same action
/// instances never share a buffer.
#[derive(Default)]
pub struct ActionContext {
    log: Vec<String>,
    failed: Option<Arc<dyn Action>>,
}

impl ActionContext {
    /// Fresh context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line to the request log.
    pub fn log(&mut self, line: impl fmt::Display) {
        self.log.push(line.to_string());
    }

    /// Request log joined with `"; "`.
    #[must_use]
    pub fn log_text(&self) -> String {
        self.log.join("; ")
    }

    /// `true` when nothing was logged.
    #[must_use]
    pub fn log_is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Remember the innermost action that failed. Later calls keep the first.
    pub fn record_failure(&mut self, action: Arc<dyn Action>) {
        if self.failed.is_none() {
            self.failed = Some(action);
        }
    }

    /// The innermost action that failed during this invocation.
    #[must_use]
    pub fn failed_action(&self) -> Option<&Arc<dyn Action>> {
        self.failed.as_ref()
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("log", &self.log)
            .field("failed", &self.failed.as_ref().map(|a| a.name().to_string()))
            .finish()
    }
}

/// A named unit of request-handling logic.
///
/// Hooks run around [`Action::run`] in the order `on_before_run`, `run`,
/// then `on_success` or `on_error`, then `on_finished`.
#[async_trait]
pub trait Action: Send + Sync {
    /// Stable identifier used in logs and chain names.
    ///
    /// Defaults to the implementing type's name.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Do the work.
    ///
    /// # Errors
    ///
    /// Any business failure; the runner classifies it.
    async fn run(&self, ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError>;

    /// Called before `run`.
    fn on_before_run(&self, _arg: &Payload) {}

    /// Called after a successful `run`.
    fn on_success(&self, _arg: &Payload, _result: &Payload) {}

    /// Called after a failed `run` (or a failed argument parse).
    fn on_error(&self, _arg: &Payload, _err: &ClassifiedError) {}

    /// Called last, whatever happened.
    fn on_finished(&self, _arg: &Payload, _result: &ActionResult) {}

    /// Adjust alerting for `err`; set `alert.send = false` to mute expected
    /// failures.
    fn prepare_error_alert(
        &self,
        _ctx: &ActionContext,
        _alert: &mut AlertParams,
        _err: &ClassifiedError,
        _arg: &Payload,
    ) {
    }

    /// What to log as the action's arguments.
    fn args_for_log(&self, arg: &Payload) -> serde_json::Value {
        serde_json::to_value(arg).unwrap_or_default()
    }
}

/// Action that forwards its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopAction;

#[async_trait]
impl Action for NopAction {
    fn name(&self) -> &str {
        "Nop"
    }

    async fn run(&self, _ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError> {
        Ok(arg)
    }
}
