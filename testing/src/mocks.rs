//! Instrumented test doubles.

use async_trait::async_trait;
use parking_lot::Mutex;
use pipeline_core::{
    Action, ActionContext, ActionResult, ClassifiedError, Payload, PipelineError, Reason,
};
use pipeline_runtime::AlertSink;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum Script {
    Return(Payload),
    Echo,
    Fail(Reason, String),
    Error(String),
}

/// Action with a fixed outcome that records every call and hook.
///
/// # Example
///
/// ```
/// use pipeline_core::{Action, ActionContext, Payload};
/// use pipeline_testing::ScriptedAction;
///
/// # tokio_test::block_on(async {
/// let action = ScriptedAction::echo("Echo");
/// let out = action.run(&mut ActionContext::new(), Payload::Empty).await;
/// assert!(out.is_ok());
/// assert_eq!(action.inputs(), vec![Payload::Empty]);
/// # });
/// ```
#[derive(Debug)]
pub struct ScriptedAction {
    name: String,
    script: Script,
    calls: AtomicUsize,
    hooks: Mutex<Vec<String>>,
    inputs: Mutex<Vec<Payload>>,
}

impl ScriptedAction {
    fn scripted(name: impl Into<String>, script: Script) -> Self {
        Self {
            name: name.into(),
            script,
            calls: AtomicUsize::new(0),
            hooks: Mutex::new(Vec::new()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Always succeeds with `output`.
    #[must_use]
    pub fn returning(name: impl Into<String>, output: Payload) -> Self {
        Self::scripted(name, Script::Return(output))
    }

    /// Always succeeds with its input.
    #[must_use]
    pub fn echo(name: impl Into<String>) -> Self {
        Self::scripted(name, Script::Echo)
    }

    /// Always fails with a business error carrying `reason`.
    #[must_use]
    pub fn failing(name: impl Into<String>, reason: Reason, message: impl Into<String>) -> Self {
        Self::scripted(name, Script::Fail(reason, message.into()))
    }

    /// Always fails with an unclassified internal error.
    #[must_use]
    pub fn erroring(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::scripted(name, Script::Error(message.into()))
    }

    /// Number of `run` calls.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Hook and run events in call order: `before_run`, `run`, `success`,
    /// `error`, `finished`.
    #[must_use]
    pub fn hooks(&self) -> Vec<String> {
        self.hooks.lock().clone()
    }

    /// Inputs `run` was called with.
    #[must_use]
    pub fn inputs(&self) -> Vec<Payload> {
        self.inputs.lock().clone()
    }

    fn record(&self, event: &str) {
        self.hooks.lock().push(event.to_string());
    }
}

#[async_trait]
impl Action for ScriptedAction {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.record("run");
        self.inputs.lock().push(arg.clone());
        ctx.log(format!("{} ran", self.name));

        match &self.script {
            Script::Return(output) => Ok(output.clone()),
            Script::Echo => Ok(arg),
            Script::Fail(reason, message) => {
                Err(PipelineError::with_reason(message.clone(), reason.clone()))
            }
            Script::Error(message) => Err(PipelineError::internal(message.clone())),
        }
    }

    fn on_before_run(&self, _arg: &Payload) {
        self.record("before_run");
    }

    fn on_success(&self, _arg: &Payload, _result: &Payload) {
        self.record("success");
    }

    fn on_error(&self, _arg: &Payload, _err: &ClassifiedError) {
        self.record("error");
    }

    fn on_finished(&self, _arg: &Payload, _result: &ActionResult) {
        self.record("finished");
    }
}

/// Alert sink that remembers `(action, reason)` for every alert.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<(String, Reason)>>,
}

impl RecordingAlertSink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts received so far.
    #[must_use]
    pub fn alerts(&self) -> Vec<(String, Reason)> {
        self.alerts.lock().clone()
    }
}

impl AlertSink for RecordingAlertSink {
    fn alert(&self, action: &str, err: &ClassifiedError, _arg: &Payload) {
        self.alerts
            .lock()
            .push((action.to_string(), err.reason.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_failure() {
        let action = ScriptedAction::failing("Login", Reason::InvalidPassword, "wrong");
        let err = action.run(&mut ActionContext::new(), Payload::Empty).await.err();
        assert!(err.is_some_and(|e| e.has_reason(&Reason::InvalidPassword)));
        assert_eq!(action.calls(), 1);
        assert_eq!(action.hooks(), vec!["run"]);
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingAlertSink::new();
        sink.alert("A", &ClassifiedError::new(Reason::Internal, "x"), &Payload::Empty);
        assert_eq!(sink.alerts(), vec![("A".to_string(), Reason::Internal)]);
    }
}
