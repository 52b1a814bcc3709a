//! The action runner.
//!
//! [`ActionRunner::run`] drives one request through an action:
//!
//! 1. obtain the input from the args provider (transport parsing happens
//!    here and may fail, in which case `run` is skipped);
//! 2. call the lifecycle hooks around [`Action::run`];
//! 3. classify any failure, call `on_error` and route it to the alert sink
//!    unless the action mutes it;
//! 4. call `on_finished` with the final [`ActionResult`], then emit one
//!    structured log record.
//!
//! Every failure ends up in `ActionResult::error`; nothing escapes.

use crate::alert::{AlertSink, TracingAlertSink};
use crate::metrics::RunnerMetrics;
use pipeline_core::{
    Action, ActionContext, ActionResult, AlertParams, DefaultErrorClassifier, ErrorClassifier,
    Payload, PipelineError,
};
use std::sync::Arc;
use std::time::Instant;

/// Runs actions and turns their outcome into an [`ActionResult`].
#[derive(Clone)]
pub struct ActionRunner {
    classifier: Arc<dyn ErrorClassifier>,
    alerts: Arc<dyn AlertSink>,
}

impl ActionRunner {
    /// Runner with an explicit classifier and alert sink.
    #[must_use]
    pub fn new(classifier: Arc<dyn ErrorClassifier>, alerts: Arc<dyn AlertSink>) -> Self {
        Self { classifier, alerts }
    }

    /// Runner using [`DefaultErrorClassifier`] for the given profile and
    /// alerting through tracing.
    #[must_use]
    pub fn for_profile(production: bool) -> Self {
        Self::new(
            Arc::new(DefaultErrorClassifier::new(production)),
            Arc::new(TracingAlertSink),
        )
    }

    /// Run `action` on the input produced by `args`.
    pub async fn run<F>(&self, action: &dyn Action, args: F) -> ActionResult
    where
        F: FnOnce() -> Result<Payload, PipelineError>,
    {
        self.run_with(action, args, None).await
    }

    /// Like [`run`](Self::run), classifying failures with `classifier`
    /// instead of the runner's own when given.
    pub async fn run_with<F>(
        &self,
        action: &dyn Action,
        args: F,
        classifier: Option<&dyn ErrorClassifier>,
    ) -> ActionResult
    where
        F: FnOnce() -> Result<Payload, PipelineError>,
    {
        let start = Instant::now();
        let mut ctx = ActionContext::new();

        let (arg, outcome) = match args() {
            Ok(arg) => {
                action.on_before_run(&arg);
                let outcome = action.run(&mut ctx, arg.clone()).await;
                (arg, outcome)
            }
            Err(err) => (Payload::Empty, Err(err)),
        };

        let mut result = match outcome {
            Ok(value) => {
                action.on_success(&arg, &value);
                ActionResult::success(value)
            }
            Err(err) => {
                let classified = classifier
                    .unwrap_or(self.classifier.as_ref())
                    .classify(err);
                action.on_error(&arg, &classified);

                let mut alert = AlertParams::default();
                action.prepare_error_alert(&ctx, &mut alert, &classified, &arg);
                if alert.send {
                    self.alerts.alert(action.name(), &classified, &arg);
                }
                RunnerMetrics::record_error(&classified.reason);
                ActionResult::failure(classified)
            }
        };

        let elapsed = start.elapsed();
        result.execution_time_ms = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
        action.on_finished(&arg, &result);
        RunnerMetrics::record_run(elapsed);

        log_run(action, &arg, &ctx, &result);
        result
    }
}

impl std::fmt::Debug for ActionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRunner").finish_non_exhaustive()
    }
}

fn log_run(action: &dyn Action, arg: &Payload, ctx: &ActionContext, result: &ActionResult) {
    let args = action.args_for_log(arg).to_string();
    let log = (!ctx.log_is_empty()).then(|| ctx.log_text());
    let value = serde_json::to_string(&result.value).unwrap_or_default();

    match &result.error {
        None => tracing::info!(
            target: "pipeline::action",
            action = %action.name(),
            args = %args,
            log = log.as_deref(),
            result = %value,
            execution_time_ms = result.execution_time_ms,
            "Action succeeded"
        ),
        Some(err) => tracing::warn!(
            target: "pipeline::action",
            action = %action.name(),
            args = %args,
            log = log.as_deref(),
            error_reason = %err.reason,
            error = %err.message,
            execution_time_ms = result.execution_time_ms,
            "Action failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::NoopAlertSink;
    use pipeline_core::NopAction;

    #[tokio::test]
    async fn test_nop_round_trip() {
        let runner = ActionRunner::new(
            Arc::new(DefaultErrorClassifier::default()),
            Arc::new(NoopAlertSink),
        );
        let result = runner
            .run(&NopAction, || Ok(Payload::Json(serde_json::json!("x"))))
            .await;
        assert!(result.is_success());
        assert_eq!(result.value, Payload::Json(serde_json::json!("x")));
    }
}
