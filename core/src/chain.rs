//! Sequential composition of actions.
//!
//! A [`Chain`] runs its actions in order. Each action's output becomes the
//! next action's input unless it is empty, in which case the previous input
//! is forwarded unchanged. The first failure stops the chain.
//!
//! ```text
//! params ─▶ ValidateCaller ─▶ GetUser ─▶ RegisterAccount ─▶ session
//!              │ error           │ error      │ error
//!              └─────────────────┴────────────┴──▶ stop, return error
//! ```

use crate::action::{Action, ActionContext, AlertParams};
use crate::error::PipelineError;
use crate::payload::Payload;
use crate::result::{ActionResult, ClassifiedError};
use async_trait::async_trait;
use std::sync::Arc;

/// Ordered sequence of shared actions, itself an [`Action`].
#[derive(Clone)]
pub struct Chain {
    name: String,
    actions: Vec<Arc<dyn Action>>,
}

impl Chain {
    /// Chain named after its children, hyphen-joined.
    #[must_use]
    pub fn new(actions: Vec<Arc<dyn Action>>) -> Self {
        let name = actions
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>()
            .join("-");
        Self { name, actions }
    }

    /// Chain with an explicit name.
    #[must_use]
    pub fn named(name: impl Into<String>, actions: Vec<Arc<dyn Action>>) -> Self {
        Self {
            name: name.into(),
            actions,
        }
    }

    /// Append an action.
    #[must_use]
    pub fn then(mut self, action: Arc<dyn Action>) -> Self {
        if !self.name.is_empty() {
            self.name.push('-');
        }
        self.name.push_str(action.name());
        self.actions.push(action);
        self
    }

    /// The actions, in order.
    #[must_use]
    pub fn actions(&self) -> &[Arc<dyn Action>] {
        &self.actions
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// `true` if the chain has no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain").field("name", &self.name).finish()
    }
}

#[async_trait]
impl Action for Chain {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError> {
        let mut input = arg;
        let mut last = Payload::Empty;

        for action in &self.actions {
            action.on_before_run(&input);
            match action.run(ctx, input.clone()).await {
                Ok(output) => {
                    action.on_success(&input, &output);
                    action.on_finished(&input, &ActionResult::success(output.clone()));
                    if !output.is_empty() {
                        input = output.clone();
                    }
                    last = output;
                }
                Err(err) => {
                    let classified = ClassifiedError::describe(&err);
                    action.on_error(&input, &classified);
                    action.on_finished(&input, &ActionResult::failure(classified));
                    ctx.record_failure(Arc::clone(action));
                    return Err(err);
                }
            }
        }

        Ok(last)
    }

    fn prepare_error_alert(
        &self,
        ctx: &ActionContext,
        alert: &mut AlertParams,
        err: &ClassifiedError,
        arg: &Payload,
    ) {
        if let Some(failed) = ctx.failed_action() {
            failed.prepare_error_alert(ctx, alert, err, arg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reason;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Step {
        name: &'static str,
        output: Result<Payload, Reason>,
        calls: AtomicUsize,
        seen: parking_lot::Mutex<Vec<Payload>>,
    }

    impl Step {
        fn ok(name: &'static str, output: Payload) -> Arc<Self> {
            Arc::new(Self {
                name,
                output: Ok(output),
                calls: AtomicUsize::new(0),
                seen: parking_lot::Mutex::new(Vec::new()),
            })
        }

        fn fail(name: &'static str, reason: Reason) -> Arc<Self> {
            Arc::new(Self {
                name,
                output: Err(reason),
                calls: AtomicUsize::new(0),
                seen: parking_lot::Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Action for Step {
        fn name(&self) -> &str {
            self.name
        }

        async fn run(&self, _ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().push(arg);
            match &self.output {
                Ok(p) => Ok(p.clone()),
                Err(reason) => Err(PipelineError::with_reason("step failed", reason.clone())),
            }
        }
    }

    fn dyn_action(step: &Arc<Step>) -> Arc<dyn Action> {
        Arc::clone(step) as Arc<dyn Action>
    }

    #[test]
    fn test_name_is_hyphen_joined() {
        let chain = Chain::new(vec![
            dyn_action(&Step::ok("A", Payload::Empty)),
            dyn_action(&Step::ok("B", Payload::Empty)),
        ])
        .then(dyn_action(&Step::ok("C", Payload::Empty)));
        assert_eq!(chain.name(), "A-B-C");
        assert_eq!(chain.len(), 3);
    }

    #[tokio::test]
    async fn test_output_feeds_next_input() {
        let a = Step::ok("A", Payload::Json(json!(1)));
        let b = Step::ok("B", Payload::Json(json!(2)));
        let chain = Chain::new(vec![dyn_action(&a), dyn_action(&b)]);

        let out = chain.run(&mut ActionContext::new(), Payload::Json(json!(0))).await;

        assert_eq!(out.ok(), Some(Payload::Json(json!(2))));
        assert_eq!(b.seen.lock().as_slice(), &[Payload::Json(json!(1))]);
    }

    #[tokio::test]
    async fn test_empty_output_forwards_previous_input() {
        let a = Step::ok("A", Payload::Empty);
        let b = Step::ok("B", Payload::Json(json!([])));
        let c = Step::ok("C", Payload::Json(json!("done")));
        let chain = Chain::new(vec![dyn_action(&a), dyn_action(&b), dyn_action(&c)]);

        let _ = chain.run(&mut ActionContext::new(), Payload::Json(json!("in"))).await;

        assert_eq!(b.seen.lock().as_slice(), &[Payload::Json(json!("in"))]);
        // An empty list is a real value and is forwarded as-is.
        assert_eq!(c.seen.lock().as_slice(), &[Payload::Json(json!([]))]);
    }

    #[tokio::test]
    async fn test_failure_stops_chain() {
        let a = Step::ok("A", Payload::Empty);
        let b = Step::fail("B", Reason::AccessDenied);
        let c = Step::ok("C", Payload::Empty);
        let chain = Chain::new(vec![dyn_action(&a), dyn_action(&b), dyn_action(&c)]);
        let mut ctx = ActionContext::new();

        let err = chain.run(&mut ctx, Payload::Empty).await.err();

        assert!(err.is_some_and(|e| e.has_reason(&Reason::AccessDenied)));
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.failed_action().map(|f| f.name()), Some("B"));
    }

    #[tokio::test]
    async fn test_nested_chain_records_innermost_failure() {
        let inner = Chain::new(vec![dyn_action(&Step::fail("Leaf", Reason::InactiveUser))]);
        let outer = Chain::new(vec![
            dyn_action(&Step::ok("A", Payload::Empty)),
            Arc::new(inner) as Arc<dyn Action>,
        ]);
        let mut ctx = ActionContext::new();

        let _ = outer.run(&mut ctx, Payload::Empty).await;

        assert_eq!(ctx.failed_action().map(|f| f.name()), Some("Leaf"));
    }

    #[tokio::test]
    async fn test_empty_chain_returns_empty() {
        let out = Chain::new(Vec::new())
            .run(&mut ActionContext::new(), Payload::Json(json!(1)))
            .await;
        assert_eq!(out.ok(), Some(Payload::Empty));
    }
}
