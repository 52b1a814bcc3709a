//! Property tests for chain short-circuiting and input forwarding.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pipeline_core::{Action, ActionContext, Chain, Payload, Reason};
use pipeline_testing::ScriptedAction;
use pipeline_testing::properties::known_reason;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn run_chain(chain: &Chain, input: Payload) -> (Result<Payload, pipeline_core::PipelineError>, ActionContext) {
    let mut ctx = ActionContext::new();
    let out = tokio_test::block_on(chain.run(&mut ctx, input));
    (out, ctx)
}

proptest! {
    #[test]
    fn prop_actions_after_failure_never_run(
        len in 1usize..8,
        fail_seed in any::<usize>(),
        reason in known_reason(),
    ) {
        let fail_at = fail_seed % len;
        let actions: Vec<Arc<ScriptedAction>> = (0..len)
            .map(|i| {
                let name = format!("A{i}");
                if i == fail_at {
                    Arc::new(ScriptedAction::failing(name, reason.clone(), "failed"))
                } else {
                    Arc::new(ScriptedAction::echo(name))
                }
            })
            .collect();
        let chain = Chain::new(
            actions.iter().map(|a| Arc::clone(a) as Arc<dyn Action>).collect(),
        );

        let (out, ctx) = run_chain(&chain, Payload::Empty);

        let err = out.err();
        prop_assert!(err.is_some_and(|e| e.has_reason(&reason)));
        for (i, action) in actions.iter().enumerate() {
            prop_assert_eq!(action.calls(), usize::from(i <= fail_at));
        }
        let expected_failed = format!("A{fail_at}");
        prop_assert_eq!(ctx.failed_action().map(|a| a.name().to_string()), Some(expected_failed));
    }

    #[test]
    fn prop_empty_outputs_keep_forwarding_input(len in 1usize..6, seed in any::<i64>()) {
        let actions: Vec<Arc<ScriptedAction>> = (0..len)
            .map(|i| Arc::new(ScriptedAction::returning(format!("A{i}"), Payload::Empty)))
            .collect();
        let chain = Chain::new(
            actions.iter().map(|a| Arc::clone(a) as Arc<dyn Action>).collect(),
        );

        let input = Payload::Json(json!(seed));
        let (out, _) = run_chain(&chain, input.clone());

        prop_assert_eq!(out.ok(), Some(Payload::Empty));
        for action in &actions {
            prop_assert_eq!(action.inputs(), vec![input.clone()]);
        }
    }
}

#[test]
fn test_failure_reason_survives_nesting() {
    let inner = Chain::named(
        "Inner",
        vec![Arc::new(ScriptedAction::failing("Leaf", Reason::InactiveUser, "inactive")) as Arc<dyn Action>],
    );
    let outer = Chain::new(vec![
        Arc::new(ScriptedAction::echo("First")) as Arc<dyn Action>,
        Arc::new(inner),
    ]);

    let (out, ctx) = run_chain(&outer, Payload::Empty);

    assert!(out.err().is_some_and(|e| e.has_reason(&Reason::InactiveUser)));
    assert_eq!(ctx.failed_action().map(|a| a.name().to_string()), Some("Leaf".to_string()));
    assert_eq!(outer.name(), "First-Inner");
}
