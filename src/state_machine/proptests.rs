//! Property-based tests for the dialogue state machine

use super::transition::{
    model_failure_response, tool_context, TransitionResult, EMPTY_DRAFT_REASON,
};
use super::*;
use crate::actions::ActionRequest;
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Generators
// ============================================================================

fn arb_request() -> impl Strategy<Value = ActionRequest> {
    ("call_[0-9]{1,3}", prop_oneof!["[a-z_]{1,12}", Just(String::new())])
        .prop_map(|(id, name)| ActionRequest::new(id, name, json!({})))
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::UserInput),
        ("[a-zA-Z ]{0,20}", proptest::collection::vec(arb_request(), 0..3))
            .prop_map(|(text, requests)| Event::DraftReceived { text, requests }),
        Just(Event::DetectionComplete),
        ("call_[0-9]{1,3}", "[a-zA-Z ]{1,20}")
            .prop_map(|(call_id, outcome)| Event::ActionCompleted { call_id, outcome }),
        "[a-zA-Z ]{0,20}".prop_map(|text| Event::FinalReceived { text }),
        "[a-z ]{1,20}".prop_map(|message| Event::ModelFailed { message }),
        Just(Event::ResponseDelivered),
    ]
}

/// How the model and actions behave for one simulated turn
#[derive(Debug, Clone)]
struct Script {
    draft_text: String,
    requests: Vec<ActionRequest>,
    draft_fails: bool,
    final_text: String,
    final_fails: bool,
}

fn arb_script() -> impl Strategy<Value = Script> {
    (
        "[a-zA-Z ]{0,20}",
        proptest::collection::vec(arb_request(), 0..4),
        any::<bool>(),
        "[a-zA-Z ]{1,20}",
        any::<bool>(),
    )
        .prop_map(
            |(draft_text, requests, draft_fails, final_text, final_fails)| Script {
                draft_text,
                requests,
                draft_fails,
                final_text,
                final_fails,
            },
        )
}

/// Drive one turn to completion, answering each effect from the script
fn run_turn(script: &Script) -> (DialoguePhase, Vec<Effect>) {
    let mut state = DialoguePhase::Collecting;
    let mut log = Vec::new();
    let mut pending = vec![Event::UserInput];

    while let Some(event) = pending.pop() {
        let TransitionResult { new_state, effects } =
            transition(&state, event).expect("scripted turn follows valid transitions");
        state = new_state;

        for effect in &effects {
            let next = match effect {
                Effect::RequestDraft if script.draft_fails => Event::ModelFailed {
                    message: "offline".to_string(),
                },
                Effect::RequestDraft => Event::DraftReceived {
                    text: script.draft_text.clone(),
                    requests: script.requests.clone(),
                },
                Effect::Detect => Event::DetectionComplete,
                Effect::ExecuteAction { request } => Event::ActionCompleted {
                    call_id: request.id.clone(),
                    outcome: format!("ran {}", request.name),
                },
                Effect::RequestFinal { .. } if script.final_fails => Event::ModelFailed {
                    message: "offline".to_string(),
                },
                Effect::RequestFinal { .. } => Event::FinalReceived {
                    text: script.final_text.clone(),
                },
                Effect::CommitTurn { .. } => continue,
                Effect::Respond { .. } => Event::ResponseDelivered,
            };
            pending.push(next);
        }
        log.extend(effects);
    }

    (state, log)
}

fn well_formed(requests: &[ActionRequest]) -> Vec<ActionRequest> {
    requests
        .iter()
        .filter(|r| !r.name.trim().is_empty())
        .cloned()
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Arbitrary event sequences never panic and never leave a half-built phase
    #[test]
    fn prop_arbitrary_events_never_panic(events in proptest::collection::vec(arb_event(), 0..24)) {
        let mut state = DialoguePhase::Collecting;
        for event in events {
            if let Ok(result) = transition(&state, event) {
                if let DialoguePhase::Complete { response } = &result.new_state {
                    let responded = result
                        .effects
                        .iter()
                        .any(|e| matches!(e, Effect::Respond { response: r } if r == response));
                    prop_assert!(responded, "entered complete without responding");
                }
                state = result.new_state;
            }
        }
    }

    // Every turn ends back in collecting with exactly one response
    #[test]
    fn prop_turn_always_responds_once(script in arb_script()) {
        let (state, effects) = run_turn(&script);

        prop_assert_eq!(state, DialoguePhase::Collecting);
        let responses = effects.iter().filter(|e| matches!(e, Effect::Respond { .. })).count();
        prop_assert_eq!(responses, 1);
    }

    // Actions execute once each, in request order, and never after finalizing starts
    #[test]
    fn prop_actions_execute_in_order(script in arb_script()) {
        prop_assume!(!script.draft_fails);
        let (_, effects) = run_turn(&script);

        let executed: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::ExecuteAction { request } => Some(request.clone()),
                _ => None,
            })
            .collect();
        prop_assert_eq!(executed, well_formed(&script.requests));

        if let Some(pos) = effects.iter().position(|e| matches!(e, Effect::RequestFinal { .. })) {
            let late = effects[pos..]
                .iter()
                .any(|e| matches!(e, Effect::ExecuteAction { .. }));
            prop_assert!(!late);
        }
    }

    // Without actions the draft is the reply; with actions a finalizing pass happens once
    #[test]
    fn prop_finalizing_iff_actions(script in arb_script()) {
        prop_assume!(!script.draft_fails);
        let (_, effects) = run_turn(&script);
        let requested = well_formed(&script.requests);

        let finals: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::RequestFinal { tool_context } => Some(tool_context.clone()),
                _ => None,
            })
            .collect();

        if requested.is_empty() {
            prop_assert!(finals.is_empty());
            let expected = if script.draft_text.trim().is_empty() {
                model_failure_response(EMPTY_DRAFT_REASON)
            } else {
                script.draft_text.clone()
            };
            let respond = Effect::Respond { response: expected };
            prop_assert!(effects.contains(&respond));
        } else {
            let outcomes: Vec<String> = requested.iter().map(|r| format!("ran {}", r.name)).collect();
            prop_assert_eq!(finals, vec![tool_context(&outcomes)]);
        }
    }

    // History is written only when a model reply was obtained
    #[test]
    fn prop_commit_only_on_success(script in arb_script()) {
        let (_, effects) = run_turn(&script);
        let commits: Vec<_> = effects
            .iter()
            .filter(|e| matches!(e, Effect::CommitTurn { .. }))
            .collect();

        let has_actions = !well_formed(&script.requests).is_empty();
        let model_failed = script.draft_fails || (has_actions && script.final_fails);
        let blank_draft = !script.draft_fails && !has_actions && script.draft_text.trim().is_empty();
        if model_failed {
            prop_assert!(commits.is_empty());
            let respond = Effect::Respond {
                response: model_failure_response("offline"),
            };
            prop_assert!(effects.contains(&respond));
        } else if blank_draft {
            prop_assert!(commits.is_empty());
        } else {
            prop_assert_eq!(commits.len(), 1);
        }
    }
}
