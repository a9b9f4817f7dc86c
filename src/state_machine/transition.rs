//! Pure state transition function

use super::{DialoguePhase, Effect, Event};
use crate::actions::ActionRequest;
use thiserror::Error;

/// Prefix of the context handed to the finalizing pass
pub const TOOL_RESULTS_PREFIX: &str = "Tool results: ";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: DialoguePhase,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: DialoguePhase) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("A turn is already in progress")]
    TurnInProgress,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Failure reason when a draft carries neither text nor an action
pub const EMPTY_DRAFT_REASON: &str = "the model returned an empty reply";

/// Text returned when a model call fails
pub fn model_failure_response(message: &str) -> String {
    format!("I'm having trouble reaching the assistant right now: {message}")
}

/// Context for the finalizing pass, one clause per outcome in execution order
pub fn tool_context(outcomes: &[String]) -> String {
    format!("{TOOL_RESULTS_PREFIX}{}", outcomes.join("; "))
}

/// A request is well-formed when it names an action
fn is_well_formed(request: &ActionRequest) -> bool {
    !request.name.trim().is_empty()
}

fn complete(response: String, commit: bool) -> TransitionResult {
    let mut result = TransitionResult::new(DialoguePhase::Complete {
        response: response.clone(),
    });
    if commit {
        result = result.with_effect(Effect::CommitTurn {
            response: response.clone(),
        });
    }
    result.with_effect(Effect::Respond { response })
}

/// Pure transition function: same inputs, same outputs, no I/O
pub fn transition(
    state: &DialoguePhase,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        (DialoguePhase::Collecting, Event::UserInput) => {
            Ok(TransitionResult::new(DialoguePhase::Drafting).with_effect(Effect::RequestDraft))
        }

        (_, Event::UserInput) => Err(TransitionError::TurnInProgress),

        (DialoguePhase::Drafting, Event::DraftReceived { text, requests }) => Ok(
            TransitionResult::new(DialoguePhase::Detecting {
                draft_text: text,
                requests,
            })
            .with_effect(Effect::Detect),
        ),

        (
            DialoguePhase::Detecting {
                draft_text,
                requests,
            },
            Event::DetectionComplete,
        ) => {
            let mut requests = requests.iter().filter(|r| is_well_formed(r)).cloned();
            match requests.next() {
                // A blank draft is never an answer and never enters history
                None if draft_text.trim().is_empty() => {
                    Ok(complete(model_failure_response(EMPTY_DRAFT_REASON), false))
                }
                // No action requested: the draft is the answer, verbatim
                None => Ok(complete(draft_text.clone(), true)),
                Some(first) => Ok(TransitionResult::new(DialoguePhase::Acting {
                    current: first.clone(),
                    remaining: requests.collect(),
                    outcomes: vec![],
                })
                .with_effect(Effect::ExecuteAction { request: first })),
            }
        }

        (
            DialoguePhase::Acting {
                current,
                remaining,
                outcomes,
            },
            Event::ActionCompleted { call_id, outcome },
        ) => {
            if call_id != current.id {
                return Err(TransitionError::InvalidTransition(format!(
                    "outcome for {call_id} while executing {}",
                    current.id
                )));
            }

            let mut outcomes = outcomes.clone();
            outcomes.push(outcome);

            match remaining.split_first() {
                Some((next, rest)) => Ok(TransitionResult::new(DialoguePhase::Acting {
                    current: next.clone(),
                    remaining: rest.to_vec(),
                    outcomes,
                })
                .with_effect(Effect::ExecuteAction {
                    request: next.clone(),
                })),
                None => {
                    let tool_context = tool_context(&outcomes);
                    Ok(TransitionResult::new(DialoguePhase::Finalizing { outcomes })
                        .with_effect(Effect::RequestFinal { tool_context }))
                }
            }
        }

        (DialoguePhase::Finalizing { outcomes }, Event::FinalReceived { text }) => {
            // An empty narration still has to tell the user what happened
            let response = if text.trim().is_empty() {
                outcomes.join(" ")
            } else {
                text
            };
            Ok(complete(response, true))
        }

        (
            DialoguePhase::Drafting | DialoguePhase::Finalizing { .. },
            Event::ModelFailed { message },
        ) => Ok(complete(model_failure_response(&message), false)),

        (DialoguePhase::Complete { .. }, Event::ResponseDelivered) => {
            Ok(TransitionResult::new(DialoguePhase::Collecting))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in phase {}",
            state.name()
        ))),
    }
}
