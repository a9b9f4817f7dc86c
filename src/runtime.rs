//! Dialogue runtime
//!
//! Runs one chat turn end to end: feeds events to the pure state machine and
//! performs the effects it returns (model calls, action execution, history
//! writes). Each request runs its own machine; nothing here spawns tasks and
//! no lock is held across a model call or a store write.

#[cfg(test)]
pub mod testing;

use crate::actions::{narrate, ActionExecutor, ActionRegistry, ActionRequest};
use crate::auth::CallerIdentity;
use crate::conversation::{ConversationStore, HistoryKey, Turn};
use crate::llm::{LlmError, LlmMessage, LlmRequest, LlmService, SystemContent, ToolDefinition};
use crate::state_machine::{transition, DialoguePhase, Effect, Event, TransitionError};
use crate::store::ContractStore;
use crate::system_prompt::{build_system_prompt, finalizing_input, user_input};
use std::sync::Arc;

/// Sampling parameters sent with every model call
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// Per-turn data the effects need
struct TurnContext<'a> {
    caller: &'a CallerIdentity,
    key: HistoryKey,
    /// History as it stood when the turn started, excluding the turn itself
    history: Vec<Turn>,
    user_input: String,
}

pub struct DialogueRuntime {
    llm: Arc<dyn LlmService>,
    executor: ActionExecutor<Arc<dyn ContractStore>>,
    history: Arc<ConversationStore>,
    settings: GenerationSettings,
    system_prompt: String,
}

impl DialogueRuntime {
    pub fn new(
        llm: Arc<dyn LlmService>,
        store: Arc<dyn ContractStore>,
        history: Arc<ConversationStore>,
        settings: GenerationSettings,
    ) -> Self {
        let registry = Arc::new(ActionRegistry::standard());
        let system_prompt = build_system_prompt(&registry);
        Self {
            llm,
            executor: ActionExecutor::new(registry, store),
            history,
            settings,
            system_prompt,
        }
    }

    /// Run one turn for `caller` and return the assistant's reply.
    ///
    /// Model failures and action failures come back as reply text. An `Err`
    /// means the state machine was driven incorrectly.
    pub async fn respond(
        &self,
        caller: &CallerIdentity,
        query: &str,
    ) -> Result<String, TransitionError> {
        let key = self.history.key_for(caller);
        let turn = TurnContext {
            caller,
            history: self.history.snapshot(&key),
            user_input: user_input(query, caller),
            key,
        };

        let mut state = DialoguePhase::Collecting;
        let mut reply = None;
        let mut events_to_process = vec![Event::UserInput];

        while let Some(event) = events_to_process.pop() {
            let result = transition(&state, event)?;
            tracing::debug!(
                from = state.name(),
                to = result.new_state.name(),
                history_key = %turn.key,
                "Dialogue transition"
            );
            state = result.new_state;

            for effect in result.effects {
                if let Some(next) = self.execute_effect(effect, &turn, &mut reply).await {
                    events_to_process.push(next);
                }
            }
        }

        reply.ok_or_else(|| {
            TransitionError::InvalidTransition(format!(
                "turn ended in phase {} without a response",
                state.name()
            ))
        })
    }

    async fn execute_effect(
        &self,
        effect: Effect,
        turn: &TurnContext<'_>,
        reply: &mut Option<String>,
    ) -> Option<Event> {
        match effect {
            Effect::RequestDraft => {
                let request = self.build_request(
                    &turn.history,
                    turn.user_input.clone(),
                    self.executor.registry().definitions(),
                );
                Some(match self.llm.complete(&request).await {
                    Ok(response) => Event::DraftReceived {
                        text: response.text(),
                        requests: response
                            .tool_uses()
                            .into_iter()
                            .map(|(id, name, input)| ActionRequest::new(id, name, input.clone()))
                            .collect(),
                    },
                    Err(e) => model_failed(&e),
                })
            }

            Effect::Detect => Some(Event::DetectionComplete),

            Effect::ExecuteAction { request } => {
                let result = self.executor.execute(&request, turn.caller).await;
                Some(Event::ActionCompleted {
                    call_id: request.id,
                    outcome: narrate(&result),
                })
            }

            Effect::RequestFinal { tool_context } => {
                // No tools offered: the finalizing pass can only narrate
                let request = self.build_request(
                    &turn.history,
                    finalizing_input(&turn.user_input, &tool_context),
                    vec![],
                );
                Some(match self.llm.complete(&request).await {
                    Ok(response) => {
                        if !response.tool_uses().is_empty() {
                            tracing::warn!(
                                tool_uses = response.tool_uses().len(),
                                "Ignoring actions requested during finalizing pass"
                            );
                        }
                        Event::FinalReceived {
                            text: response.text(),
                        }
                    }
                    Err(e) => model_failed(&e),
                })
            }

            Effect::CommitTurn { response } => {
                self.history.commit(
                    &turn.key,
                    Turn::user(turn.user_input.clone()),
                    Turn::assistant(response),
                );
                None
            }

            Effect::Respond { response } => {
                *reply = Some(response);
                Some(Event::ResponseDelivered)
            }
        }
    }

    fn build_request(
        &self,
        history: &[Turn],
        input: String,
        tools: Vec<ToolDefinition>,
    ) -> LlmRequest {
        let mut messages: Vec<LlmMessage> = history.iter().map(Turn::to_llm_message).collect();
        messages.push(LlmMessage::user(input));

        LlmRequest {
            system: vec![SystemContent::new(self.system_prompt.clone())],
            messages,
            tools,
            max_tokens: Some(self.settings.max_tokens),
            temperature: Some(self.settings.temperature),
        }
    }
}

fn model_failed(error: &LlmError) -> Event {
    tracing::warn!(kind = ?error.kind, error = %error.message, "Model call failed");
    Event::ModelFailed {
        message: error.message.clone(),
    }
}
