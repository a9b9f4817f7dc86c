//! Effects produced by phase transitions

use crate::actions::ActionRequest;

/// Work the runtime must perform after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the model for a draft, offering the registered actions
    RequestDraft,

    /// Feed the draft back through detection
    Detect,

    /// Run one action
    ExecuteAction { request: ActionRequest },

    /// Ask the model to narrate action outcomes, offering no actions
    RequestFinal { tool_context: String },

    /// Append the user turn and this assistant turn to history
    CommitTurn { response: String },

    /// Return the response to the caller
    Respond { response: String },
}
