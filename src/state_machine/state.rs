//! Dialogue phases

use crate::actions::ActionRequest;

/// Where one chat turn is in its lifecycle
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DialoguePhase {
    /// Awaiting user input
    #[default]
    Collecting,

    /// First model call in flight
    Drafting,

    /// Draft received, scanning it for action requests
    Detecting {
        draft_text: String,
        requests: Vec<ActionRequest>,
    },

    /// Executing requested actions one at a time, in the order requested
    Acting {
        current: ActionRequest,
        remaining: Vec<ActionRequest>,
        /// Narrated outcomes of the actions already run
        outcomes: Vec<String>,
    },

    /// Second model call in flight, narrating the outcomes. No actions allowed.
    Finalizing { outcomes: Vec<String> },

    /// Response ready
    Complete { response: String },
}

impl DialoguePhase {
    pub fn name(&self) -> &'static str {
        match self {
            DialoguePhase::Collecting => "collecting",
            DialoguePhase::Drafting => "drafting",
            DialoguePhase::Detecting { .. } => "detecting",
            DialoguePhase::Acting { .. } => "acting",
            DialoguePhase::Finalizing { .. } => "finalizing",
            DialoguePhase::Complete { .. } => "complete",
        }
    }
}
