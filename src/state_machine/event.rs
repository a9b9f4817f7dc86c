//! Events that drive a dialogue turn

use crate::actions::ActionRequest;

/// Events that trigger phase transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// A new user query was accepted
    UserInput,

    /// The drafting call returned
    DraftReceived {
        text: String,
        requests: Vec<ActionRequest>,
    },

    /// The runtime has handed the draft over for scanning
    DetectionComplete,

    /// One action finished, successfully or not
    ActionCompleted { call_id: String, outcome: String },

    /// The finalizing call returned
    FinalReceived { text: String },

    /// Either model call failed
    ModelFailed { message: String },

    /// The response has been returned to the caller
    ResponseDelivered,
}
