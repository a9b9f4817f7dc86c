//! Dialogue state machine
//!
//! Pure transitions in the Elm style: `transition(state, event)` returns the
//! next state plus the effects the runtime must perform. All I/O (model calls,
//! action execution, history writes) lives in `runtime`.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::DialoguePhase;
pub use transition::{transition, TransitionError};
