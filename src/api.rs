//! HTTP API
//!
//! `POST /chatbot` runs one dialogue turn for the authenticated caller;
//! `GET /health` and `GET /version` are liveness probes.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::auth::TokenVerifier;
use crate::runtime::DialogueRuntime;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<DialogueRuntime>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(runtime: DialogueRuntime, verifier: TokenVerifier) -> Self {
        Self {
            runtime: Arc::new(runtime),
            verifier: Arc::new(verifier),
        }
    }
}
