//! API request and response types

use serde::{Deserialize, Serialize};

/// One chat turn from the user
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

/// The assistant's reply for one turn
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
