//! HTTP request handlers

use super::types::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse};
use super::AppState;
use crate::auth::AuthError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chatbot", post(chatbot))
        .route("/health", get(health))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat
// ============================================================

async fn chatbot(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    // Authentication is checked before anything else touches the request
    let header = headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default());
    let caller = state.verifier.identify(header)?;

    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if request.query.trim().is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }

    tracing::info!(
        request_id = %uuid::Uuid::new_v4(),
        store_id = %caller.store_id,
        org_id = %caller.org_id,
        query_len = request.query.len(),
        "Chat turn started"
    );

    let response = state
        .runtime
        .respond(&caller, &request.query)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ChatResponse { response }))
}

// ============================================================
// Probes
// ============================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

async fn get_version() -> &'static str {
    concat!("contract-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Unauthorized(AuthError),
    BadRequest(String),
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Unauthorized(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(e) => {
                tracing::warn!(error = %e, "Rejected unauthenticated request");
                (StatusCode::UNAUTHORIZED, e.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Chat turn failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
