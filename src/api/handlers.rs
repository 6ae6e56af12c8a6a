//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ChatRequest, ChatResponse, ConversationListResponse, ConversationResponse, ErrorResponse,
    SuccessResponse,
};
use super::AppState;
use crate::runtime::RuntimeError;
use crate::state_machine::TransitionError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Active conversation
        .route("/api/conversation", get(get_conversation))
        .route("/api/conversation/stream", get(stream_conversation))
        .route("/api/conversation/messages", post(send_message))
        .route("/api/conversation/reset", post(reset_conversation))
        // Sidebar titles
        .route("/api/conversations", get(list_conversations))
        .route("/api/conversations/new", post(new_conversation))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Conversation Retrieval
// ============================================================

async fn get_conversation(State(state): State<AppState>) -> Json<ConversationResponse> {
    let snapshot = state.chat.snapshot();
    Json(ConversationResponse {
        conversation_id: snapshot.conversation_id,
        messages: snapshot.messages,
        state: snapshot.state,
        busy: snapshot.busy,
    })
}

async fn list_conversations(State(state): State<AppState>) -> Json<ConversationListResponse> {
    Json(ConversationListResponse {
        conversations: state.chat.snapshot().titles,
    })
}

async fn stream_conversation(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before snapshotting so no event falls between the two
    let broadcast_rx = state.chat.subscribe();
    let init = state.chat.snapshot();
    sse_stream(init, broadcast_rx)
}

// ============================================================
// User Actions
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    // Resolves after the runtime has applied the turn
    match state.chat.submit_user_message(req.text).await {
        Ok(message_id) => Ok(Json(ChatResponse {
            queued: true,
            message_id: Some(message_id),
        })),
        Err(RuntimeError::Rejected(TransitionError::EmptyInput)) => Ok(Json(ChatResponse {
            queued: false,
            message_id: None,
        })),
        Err(e) => Err(e.into()),
    }
}

async fn reset_conversation(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.chat.reset_conversation().await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn new_conversation(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.chat.start_new_conversation().await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn get_version() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Conflict(String),
    Unavailable(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::Stopped => AppError::Unavailable(e.to_string()),
            RuntimeError::Rejected(TransitionError::Busy) => AppError::Conflict(e.to_string()),
            RuntimeError::Rejected(_) => AppError::BadRequest(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
