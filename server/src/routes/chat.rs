//! Chat history routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use wire::{CanvasId, ChatMessage};

use super::{ApiError, api_error};
use crate::services::chat::{self as service, ChatError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct NewMessage {
    pub text: String,
    #[serde(default)]
    pub sender: Option<String>,
}

/// `GET /api/canvas/{id}/messages?limit=N`: newest N messages, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<CanvasId>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<ChatMessage>> {
    let limit = query.limit.unwrap_or(state.config.chat_history_limit);
    Json(service::list_messages(&state, id, limit).await)
}

/// `POST /api/canvas/{id}/messages`: body `{text, sender?}`.
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<CanvasId>,
    Json(body): Json<NewMessage>,
) -> Result<Json<ChatMessage>, ApiError> {
    service::post_message(&state, id, &body.text, body.sender.as_deref())
        .await
        .map(Json)
        .map_err(|e| api_error(chat_error_to_status(&e), e))
}

fn chat_error_to_status(err: &ChatError) -> StatusCode {
    match err {
        ChatError::EmptyText => StatusCode::BAD_REQUEST,
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
