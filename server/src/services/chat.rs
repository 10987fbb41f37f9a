//! Chat service: per-canvas message history.
//!
//! History is kept oldest first and is not bounded; reads return the newest
//! `limit` messages. Chat does not require the canvas to exist.

use tracing::info;
use uuid::Uuid;
use wire::{CanvasEvent, CanvasId, ChatMessage, Frame, now_ms};

use crate::services::room;
use crate::state::AppState;

/// Sender name used when a message arrives without one.
pub const DEFAULT_SENDER: &str = "User";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message text is empty")]
    EmptyText,
}

/// The newest `limit` messages of a canvas, oldest first.
pub async fn list_messages(state: &AppState, canvas_id: CanvasId, limit: usize) -> Vec<ChatMessage> {
    let chats = state.chats.read().await;
    let Some(history) = chats.get(&canvas_id) else {
        return Vec::new();
    };
    let start = history.len().saturating_sub(limit);
    history[start..].to_vec()
}

/// Append a message and broadcast `chat_message` to the room.
///
/// # Errors
///
/// Returns [`ChatError::EmptyText`] when `text` is blank.
pub async fn post_message(
    state: &AppState,
    canvas_id: CanvasId,
    text: &str,
    sender: Option<&str>,
) -> Result<ChatMessage, ChatError> {
    if text.trim().is_empty() {
        return Err(ChatError::EmptyText);
    }
    let sender = sender.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SENDER);

    let message = ChatMessage {
        id: Uuid::new_v4(),
        text: text.to_owned(),
        sender: sender.to_owned(),
        timestamp: now_ms(),
        canvas_id,
    };
    state
        .chats
        .write()
        .await
        .entry(canvas_id)
        .or_default()
        .push(message.clone());

    info!(%canvas_id, message_id = %message.id, "chat message posted");
    room::broadcast(state, &Frame::new(canvas_id, CanvasEvent::ChatMessage(message.clone())), None).await;
    Ok(message)
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
