//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Everything lives in memory: canvas documents, chat history and the
//! rooms of connected WebSocket clients. Nothing survives a restart.
//!
//! Rooms are keyed by canvas id but exist independently of the canvas
//! map, so a client can connect to a canvas id before it is created.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;
use wire::{CanvasId, CanvasState, ChatMessage, Frame};

use crate::config::Config;

// =============================================================================
// ROOM
// =============================================================================

/// Connected clients of one canvas.
#[derive(Default)]
pub struct Room {
    /// `client_id` -> sender for outgoing frames.
    pub clients: HashMap<Uuid, mpsc::Sender<Frame>>,
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is cheap: every field is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub canvases: Arc<RwLock<HashMap<CanvasId, CanvasState>>>,
    /// Chat history per canvas, oldest first.
    pub chats: Arc<RwLock<HashMap<CanvasId, Vec<ChatMessage>>>>,
    pub rooms: Arc<RwLock<HashMap<CanvasId, Room>>>,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            canvases: Arc::new(RwLock::new(HashMap::new())),
            chats: Arc::new(RwLock::new(HashMap::new())),
            rooms: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
