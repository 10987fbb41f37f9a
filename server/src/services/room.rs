//! Room service: join, part and broadcast for WebSocket clients.
//!
//! A room is created by the first join and evicted when its last client
//! parts. Broadcast is best-effort: a client whose channel is full or closed
//! misses the frame; the socket task notices a closed channel on its own.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wire::{CanvasId, Frame};

use crate::state::AppState;

/// Add a client to the canvas room. Returns the number of clients after joining.
pub async fn join(state: &AppState, canvas_id: CanvasId, client_id: Uuid, tx: mpsc::Sender<Frame>) -> usize {
    let mut rooms = state.rooms.write().await;
    let room = rooms.entry(canvas_id).or_default();
    room.clients.insert(client_id, tx);
    info!(%canvas_id, %client_id, clients = room.clients.len(), "client joined room");
    room.clients.len()
}

/// Remove a client from the canvas room, evicting the room when it empties.
/// Returns the number of clients left.
pub async fn part(state: &AppState, canvas_id: CanvasId, client_id: Uuid) -> usize {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(&canvas_id) else {
        return 0;
    };
    room.clients.remove(&client_id);
    let remaining = room.clients.len();
    info!(%canvas_id, %client_id, remaining, "client left room");
    if remaining == 0 {
        rooms.remove(&canvas_id);
        debug!(%canvas_id, "evicted empty room");
    }
    remaining
}

/// Send a frame to every client in the room except `exclude`.
/// Returns how many clients accepted it.
pub async fn broadcast(state: &AppState, frame: &Frame, exclude: Option<Uuid>) -> usize {
    let canvas_id = frame.canvas_id;
    let rooms = state.rooms.read().await;
    let Some(room) = rooms.get(&canvas_id) else {
        return 0;
    };

    let mut delivered = 0;
    for (client_id, tx) in &room.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        match tx.try_send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => warn!(%canvas_id, %client_id, kind = frame.kind(), error = %e, "dropped broadcast frame"),
        }
    }
    delivered
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
