//! WebSocket handler: per-canvas frame relay.
//!
//! DESIGN
//! ======
//! The server does not interpret realtime traffic. Every inbound text frame
//! is decoded once with `wire::decode_frame`, checked against the canvas the
//! socket is attached to, and re-broadcast to the other clients in the room.
//! Invalid frames are logged and dropped; the socket stays open.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → join the room → send `canvas_state` if the canvas exists
//! 2. Broadcast `user_joined` to peers
//! 3. Relay inbound frames to peers; forward room broadcasts to this client
//! 4. Close → part the room → broadcast `user_left`

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wire::{CanvasEvent, CanvasId, CodecError, Frame, Notice};

use crate::services::{canvas, room};
use crate::state::AppState;

/// Outgoing frames buffered per client before broadcasts start dropping.
const CLIENT_QUEUE: usize = 256;

const JOINED_MESSAGE: &str = "A user joined the canvas";
const LEFT_MESSAGE: &str = "A user left the canvas";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("frame for canvas {got} sent on socket for canvas {expected}")]
    WrongCanvas { expected: CanvasId, got: CanvasId },
}

// =============================================================================
// UPGRADE
// =============================================================================

/// `GET /ws/{canvas_id}`.
pub async fn handle_ws(
    State(state): State<AppState>,
    Path(canvas_id): Path<CanvasId>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state, canvas_id))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, canvas_id: CanvasId) {
    let client_id = Uuid::new_v4();
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(CLIENT_QUEUE);

    // Join before reading the snapshot so no broadcast falls in between.
    let clients = room::join(&state, canvas_id, client_id, client_tx).await;

    if let Ok(snapshot) = canvas::get_canvas(&state, canvas_id).await {
        let welcome = Frame::new(canvas_id, CanvasEvent::CanvasState(snapshot));
        if send_frame(&mut socket, &welcome).await.is_err() {
            room::part(&state, canvas_id, client_id).await;
            return;
        }
    }

    let joined = Frame::new(canvas_id, CanvasEvent::UserJoined(Notice { message: JOINED_MESSAGE.into() }));
    room::broadcast(&state, &joined, Some(client_id)).await;
    info!(%canvas_id, %client_id, clients, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        if let Err(e) = process_inbound_text(&state, canvas_id, client_id, &text).await {
                            warn!(%canvas_id, %client_id, error = %e, "ws: dropped inbound frame");
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    room::part(&state, canvas_id, client_id).await;
    let left = Frame::new(canvas_id, CanvasEvent::UserLeft(Notice { message: LEFT_MESSAGE.into() }));
    room::broadcast(&state, &left, None).await;
    info!(%canvas_id, %client_id, "ws: client disconnected");
}

// =============================================================================
// RELAY
// =============================================================================

/// Decode one inbound text frame and relay it to the sender's peers.
/// Returns the number of peers that accepted it.
///
/// Transport-free so tests can drive the relay with `mpsc` peers.
async fn process_inbound_text(
    state: &AppState,
    canvas_id: CanvasId,
    client_id: Uuid,
    text: &str,
) -> Result<usize, RelayError> {
    let frame = wire::decode_frame(text)?;
    if frame.canvas_id != canvas_id {
        return Err(RelayError::WrongCanvas { expected: canvas_id, got: frame.canvas_id });
    }
    let delivered = room::broadcast(state, &frame, Some(client_id)).await;
    debug!(%canvas_id, %client_id, kind = frame.kind(), delivered, "ws: relayed frame");
    Ok(delivered)
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match wire::encode_frame(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(kind = frame.kind(), error = %e, "ws: failed to encode frame");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|e| {
        debug!(kind = frame.kind(), error = %e, "ws: send failed");
    })
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
