//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the REST API, the per-canvas WebSocket endpoint and the health
//! check under one Axum router. CORS is limited to the configured origins;
//! every request is traced through `tower-http`.

pub mod canvas;
pub mod chat;
pub mod upload;
pub mod ws;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use wire::Health;

use crate::services;
use crate::state::AppState;

/// Multipart framing on top of the file bytes.
const UPLOAD_FORM_OVERHEAD: usize = 64 * 1024;

/// JSON error body: `{"detail": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, detail: impl ToString) -> ApiError {
    (status, Json(ErrorBody { detail: detail.to_string() }))
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes + UPLOAD_FORM_OVERHEAD);

    Router::new()
        .route("/api/canvas", post(canvas::create_canvas))
        .route("/api/canvas/{id}", get(canvas::get_canvas).put(canvas::update_canvas))
        .route("/api/canvas/{id}/images", post(canvas::add_image))
        .route("/api/canvas/{id}/images/{image_id}", delete(canvas::delete_image))
        .route("/api/canvas/{id}/groups", post(canvas::create_group))
        .route("/api/canvas/{id}/groups/{group_id}", delete(canvas::delete_group))
        .route("/api/canvas/{id}/messages", get(chat::list_messages).post(chat::post_message))
        .route("/api/upload", post(upload::upload_image).layer(upload_limit))
        .route("/ws/{canvas_id}", get(ws::handle_ws))
        .route("/health", get(health))
        .layer(cors_layer(&state.config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// `GET /health`: liveness plus the number of canvases in memory.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let canvases = services::canvas::canvas_count(&state).await;
    Json(Health { status: "healthy".into(), canvases })
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
