//! Canvas, image and group routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use wire::{CanvasId, CanvasState, GroupId, GroupRecord, ImageId, ImageRecord};

use super::{ApiError, api_error};
use crate::services::canvas::{self as service, CanvasServiceError};
use crate::state::AppState;

/// Body of `POST /api/canvas/{id}/images`. Any client-sent id is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct NewImage {
    pub src: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deleted {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Ungrouped {
    pub status: String,
    pub image_ids: Vec<ImageId>,
}

/// `POST /api/canvas`: create an empty canvas.
pub async fn create_canvas(State(state): State<AppState>) -> Json<CanvasState> {
    Json(service::create_canvas(&state).await)
}

/// `GET /api/canvas/{id}`: current canvas state.
pub async fn get_canvas(State(state): State<AppState>, Path(id): Path<CanvasId>) -> Result<Json<CanvasState>, ApiError> {
    service::get_canvas(&state, id).await.map(Json).map_err(canvas_error)
}

/// `PUT /api/canvas/{id}`: replace the whole canvas.
pub async fn update_canvas(
    State(state): State<AppState>,
    Path(id): Path<CanvasId>,
    Json(body): Json<CanvasState>,
) -> Result<Json<CanvasState>, ApiError> {
    service::replace_canvas(&state, id, body).await.map(Json).map_err(canvas_error)
}

/// `POST /api/canvas/{id}/images`: place an image.
pub async fn add_image(
    State(state): State<AppState>,
    Path(id): Path<CanvasId>,
    Json(body): Json<NewImage>,
) -> Result<Json<ImageRecord>, ApiError> {
    let image = ImageRecord {
        id: uuid::Uuid::nil(),
        src: body.src,
        x: body.x,
        y: body.y,
        w: body.w,
        h: body.h,
        selected: false,
        group_id: None,
    };
    service::add_image(&state, id, image).await.map(Json).map_err(canvas_error)
}

/// `DELETE /api/canvas/{id}/images/{image_id}`.
pub async fn delete_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(CanvasId, ImageId)>,
) -> Result<Json<Deleted>, ApiError> {
    service::delete_image(&state, id, image_id).await.map_err(canvas_error)?;
    Ok(Json(Deleted { status: "deleted".into() }))
}

/// `POST /api/canvas/{id}/groups`: body is a JSON array of image ids.
pub async fn create_group(
    State(state): State<AppState>,
    Path(id): Path<CanvasId>,
    Json(image_ids): Json<Vec<ImageId>>,
) -> Result<Json<GroupRecord>, ApiError> {
    service::create_group(&state, id, image_ids).await.map(Json).map_err(canvas_error)
}

/// `DELETE /api/canvas/{id}/groups/{group_id}`: ungroup.
pub async fn delete_group(
    State(state): State<AppState>,
    Path((id, group_id)): Path<(CanvasId, GroupId)>,
) -> Result<Json<Ungrouped>, ApiError> {
    let image_ids = service::delete_group(&state, id, group_id).await.map_err(canvas_error)?;
    Ok(Json(Ungrouped { status: "ungrouped".into(), image_ids }))
}

fn canvas_error_to_status(err: &CanvasServiceError) -> StatusCode {
    match err {
        CanvasServiceError::CanvasNotFound(_) | CanvasServiceError::ImageNotFound(_) | CanvasServiceError::GroupNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        CanvasServiceError::TooFewImages(_) | CanvasServiceError::UnknownImages(_) => StatusCode::BAD_REQUEST,
    }
}

fn canvas_error(err: CanvasServiceError) -> ApiError {
    api_error(canvas_error_to_status(&err), err)
}

#[cfg(test)]
#[path = "canvas_test.rs"]
mod tests;
