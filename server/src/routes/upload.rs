//! Image upload route.

use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use tracing::info;
use wire::UploadedImage;

use super::{ApiError, api_error};
use crate::services::upload::{UploadError, encode_upload};
use crate::state::AppState;

/// Name of the form field carrying the file.
const FILE_FIELD: &str = "file";

/// `POST /api/upload`: multipart `file` (must be `image/*`) to a `data:` URL.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadedImage>, ApiError> {
    let max = state.config.max_upload_bytes;
    while let Some(field) = multipart.next_field().await.map_err(|e| upload_error(multipart_error(e)))? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let filename = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await.map_err(|e| upload_error(multipart_error(e)))?;

        let uploaded = encode_upload(content_type.as_deref(), filename, &bytes, max).map_err(upload_error)?;
        info!(bytes = bytes.len(), content_type = content_type.as_deref().unwrap_or("-"), "image uploaded");
        return Ok(Json(uploaded));
    }
    Err(upload_error(UploadError::MissingFile))
}

fn multipart_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::BodyTooLarge
    } else {
        UploadError::Multipart(err.body_text())
    }
}

fn upload_error_to_status(err: &UploadError) -> StatusCode {
    match err {
        UploadError::NotAnImage(_) | UploadError::MissingFile | UploadError::Multipart(_) => StatusCode::BAD_REQUEST,
        UploadError::TooLarge { .. } | UploadError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
    }
}

fn upload_error(err: UploadError) -> ApiError {
    api_error(upload_error_to_status(&err), err)
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;
