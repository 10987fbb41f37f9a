//! Upload service: turns an uploaded image file into a `data:` URL.
//!
//! Bytes are never stored; the browser places the returned URL on its canvas
//! and shares it like any other image source.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use wire::UploadedImage;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("file must be an image, got {0:?}")]
    NotAnImage(String),
    #[error("upload of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
    #[error("request body exceeds the upload limit")]
    BodyTooLarge,
    #[error("multipart form has no `file` field")]
    MissingFile,
    #[error("malformed multipart body: {0}")]
    Multipart(String),
}

/// Encode an uploaded file as a base64 `data:` URL.
///
/// `content_type` must be an `image/*` MIME type.
///
/// # Errors
///
/// Returns [`UploadError::NotAnImage`] for a missing or non-image type and
/// [`UploadError::TooLarge`] when `bytes` exceeds `max_bytes`.
pub fn encode_upload(
    content_type: Option<&str>,
    filename: Option<String>,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<UploadedImage, UploadError> {
    let mime = content_type.map(str::trim).unwrap_or_default();
    if !is_image_mime(mime) {
        return Err(UploadError::NotAnImage(mime.to_owned()));
    }
    if bytes.len() > max_bytes {
        return Err(UploadError::TooLarge { size: bytes.len(), max: max_bytes });
    }

    let data_url = format!("data:{mime};base64,{}", STANDARD.encode(bytes));
    Ok(UploadedImage { data_url, filename })
}

fn is_image_mime(mime: &str) -> bool {
    mime.split_once('/')
        .is_some_and(|(top, sub)| top.eq_ignore_ascii_case("image") && !sub.is_empty())
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;
