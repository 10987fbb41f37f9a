//! HTTP client for the imageboard API with an explicit active canvas.
//!
//! Canvas-scoped calls fail with [`CliError::NoActiveCanvas`] before any
//! request is sent when no canvas has been chosen.

use std::path::Path;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wire::{CanvasId, CanvasState, ChatMessage, GroupId, GroupRecord, Health, ImageId, ImageRecord, UploadedImage};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("no active canvas; pass --canvas, set IMAGEBOARD_CANVAS, or run `canvas create`")]
    NoActiveCanvas,
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {detail}")]
    Api { status: u16, detail: String },
    #[error("websocket failed: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("frame decode failed: {0}")]
    Decode(#[from] wire::CodecError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<tokio_tungstenite::tungstenite::Error> for CliError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Ws(Box::new(error))
    }
}

/// Body of `POST /api/canvas/{id}/images`.
#[derive(Debug, Clone, Serialize)]
pub struct NewImage {
    pub src: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Serialize)]
struct NewMessage<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ungrouped {
    image_ids: Vec<ImageId>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

pub struct ApiClient {
    base_url: String,
    canvas: Option<CanvasId>,
    http: reqwest::Client,
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: &str, canvas: Option<CanvasId>) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_owned(), canvas, http: reqwest::Client::new() }
    }

    #[must_use]
    pub fn canvas(&self) -> Option<CanvasId> {
        self.canvas
    }

    pub fn set_canvas(&mut self, canvas: Option<CanvasId>) {
        self.canvas = canvas;
    }

    fn active_canvas(&self) -> Result<CanvasId, CliError> {
        self.canvas.ok_or(CliError::NoActiveCanvas)
    }

    // -------------------------------------------------------------------------
    // Unscoped
    // -------------------------------------------------------------------------

    pub async fn health(&self) -> Result<Health, CliError> {
        self.request(Method::GET, "/health", None::<&()>).await
    }

    /// Create a canvas and make it the active one.
    pub async fn create_canvas(&mut self) -> Result<CanvasState, CliError> {
        let state: CanvasState = self.request(Method::POST, "/api/canvas", None::<&()>).await?;
        self.canvas = Some(state.id);
        Ok(state)
    }

    pub async fn upload(&self, path: &Path) -> Result<UploadedImage, CliError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| CliError::Io { path: path.display().to_string(), source })?;
        let filename = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |name| name.to_string_lossy().into_owned());
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str(mime_for(path))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self.http.post(self.url("/api/upload")).multipart(form).send().await?;
        decode_response(response).await
    }

    // -------------------------------------------------------------------------
    // Canvas-scoped
    // -------------------------------------------------------------------------

    pub async fn get_canvas(&self) -> Result<CanvasState, CliError> {
        let id = self.active_canvas()?;
        self.request(Method::GET, &format!("/api/canvas/{id}"), None::<&()>).await
    }

    pub async fn add_image(&self, image: &NewImage) -> Result<ImageRecord, CliError> {
        let id = self.active_canvas()?;
        self.request(Method::POST, &format!("/api/canvas/{id}/images"), Some(image)).await
    }

    pub async fn delete_image(&self, image_id: ImageId) -> Result<(), CliError> {
        let id = self.active_canvas()?;
        self.request::<serde_json::Value, ()>(Method::DELETE, &format!("/api/canvas/{id}/images/{image_id}"), None)
            .await
            .map(|_| ())
    }

    pub async fn group(&self, image_ids: &[ImageId]) -> Result<GroupRecord, CliError> {
        let id = self.active_canvas()?;
        self.request(Method::POST, &format!("/api/canvas/{id}/groups"), Some(image_ids)).await
    }

    /// Dissolve a group; returns its former members.
    pub async fn ungroup(&self, group_id: GroupId) -> Result<Vec<ImageId>, CliError> {
        let id = self.active_canvas()?;
        let body: Ungrouped = self
            .request(Method::DELETE, &format!("/api/canvas/{id}/groups/{group_id}"), None::<&()>)
            .await?;
        Ok(body.image_ids)
    }

    pub async fn messages(&self, limit: Option<usize>) -> Result<Vec<ChatMessage>, CliError> {
        let id = self.active_canvas()?;
        let path = match limit {
            Some(n) => format!("/api/canvas/{id}/messages?limit={n}"),
            None => format!("/api/canvas/{id}/messages"),
        };
        self.request(Method::GET, &path, None::<&()>).await
    }

    pub async fn send(&self, text: &str, sender: Option<&str>) -> Result<ChatMessage, CliError> {
        let id = self.active_canvas()?;
        let body = NewMessage { text, sender };
        self.request(Method::POST, &format!("/api/canvas/{id}/messages"), Some(&body)).await
    }

    /// WebSocket URL of the active canvas room.
    pub fn ws_url(&self) -> Result<String, CliError> {
        let id = self.active_canvas()?;
        ws_url(&self.base_url, id)
    }

    // -------------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, CliError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.http.request(method, self.url(path));
        let request = if let Some(json) = body { request.json(json) } else { request };
        decode_response(request.send().await?).await
    }
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CliError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(CliError::Api { status: status.as_u16(), detail: error_detail(&text) });
    }
    Ok(serde_json::from_str(&text)?)
}

/// The `detail` of a JSON error body, or the raw text.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.detail,
        Err(_) => body.trim().to_owned(),
    }
}

fn ws_url(base_url: &str, canvas: CanvasId) -> Result<String, CliError> {
    if let Some(rest) = base_url.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/ws/{canvas}"));
    }
    if let Some(rest) = base_url.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/ws/{canvas}"));
    }
    Err(CliError::InvalidBaseUrl(base_url.to_owned()))
}

/// MIME type sent with an upload, from the file extension.
fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
