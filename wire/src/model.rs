//! Records shared by the server, the CLI and the canvas engine.
//!
//! Field names follow the browser client's camelCase JSON. Timestamps are
//! Unix milliseconds.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a canvas workspace.
pub type CanvasId = Uuid;
/// Identifier of an image placed on a canvas.
pub type ImageId = Uuid;
/// Identifier of an image group.
pub type GroupId = Uuid;

/// A positioned image as stored on the server and sent over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: ImageId,
    /// URL, object URL, or `data:` URL of the source image.
    pub src: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}

/// A named set of at least two images that select and move together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: GroupId,
    pub image_ids: Vec<ImageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Pan/zoom state: `screen = world * scale + (tx, ty)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRecord {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub tx: f64,
    #[serde(default)]
    pub ty: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for ViewportRecord {
    fn default() -> Self {
        Self { scale: 1.0, tx: 0.0, ty: 0.0 }
    }
}

/// Full state of one canvas workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    pub id: CanvasId,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub viewport: ViewportRecord,
    #[serde(default)]
    pub last_modified: i64,
}

impl CanvasState {
    /// An empty canvas stamped with `now`.
    #[must_use]
    pub fn empty(id: CanvasId, now: i64) -> Self {
        Self { id, images: Vec::new(), groups: Vec::new(), viewport: ViewportRecord::default(), last_modified: now }
    }
}

/// One chat line posted to a canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub sender: String,
    pub timestamp: i64,
    pub canvas_id: CanvasId,
}

/// Result of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub data_url: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Result of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub canvases: usize,
}

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
///
/// Native targets only; the browser engine reads `Date.now()` instead.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}
