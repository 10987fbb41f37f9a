//! Shared record types and the realtime frame codec.
//!
//! This crate owns the wire representation used by `server`, `cli` and the
//! browser `canvas` engine. On the socket every frame is a JSON object
//! `{"type": ..., "data": ..., "canvasId": ...}`. Internally the tag and
//! payload are decoded once into the closed [`CanvasEvent`] enum so no
//! consumer ever matches on raw type strings.

pub mod model;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use model::{
    CanvasId, CanvasState, ChatMessage, GroupId, GroupRecord, Health, ImageId, ImageRecord, UploadedImage,
    ViewportRecord, now_ms,
};

/// Error returned by [`decode_frame`] and [`encode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not a JSON frame envelope.
    #[error("invalid frame json: {0}")]
    Json(#[from] serde_json::Error),
    /// The `type` tag does not name a known event.
    #[error("unknown frame type: {0}")]
    UnknownType(String),
    /// The `canvasId` field is not a UUID.
    #[error("invalid canvas id: {0}")]
    InvalidCanvasId(String),
    /// The `data` payload does not match the shape required by its tag.
    #[error("invalid {kind} payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Payload of `user_joined` / `user_left`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
}

/// Payload of `image_deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDeleted {
    pub image_id: ImageId,
}

/// Payload of `images_ungrouped`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesUngrouped {
    pub group_id: GroupId,
    pub image_ids: Vec<ImageId>,
}

/// Every realtime event a canvas room can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// Full state sent to a client right after it connects.
    CanvasState(CanvasState),
    /// Full state after a bulk replace.
    CanvasUpdate(CanvasState),
    ChatMessage(ChatMessage),
    UserJoined(Notice),
    UserLeft(Notice),
    ImageAdded(ImageRecord),
    ImageDeleted(ImageDeleted),
    ImagesGrouped(GroupRecord),
    ImagesUngrouped(ImagesUngrouped),
}

impl CanvasEvent {
    /// The wire tag for this event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CanvasState(_) => "canvas_state",
            Self::CanvasUpdate(_) => "canvas_update",
            Self::ChatMessage(_) => "chat_message",
            Self::UserJoined(_) => "user_joined",
            Self::UserLeft(_) => "user_left",
            Self::ImageAdded(_) => "image_added",
            Self::ImageDeleted(_) => "image_deleted",
            Self::ImagesGrouped(_) => "images_grouped",
            Self::ImagesUngrouped(_) => "images_ungrouped",
        }
    }

    fn payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::CanvasState(v) | Self::CanvasUpdate(v) => serde_json::to_value(v),
            Self::ChatMessage(v) => serde_json::to_value(v),
            Self::UserJoined(v) | Self::UserLeft(v) => serde_json::to_value(v),
            Self::ImageAdded(v) => serde_json::to_value(v),
            Self::ImageDeleted(v) => serde_json::to_value(v),
            Self::ImagesGrouped(v) => serde_json::to_value(v),
            Self::ImagesUngrouped(v) => serde_json::to_value(v),
        }
    }

    fn from_parts(kind: &str, data: Value) -> Result<Self, CodecError> {
        match kind {
            "canvas_state" => Ok(Self::CanvasState(payload("canvas_state", data)?)),
            "canvas_update" => Ok(Self::CanvasUpdate(payload("canvas_update", data)?)),
            "chat_message" => Ok(Self::ChatMessage(payload("chat_message", data)?)),
            "user_joined" => Ok(Self::UserJoined(payload("user_joined", data)?)),
            "user_left" => Ok(Self::UserLeft(payload("user_left", data)?)),
            "image_added" => Ok(Self::ImageAdded(payload("image_added", data)?)),
            "image_deleted" => Ok(Self::ImageDeleted(payload("image_deleted", data)?)),
            "images_grouped" => Ok(Self::ImagesGrouped(payload("images_grouped", data)?)),
            "images_ungrouped" => Ok(Self::ImagesUngrouped(payload("images_ungrouped", data)?)),
            other => Err(CodecError::UnknownType(other.to_owned())),
        }
    }
}

/// A decoded realtime message addressed to one canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub canvas_id: CanvasId,
    pub event: CanvasEvent,
}

impl Frame {
    #[must_use]
    pub fn new(canvas_id: CanvasId, event: CanvasEvent) -> Self {
        Self { canvas_id, event }
    }

    /// The wire tag of the carried event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.event.kind()
    }
}

/// Untyped envelope exactly as it appears on the socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
    #[serde(rename = "canvasId")]
    canvas_id: String,
}

/// Encode a frame as a JSON text message.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if a payload cannot be represented as JSON.
pub fn encode_frame(frame: &Frame) -> Result<String, CodecError> {
    let wire = WireFrame {
        kind: frame.kind().to_owned(),
        data: frame.event.payload()?,
        canvas_id: frame.canvas_id.to_string(),
    };
    Ok(serde_json::to_string(&wire)?)
}

/// Decode a JSON text message into a typed frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed envelopes,
/// [`CodecError::UnknownType`] for unrecognized tags,
/// [`CodecError::InvalidCanvasId`] for a bad `canvasId`, and
/// [`CodecError::Payload`] when `data` does not fit the tag.
pub fn decode_frame(text: &str) -> Result<Frame, CodecError> {
    let wire: WireFrame = serde_json::from_str(text)?;
    let canvas_id = wire
        .canvas_id
        .parse::<CanvasId>()
        .map_err(|_| CodecError::InvalidCanvasId(wire.canvas_id.clone()))?;
    let event = CanvasEvent::from_parts(&wire.kind, wire.data)?;
    Ok(Frame { canvas_id, event })
}

fn payload<T: DeserializeOwned>(kind: &'static str, data: Value) -> Result<T, CodecError> {
    serde_json::from_value(data).map_err(|source| CodecError::Payload { kind, source })
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
