//! Error type for fallible canvas operations.

use wasm_bindgen::JsValue;

#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// The browser could not load or decode the image at `src`.
    #[error("failed to decode image {src}: {reason}")]
    ImageDecode { src: String, reason: String },
    /// The canvas element did not provide a 2D context.
    #[error("canvas has no 2d rendering context")]
    NoContext,
    /// The host passed an unusable configuration.
    #[error("invalid canvas config: {0}")]
    Config(String),
    /// A browser API call failed.
    #[error("browser call failed: {0}")]
    Js(String),
}

impl CanvasError {
    /// Wrap a thrown JS value, keeping its debug rendering as the message.
    #[must_use]
    pub fn js(value: &JsValue) -> Self {
        Self::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<CanvasError> for JsValue {
    fn from(err: CanvasError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
