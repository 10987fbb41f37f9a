//! Tunables the host page may override when creating the canvas.
//!
//! The host passes a JSON object; every field is optional and falls back to
//! the values in [`crate::consts`].

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_DISPLAY_WIDTH, MAX_SCALE, MIN_SCALE, PAN_KEY, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};
use crate::error::CanvasError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Cap on the display width of a freshly loaded image, in world units.
    pub max_display_width: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale multiplier applied when the wheel moves towards the user.
    pub zoom_in_factor: f64,
    /// Scale multiplier applied when the wheel moves away from the user.
    pub zoom_out_factor: f64,
    /// `KeyboardEvent.key` value that enables panning while held.
    pub pan_key: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            max_display_width: MAX_DISPLAY_WIDTH,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            zoom_in_factor: ZOOM_IN_FACTOR,
            zoom_out_factor: ZOOM_OUT_FACTOR,
            pan_key: PAN_KEY.to_owned(),
        }
    }
}

impl CanvasConfig {
    /// Parse a config from the host's JSON, then validate it.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Config`] for malformed JSON or values that
    /// would break the viewport math.
    pub fn from_json(json: &str) -> Result<Self, CanvasError> {
        let config: Self = serde_json::from_str(json).map_err(|e| CanvasError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that scale limits and factors are usable.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CanvasError> {
        if !(self.max_display_width.is_finite() && self.max_display_width > 0.0) {
            return Err(CanvasError::Config("maxDisplayWidth must be positive".into()));
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale && self.max_scale.is_finite()) {
            return Err(CanvasError::Config("scale limits must satisfy 0 < minScale <= maxScale".into()));
        }
        if !(self.zoom_in_factor > 1.0 && self.zoom_in_factor.is_finite()) {
            return Err(CanvasError::Config("zoomInFactor must be greater than 1".into()));
        }
        if !(self.zoom_out_factor > 0.0 && self.zoom_out_factor < 1.0) {
            return Err(CanvasError::Config("zoomOutFactor must be between 0 and 1".into()));
        }
        Ok(())
    }
}
