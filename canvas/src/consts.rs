//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed viewport scale.
pub const MIN_SCALE: f64 = 0.1;

/// Largest allowed viewport scale.
pub const MAX_SCALE: f64 = 5.0;

/// Scale multiplier for one wheel notch towards the user (zoom in).
pub const ZOOM_IN_FACTOR: f64 = 1.1;

/// Scale multiplier for one wheel notch away from the user (zoom out).
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

// ── Images ──────────────────────────────────────────────────────

/// Newly added images wider than this (world units) are scaled down to it.
pub const MAX_DISPLAY_WIDTH: f64 = 300.0;

/// Key that turns a pointer-down into a pan while held.
pub const PAN_KEY: &str = " ";

// ── Rendering ───────────────────────────────────────────────────

/// Canvas background fill.
pub const BACKGROUND: &str = "#F5F3EF";

/// Ring drawn around every grouped image.
pub const GROUP_RING_COLOR: &str = "#7B61FF";

/// Dashed ring drawn around every selected image.
pub const SELECTION_COLOR: &str = "#1E88E5";

/// Marquee rectangle fill.
pub const MARQUEE_FILL: &str = "rgba(30, 136, 229, 0.08)";

/// Ring stroke width in screen pixels.
pub const RING_WIDTH_PX: f64 = 2.0;

/// Gap between an image edge and its group ring, in screen pixels.
pub const GROUP_RING_OFFSET_PX: f64 = 4.0;

/// Gap between an image edge and its selection ring, in screen pixels.
pub const SELECTION_RING_OFFSET_PX: f64 = 2.0;

/// Dash segment length for selection and marquee outlines, in screen pixels.
pub const DASH_PX: f64 = 6.0;
