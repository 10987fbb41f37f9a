#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use wire::ViewportRecord;

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pan/zoom state mapping world space onto the canvas surface.
///
/// `screen = world * scale + (tx, ty)`. `tx` / `ty` are in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { scale: 1.0, tx: 0.0, ty: 0.0 }
    }
}

impl Viewport {
    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.tx) / self.scale,
            y: (screen.y - self.ty) / self.scale,
        }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.scale + self.tx,
            y: world.y * self.scale + self.ty,
        }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// Multiply the scale by `factor`, clamped to `[min, max]`, keeping the
    /// world point under `anchor` (screen space) fixed on screen.
    ///
    /// Returns `true` if the scale actually changed.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64, min: f64, max: f64) -> bool {
        let world = self.screen_to_world(anchor);
        let old_scale = self.scale;
        let new_scale = (old_scale * factor).clamp(min, max);
        if (new_scale - old_scale).abs() < f64::EPSILON {
            return false;
        }
        self.scale = new_scale;
        self.tx -= world.x * (new_scale - old_scale);
        self.ty -= world.y * (new_scale - old_scale);
        true
    }
}

impl From<ViewportRecord> for Viewport {
    fn from(r: ViewportRecord) -> Self {
        Self { scale: r.scale, tx: r.tx, ty: r.ty }
    }
}

impl From<Viewport> for ViewportRecord {
    fn from(v: Viewport) -> Self {
        Self { scale: v.scale, tx: v.tx, ty: v.ty }
    }
}
