#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::doc::{ImageId, ImageNode};
use crate::viewport::Point;

/// Axis-aligned rectangle in world space with non-negative size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// The rectangle spanned by two corners, in any drag direction.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            w: (a.x - b.x).abs(),
            h: (a.y - b.y).abs(),
        }
    }

    /// Edge-inclusive point containment.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// True unless the rectangles are separated on the x or the y axis.
    /// Touching edges count as intersecting.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        let separated_x = self.x + self.w < other.x || other.x + other.w < self.x;
        let separated_y = self.y + self.h < other.y || other.y + other.h < self.y;
        !(separated_x || separated_y)
    }
}

/// Topmost image under `world_pt`.
///
/// Images later in the list paint on top, so the scan runs back to front.
#[must_use]
pub fn image_at(images: &[ImageNode], world_pt: Point) -> Option<ImageId> {
    images
        .iter()
        .rev()
        .find(|img| img.bounds().contains(world_pt))
        .map(|img| img.id)
}

/// Ids of every image whose bounds intersect `rect`, in list order.
#[must_use]
pub fn images_in_rect(images: &[ImageNode], rect: &Rect) -> Vec<ImageId> {
    images
        .iter()
        .filter(|img| img.bounds().intersects(rect))
        .map(|img| img.id)
        .collect()
}
