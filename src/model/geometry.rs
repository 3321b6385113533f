//! Page-space geometry.
//!
//! All coordinates are in points with the origin at the top-left corner of
//! the page and `y` growing downward.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BBox {
    /// Create a box from its edges.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a box from an origin and a size.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    /// Check if the box has no area.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Check that every edge is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// Swap inverted edges so that `x0 <= x1` and `y0 <= y1`.
    pub fn normalized(self) -> Self {
        Self {
            x0: self.x0.min(self.x1),
            y0: self.y0.min(self.y1),
            x1: self.x0.max(self.x1),
            y1: self.y0.max(self.y1),
        }
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Union of all boxes, or `None` for an empty iterator.
    pub fn union_all<'a, I>(boxes: I) -> Option<BBox>
    where
        I: IntoIterator<Item = &'a BBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BBox>, b| Some(acc.map_or(*b, |a| a.union(b))))
    }

    /// Length of the overlap of the two boxes projected on the x axis.
    pub fn horizontal_overlap(&self, other: &BBox) -> f32 {
        (self.x1.min(other.x1) - self.x0.max(other.x0)).max(0.0)
    }

    /// Length of the overlap of the two boxes projected on the y axis.
    pub fn vertical_overlap(&self, other: &BBox) -> f32 {
        (self.y1.min(other.y1) - self.y0.max(other.y0)).max(0.0)
    }

    pub fn intersection_area(&self, other: &BBox) -> f32 {
        self.horizontal_overlap(other) * self.vertical_overlap(other)
    }

    /// Check if the interiors of the two boxes overlap.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.intersection_area(other) > 0.0
    }

    /// Check if `other` lies inside this box, allowing `tolerance` points of slack.
    pub fn contains(&self, other: &BBox, tolerance: f32) -> bool {
        other.x0 >= self.x0 - tolerance
            && other.y0 >= self.y0 - tolerance
            && other.x1 <= self.x1 + tolerance
            && other.y1 <= self.y1 + tolerance
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Grow the box by `margin` on every side.
    pub fn expand(&self, margin: f32) -> BBox {
        BBox {
            x0: self.x0 - margin,
            y0: self.y0 - margin,
            x1: self.x1 + margin,
            y1: self.y1 + margin,
        }
    }

    /// Shrink the box by `padding` on every side, never inverting it.
    pub fn inset(&self, padding: f32) -> BBox {
        let px = padding.min(self.width() / 2.0).max(0.0);
        let py = padding.min(self.height() / 2.0).max(0.0);
        BBox {
            x0: self.x0 + px,
            y0: self.y0 + py,
            x1: self.x1 - px,
            y1: self.y1 - py,
        }
    }

    /// Clip the box to the bounds of `frame`.
    pub fn clip_to(&self, frame: &BBox) -> BBox {
        BBox {
            x0: self.x0.clamp(frame.x0, frame.x1),
            y0: self.y0.clamp(frame.y0, frame.y1),
            x1: self.x1.clamp(frame.x0, frame.x1),
            y1: self.y1.clamp(frame.y0, frame.y1),
        }
    }

    /// Move the box vertically.
    pub fn shift_y(&self, dy: f32) -> BBox {
        BBox {
            y0: self.y0 + dy,
            y1: self.y1 + dy,
            ..*self
        }
    }
}

/// Total order on boxes by top edge, then left edge.
///
/// Used wherever a deterministic geometric order is needed.
pub fn cmp_top_left(a: &BBox, b: &BBox) -> std::cmp::Ordering {
    a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0))
}
