use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    pub fn min_side(self) -> f64 {
        self.width.min(self.height)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn at(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Overlap test used for both collisions and encounter zones.
///
/// Only half of the target's extent counts on the leading edges, so the
/// actor may sink into the lower-right half of a cell before it registers.
pub fn overlaps(actor: &Rect, target: &Rect) -> bool {
    actor.x < target.x + target.width / 2.0
        && actor.x + actor.width > target.x
        && actor.y < target.y + target.height / 2.0
        && actor.y + actor.height > target.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_uses_half_of_target_extent() {
        let cell = Rect::new(10.0, 10.0, 10.0, 10.0);

        // Touching the far half of the target does not count.
        let right_half = Rect::new(15.0, 10.0, 4.0, 4.0);
        assert!(!overlaps(&right_half, &cell));

        let left_half = Rect::new(14.9, 10.0, 4.0, 4.0);
        assert!(overlaps(&left_half, &cell));

        // The actor's own full extent is used.
        let approaching = Rect::new(2.0, 10.0, 8.5, 4.0);
        assert!(overlaps(&approaching, &cell));
    }

    #[test]
    fn overlap_is_not_symmetric() {
        let big = Rect::new(0.0, 0.0, 20.0, 20.0);
        let small = Rect::new(12.0, 12.0, 4.0, 4.0);
        assert!(overlaps(&small, &big) != overlaps(&big, &small));
    }

    #[test]
    fn disjoint_rects_never_overlap() {
        let a = Rect::new(0.0, 0.0, 5.0, 5.0);
        let b = Rect::new(50.0, 50.0, 5.0, 5.0);
        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&b, &a));
    }
}
