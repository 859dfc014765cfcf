//! Core geometric types shared by anchors, routing and bounding boxes

use serde::{Deserialize, Serialize};

/// A 2D point in canvas coordinates (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Shift the point by a delta
    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Midpoint between two points
    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// A bounding box representing the spatial extent of a component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero-sized box located at a point
    pub fn at_point(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    /// Smallest box containing every point, `None` for an empty slice
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(
            rest.iter()
                .fold(Self::at_point(*first), |bb, p| bb.expand_to_include(*p)),
        )
    }

    /// Right edge x-coordinate
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point of the bounding box
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Check if this bounding box contains a point (edges inclusive)
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Check if a point lies exactly on one of the four edges
    pub fn on_boundary(&self, point: Point) -> bool {
        let on_vertical = (point.x == self.x || point.x == self.right())
            && point.y >= self.y
            && point.y <= self.bottom();
        let on_horizontal = (point.y == self.y || point.y == self.bottom())
            && point.x >= self.x
            && point.x <= self.right();
        on_vertical || on_horizontal
    }

    /// Compute the union of two bounding boxes (smallest box containing both)
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(x, y, right - x, bottom - y)
    }

    /// Expand this bounding box to include a point
    pub fn expand_to_include(&self, point: Point) -> BoundingBox {
        let x = self.x.min(point.x);
        let y = self.y.min(point.y);
        let right = self.right().max(point.x);
        let bottom = self.bottom().max(point.y);
        BoundingBox::new(x, y, right - x, bottom - y)
    }

    /// Grow the box by `padding` on every side
    pub fn padded(&self, padding: f64) -> BoundingBox {
        BoundingBox::new(
            self.x - padding,
            self.y - padding,
            self.width + 2.0 * padding,
            self.height + 2.0 * padding,
        )
    }
}
