//! Side classification and rectangle anchors

use serde::{Deserialize, Serialize};

use super::types::{BoundingBox, Point};

/// Tolerance under which two axis separations count as equal
pub const AXIS_EPSILON: f64 = 1e-6;

/// Edge of a rectangle used to attach connector endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// Outward unit normal of the side
    pub fn normal(&self) -> (f64, f64) {
        match self {
            Side::Top => (0.0, -1.0),
            Side::Bottom => (0.0, 1.0),
            Side::Left => (-1.0, 0.0),
            Side::Right => (1.0, 0.0),
        }
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }
}

/// Side of `to` that faces `from`, by the two diagonals through `to`.
///
/// The plane is split by `y = (x - to.x) + to.y` and `y = -(x - to.x) + to.y`.
/// A point lying on a diagonal counts as above it, and the positive diagonal
/// is tested first, so the classification is not symmetric under swapping
/// the arguments.
pub fn relative_side(to: Point, from: Point) -> Side {
    let above_positive = from.y <= (from.x - to.x) + to.y;
    let above_negative = from.y <= -(from.x - to.x) + to.y;

    match (above_positive, above_negative) {
        (true, true) => Side::Top,
        (true, false) => Side::Right,
        (false, true) => Side::Left,
        (false, false) => Side::Bottom,
    }
}

/// Side used by orthogonal routing.
///
/// When the horizontal separation dominates the connector leaves vertically
/// (TOP/BOTTOM) so the long horizontal run ends at the target; otherwise it
/// leaves horizontally. Separations within [`AXIS_EPSILON`] of each other fall
/// back to [`relative_side`].
pub fn angle_relative_side(to: Point, from: Point) -> Side {
    let dx = from.x - to.x;
    let dy = from.y - to.y;

    if (dx.abs() - dy.abs()).abs() < AXIS_EPSILON {
        return relative_side(to, from);
    }

    if dx.abs() > dy.abs() {
        if dy < 0.0 {
            Side::Top
        } else {
            Side::Bottom
        }
    } else if dx < 0.0 {
        Side::Left
    } else {
        Side::Right
    }
}

/// Midpoint of a rectangle side
pub fn attachment_point(bounds: &BoundingBox, side: Side) -> Point {
    match side {
        Side::Top => Point::new(bounds.x + bounds.width / 2.0, bounds.y),
        Side::Bottom => Point::new(bounds.x + bounds.width / 2.0, bounds.bottom()),
        Side::Left => Point::new(bounds.x, bounds.y + bounds.height / 2.0),
        Side::Right => Point::new(bounds.right(), bounds.y + bounds.height / 2.0),
    }
}

/// Midpoint of a rectangle side pushed outward along the side normal
pub fn padded_attachment_point(bounds: &BoundingBox, side: Side, padding: f64) -> Point {
    let (nx, ny) = side.normal();
    attachment_point(bounds, side).offset(nx * padding, ny * padding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_side_axes() {
        let c = Point::new(0.0, 0.0);
        assert_eq!(relative_side(c, Point::new(0.0, -10.0)), Side::Top);
        assert_eq!(relative_side(c, Point::new(0.0, 10.0)), Side::Bottom);
        assert_eq!(relative_side(c, Point::new(-10.0, 0.0)), Side::Left);
        assert_eq!(relative_side(c, Point::new(10.0, 0.0)), Side::Right);
    }

    #[test]
    fn test_relative_side_on_diagonal() {
        let c = Point::new(0.0, 0.0);
        // On the positive diagonal below-right: above positive, below negative
        assert_eq!(relative_side(c, Point::new(10.0, 10.0)), Side::Right);
        // On the positive diagonal above-left: above both
        assert_eq!(relative_side(c, Point::new(-10.0, -10.0)), Side::Top);
        // On the negative diagonal above-right: above both
        assert_eq!(relative_side(c, Point::new(10.0, -10.0)), Side::Top);
        // On the negative diagonal below-left: below positive, above negative
        assert_eq!(relative_side(c, Point::new(-10.0, 10.0)), Side::Left);
    }

    #[test]
    fn test_relative_side_coincident() {
        let c = Point::new(5.0, 5.0);
        assert_eq!(relative_side(c, c), Side::Top);
    }

    #[test]
    fn test_angle_relative_side_dominant_axis() {
        let c = Point::new(0.0, 0.0);
        assert_eq!(angle_relative_side(c, Point::new(100.0, 10.0)), Side::Bottom);
        assert_eq!(angle_relative_side(c, Point::new(100.0, -10.0)), Side::Top);
        assert_eq!(angle_relative_side(c, Point::new(10.0, 100.0)), Side::Right);
        assert_eq!(angle_relative_side(c, Point::new(-10.0, 100.0)), Side::Left);
    }

    #[test]
    fn test_angle_relative_side_falls_back_on_diagonal() {
        let c = Point::new(0.0, 0.0);
        let p = Point::new(10.0, 10.0);
        assert_eq!(angle_relative_side(c, p), relative_side(c, p));
        assert_eq!(angle_relative_side(c, c), Side::Top);
    }

    #[test]
    fn test_attachment_points() {
        let bounds = BoundingBox::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(attachment_point(&bounds, Side::Top), Point::new(50.0, 0.0));
        assert_eq!(attachment_point(&bounds, Side::Bottom), Point::new(50.0, 50.0));
        assert_eq!(attachment_point(&bounds, Side::Left), Point::new(0.0, 25.0));
        assert_eq!(attachment_point(&bounds, Side::Right), Point::new(100.0, 25.0));
    }

    #[test]
    fn test_padded_attachment_point() {
        let bounds = BoundingBox::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(
            padded_attachment_point(&bounds, Side::Top, 5.0),
            Point::new(50.0, -5.0)
        );
        assert_eq!(
            padded_attachment_point(&bounds, Side::Right, 5.0),
            Point::new(105.0, 25.0)
        );
    }
}
