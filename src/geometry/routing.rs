//! Arrow path routing for pointer components

use serde::{Deserialize, Serialize};

use super::side::{angle_relative_side, attachment_point, padded_attachment_point, relative_side, Side};
use super::types::{BoundingBox, Point};

/// Routing mode for flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    /// Two-point path from source anchor to target anchor
    #[default]
    Straight,
    /// Three-point path with a single orthogonal bend
    Angle,
}

impl std::str::FromStr for RoutingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "straight" => Ok(RoutingMode::Straight),
            "angle" | "angled" => Ok(RoutingMode::Angle),
            other => Err(format!("unknown routing mode '{}'", other)),
        }
    }
}

/// Resolved shape of one end of a pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EndpointShape {
    /// A rectangular component; `padding` pushes anchors outward (text components)
    Rect { bounds: BoundingBox, padding: f64 },
    /// A point-like end: free-floating coordinates or another pointer's midpoint
    Point(Point),
}

impl EndpointShape {
    pub fn rect(bounds: BoundingBox) -> Self {
        EndpointShape::Rect {
            bounds,
            padding: 0.0,
        }
    }

    pub fn center(&self) -> Point {
        match self {
            EndpointShape::Rect { bounds, .. } => bounds.center(),
            EndpointShape::Point(p) => *p,
        }
    }

    /// Anchor on a given side; point-like shapes anchor at themselves
    pub fn anchor(&self, side: Side) -> Point {
        match self {
            EndpointShape::Rect { bounds, padding } if *padding != 0.0 => {
                padded_attachment_point(bounds, side, *padding)
            }
            EndpointShape::Rect { bounds, .. } => attachment_point(bounds, side),
            EndpointShape::Point(p) => *p,
        }
    }

    /// Anchor on the side facing `other`
    pub fn anchor_facing(&self, other: Point) -> Point {
        self.anchor(relative_side(self.center(), other))
    }
}

/// Inputs for a single arrow path computation
#[derive(Debug, Clone, Copy)]
pub struct ArrowRequest {
    pub source: Option<EndpointShape>,
    pub target: Option<EndpointShape>,
    pub mode: RoutingMode,
    /// Manually dragged handle, offset from the straight path's midpoint
    pub handle: Option<(f64, f64)>,
    /// Offset used to synthesize a missing endpoint next to the present one
    pub fallback_offset: f64,
}

/// Replace absent endpoints with placeholder points
pub fn resolve_placeholders(
    source: Option<EndpointShape>,
    target: Option<EndpointShape>,
    fallback_offset: f64,
) -> (EndpointShape, EndpointShape) {
    match (source, target) {
        (Some(s), Some(t)) => (s, t),
        (Some(s), None) => {
            let placeholder = s.center().offset(fallback_offset, fallback_offset);
            (s, EndpointShape::Point(placeholder))
        }
        (None, Some(t)) => {
            let placeholder = t.center().offset(-fallback_offset, -fallback_offset);
            (EndpointShape::Point(placeholder), t)
        }
        (None, None) => (
            EndpointShape::Point(Point::origin()),
            EndpointShape::Point(Point::origin()),
        ),
    }
}

/// Straight two-point path between the facing anchors
pub fn route_straight(source: &EndpointShape, target: &EndpointShape) -> Vec<Point> {
    let start = source.anchor_facing(target.center());
    let end = target.anchor_facing(source.center());
    vec![start, end]
}

/// Orthogonal three-point path: leave the source on its angle-relative side,
/// bend once, and enter the target on the side facing the bend
pub fn route_angle(source: &EndpointShape, target: &EndpointShape) -> Vec<Point> {
    let target_center = target.center();
    let side = angle_relative_side(source.center(), target_center);
    let start = source.anchor(side);
    let bend = if side.is_vertical() {
        Point::new(start.x, target_center.y)
    } else {
        Point::new(target_center.x, start.y)
    };
    let end = target.anchor_facing(bend);
    vec![start, bend, end]
}

/// Path bent through a handle placed relative to the straight midpoint
pub fn route_through_handle(
    source: &EndpointShape,
    target: &EndpointShape,
    offset: (f64, f64),
) -> Vec<Point> {
    let straight = route_straight(source, target);
    let handle = straight[0].midpoint(straight[1]).offset(offset.0, offset.1);
    vec![
        source.anchor_facing(handle),
        handle,
        target.anchor_facing(handle),
    ]
}

/// Compute the full arrow path for a request
pub fn arrow_points(request: &ArrowRequest) -> Vec<Point> {
    let (source, target) =
        resolve_placeholders(request.source, request.target, request.fallback_offset);

    if let Some(offset) = request.handle {
        return route_through_handle(&source, &target, offset);
    }

    match request.mode {
        RoutingMode::Straight => route_straight(&source, &target),
        RoutingMode::Angle => route_angle(&source, &target),
    }
}

/// Midpoint of a polyline measured along its length
pub fn path_midpoint(path: &[Point]) -> Point {
    let total: f64 = path.windows(2).map(|w| segment_length(w[0], w[1])).sum();
    if total == 0.0 {
        return path.first().copied().unwrap_or_default();
    }

    let mut remaining = total / 2.0;
    for w in path.windows(2) {
        let len = segment_length(w[0], w[1]);
        if remaining <= len && len > 0.0 {
            let t = remaining / len;
            return Point::new(
                w[0].x + (w[1].x - w[0].x) * t,
                w[0].y + (w[1].y - w[0].y) * t,
            );
        }
        remaining -= len;
    }
    path.last().copied().unwrap_or_default()
}

fn segment_length(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source: Option<EndpointShape>, target: Option<EndpointShape>) -> ArrowRequest {
        ArrowRequest {
            source,
            target,
            mode: RoutingMode::Straight,
            handle: None,
            fallback_offset: 50.0,
        }
    }

    #[test]
    fn test_straight_between_rects() {
        let a = EndpointShape::rect(BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        let b = EndpointShape::rect(BoundingBox::new(200.0, 0.0, 50.0, 50.0));
        let path = arrow_points(&request(Some(a), Some(b)));
        assert_eq!(path, vec![Point::new(50.0, 25.0), Point::new(200.0, 25.0)]);
    }

    #[test]
    fn test_point_endpoint_anchors_at_itself() {
        let a = EndpointShape::rect(BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        let p = EndpointShape::Point(Point::new(25.0, 300.0));
        let path = arrow_points(&request(Some(a), Some(p)));
        assert_eq!(path, vec![Point::new(25.0, 50.0), Point::new(25.0, 300.0)]);
    }

    #[test]
    fn test_missing_target_uses_offset_placeholder() {
        let a = EndpointShape::rect(BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        let path = arrow_points(&request(Some(a), None));
        assert_eq!(path[1], Point::new(75.0, 75.0));
    }

    #[test]
    fn test_missing_source_uses_offset_placeholder() {
        let b = EndpointShape::rect(BoundingBox::new(100.0, 100.0, 50.0, 50.0));
        let path = arrow_points(&request(None, Some(b)));
        assert_eq!(path[0], Point::new(75.0, 75.0));
    }

    #[test]
    fn test_both_missing_degenerates_at_origin() {
        let path = arrow_points(&request(None, None));
        assert_eq!(path, vec![Point::origin(), Point::origin()]);
    }

    #[test]
    fn test_angle_route_is_orthogonal() {
        let a = EndpointShape::rect(BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        let b = EndpointShape::rect(BoundingBox::new(300.0, 100.0, 50.0, 50.0));
        let mut req = request(Some(a), Some(b));
        req.mode = RoutingMode::Angle;
        let path = arrow_points(&req);

        assert_eq!(path.len(), 3);
        // Horizontal separation dominates: leave from the bottom, enter from the left
        assert_eq!(path[0], Point::new(25.0, 50.0));
        assert_eq!(path[1], Point::new(25.0, 125.0));
        assert_eq!(path[2], Point::new(300.0, 125.0));
    }

    #[test]
    fn test_handle_bends_path() {
        let a = EndpointShape::rect(BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        let b = EndpointShape::rect(BoundingBox::new(200.0, 0.0, 50.0, 50.0));
        let mut req = request(Some(a), Some(b));
        req.handle = Some((0.0, -100.0));
        let path = arrow_points(&req);

        assert_eq!(path.len(), 3);
        assert_eq!(path[1], Point::new(125.0, -75.0));
        // Both ends now face the handle above them
        assert_eq!(path[0], Point::new(25.0, 0.0));
        assert_eq!(path[2], Point::new(225.0, 0.0));
    }

    #[test]
    fn test_self_reference_is_degenerate() {
        let a = EndpointShape::rect(BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        let path = arrow_points(&request(Some(a), Some(a)));
        assert_eq!(path.len(), 2);
        assert_eq!(path[0], path[1]);
    }

    #[test]
    fn test_path_midpoint() {
        let path = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        assert_eq!(path_midpoint(&path), Point::new(50.0, 0.0));

        let bent = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
        ];
        assert_eq!(path_midpoint(&bent), Point::new(0.0, 100.0));
        assert_eq!(path_midpoint(&[Point::new(1.0, 2.0)]), Point::new(1.0, 2.0));
    }

    #[test]
    fn test_routing_mode_from_str() {
        assert_eq!("angle".parse::<RoutingMode>(), Ok(RoutingMode::Angle));
        assert_eq!("straight".parse::<RoutingMode>(), Ok(RoutingMode::Straight));
        assert!("zigzag".parse::<RoutingMode>().is_err());
    }
}
