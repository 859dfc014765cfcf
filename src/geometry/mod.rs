//! Geometry and routing engine
//!
//! Pure functions over points and rectangles (`types`, `side`, `routing`) and a
//! [`GeometryContext`] that answers anchor, bounding box and arrow path queries
//! for components of a collection. Nothing here is cached: every query is
//! recomputed from the current collection.

mod context;
pub mod routing;
pub mod side;
pub mod types;

pub use context::{GeometryContext, MAX_POINTER_DEPTH};
pub use routing::{arrow_points, path_midpoint, ArrowRequest, EndpointShape, RoutingMode};
pub use side::{
    angle_relative_side, attachment_point, padded_attachment_point, relative_side, Side,
    AXIS_EPSILON,
};
pub use types::{BoundingBox, Point};
