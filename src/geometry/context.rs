//! Geometry queries over a component collection

use crate::collection::ComponentCollection;
use crate::component::{Component, Endpoint, PointerRouting};
use crate::config::GeometryConfig;
use crate::static_model::{expand_in, LoadedModels, MAX_NESTING_DEPTH};
use crate::substitution::SubstitutionOverlay;

use super::routing::{self, path_midpoint, ArrowRequest, EndpointShape, RoutingMode};
use super::side::{relative_side, Side};
use super::types::{BoundingBox, Point};

/// Pointer chains (a connection ending on a flow ending on a flow ...) longer
/// than this leave the innermost endpoint unresolved
pub const MAX_POINTER_DEPTH: usize = 8;

/// Read-only geometry view of one collection
#[derive(Debug, Clone, Copy)]
pub struct GeometryContext<'a> {
    collection: &'a ComponentCollection,
    config: &'a GeometryConfig,
    models: Option<&'a LoadedModels>,
    substitutions: Option<&'a SubstitutionOverlay>,
    routing: RoutingMode,
    nesting_depth: usize,
}

impl<'a> GeometryContext<'a> {
    /// Flows route with the config's default mode until [`Self::with_routing`]
    pub fn new(collection: &'a ComponentCollection, config: &'a GeometryConfig) -> Self {
        Self {
            collection,
            config,
            models: None,
            substitutions: None,
            routing: config.flow_routing,
            nesting_depth: 0,
        }
    }

    /// Size static model references from their loaded contents
    pub fn with_models(mut self, models: &'a LoadedModels) -> Self {
        self.models = Some(models);
        self
    }

    /// Resolve endpoints naming a replaced component to its replacement
    pub fn with_substitutions(mut self, overlay: &'a SubstitutionOverlay) -> Self {
        self.substitutions = Some(overlay);
        self
    }

    pub fn with_routing(mut self, routing: RoutingMode) -> Self {
        self.routing = routing;
        self
    }

    pub(crate) fn at_depth(mut self, nesting_depth: usize) -> Self {
        self.nesting_depth = nesting_depth;
        self
    }

    pub fn routing(&self) -> RoutingMode {
        self.routing
    }

    pub fn collection(&self) -> &'a ComponentCollection {
        self.collection
    }

    /// Look up a component, following substitutions
    pub fn resolve(&self, id: &str) -> Option<&'a Component> {
        let effective = match self.substitutions {
            Some(overlay) => overlay.effective_id(id),
            None => id,
        };
        self.collection.get_by_id(effective)
    }

    /// Rectangle of a positioned component
    pub fn rect(&self, component: &Component) -> Option<BoundingBox> {
        let position = component.position()?;
        let (width, height) = match component.size(self.config) {
            Some(size) => size,
            None => self.static_model_size(component)?,
        };
        Some(BoundingBox::new(position.x, position.y, width, height))
    }

    fn static_model_size(&self, reference: &Component) -> Option<(f64, f64)> {
        let model_id = reference.model_id()?;
        let loaded = self.models.and_then(|models| models.get(model_id));

        match loaded {
            Some(children) if self.nesting_depth < MAX_NESTING_DEPTH => Some(
                expand_in(
                    reference,
                    children,
                    self.models,
                    self.config,
                    self.nesting_depth,
                )
                .size,
            ),
            _ => Some(self.config.static_model_min_size),
        }
    }

    /// Centre of a rectangle, or the midpoint of a pointer's path
    pub fn center(&self, component: &Component) -> Option<Point> {
        self.shape_of(component, 0).map(|shape| shape.center())
    }

    /// Anchor of a component on the given side
    pub fn anchor(&self, component: &Component, side: Side) -> Option<Point> {
        self.shape_of(component, 0).map(|shape| shape.anchor(side))
    }

    /// Side of `to` that faces `from`, by centres
    pub fn relative_side(&self, to: &Component, from: &Component) -> Option<Side> {
        Some(relative_side(self.center(to)?, self.center(from)?))
    }

    fn shape_of(&self, component: &Component, depth: usize) -> Option<EndpointShape> {
        if component.is_pointer() {
            if depth >= MAX_POINTER_DEPTH {
                return None;
            }
            let path = self.arrow_points_at(component, depth + 1);
            return Some(EndpointShape::Point(path_midpoint(&path)));
        }

        let bounds = self.rect(component)?;
        let padding = if component.kind().is_text() {
            self.config.text_anchor_padding
        } else {
            0.0
        };
        Some(EndpointShape::Rect { bounds, padding })
    }

    fn endpoint_shape(&self, endpoint: &Endpoint, depth: usize) -> Option<EndpointShape> {
        match endpoint {
            Endpoint::Point(p) => Some(EndpointShape::Point(*p)),
            Endpoint::Component(id) => self
                .resolve(id)
                .and_then(|target| self.shape_of(target, depth)),
        }
    }

    /// Path of a pointer component; empty for other kinds
    pub fn arrow_points(&self, pointer: &Component) -> Vec<Point> {
        self.arrow_points_at(pointer, 0)
    }

    pub fn arrow_points_by_id(&self, id: &str) -> Option<Vec<Point>> {
        let pointer = self.collection.get_by_id(id)?;
        pointer.is_pointer().then(|| self.arrow_points(pointer))
    }

    fn arrow_points_at(&self, pointer: &Component, depth: usize) -> Vec<Point> {
        let Some(data) = pointer.data().as_pointer() else {
            return Vec::new();
        };

        let mode = match pointer.kind().info().routing {
            PointerRouting::Session => self.routing,
            PointerRouting::Straight | PointerRouting::None => RoutingMode::Straight,
        };

        let request = ArrowRequest {
            source: self.endpoint_shape(data.from(), depth),
            target: self.endpoint_shape(data.to(), depth),
            mode,
            handle: data.handle_offset(),
            fallback_offset: self.config.fallback_offset,
        };
        routing::arrow_points(&request)
    }

    /// Extent of a visible component: its rectangle, or the hull of its path
    pub fn bounding_box(&self, component: &Component) -> Option<BoundingBox> {
        if !component.is_visible() {
            return None;
        }
        if component.is_pointer() {
            return BoundingBox::from_points(&self.arrow_points(component));
        }
        self.rect(component)
    }

    /// Union of every visible component's bounding box
    pub fn diagram_bounds(&self) -> Option<BoundingBox> {
        self.collection
            .iter()
            .filter_map(|c| self.bounding_box(c))
            .reduce(|acc, bb| acc.union(&bb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentData, ConnectionData};
    use pretty_assertions::assert_eq;

    fn collection(components: Vec<Component>) -> ComponentCollection {
        ComponentCollection::new(components)
    }

    #[test]
    fn test_flow_to_free_point() {
        let config = GeometryConfig::default();
        let c = collection(vec![
            Component::stock("s1", 100.0, 100.0, "Population"),
            Component::flow("f1", "s1", "p50,50"),
        ]);
        let geo = GeometryContext::new(&c, &config);

        let path = geo.arrow_points_by_id("f1").unwrap();
        assert_eq!(path, vec![Point::new(100.0, 135.0), Point::new(50.0, 50.0)]);
    }

    #[test]
    fn test_text_anchor_is_padded() {
        let config = GeometryConfig::default();
        let c = collection(vec![Component::parameter("p1", 0.0, 0.0, "rate")]);
        let geo = GeometryContext::new(&c, &config);
        let p1 = c.get_by_id("p1").unwrap();

        assert_eq!(geo.anchor(p1, Side::Top), Some(Point::new(40.0, -5.0)));
        assert_eq!(geo.anchor(p1, Side::Right), Some(Point::new(85.0, 15.0)));
    }

    #[test]
    fn test_missing_target_uses_placeholder() {
        let config = GeometryConfig::default();
        let c = collection(vec![
            Component::stock("s1", 0.0, 0.0, "A"),
            Component::flow("f1", "s1", "gone"),
        ]);
        let geo = GeometryContext::new(&c, &config);

        let path = geo.arrow_points_by_id("f1").unwrap();
        // Placeholder sits at centre (50, 35) + (50, 50)
        assert_eq!(path.last(), Some(&Point::new(100.0, 85.0)));
    }

    #[test]
    fn test_both_endpoints_missing() {
        let config = GeometryConfig::default();
        let c = collection(vec![Component::flow("f1", "a", "b")]);
        let geo = GeometryContext::new(&c, &config);
        assert_eq!(
            geo.arrow_points_by_id("f1").unwrap(),
            vec![Point::origin(), Point::origin()]
        );
    }

    #[test]
    fn test_angle_routing_only_for_flows() {
        let config = GeometryConfig::default();
        let c = collection(vec![
            Component::stock("a", 0.0, 0.0, "A"),
            Component::stock("b", 300.0, 200.0, "B"),
            Component::flow("f1", "a", "b"),
            Component::connection("k1", "a", "b"),
        ]);
        let geo = GeometryContext::new(&c, &config).with_routing(RoutingMode::Angle);

        assert_eq!(geo.arrow_points_by_id("f1").unwrap().len(), 3);
        assert_eq!(geo.arrow_points_by_id("k1").unwrap().len(), 2);
    }

    #[test]
    fn test_handle_bends_connection() {
        let config = GeometryConfig::default();
        let k1 = Component::new(
            "k1",
            ComponentData::Connection(ConnectionData {
                from: Endpoint::point(0.0, 0.0),
                to: Endpoint::point(100.0, 0.0),
                handle_x_offset: Some(0.0),
                handle_y_offset: Some(40.0),
            }),
        );
        let c = collection(vec![k1]);
        let geo = GeometryContext::new(&c, &config);

        assert_eq!(
            geo.arrow_points_by_id("k1").unwrap(),
            vec![
                Point::new(0.0, 0.0),
                Point::new(50.0, 40.0),
                Point::new(100.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_pointer_endpoint_anchors_at_midpoint() {
        let config = GeometryConfig::default();
        let c = collection(vec![
            Component::flow("f1", "p0,0", "p100,0"),
            Component::connection("k1", "p50,80", "f1"),
        ]);
        let geo = GeometryContext::new(&c, &config);

        let path = geo.arrow_points_by_id("k1").unwrap();
        assert_eq!(path.last(), Some(&Point::new(50.0, 0.0)));
    }

    #[test]
    fn test_self_referencing_pointer_terminates() {
        let config = GeometryConfig::default();
        let c = collection(vec![Component::connection("k1", "k1", "k1")]);
        let geo = GeometryContext::new(&c, &config);
        assert_eq!(geo.arrow_points_by_id("k1").unwrap().len(), 2);
    }

    #[test]
    fn test_static_model_unloaded_uses_min_size() {
        let config = GeometryConfig::default();
        let c = collection(vec![Component::static_model("m", 10.0, 10.0, "lib")]);
        let geo = GeometryContext::new(&c, &config);
        let m = c.get_by_id("m").unwrap();
        assert_eq!(geo.rect(m), Some(BoundingBox::new(10.0, 10.0, 40.0, 40.0)));
    }

    #[test]
    fn test_static_model_loaded_size() {
        let config = GeometryConfig::default();
        let models =
            LoadedModels::new().with_model("lib", vec![Component::stock("s", 0.0, 0.0, "S")]);
        let c = collection(vec![Component::static_model("m", 10.0, 10.0, "lib")]);
        let geo = GeometryContext::new(&c, &config).with_models(&models);
        let m = c.get_by_id("m").unwrap();
        assert_eq!(geo.rect(m), Some(BoundingBox::new(10.0, 10.0, 140.0, 110.0)));
    }

    #[test]
    fn test_self_containing_model_size_terminates() {
        let config = GeometryConfig::default();
        let models = LoadedModels::new().with_model(
            "loop",
            vec![Component::static_model("inner", 0.0, 0.0, "loop")],
        );
        let c = collection(vec![Component::static_model("m", 0.0, 0.0, "loop")]);
        let geo = GeometryContext::new(&c, &config).with_models(&models);
        assert!(geo.rect(c.get_by_id("m").unwrap()).is_some());
    }

    #[test]
    fn test_diagram_bounds_skips_invisible() {
        let config = GeometryConfig::default();
        let c = collection(vec![
            Component::stock("s1", 0.0, 0.0, "A"),
            Component::cloud("c1", 200.0, 100.0),
            Component::new(
                "sub",
                ComponentData::Substitution(crate::component::SubstitutionData {
                    replaced_id: "x".to_string(),
                    replacement_id: "y".to_string(),
                }),
            ),
        ]);
        let geo = GeometryContext::new(&c, &config);
        assert_eq!(
            geo.diagram_bounds(),
            Some(BoundingBox::new(0.0, 0.0, 250.0, 150.0))
        );
    }

    #[test]
    fn test_empty_collection_has_no_bounds() {
        let config = GeometryConfig::default();
        let c = collection(Vec::new());
        assert_eq!(GeometryContext::new(&c, &config).diagram_bounds(), None);
    }
}
