//! Expansion of a static model reference into namespaced, translated children

use std::collections::HashSet;

use crate::collection::ComponentCollection;
use crate::component::{prefixed_id, Component, ComponentData, Endpoint};
use crate::config::GeometryConfig;
use crate::geometry::{BoundingBox, GeometryContext, Point};

use super::registry::LoadedModels;

/// Static models nested deeper than this are sized as if empty
pub const MAX_NESTING_DEPTH: usize = 6;

/// The children of one static model reference in both frames
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// Id of the reference the children were expanded under
    pub reference_id: String,
    /// Children positioned inside the reference frame; the top-left-most child
    /// sits at `(padding, padding)`
    pub relative_to_self: Vec<Component>,
    /// Children positioned on the host canvas
    pub relative_to_canvas: Vec<Component>,
    /// Frame size of the reference
    pub size: (f64, f64),
}

/// Expand `loaded` (the referenced model's components) under `reference`.
///
/// Ids are prefixed with `<reference id>/`; pointer endpoints naming a sibling
/// are rewritten the same way. Ids that already carry the prefix are left
/// alone, so feeding an expansion's self-relative output back in reproduces it.
pub fn expand(reference: &Component, loaded: &[Component], config: &GeometryConfig) -> Expansion {
    expand_in(reference, loaded, None, config, 0)
}

pub(crate) fn expand_in(
    reference: &Component,
    loaded: &[Component],
    models: Option<&LoadedModels>,
    config: &GeometryConfig,
    depth: usize,
) -> Expansion {
    let padding = config.static_model_padding;
    let origin = reference.position().unwrap_or_default();
    let min = min_corner(loaded);

    let dx = padding - min.x;
    let dy = padding - min.y;

    let siblings: HashSet<&str> = loaded.iter().map(|c| c.id()).collect();
    let namespaced: Vec<Component> = loaded
        .iter()
        .map(|c| namespace(c, reference.id(), &siblings))
        .collect();

    let relative_to_self: Vec<Component> =
        namespaced.iter().map(|c| translate(c, dx, dy)).collect();
    let relative_to_canvas: Vec<Component> = namespaced
        .iter()
        .map(|c| translate(c, dx + origin.x, dy + origin.y))
        .collect();

    let size = frame_size(&relative_to_self, models, config, depth);

    Expansion {
        reference_id: reference.id().to_string(),
        relative_to_self,
        relative_to_canvas,
        size,
    }
}

/// Smallest x and y over child positions and free-floating endpoints
fn min_corner(components: &[Component]) -> Point {
    let mut points = Vec::new();
    for c in components {
        if let Some(p) = c.position() {
            points.push(p);
        }
        if let Some((from, to)) = c.endpoints() {
            for endpoint in [from, to] {
                if let Endpoint::Point(p) = endpoint {
                    points.push(*p);
                }
            }
        }
    }

    match BoundingBox::from_points(&points) {
        Some(bb) => Point::new(bb.x, bb.y),
        None => Point::origin(),
    }
}

fn namespace(component: &Component, prefix: &str, siblings: &HashSet<&str>) -> Component {
    let rewrite = |endpoint: &Endpoint| match endpoint {
        Endpoint::Component(id) if siblings.contains(id.as_str()) => {
            Endpoint::Component(prefixed_id(prefix, id))
        }
        other => other.clone(),
    };

    let mut result = component.with_id(prefixed_id(prefix, component.id()));
    if let Some((from, to)) = component.endpoints() {
        result = result.with_endpoints(rewrite(from), rewrite(to));
    }
    if let ComponentData::Substitution(data) = result.data() {
        let mut data = data.clone();
        if siblings.contains(data.replaced_id.as_str()) {
            data.replaced_id = prefixed_id(prefix, &data.replaced_id);
        }
        if siblings.contains(data.replacement_id.as_str()) {
            data.replacement_id = prefixed_id(prefix, &data.replacement_id);
        }
        result = result.with_data(ComponentData::Substitution(data));
    }
    result
}

/// Shift positions and free-floating endpoints by a delta
pub fn translate(component: &Component, dx: f64, dy: f64) -> Component {
    if let Some(p) = component.position() {
        return component.with_position(p.offset(dx, dy));
    }

    match component.endpoints() {
        Some((from, to)) => {
            let shift = |endpoint: &Endpoint| match endpoint {
                Endpoint::Point(p) => Endpoint::Point(p.offset(dx, dy)),
                other => other.clone(),
            };
            component.with_endpoints(shift(from), shift(to))
        }
        None => component.clone(),
    }
}

fn frame_size(
    children: &[Component],
    models: Option<&LoadedModels>,
    config: &GeometryConfig,
    depth: usize,
) -> (f64, f64) {
    let collection = ComponentCollection::new(children.to_vec());
    let mut geometry = GeometryContext::new(&collection, config).at_depth(depth + 1);
    if let Some(models) = models {
        geometry = geometry.with_models(models);
    }

    match geometry.diagram_bounds() {
        Some(bounds) => {
            let padding = config.static_model_padding;
            (bounds.width + 2.0 * padding, bounds.height + 2.0 * padding)
        }
        None => config.static_model_min_size,
    }
}
