//! Component value model
//!
//! A [`Component`] is an immutable record of one diagram element: an id and a
//! kind-specific payload. The payload enum fixes the shape for each kind, so a
//! component can never carry data that does not match its kind. Edits produce
//! new values through the `with_*` methods.

pub mod data;
pub mod endpoint;
pub mod ingress;
pub mod kind;

use serde::{Serialize, Serializer};

pub use data::*;
pub use endpoint::{containing_model, is_under, local_id, prefixed_id, Endpoint};
pub use kind::{ComponentKind, KindInfo, PointerRouting};

use crate::config::GeometryConfig;
use crate::geometry::Point;

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComponentData {
    Stock(StockData),
    Flow(FlowData),
    Parameter(ParameterData),
    Variable(VariableData),
    SumVariable(SumVariableData),
    Connection(ConnectionData),
    Cloud(CloudData),
    StaticModel(StaticModelData),
    Substitution(SubstitutionData),
    Scenario(ScenarioData),
    CldVertex(CldVertexData),
    CldLink(CldLinkData),
    StickyNote(StickyNoteData),
    LoopIcon(LoopIconData),
}

impl ComponentData {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentData::Stock(_) => ComponentKind::Stock,
            ComponentData::Flow(_) => ComponentKind::Flow,
            ComponentData::Parameter(_) => ComponentKind::Parameter,
            ComponentData::Variable(_) => ComponentKind::Variable,
            ComponentData::SumVariable(_) => ComponentKind::SumVariable,
            ComponentData::Connection(_) => ComponentKind::Connection,
            ComponentData::Cloud(_) => ComponentKind::Cloud,
            ComponentData::StaticModel(_) => ComponentKind::StaticModel,
            ComponentData::Substitution(_) => ComponentKind::Substitution,
            ComponentData::Scenario(_) => ComponentKind::Scenario,
            ComponentData::CldVertex(_) => ComponentKind::CldVertex,
            ComponentData::CldLink(_) => ComponentKind::CldLink,
            ComponentData::StickyNote(_) => ComponentKind::StickyNote,
            ComponentData::LoopIcon(_) => ComponentKind::LoopIcon,
        }
    }

    pub fn as_positioned(&self) -> Option<&dyn Positioned> {
        match self {
            ComponentData::Stock(d) => Some(d),
            ComponentData::Parameter(d) => Some(d),
            ComponentData::Variable(d) => Some(d),
            ComponentData::SumVariable(d) => Some(d),
            ComponentData::Cloud(d) => Some(d),
            ComponentData::StaticModel(d) => Some(d),
            ComponentData::CldVertex(d) => Some(d),
            ComponentData::StickyNote(d) => Some(d),
            ComponentData::LoopIcon(d) => Some(d),
            ComponentData::Flow(_)
            | ComponentData::Connection(_)
            | ComponentData::CldLink(_)
            | ComponentData::Substitution(_)
            | ComponentData::Scenario(_) => None,
        }
    }

    fn as_positioned_mut(&mut self) -> Option<&mut dyn Positioned> {
        match self {
            ComponentData::Stock(d) => Some(d),
            ComponentData::Parameter(d) => Some(d),
            ComponentData::Variable(d) => Some(d),
            ComponentData::SumVariable(d) => Some(d),
            ComponentData::Cloud(d) => Some(d),
            ComponentData::StaticModel(d) => Some(d),
            ComponentData::CldVertex(d) => Some(d),
            ComponentData::StickyNote(d) => Some(d),
            ComponentData::LoopIcon(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<&dyn Named> {
        match self {
            ComponentData::Stock(d) => Some(d),
            ComponentData::Flow(d) => Some(d),
            ComponentData::Parameter(d) => Some(d),
            ComponentData::Variable(d) => Some(d),
            ComponentData::SumVariable(d) => Some(d),
            ComponentData::CldVertex(d) => Some(d),
            ComponentData::StickyNote(d) => Some(d),
            ComponentData::LoopIcon(d) => Some(d),
            _ => None,
        }
    }

    fn as_named_mut(&mut self) -> Option<&mut dyn Named> {
        match self {
            ComponentData::Stock(d) => Some(d),
            ComponentData::Flow(d) => Some(d),
            ComponentData::Parameter(d) => Some(d),
            ComponentData::Variable(d) => Some(d),
            ComponentData::SumVariable(d) => Some(d),
            ComponentData::CldVertex(d) => Some(d),
            ComponentData::StickyNote(d) => Some(d),
            ComponentData::LoopIcon(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&dyn Pointer> {
        match self {
            ComponentData::Flow(d) => Some(d),
            ComponentData::Connection(d) => Some(d),
            ComponentData::CldLink(d) => Some(d),
            _ => None,
        }
    }

    fn as_pointer_mut(&mut self) -> Option<&mut dyn Pointer> {
        match self {
            ComponentData::Flow(d) => Some(d),
            ComponentData::Connection(d) => Some(d),
            ComponentData::CldLink(d) => Some(d),
            _ => None,
        }
    }

    /// Rectangle size for kinds with a fixed size; static models are sized by
    /// their children and are not covered here
    pub fn as_dimensioned(&self) -> Option<&dyn Dimensioned> {
        match self {
            ComponentData::Stock(d) => Some(d),
            ComponentData::Parameter(d) => Some(d),
            ComponentData::Variable(d) => Some(d),
            ComponentData::SumVariable(d) => Some(d),
            ComponentData::Cloud(d) => Some(d),
            ComponentData::CldVertex(d) => Some(d),
            ComponentData::StickyNote(d) => Some(d),
            ComponentData::LoopIcon(d) => Some(d),
            _ => None,
        }
    }
}

/// One diagram element
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    id: String,
    data: ComponentData,
}

impl Component {
    pub fn new(id: impl Into<String>, data: ComponentData) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ComponentKind {
        self.data.kind()
    }

    pub fn data(&self) -> &ComponentData {
        &self.data
    }

    pub fn is_pointer(&self) -> bool {
        self.kind().is_pointer()
    }

    pub fn is_visible(&self) -> bool {
        self.kind().is_visible()
    }

    /// Top-left position, for positioned kinds
    pub fn position(&self) -> Option<Point> {
        self.data.as_positioned().map(|p| p.position())
    }

    pub fn text(&self) -> Option<&str> {
        self.data.as_named().map(|n| n.text())
    }

    /// `(from, to)` for pointer kinds
    pub fn endpoints(&self) -> Option<(&Endpoint, &Endpoint)> {
        self.data.as_pointer().map(|p| (p.from(), p.to()))
    }

    /// Whether either endpoint names `id`
    pub fn points_at(&self, id: &str) -> bool {
        self.endpoints()
            .is_some_and(|(from, to)| from.references(id) || to.references(id))
    }

    pub fn size(&self, config: &GeometryConfig) -> Option<(f64, f64)> {
        self.data.as_dimensioned().map(|d| d.size(config))
    }

    /// Same id, new payload
    pub fn with_data(&self, data: ComponentData) -> Component {
        Component::new(self.id.clone(), data)
    }

    /// Same payload, new id
    pub fn with_id(&self, id: impl Into<String>) -> Component {
        Component::new(id, self.data.clone())
    }

    /// Copy moved to a new position; non-positioned kinds are returned unchanged
    pub fn with_position(&self, position: Point) -> Component {
        let mut data = self.data.clone();
        if let Some(p) = data.as_positioned_mut() {
            p.set_position(position);
        }
        self.with_data(data)
    }

    /// Copy with a new label; unlabeled kinds are returned unchanged
    pub fn with_text(&self, text: impl Into<String>) -> Component {
        let mut data = self.data.clone();
        if let Some(n) = data.as_named_mut() {
            n.set_text(text.into());
        }
        self.with_data(data)
    }

    /// Copy with new endpoints; non-pointer kinds are returned unchanged
    pub fn with_endpoints(&self, from: Endpoint, to: Endpoint) -> Component {
        let mut data = self.data.clone();
        if let Some(p) = data.as_pointer_mut() {
            p.set_endpoints(from, to);
        }
        self.with_data(data)
    }

    pub fn stock(id: impl Into<String>, x: f64, y: f64, text: impl Into<String>) -> Self {
        Self::new(
            id,
            ComponentData::Stock(StockData {
                x,
                y,
                text: text.into(),
                initial_value: String::new(),
            }),
        )
    }

    pub fn parameter(id: impl Into<String>, x: f64, y: f64, text: impl Into<String>) -> Self {
        Self::new(
            id,
            ComponentData::Parameter(ParameterData {
                x,
                y,
                text: text.into(),
                value: String::new(),
            }),
        )
    }

    pub fn variable(id: impl Into<String>, x: f64, y: f64, text: impl Into<String>) -> Self {
        Self::new(
            id,
            ComponentData::Variable(VariableData {
                x,
                y,
                text: text.into(),
                value: String::new(),
            }),
        )
    }

    pub fn cloud(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self::new(id, ComponentData::Cloud(CloudData { x, y }))
    }

    pub fn flow(id: impl Into<String>, from: impl Into<Endpoint>, to: impl Into<Endpoint>) -> Self {
        Self::new(
            id,
            ComponentData::Flow(FlowData {
                from: from.into(),
                to: to.into(),
                text: String::new(),
                equation: String::new(),
            }),
        )
    }

    pub fn connection(
        id: impl Into<String>,
        from: impl Into<Endpoint>,
        to: impl Into<Endpoint>,
    ) -> Self {
        Self::new(
            id,
            ComponentData::Connection(ConnectionData {
                from: from.into(),
                to: to.into(),
                handle_x_offset: None,
                handle_y_offset: None,
            }),
        )
    }

    pub fn static_model(
        id: impl Into<String>,
        x: f64,
        y: f64,
        model_id: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            ComponentData::StaticModel(StaticModelData {
                x,
                y,
                model_id: model_id.into(),
                color: String::new(),
            }),
        )
    }

    /// The id of the referenced model, for static model references
    pub fn model_id(&self) -> Option<&str> {
        match &self.data {
            ComponentData::StaticModel(d) => Some(&d.model_id),
            _ => None,
        }
    }

    /// `(replaced, replacement)` for substitutions
    pub fn substitution_ids(&self) -> Option<(&str, &str)> {
        match &self.data {
            ComponentData::Substitution(d) => Some((&d.replaced_id, &d.replacement_id)),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct RecordRef<'a> {
    id: &'a str,
    kind: ComponentKind,
    payload: &'a ComponentData,
}

/// Serializes as the wire record `{id, kind, payload}`
impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RecordRef {
            id: &self.id,
            kind: self.kind(),
            payload: &self.data,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_position_is_a_new_value() {
        let s = Component::stock("s1", 10.0, 20.0, "Population");
        let moved = s.with_position(Point::new(30.0, 40.0));
        assert_eq!(s.position(), Some(Point::new(10.0, 20.0)));
        assert_eq!(moved.position(), Some(Point::new(30.0, 40.0)));
        assert_eq!(moved.id(), "s1");
        assert_ne!(s, moved);
    }

    #[test]
    fn test_with_position_ignores_pointers() {
        let f = Component::flow("f1", "a", "b");
        assert_eq!(f.with_position(Point::new(1.0, 1.0)), f);
    }

    #[test]
    fn test_with_text_and_endpoints() {
        let f = Component::flow("f1", "a", "b").with_text("births");
        assert_eq!(f.text(), Some("births"));
        let rewired = f.with_endpoints(Endpoint::component("c"), Endpoint::point(5.0, 5.0));
        assert_eq!(
            rewired.endpoints(),
            Some((&Endpoint::component("c"), &Endpoint::point(5.0, 5.0)))
        );
        assert_eq!(rewired.text(), Some("births"));
    }

    #[test]
    fn test_points_at() {
        let c = Component::connection("c1", "s1", "p5,5");
        assert!(c.points_at("s1"));
        assert!(!c.points_at("p5,5"));
        assert!(!Component::stock("s1", 0.0, 0.0, "").points_at("s1"));
    }

    #[test]
    fn test_serialize_record() {
        let c = Component::connection("c1", "s1", "p5,5");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "c1",
                "kind": "connection",
                "payload": { "from": "s1", "to": "p5,5" }
            })
        );
    }
}
