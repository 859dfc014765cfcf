//! Kind-specific payload records and capability traits

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GeometryConfig;
use crate::geometry::Point;

use super::endpoint::Endpoint;

/// Components with a top-left position
pub trait Positioned {
    fn position(&self) -> Point;
    fn set_position(&mut self, position: Point);
}

/// Components carrying a label
pub trait Named {
    fn text(&self) -> &str;
    fn set_text(&mut self, text: String);
}

/// Components connecting two endpoints
pub trait Pointer {
    fn from(&self) -> &Endpoint;
    fn to(&self) -> &Endpoint;
    fn set_endpoints(&mut self, from: Endpoint, to: Endpoint);

    /// Offset of a dragged handle from the straight path's midpoint
    fn handle_offset(&self) -> Option<(f64, f64)> {
        None
    }
}

/// Components with a fixed rectangle size
pub trait Dimensioned {
    fn size(&self, config: &GeometryConfig) -> (f64, f64);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockData {
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(default)]
    pub initial_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterData {
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableData {
    pub x: f64,
    pub y: f64,
    pub text: String,
    /// Equation text
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SumVariableData {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CldVertexData {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudData {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickyNoteData {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopIconData {
    pub x: f64,
    pub y: f64,
    /// Loop polarity label, e.g. "R" or "B"
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticModelData {
    pub x: f64,
    pub y: f64,
    pub model_id: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowData {
    pub from: Endpoint,
    pub to: Endpoint,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub equation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionData {
    pub from: Endpoint,
    pub to: Endpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_x_offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_y_offset: Option<f64>,
}

/// Causal-loop link polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Polarity {
    #[default]
    #[serde(rename = "+")]
    Positive,
    #[serde(rename = "-")]
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CldLinkData {
    pub from: Endpoint,
    pub to: Endpoint,
    #[serde(default)]
    pub polarity: Polarity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_x_offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_y_offset: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionData {
    pub replaced_id: String,
    pub replacement_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioData {
    pub name: String,
    #[serde(default)]
    pub param_overrides: BTreeMap<String, String>,
}

impl ScenarioData {
    /// Overridden value of a parameter under this scenario
    pub fn override_for(&self, param_name: &str) -> Option<&str> {
        self.param_overrides.get(param_name).map(|v| v.as_str())
    }
}

macro_rules! impl_positioned {
    ($($ty:ty),* $(,)?) => {
        $(impl Positioned for $ty {
            fn position(&self) -> Point {
                Point::new(self.x, self.y)
            }

            fn set_position(&mut self, position: Point) {
                self.x = position.x;
                self.y = position.y;
            }
        })*
    };
}

macro_rules! impl_named {
    ($($ty:ty),* $(,)?) => {
        $(impl Named for $ty {
            fn text(&self) -> &str {
                &self.text
            }

            fn set_text(&mut self, text: String) {
                self.text = text;
            }
        })*
    };
}

macro_rules! impl_pointer {
    ($ty:ty, handle) => {
        impl_pointer!($ty, |s: &$ty| s.handle_x_offset.zip(s.handle_y_offset));
    };
    ($ty:ty, $handle:expr) => {
        impl Pointer for $ty {
            fn from(&self) -> &Endpoint {
                &self.from
            }

            fn to(&self) -> &Endpoint {
                &self.to
            }

            fn set_endpoints(&mut self, from: Endpoint, to: Endpoint) {
                self.from = from;
                self.to = to;
            }

            fn handle_offset(&self) -> Option<(f64, f64)> {
                ($handle)(self)
            }
        }
    };
}

impl_positioned!(
    StockData,
    ParameterData,
    VariableData,
    SumVariableData,
    CldVertexData,
    CloudData,
    StickyNoteData,
    LoopIconData,
    StaticModelData,
);

impl_named!(
    StockData,
    ParameterData,
    VariableData,
    SumVariableData,
    CldVertexData,
    StickyNoteData,
    LoopIconData,
    FlowData,
);

impl_pointer!(FlowData, |_: &FlowData| None);
impl_pointer!(ConnectionData, handle);
impl_pointer!(CldLinkData, handle);

impl Dimensioned for StockData {
    fn size(&self, config: &GeometryConfig) -> (f64, f64) {
        config.stock_size
    }
}

impl Dimensioned for CloudData {
    fn size(&self, config: &GeometryConfig) -> (f64, f64) {
        config.cloud_size
    }
}

impl Dimensioned for LoopIconData {
    fn size(&self, config: &GeometryConfig) -> (f64, f64) {
        config.loop_icon_size
    }
}

impl Dimensioned for StickyNoteData {
    fn size(&self, config: &GeometryConfig) -> (f64, f64) {
        (
            self.width.unwrap_or(config.sticky_size.0),
            self.height.unwrap_or(config.sticky_size.1),
        )
    }
}

macro_rules! impl_text_size {
    ($($ty:ty),* $(,)?) => {
        $(impl Dimensioned for $ty {
            fn size(&self, config: &GeometryConfig) -> (f64, f64) {
                config.text_size
            }
        })*
    };
}

impl_text_size!(ParameterData, VariableData, SumVariableData, CldVertexData);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_requires_both_offsets() {
        let mut conn = ConnectionData {
            from: Endpoint::component("a"),
            to: Endpoint::component("b"),
            handle_x_offset: Some(10.0),
            handle_y_offset: None,
        };
        assert_eq!(conn.handle_offset(), None);
        conn.handle_y_offset = Some(-4.0);
        assert_eq!(conn.handle_offset(), Some((10.0, -4.0)));
    }

    #[test]
    fn test_sticky_size_defaults() {
        let config = GeometryConfig::default();
        let note = StickyNoteData {
            x: 0.0,
            y: 0.0,
            text: String::new(),
            width: Some(300.0),
            height: None,
        };
        assert_eq!(note.size(&config), (300.0, 100.0));
    }

    #[test]
    fn test_payload_wire_names() {
        let json = serde_json::json!({
            "x": 1.0, "y": 2.0, "modelId": "m1", "color": "red"
        });
        let data: StaticModelData = serde_json::from_value(json).unwrap();
        assert_eq!(data.model_id, "m1");

        let link: CldLinkData = serde_json::from_value(serde_json::json!({
            "from": "a", "to": "p10,20", "polarity": "-"
        }))
        .unwrap();
        assert_eq!(link.polarity, Polarity::Negative);
        assert_eq!(link.to, Endpoint::point(10.0, 20.0));
    }

    #[test]
    fn test_scenario_override() {
        let scenario = ScenarioData {
            name: "high growth".to_string(),
            param_overrides: [("rate".to_string(), "0.3".to_string())].into(),
        };
        assert_eq!(scenario.override_for("rate"), Some("0.3"));
        assert_eq!(scenario.override_for("other"), None);
    }
}
