//! Geometry configuration
//!
//! Every constant the geometry engine and static model expansion depend on
//! lives here. Configurations can be built in code with the `with_*` builder
//! methods or loaded from TOML; missing keys keep their defaults.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::RoutingMode;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Reference configuration, equal to [`GeometryConfig::default`]
pub const DEFAULT_CONFIG: &str = r#"
# Component sizes (width, height)
stock_size = [100.0, 70.0]
cloud_size = [50.0, 50.0]
text_size = [80.0, 30.0]
sticky_size = [150.0, 100.0]
loop_icon_size = [30.0, 30.0]

# Anchors on text components sit this far outside the label box
text_anchor_padding = 5.0

# Distance of a synthesized endpoint from the present one
fallback_offset = 50.0

# Static model frames
static_model_padding = 20.0
static_model_min_size = [40.0, 40.0]

# Flow routing: "straight" or "angle"
flow_routing = "straight"
"#;

/// Configuration options for geometry computation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Size of a stock rectangle
    pub stock_size: (f64, f64),

    /// Size of a cloud
    pub cloud_size: (f64, f64),

    /// Label box of parameters, variables, sum variables and causal-loop vertices
    pub text_size: (f64, f64),

    /// Sticky note size when the payload does not carry one
    pub sticky_size: (f64, f64),

    /// Size of a loop icon
    pub loop_icon_size: (f64, f64),

    /// Outward padding applied to anchors on text components
    pub text_anchor_padding: f64,

    /// Offset used to place a missing pointer endpoint next to the present one
    pub fallback_offset: f64,

    /// Padding between a static model frame and its children
    pub static_model_padding: f64,

    /// Frame size of a static model with no visible children
    pub static_model_min_size: (f64, f64),

    /// Routing used for flows
    pub flow_routing: RoutingMode,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            stock_size: (100.0, 70.0),
            cloud_size: (50.0, 50.0),
            text_size: (80.0, 30.0),
            sticky_size: (150.0, 100.0),
            loop_icon_size: (30.0, 30.0),
            text_anchor_padding: 5.0,
            fallback_offset: 50.0,
            static_model_padding: 20.0,
            static_model_min_size: (40.0, 40.0),
            flow_routing: RoutingMode::Straight,
        }
    }
}

impl GeometryConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the stock size
    pub fn with_stock_size(mut self, width: f64, height: f64) -> Self {
        self.stock_size = (width, height);
        self
    }

    /// Set the label box size of text components
    pub fn with_text_size(mut self, width: f64, height: f64) -> Self {
        self.text_size = (width, height);
        self
    }

    /// Set the text anchor padding
    pub fn with_text_anchor_padding(mut self, padding: f64) -> Self {
        self.text_anchor_padding = padding;
        self
    }

    /// Set the fallback offset for missing endpoints
    pub fn with_fallback_offset(mut self, offset: f64) -> Self {
        self.fallback_offset = offset;
        self
    }

    /// Set the static model padding
    pub fn with_static_model_padding(mut self, padding: f64) -> Self {
        self.static_model_padding = padding;
        self
    }

    /// Set the minimum static model frame size
    pub fn with_static_model_min_size(mut self, width: f64, height: f64) -> Self {
        self.static_model_min_size = (width, height);
        self
    }

    /// Set the routing used for flows
    pub fn with_flow_routing(mut self, routing: RoutingMode) -> Self {
        self.flow_routing = routing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeometryConfig::default();
        assert_eq!(config.stock_size, (100.0, 70.0));
        assert_eq!(config.text_anchor_padding, 5.0);
        assert_eq!(config.fallback_offset, 50.0);
        assert_eq!(config.static_model_padding, 20.0);
        assert_eq!(config.flow_routing, RoutingMode::Straight);
    }

    #[test]
    fn test_reference_toml_matches_default() {
        let parsed = GeometryConfig::from_toml(DEFAULT_CONFIG).expect("Should parse");
        assert_eq!(parsed, GeometryConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GeometryConfig::from_toml(
            r#"
stock_size = [120.0, 80.0]
flow_routing = "angle"
"#,
        )
        .expect("Should parse");
        assert_eq!(config.stock_size, (120.0, 80.0));
        assert_eq!(config.flow_routing, RoutingMode::Angle);
        assert_eq!(config.cloud_size, (50.0, 50.0));
    }

    #[test]
    fn test_invalid_toml_error() {
        assert!(GeometryConfig::from_toml("stock_size = {{{").is_err());
        assert!(GeometryConfig::from_toml(r#"flow_routing = "zigzag""#).is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let config = GeometryConfig::new()
            .with_stock_size(10.0, 20.0)
            .with_fallback_offset(7.0)
            .with_flow_routing(RoutingMode::Angle);

        assert_eq!(config.stock_size, (10.0, 20.0));
        assert_eq!(config.fallback_offset, 7.0);
        assert_eq!(config.flow_routing, RoutingMode::Angle);
    }
}
