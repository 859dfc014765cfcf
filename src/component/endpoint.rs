//! Pointer endpoint encoding and identifier helpers
//!
//! An endpoint is either the id of another component or a free-floating point
//! encoded as `p<x>,<y>`. Identifiers use `/` to express containment:
//! `modelA/stock1` is `stock1` inside the static model instance `modelA`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Separator between containment segments of an identifier
pub const PATH_SEPARATOR: char = '/';

fn point_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^p(?<x>\d+),(?<y>\d+)$").expect("endpoint pattern is a valid regex")
    })
}

/// One end of a pointer component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Endpoint {
    /// Id of another component; it need not currently resolve
    Component(String),
    /// Free-floating coordinates
    Point(Point),
}

impl Endpoint {
    pub fn component(id: impl Into<String>) -> Self {
        Endpoint::Component(id.into())
    }

    pub fn point(x: f64, y: f64) -> Self {
        Endpoint::Point(Point::new(x, y))
    }

    /// Decode an endpoint string
    pub fn parse(raw: &str) -> Self {
        match parse_point(raw) {
            Some(point) => Endpoint::Point(point),
            None => Endpoint::Component(raw.to_string()),
        }
    }

    /// The referenced component id, if any
    pub fn component_id(&self) -> Option<&str> {
        match self {
            Endpoint::Component(id) => Some(id),
            Endpoint::Point(_) => None,
        }
    }

    pub fn references(&self, id: &str) -> bool {
        self.component_id() == Some(id)
    }
}

fn parse_point(raw: &str) -> Option<Point> {
    let caps = point_pattern().captures(raw)?;
    let x = caps.name("x")?.as_str().parse().ok()?;
    let y = caps.name("y")?.as_str().parse().ok()?;
    Some(Point::new(x, y))
}

impl From<String> for Endpoint {
    fn from(raw: String) -> Self {
        match parse_point(&raw) {
            Some(point) => Endpoint::Point(point),
            None => Endpoint::Component(raw),
        }
    }
}

impl From<&str> for Endpoint {
    fn from(raw: &str) -> Self {
        Endpoint::parse(raw)
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}

/// Points are written with rounded coordinates; the encoding only covers the
/// non-negative quadrant, so negative coordinates are clamped to zero.
impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Component(id) => f.write_str(id),
            Endpoint::Point(p) => write!(
                f,
                "p{},{}",
                p.x.max(0.0).round() as u64,
                p.y.max(0.0).round() as u64
            ),
        }
    }
}

/// Id of the static model instance containing `id`, `None` at the top level
pub fn containing_model(id: &str) -> Option<&str> {
    id.rsplit_once(PATH_SEPARATOR).map(|(parent, _)| parent)
}

/// Last containment segment of an id
pub fn local_id(id: &str) -> &str {
    id.rsplit_once(PATH_SEPARATOR)
        .map(|(_, local)| local)
        .unwrap_or(id)
}

/// Namespace `id` under `prefix`, leaving already-namespaced ids untouched
pub fn prefixed_id(prefix: &str, id: &str) -> String {
    if is_under(prefix, id) {
        id.to_string()
    } else {
        format!("{}{}{}", prefix, PATH_SEPARATOR, id)
    }
}

/// Whether `id` lives somewhere below the container `prefix`
pub fn is_under(prefix: &str, id: &str) -> bool {
    id.len() > prefix.len()
        && id.starts_with(prefix)
        && id[prefix.len()..].starts_with(PATH_SEPARATOR)
}
