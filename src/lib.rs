//! Stockflow Sync - component model and reconciliation for stock-and-flow diagrams
//!
//! This library holds the immutable component model of a diagram, the
//! geometry engine that places connector arrows between components, static
//! model expansion and substitution, and the engine that keeps a presentation
//! scene consistent with the component list delivered by an external store.
//!
//! # Example
//!
//! ```rust
//! use stockflow_sync::{Component, Session};
//!
//! let mut session = Session::default();
//! let report = session.receive(vec![
//!     Component::stock("s1", 100.0, 100.0, "Population"),
//!     Component::flow("f1", "s1", "p50,50"),
//! ]);
//! assert_eq!(report.operations.len(), 2);
//!
//! let path = session.geometry().arrow_points_by_id("f1").unwrap();
//! assert_eq!(path.len(), 2);
//! ```

pub mod collection;
pub mod component;
pub mod config;
pub mod error;
pub mod geometry;
pub mod lint;
pub mod reconcile;
pub mod static_model;
pub mod substitution;

pub use collection::ComponentCollection;
pub use component::ingress::{parse_records, IngressBatch};
pub use component::{Component, ComponentData, ComponentKind, Endpoint};
pub use config::{ConfigError, GeometryConfig};
pub use error::IngressError;
pub use geometry::{BoundingBox, GeometryContext, Point, RoutingMode, Side};
pub use lint::{LintCategory, LintWarning};
pub use reconcile::{reconcile, CycleReport, Diagnostic, Operation, Session, SessionState};
pub use static_model::{LoadError, LoadedModels, ModelDirectory, StaticModelLoader};
pub use substitution::{
    create_substitution, validate_substitution, SubstitutionError, SubstitutionOverlay,
};

/// Decode a JSON delivery and reconcile it against the previous one.
///
/// Records that fail to decode are skipped; the returned batch errors say
/// which.
pub fn receive_json(
    session: &mut Session,
    json: &str,
) -> Result<(CycleReport, Vec<IngressError>), IngressError> {
    let batch = parse_records(json)?;
    let report = session.receive(batch.components);
    Ok((report, batch.errors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_json_skips_bad_records() {
        let mut session = Session::default();
        let (report, errors) = receive_json(
            &mut session,
            r#"[
                {"id": "s1", "kind": "stock", "payload": {"x": 0, "y": 0, "text": "A"}},
                {"id": "w1", "kind": "widget", "payload": {}}
            ]"#,
        )
        .unwrap();
        assert_eq!(report.operations.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(session.scene().contains("s1"));
    }

    #[test]
    fn test_receive_json_rejects_non_array() {
        let mut session = Session::default();
        assert!(receive_json(&mut session, r#"{"id": "s1"}"#).is_err());
        assert_eq!(session.state(), SessionState::Empty);
    }
}
