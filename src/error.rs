//! Error types for ingress of component records

use thiserror::Error;

use crate::component::ComponentKind;

/// Errors raised while turning external records into components.
///
/// Record-level variants reject a single record; the rest of the delivery is
/// still processed.
#[derive(Error, Debug)]
pub enum IngressError {
    /// The kind tag is not one of the known component kinds
    #[error("component '{id}': unknown kind '{kind}'")]
    UnknownKind { id: String, kind: String },

    /// The payload does not have the shape required by the kind
    #[error("component '{id}' ({kind}): malformed payload: {message}")]
    MalformedPayload {
        id: String,
        kind: ComponentKind,
        message: String,
    },

    /// The record itself is not an `{id, kind, payload}` object
    #[error("record #{index}: {message}")]
    MalformedRecord { index: usize, message: String },

    /// The delivery is not a JSON array of records
    #[error("invalid component list: {0}")]
    Json(#[from] serde_json::Error),
}

impl IngressError {
    pub fn unknown_kind(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnknownKind {
            id: id.into(),
            kind: kind.into(),
        }
    }

    pub fn malformed_payload(
        id: impl Into<String>,
        kind: ComponentKind,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedPayload {
            id: id.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn malformed_record(index: usize, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            index,
            message: message.into(),
        }
    }

    /// Id of the affected component, when known
    pub fn component_id(&self) -> Option<&str> {
        match self {
            Self::UnknownKind { id, .. } | Self::MalformedPayload { id, .. } => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_display() {
        let err = IngressError::unknown_kind("w1", "widget");
        assert_eq!(err.to_string(), "component 'w1': unknown kind 'widget'");
        assert_eq!(err.component_id(), Some("w1"));
    }

    #[test]
    fn test_malformed_payload_display() {
        let err = IngressError::malformed_payload("s1", ComponentKind::Stock, "missing field `x`");
        assert!(err.to_string().contains("(stock)"));
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_malformed_record_has_no_id() {
        let err = IngressError::malformed_record(3, "expected object");
        assert_eq!(err.component_id(), None);
        assert!(err.to_string().starts_with("record #3"));
    }
}
