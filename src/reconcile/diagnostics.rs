//! Non-fatal problems found during a reconciliation cycle

use std::fmt;

/// Category of a [`Diagnostic`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Update for an element the presentation does not have
    StaleUpdate,
    /// Delete for an element the presentation does not have
    StaleDelete,
    /// Add for an id the presentation already has
    DuplicateElement,
    /// Add or reparent under an element that does not exist
    UnknownParent,
    /// A delivered substitution cannot take effect
    IgnoredSubstitution,
    /// The loader failed for a model id
    LoadFailed,
    /// A static model reference that (transitively) contains its own model
    CircularModel,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::StaleUpdate => "stale-update",
            DiagnosticKind::StaleDelete => "stale-delete",
            DiagnosticKind::DuplicateElement => "duplicate-element",
            DiagnosticKind::UnknownParent => "unknown-parent",
            DiagnosticKind::IgnoredSubstitution => "ignored-substitution",
            DiagnosticKind::LoadFailed => "load-failed",
            DiagnosticKind::CircularModel => "circular-model",
        };
        f.write_str(name)
    }
}

/// A reportable problem attached to one component id
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub id: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    /// Build a diagnostic and log it
    pub fn new(kind: DiagnosticKind, id: impl Into<String>, message: impl Into<String>) -> Self {
        let diagnostic = Self {
            id: id.into(),
            kind,
            message: message.into(),
        };
        tracing::warn!(
            id = %diagnostic.id,
            kind = %diagnostic.kind,
            "{}",
            diagnostic.message
        );
        diagnostic
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.id, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let d = Diagnostic::new(DiagnosticKind::StaleDelete, "s9", "no element with id 's9'");
        assert_eq!(d.to_string(), "[stale-delete] s9: no element with id 's9'");
    }
}
