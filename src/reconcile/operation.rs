//! Operations emitted to the presentation side

use std::fmt;

use crate::component::Component;

/// One change to the presentation representation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create an element, at the top level or under `parent`
    Add {
        component: Component,
        parent: Option<String>,
    },
    /// Replace an element's component in place, keeping its identity
    Update(Component),
    Delete(String),
    /// Move an element under another one, or back to the top level
    Reparent { id: String, parent: Option<String> },
}

impl Operation {
    pub fn add(component: Component) -> Self {
        Operation::Add {
            component,
            parent: None,
        }
    }

    pub fn add_child(component: Component, parent: impl Into<String>) -> Self {
        Operation::Add {
            component,
            parent: Some(parent.into()),
        }
    }

    /// Id of the affected element
    pub fn id(&self) -> &str {
        match self {
            Operation::Add { component, .. } | Operation::Update(component) => component.id(),
            Operation::Delete(id) | Operation::Reparent { id, .. } => id,
        }
    }
}

/// One-line rendering used in logs and the CLI output
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add {
                component,
                parent: None,
            } => write!(f, "add {} {}", component.kind(), component.id()),
            Operation::Add {
                component,
                parent: Some(parent),
            } => write!(f, "add {} {} in {}", component.kind(), component.id(), parent),
            Operation::Update(component) => {
                write!(f, "update {} {}", component.kind(), component.id())
            }
            Operation::Delete(id) => write!(f, "delete {}", id),
            Operation::Reparent { id, parent } => {
                write!(f, "reparent {} -> {}", id, parent.as_deref().unwrap_or("(root)"))
            }
        }
    }
}
