//! Lint checks for component lists.
//!
//! Warnings never block reconciliation; they are advisory findings a
//! front-end may surface next to the affected component.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::collection::ComponentCollection;
use crate::component::{Component, ComponentData, ComponentKind, Endpoint};

/// A lint warning attached to one component
#[derive(Debug, Clone, PartialEq)]
pub struct LintWarning {
    pub category: LintCategory,
    pub id: String,
    pub message: String,
}

/// Category of lint finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintCategory {
    DuplicateName,
    NumericLiteral,
    DanglingEndpoint,
    SelfReference,
}

impl fmt::Display for LintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintCategory::DuplicateName => write!(f, "duplicate-name"),
            LintCategory::NumericLiteral => write!(f, "numeric-literal"),
            LintCategory::DanglingEndpoint => write!(f, "dangling-endpoint"),
            LintCategory::SelfReference => write!(f, "self-reference"),
        }
    }
}

/// Kinds whose labels name model quantities and must be unique
const NAMED_KINDS: [ComponentKind; 5] = [
    ComponentKind::Stock,
    ComponentKind::Flow,
    ComponentKind::Parameter,
    ComponentKind::Variable,
    ComponentKind::SumVariable,
];

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[-+]?(0|[1-9]\d*)(\.\d+)?([eE][-+]?\d+)?$")
            .expect("number pattern is a valid regex")
    })
}

/// Run all lint checks on a collection.
pub fn check(collection: &ComponentCollection) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    check_duplicate_names(collection, &mut warnings);
    check_numeric_literals(collection, &mut warnings);
    check_pointers(collection, &mut warnings);
    warnings
}

/// Case-insensitive, with runs of whitespace and underscores folded to one space
fn normalize_name(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

fn check_duplicate_names(collection: &ComponentCollection, warnings: &mut Vec<LintWarning>) {
    let mut first_by_name: HashMap<String, &str> = HashMap::new();

    for component in collection.iter() {
        if !NAMED_KINDS.contains(&component.kind()) {
            continue;
        }
        let Some(text) = component.text() else {
            continue;
        };
        let name = normalize_name(text);
        if name.is_empty() {
            continue;
        }

        match first_by_name.get(&name) {
            Some(first) => warnings.push(LintWarning {
                category: LintCategory::DuplicateName,
                id: component.id().to_string(),
                message: format!("name \"{}\" is already used by '{}'", text, first),
            }),
            None => {
                first_by_name.insert(name, component.id());
            }
        }
    }
}

/// Values made only of number characters; anything with other letters or
/// operators is an equation and is not checked here
fn looks_numeric(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

fn literal_value(component: &Component) -> Option<&str> {
    match component.data() {
        ComponentData::Parameter(d) => Some(&d.value),
        ComponentData::Stock(d) => Some(&d.initial_value),
        _ => None,
    }
}

fn check_numeric_literals(collection: &ComponentCollection, warnings: &mut Vec<LintWarning>) {
    for component in collection.iter() {
        let Some(value) = literal_value(component).map(str::trim) else {
            continue;
        };
        if looks_numeric(value) && !number_pattern().is_match(value) {
            warnings.push(LintWarning {
                category: LintCategory::NumericLiteral,
                id: component.id().to_string(),
                message: format!("\"{}\" is not a valid number", value),
            });
        }
    }
}

fn check_pointers(collection: &ComponentCollection, warnings: &mut Vec<LintWarning>) {
    for pointer in collection.pointer_components() {
        let Some((from, to)) = pointer.endpoints() else {
            continue;
        };

        if let (Endpoint::Component(a), Endpoint::Component(b)) = (from, to) {
            if a == b {
                warnings.push(LintWarning {
                    category: LintCategory::SelfReference,
                    id: pointer.id().to_string(),
                    message: format!("{} starts and ends at '{}'", pointer.kind(), a),
                });
            }
        }

        for (end, endpoint) in [("source", from), ("target", to)] {
            if let Some(id) = endpoint.component_id() {
                if !collection.contains(id) {
                    warnings.push(LintWarning {
                        category: LintCategory::DanglingEndpoint,
                        id: pointer.id().to_string(),
                        message: format!("{} '{}' does not exist", end, id),
                    });
                }
            }
        }
    }
}
