//! Substitutions: presenting one component as a child of another
//!
//! A substitution `{replacedId, replacementId}` hides the replaced component
//! from the top level and shows it under the replacement instead. Only the
//! presentation parentage changes; the replaced record keeps its id and payload.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

use crate::collection::ComponentCollection;
use crate::component::{containing_model, Component, ComponentData, ComponentKind, SubstitutionData};

/// Reasons a substitution may not be created
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubstitutionError {
    #[error("component '{id}' cannot be substituted for itself")]
    SelfReference { id: String },

    #[error("cannot substitute {replaced_kind} '{replaced}' with {replacement_kind} '{replacement}'")]
    KindMismatch {
        replaced: String,
        replaced_kind: ComponentKind,
        replacement: String,
        replacement_kind: ComponentKind,
    },

    #[error("{kind} '{id}' cannot take part in a substitution")]
    NotIdentifiable { id: String, kind: ComponentKind },

    #[error("'{replaced}' and '{replacement}' belong to the same model")]
    SameModel {
        replaced: String,
        replacement: String,
    },
}

/// Check that `replaced` may be presented under `replacement`
pub fn validate_substitution(
    replaced: &Component,
    replacement: &Component,
) -> Result<(), SubstitutionError> {
    if replaced.id() == replacement.id() {
        return Err(SubstitutionError::SelfReference {
            id: replaced.id().to_string(),
        });
    }

    if replaced.kind() != replacement.kind() {
        return Err(SubstitutionError::KindMismatch {
            replaced: replaced.id().to_string(),
            replaced_kind: replaced.kind(),
            replacement: replacement.id().to_string(),
            replacement_kind: replacement.kind(),
        });
    }

    // Both kinds are equal past this point
    if !replaced.kind().is_identifiable() {
        return Err(SubstitutionError::NotIdentifiable {
            id: replaced.id().to_string(),
            kind: replaced.kind(),
        });
    }

    if containing_model(replaced.id()) == containing_model(replacement.id()) {
        return Err(SubstitutionError::SameModel {
            replaced: replaced.id().to_string(),
            replacement: replacement.id().to_string(),
        });
    }

    Ok(())
}

/// Build a substitution component after validating its endpoints
pub fn create_substitution(
    id: impl Into<String>,
    replaced: &Component,
    replacement: &Component,
) -> Result<Component, SubstitutionError> {
    validate_substitution(replaced, replacement)?;
    Ok(Component::new(
        id,
        ComponentData::Substitution(SubstitutionData {
            replaced_id: replaced.id().to_string(),
            replacement_id: replacement.id().to_string(),
        }),
    ))
}

/// A substitution in effect
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedSubstitution {
    pub substitution_id: String,
    pub replaced_id: String,
    pub replacement_id: String,
}

/// Why a delivered substitution has no effect
#[derive(Debug, Clone, PartialEq)]
pub enum IgnoreReason {
    MissingReplaced(String),
    MissingReplacement(String),
    /// The replaced component is already replaced by an earlier substitution
    Conflicting(String),
    /// The replacement is itself replaced, or the replaced component is itself
    /// a replacement
    Chained,
    Invalid(SubstitutionError),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::MissingReplaced(id) => write!(f, "replaced component '{}' not found", id),
            IgnoreReason::MissingReplacement(id) => {
                write!(f, "replacement component '{}' not found", id)
            }
            IgnoreReason::Conflicting(other) => {
                write!(f, "component is already replaced by substitution '{}'", other)
            }
            IgnoreReason::Chained => f.write_str("substitutions cannot be chained"),
            IgnoreReason::Invalid(err) => write!(f, "{}", err),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IgnoredSubstitution {
    pub substitution_id: String,
    pub reason: IgnoreReason,
}

/// The effective parentage implied by the substitutions of a collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstitutionOverlay {
    /// Keyed by replaced id
    applied: BTreeMap<String, AppliedSubstitution>,
    /// Source order of `applied`
    order: Vec<String>,
    ignored: Vec<IgnoredSubstitution>,
}

impl SubstitutionOverlay {
    pub fn from_collection(collection: &ComponentCollection) -> Self {
        let mut overlay = Self::default();

        for sub in collection.substitutions() {
            let Some((replaced_id, replacement_id)) = sub.substitution_ids() else {
                continue;
            };

            let checked = match (
                collection.get_by_id(replaced_id),
                collection.get_by_id(replacement_id),
            ) {
                (None, _) => Err(IgnoreReason::MissingReplaced(replaced_id.to_string())),
                (_, None) => Err(IgnoreReason::MissingReplacement(replacement_id.to_string())),
                (Some(replaced), Some(replacement)) => {
                    validate_substitution(replaced, replacement).map_err(IgnoreReason::Invalid)
                }
            }
            .and_then(|()| match overlay.applied.get(replaced_id) {
                Some(existing) => Err(IgnoreReason::Conflicting(existing.substitution_id.clone())),
                None => Ok(()),
            });

            match checked {
                Ok(()) => {
                    overlay.order.push(replaced_id.to_string());
                    overlay.applied.insert(
                        replaced_id.to_string(),
                        AppliedSubstitution {
                            substitution_id: sub.id().to_string(),
                            replaced_id: replaced_id.to_string(),
                            replacement_id: replacement_id.to_string(),
                        },
                    );
                }
                Err(reason) => overlay.ignore(sub.id(), reason),
            }
        }

        overlay.drop_chains();
        overlay
    }

    fn ignore(&mut self, substitution_id: &str, reason: IgnoreReason) {
        tracing::debug!(substitution_id, %reason, "ignoring substitution");
        self.ignored.push(IgnoredSubstitution {
            substitution_id: substitution_id.to_string(),
            reason,
        });
    }

    /// A replacement that is itself replaced would need two levels of
    /// re-parenting; every link of such a chain is dropped
    fn drop_chains(&mut self) {
        let replacements: BTreeSet<&str> = self
            .applied
            .values()
            .map(|a| a.replacement_id.as_str())
            .collect();

        let chained: Vec<String> = self
            .applied
            .values()
            .filter(|a| {
                self.applied.contains_key(&a.replacement_id)
                    || replacements.contains(a.replaced_id.as_str())
            })
            .map(|a| a.replaced_id.clone())
            .collect();

        for replaced_id in chained {
            if let Some(removed) = self.applied.remove(&replaced_id) {
                self.order.retain(|id| *id != replaced_id);
                self.ignore(&removed.substitution_id, IgnoreReason::Chained);
            }
        }
    }

    /// Substitutions in effect, in source order
    pub fn applied(&self) -> impl Iterator<Item = &AppliedSubstitution> {
        self.order.iter().filter_map(|id| self.applied.get(id))
    }

    pub fn ignored(&self) -> &[IgnoredSubstitution] {
        &self.ignored
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    /// Whether `id` is hidden from the top level
    pub fn is_replaced(&self, id: &str) -> bool {
        self.applied.contains_key(id)
    }

    /// Presentation parent imposed on `id`, if it is replaced
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.applied.get(id).map(|a| a.replacement_id.as_str())
    }

    /// The id whose geometry stands in for `id`
    pub fn effective_id<'s>(&'s self, id: &'s str) -> &'s str {
        self.parent_of(id).unwrap_or(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sub(id: &str, replaced: &str, replacement: &str) -> Component {
        Component::new(
            id,
            ComponentData::Substitution(SubstitutionData {
                replaced_id: replaced.to_string(),
                replacement_id: replacement.to_string(),
            }),
        )
    }

    #[test]
    fn test_validate_rejects_self_reference() {
        let s = Component::stock("m/s1", 0.0, 0.0, "A");
        assert!(matches!(
            validate_substitution(&s, &s),
            Err(SubstitutionError::SelfReference { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_kind_mismatch() {
        let a = Component::stock("m/a", 0.0, 0.0, "A");
        let b = Component::parameter("b", 0.0, 0.0, "B");
        let err = validate_substitution(&a, &b).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot substitute stock 'm/a' with parameter 'b'"
        );
    }

    #[test]
    fn test_validate_rejects_non_identifiable() {
        let a = Component::flow("m/f", "x", "y");
        let b = Component::flow("f", "x", "y");
        assert!(matches!(
            validate_substitution(&a, &b),
            Err(SubstitutionError::NotIdentifiable {
                kind: ComponentKind::Flow,
                ..
            })
        ));

        let a = Component::static_model("m/inner", 0.0, 0.0, "lib");
        let b = Component::static_model("other", 0.0, 0.0, "lib");
        assert!(validate_substitution(&a, &b).is_err());
    }

    #[test]
    fn test_validate_rejects_same_model() {
        let a = Component::stock("a", 0.0, 0.0, "A");
        let b = Component::stock("b", 0.0, 0.0, "B");
        assert!(matches!(
            validate_substitution(&a, &b),
            Err(SubstitutionError::SameModel { .. })
        ));

        let a = Component::stock("m/a", 0.0, 0.0, "A");
        let b = Component::stock("m/b", 0.0, 0.0, "B");
        assert!(validate_substitution(&a, &b).is_err());
    }

    #[test]
    fn test_create_substitution() {
        let a = Component::stock("m/a", 0.0, 0.0, "A");
        let b = Component::stock("b", 0.0, 0.0, "B");
        let s = create_substitution("sub1", &a, &b).unwrap();
        assert_eq!(s.kind(), ComponentKind::Substitution);
        assert_eq!(s.substitution_ids(), Some(("m/a", "b")));
    }

    #[test]
    fn test_overlay_effective_ids() {
        let c = ComponentCollection::new(vec![
            Component::stock("m/a", 0.0, 0.0, "A"),
            Component::stock("b", 0.0, 0.0, "B"),
            sub("sub1", "m/a", "b"),
        ]);
        let overlay = SubstitutionOverlay::from_collection(&c);

        assert!(overlay.is_replaced("m/a"));
        assert_eq!(overlay.parent_of("m/a"), Some("b"));
        assert_eq!(overlay.effective_id("m/a"), "b");
        assert_eq!(overlay.effective_id("b"), "b");
        assert!(overlay.ignored().is_empty());
    }

    #[test]
    fn test_overlay_ignores_missing_and_conflicting() {
        let c = ComponentCollection::new(vec![
            Component::stock("m/a", 0.0, 0.0, "A"),
            Component::stock("b", 0.0, 0.0, "B"),
            Component::stock("c", 0.0, 0.0, "C"),
            sub("sub1", "m/a", "b"),
            sub("sub2", "m/a", "c"),
            sub("sub3", "gone", "b"),
        ]);
        let overlay = SubstitutionOverlay::from_collection(&c);

        assert_eq!(overlay.applied().count(), 1);
        let reasons: Vec<(&str, &IgnoreReason)> = overlay
            .ignored()
            .iter()
            .map(|i| (i.substitution_id.as_str(), &i.reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("sub2", &IgnoreReason::Conflicting("sub1".to_string())),
                ("sub3", &IgnoreReason::MissingReplaced("gone".to_string())),
            ]
        );
    }

    #[test]
    fn test_overlay_drops_chains() {
        let c = ComponentCollection::new(vec![
            Component::stock("m/a", 0.0, 0.0, "A"),
            Component::stock("b", 0.0, 0.0, "B"),
            Component::stock("n/c", 0.0, 0.0, "C"),
            sub("sub1", "m/a", "b"),
            sub("sub2", "b", "n/c"),
        ]);
        let overlay = SubstitutionOverlay::from_collection(&c);
        assert!(overlay.is_empty());
        assert_eq!(overlay.ignored().len(), 2);
    }

    #[test]
    fn test_overlay_rejects_invalid_delivery() {
        let c = ComponentCollection::new(vec![
            Component::stock("m/a", 0.0, 0.0, "A"),
            Component::cloud("b", 0.0, 0.0),
            sub("sub1", "m/a", "b"),
        ]);
        let overlay = SubstitutionOverlay::from_collection(&c);
        assert!(overlay.is_empty());
        assert!(matches!(
            overlay.ignored()[0].reason,
            IgnoreReason::Invalid(SubstitutionError::KindMismatch { .. })
        ));
    }
}
