//! Indexed view over a flat component list

use std::collections::HashMap;

use crate::component::{Component, ComponentKind};
use crate::config::GeometryConfig;
use crate::static_model::{expand_in, LoadedModels};

/// An ordered, id-indexed set of components.
///
/// Ids are unique: when the input repeats an id the last record wins and keeps
/// the slot of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentCollection {
    components: Vec<Component>,
    index: HashMap<String, usize>,
}

impl ComponentCollection {
    pub fn new(components: Vec<Component>) -> Self {
        let mut collection = Self {
            components: Vec::with_capacity(components.len()),
            index: HashMap::with_capacity(components.len()),
        };

        for component in components {
            match collection.index.get(component.id()) {
                Some(&slot) => {
                    tracing::warn!(id = component.id(), "duplicate component id, keeping the last record");
                    collection.components[slot] = component;
                }
                None => {
                    collection
                        .index
                        .insert(component.id().to_string(), collection.components.len());
                    collection.components.push(component);
                }
            }
        }

        collection
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    pub fn as_slice(&self) -> &[Component] {
        &self.components
    }

    pub fn find<P>(&self, mut predicate: P) -> Option<&Component>
    where
        P: FnMut(&Component) -> bool,
    {
        self.components.iter().find(|c| predicate(c))
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Component> {
        self.index.get(id).map(|&slot| &self.components[slot])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.id())
    }

    /// Components of one kind, in collection order
    pub fn of_kind(&self, kind: ComponentKind) -> Vec<&Component> {
        self.components.iter().filter(|c| c.kind() == kind).collect()
    }

    pub fn stocks(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::Stock)
    }

    pub fn flows(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::Flow)
    }

    pub fn parameters(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::Parameter)
    }

    pub fn variables(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::Variable)
    }

    pub fn sum_variables(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::SumVariable)
    }

    pub fn connections(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::Connection)
    }

    pub fn clouds(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::Cloud)
    }

    pub fn static_models(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::StaticModel)
    }

    pub fn substitutions(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::Substitution)
    }

    pub fn scenarios(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::Scenario)
    }

    pub fn cld_vertices(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::CldVertex)
    }

    pub fn cld_links(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::CldLink)
    }

    pub fn sticky_notes(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::StickyNote)
    }

    pub fn loop_icons(&self) -> Vec<&Component> {
        self.of_kind(ComponentKind::LoopIcon)
    }

    /// Flows, connections and causal-loop links
    pub fn pointer_components(&self) -> Vec<&Component> {
        self.components.iter().filter(|c| c.is_pointer()).collect()
    }

    /// This collection plus the loaded children of every static model
    /// reference, recursively, positioned on the host canvas.
    ///
    /// Children follow their reference. A model that (transitively) contains
    /// itself is expanded once; the inner reference is left without children.
    pub fn all_including_nested(
        &self,
        models: &LoadedModels,
        config: &GeometryConfig,
    ) -> ComponentCollection {
        let mut out = Vec::with_capacity(self.components.len());
        let mut chain = Vec::new();
        flatten_into(&self.components, models, config, &mut chain, &mut out);
        ComponentCollection::new(out)
    }
}

fn flatten_into(
    components: &[Component],
    models: &LoadedModels,
    config: &GeometryConfig,
    chain: &mut Vec<String>,
    out: &mut Vec<Component>,
) {
    for component in components {
        out.push(component.clone());

        let Some(model_id) = component.model_id() else {
            continue;
        };
        let Some(children) = models.get(model_id) else {
            continue;
        };
        if chain.iter().any(|id| id == model_id) {
            tracing::warn!(
                reference = component.id(),
                model_id,
                "static model contains itself, not expanding"
            );
            continue;
        }

        let expansion = expand_in(component, children, Some(models), config, 0);
        chain.push(model_id.to_string());
        flatten_into(&expansion.relative_to_canvas, models, config, chain, out);
        chain.pop();
    }
}

impl FromIterator<Component> for ComponentCollection {
    fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ComponentCollection {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}
