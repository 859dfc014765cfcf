//! Arena of presentation elements
//!
//! The scene is the target representation kept consistent with the component
//! list. Elements live in slots addressed by [`ElementHandle`]; an id index
//! maps component ids to handles. Pointer elements hold the handles of the
//! elements their endpoints name, and every element holds its parent handle.
//! Vacated slots are reused, so a handle is only valid while its element
//! lives. The scene only changes through [`Scene::apply`].

use std::collections::HashMap;

use thiserror::Error;

use crate::component::Component;

use super::operation::Operation;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("element '{0}' already exists")]
    DuplicateId(String),

    #[error("no element with id '{0}'")]
    UnknownId(String),

    #[error("parent '{parent}' of '{id}' does not exist")]
    UnknownParent { id: String, parent: String },
}

/// Stable address of an element slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(usize);

impl ElementHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneElement {
    pub component: Component,
    /// Current parent
    pub parent: Option<ElementHandle>,
    /// Parent id the element was added under; substitutions move elements
    /// away from it and unapplying them moves elements back
    pub home: Option<String>,
    /// Linked `from` element, for pointers whose source exists
    pub source: Option<ElementHandle>,
    /// Linked `to` element, for pointers whose target exists
    pub target: Option<ElementHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    slots: Vec<Option<SceneElement>>,
    /// Vacated slot indices, reused by the next allocation
    free: Vec<usize>,
    by_id: HashMap<String, ElementHandle>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Number of slots allocated, live or vacant
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn handle(&self, id: &str) -> Option<ElementHandle> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, handle: ElementHandle) -> Option<&SceneElement> {
        self.slots.get(handle.0).and_then(|slot| slot.as_ref())
    }

    pub fn element(&self, id: &str) -> Option<&SceneElement> {
        self.handle(id).and_then(|h| self.get(h))
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.element(id).map(|e| &e.component)
    }

    /// Id of the element's current parent
    pub fn parent_id(&self, id: &str) -> Option<&str> {
        let parent = self.element(id)?.parent?;
        self.get(parent).map(|p| p.component.id())
    }

    /// Live elements in slot order (not insertion order once slots are reused)
    pub fn iter(&self) -> impl Iterator<Item = &SceneElement> {
        self.slots.iter().flatten()
    }

    /// Ids of the elements currently parented under `id`
    pub fn children(&self, id: &str) -> Vec<&str> {
        let Some(handle) = self.handle(id) else {
            return Vec::new();
        };
        self.iter()
            .filter(|e| e.parent == Some(handle))
            .map(|e| e.component.id())
            .collect()
    }

    /// Children that were added under `id`, excluding substituted ones
    pub fn home_children(&self, id: &str) -> Vec<&str> {
        self.iter()
            .filter(|e| e.home.as_deref() == Some(id))
            .map(|e| e.component.id())
            .collect()
    }

    /// Apply one operation
    pub fn apply(&mut self, operation: &Operation) -> Result<(), SceneError> {
        match operation {
            Operation::Add { component, parent } => {
                self.insert(component.clone(), parent.as_deref()).map(|_| ())
            }
            Operation::Update(component) => self.update(component.clone()).map(|_| ()),
            Operation::Delete(id) => self.remove(id).map(|_| ()),
            Operation::Reparent { id, parent } => self.reparent(id, parent.as_deref()).map(|_| ()),
        }
    }

    fn parent_handle(&self, id: &str, parent: Option<&str>) -> Result<Option<ElementHandle>, SceneError> {
        match parent {
            None => Ok(None),
            Some(parent) => self
                .handle(parent)
                .map(Some)
                .ok_or_else(|| SceneError::UnknownParent {
                    id: id.to_string(),
                    parent: parent.to_string(),
                }),
        }
    }

    fn insert(&mut self, component: Component, parent: Option<&str>) -> Result<ElementHandle, SceneError> {
        if self.contains(component.id()) {
            return Err(SceneError::DuplicateId(component.id().to_string()));
        }
        let parent_handle = self.parent_handle(component.id(), parent)?;

        let id = component.id().to_string();
        let handle = self.allocate(SceneElement {
            component,
            parent: parent_handle,
            home: parent.map(str::to_string),
            source: None,
            target: None,
        });
        self.by_id.insert(id.clone(), handle);

        self.link(handle);
        self.link_incoming(&id, Some(handle));
        Ok(handle)
    }

    fn update(&mut self, component: Component) -> Result<ElementHandle, SceneError> {
        let handle = self
            .handle(component.id())
            .ok_or_else(|| SceneError::UnknownId(component.id().to_string()))?;
        if let Some(element) = self.slots[handle.0].as_mut() {
            element.component = component;
        }
        self.link(handle);
        Ok(handle)
    }

    /// Remove one element. Pointers linked to it are unlinked; elements still
    /// parented under it move to the top level.
    fn remove(&mut self, id: &str) -> Result<SceneElement, SceneError> {
        let handle = self
            .by_id
            .remove(id)
            .ok_or_else(|| SceneError::UnknownId(id.to_string()))?;
        let element = self.slots[handle.0]
            .take()
            .ok_or_else(|| SceneError::UnknownId(id.to_string()))?;
        self.free.push(handle.0);

        self.replace_handle(handle, None);
        Ok(element)
    }

    /// Move an element under a new parent.
    ///
    /// The element is recreated in another slot; links from pointers and
    /// children are re-assigned to the new handle before the old slot is
    /// released.
    fn reparent(&mut self, id: &str, parent: Option<&str>) -> Result<ElementHandle, SceneError> {
        let old = self
            .handle(id)
            .ok_or_else(|| SceneError::UnknownId(id.to_string()))?;
        let parent_handle = self.parent_handle(id, parent)?;

        let Some(mut element) = self.slots[old.0].clone() else {
            return Err(SceneError::UnknownId(id.to_string()));
        };
        element.parent = parent_handle;

        let new = self.allocate(element);
        self.by_id.insert(id.to_string(), new);
        self.replace_handle(old, Some(new));
        self.slots[old.0] = None;
        self.free.push(old.0);
        Ok(new)
    }

    fn allocate(&mut self, element: SceneElement) -> ElementHandle {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(element);
                ElementHandle(index)
            }
            None => {
                self.slots.push(Some(element));
                ElementHandle(self.slots.len() - 1)
            }
        }
    }

    /// Point every reference to `old` at `new`
    fn replace_handle(&mut self, old: ElementHandle, new: Option<ElementHandle>) {
        for element in self.slots.iter_mut().flatten() {
            if element.source == Some(old) {
                element.source = new;
            }
            if element.target == Some(old) {
                element.target = new;
            }
            if element.parent == Some(old) {
                element.parent = new;
            }
        }
    }

    /// Resolve a pointer element's endpoints to handles
    fn link(&mut self, handle: ElementHandle) {
        let Some(element) = self.get(handle) else {
            return;
        };
        let Some((from, to)) = element.component.endpoints() else {
            return;
        };
        let source = from.component_id().and_then(|id| self.handle(id));
        let target = to.component_id().and_then(|id| self.handle(id));

        if let Some(element) = self.slots[handle.0].as_mut() {
            element.source = source;
            element.target = target;
        }
    }

    /// Link pointers whose endpoints name `id`
    fn link_incoming(&mut self, id: &str, handle: Option<ElementHandle>) {
        for element in self.slots.iter_mut().flatten() {
            let Some((from, to)) = element.component.endpoints() else {
                continue;
            };
            let (from_hit, to_hit) = (from.references(id), to.references(id));
            if from_hit {
                element.source = handle;
            }
            if to_hit {
                element.target = handle;
            }
        }
    }
}
