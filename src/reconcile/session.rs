//! Per-diagram reconciliation session

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::collection::ComponentCollection;
use crate::component::{Component, Endpoint};
use crate::config::GeometryConfig;
use crate::geometry::{GeometryContext, RoutingMode};
use crate::static_model::{expand, LoadedModels, StaticModelLoader};
use crate::substitution::SubstitutionOverlay;

use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::diff::{diff, pointers_last, ComponentDiff};
use super::operation::Operation;
use super::orphans::{orphan_closure, PointerRef};
use super::scene::{Scene, SceneError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No component list received yet
    #[default]
    Empty,
    Synced,
}

/// Everything one cycle produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Operations applied, in order
    pub operations: Vec<Operation>,
    pub diagnostics: Vec<Diagnostic>,
    /// Pointers removed because an endpoint was deleted; the store should drop
    /// or reconnect them
    pub orphaned: Vec<String>,
    /// Model ids the loader should fetch
    pub load_requests: Vec<String>,
}

impl CycleReport {
    pub fn is_noop(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn extend(&mut self, other: CycleReport) {
        self.operations.extend(other.operations);
        self.diagnostics.extend(other.diagnostics);
        self.orphaned.extend(other.orphaned);
        self.load_requests.extend(other.load_requests);
    }
}

/// Reconciliation state of one diagram.
///
/// Every delivery of the full component list goes through [`Session::receive`],
/// which diffs it against the previous delivery and applies the resulting
/// operations to the scene in this order: deletions (with orphaned pointers),
/// non-pointer additions, pointer additions, updates, static model child
/// attachment, then substitution reparenting. Suppressed orphans come back
/// as soon as their endpoints exist, before or after attachment.
#[derive(Debug, Clone)]
pub struct Session {
    config: GeometryConfig,
    routing: RoutingMode,
    state: SessionState,
    /// The last delivered list
    collection: ComponentCollection,
    scene: Scene,
    models: LoadedModels,
    /// Model ids handed out as load requests
    requested: BTreeSet<String>,
    /// Orphaned pointers kept out of the scene until the source resolves them
    suppressed: BTreeSet<String>,
    /// Replaced id to replacement id, as currently reflected in the scene
    substituted: BTreeMap<String, String>,
    ignored_substitutions: BTreeSet<String>,
    circular: BTreeSet<String>,
    flattened: ComponentCollection,
    overlay: SubstitutionOverlay,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(GeometryConfig::default())
    }
}

impl Session {
    pub fn new(config: GeometryConfig) -> Self {
        Self {
            routing: config.flow_routing,
            config,
            state: SessionState::Empty,
            collection: ComponentCollection::default(),
            scene: Scene::new(),
            models: LoadedModels::new(),
            requested: BTreeSet::new(),
            suppressed: BTreeSet::new(),
            substituted: BTreeMap::new(),
            ignored_substitutions: BTreeSet::new(),
            circular: BTreeSet::new(),
            flattened: ComponentCollection::default(),
            overlay: SubstitutionOverlay::default(),
        }
    }

    /// Start with models that are already loaded
    pub fn with_models(mut self, models: LoadedModels) -> Self {
        for model_id in models.model_ids() {
            self.requested.insert(model_id.to_string());
        }
        self.models = models;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    pub fn routing(&self) -> RoutingMode {
        self.routing
    }

    /// Switch the flow routing mode; paths are recomputed on the next query
    pub fn set_routing(&mut self, routing: RoutingMode) {
        self.routing = routing;
    }

    /// The last delivered component list
    pub fn collection(&self) -> &ComponentCollection {
        &self.collection
    }

    /// Displayed components with static model children on the canvas
    pub fn flattened(&self) -> &ComponentCollection {
        &self.flattened
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn models(&self) -> &LoadedModels {
        &self.models
    }

    pub fn overlay(&self) -> &SubstitutionOverlay {
        &self.overlay
    }

    /// Orphaned pointers waiting for the source to drop or reconnect them
    pub fn suppressed(&self) -> impl Iterator<Item = &str> {
        self.suppressed.iter().map(|s| s.as_str())
    }

    /// Requested model ids that have not been attached
    pub fn pending_loads(&self) -> impl Iterator<Item = &str> {
        self.requested
            .iter()
            .filter(|id| !self.models.contains(id))
            .map(|s| s.as_str())
    }

    /// Geometry over the flattened, substitution-aware view
    pub fn geometry(&self) -> GeometryContext<'_> {
        GeometryContext::new(&self.flattened, &self.config)
            .with_models(&self.models)
            .with_substitutions(&self.overlay)
            .with_routing(self.routing)
    }

    /// Reconcile a full delivery of the component list
    pub fn receive(&mut self, components: Vec<Component>) -> CycleReport {
        let new = ComponentCollection::new(components);
        let old = std::mem::take(&mut self.collection);
        let mut report = CycleReport::default();

        {
            let changes = diff(&new, &old);
            self.delete_phase(&new, &old, &changes, &mut report);
            let revived = self.add_phase(&new, &changes, &mut report);
            self.update_phase(&changes, &revived, &mut report);
        }

        self.collection = new;
        self.state = SessionState::Synced;
        self.attach_phase(&mut report);
        self.revive_attached(&mut report);
        self.refresh();
        self.substitution_phase(&mut report);

        tracing::debug!(
            operations = report.operations.len(),
            diagnostics = report.diagnostics.len(),
            orphaned = report.orphaned.len(),
            "reconciliation cycle"
        );
        report
    }

    /// Store a loaded model and attach it under every reference still
    /// waiting for it
    pub fn attach_loaded(&mut self, model_id: &str, components: Vec<Component>) -> CycleReport {
        self.requested.insert(model_id.to_string());
        self.models.insert(model_id, components);

        let mut report = CycleReport::default();
        self.attach_phase(&mut report);
        self.revive_attached(&mut report);
        self.refresh();
        self.substitution_phase(&mut report);

        tracing::debug!(
            model_id,
            operations = report.operations.len(),
            "attached static model"
        );
        report
    }

    /// [`Session::receive`], then service every load request (including ones
    /// raised by nested models) with `loader`
    pub fn sync_with_loader<L>(&mut self, components: Vec<Component>, loader: &mut L) -> CycleReport
    where
        L: StaticModelLoader + ?Sized,
    {
        let mut report = self.receive(components);
        let mut queue: VecDeque<String> = report.load_requests.iter().cloned().collect();

        while let Some(model_id) = queue.pop_front() {
            match loader.load(&model_id) {
                Ok(children) => {
                    let step = self.attach_loaded(&model_id, children);
                    queue.extend(step.load_requests.iter().cloned());
                    report.extend(step);
                }
                Err(err) => report.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::LoadFailed,
                    model_id.as_str(),
                    err.to_string(),
                )),
            }
        }

        report
    }

    /// Apply an operation to the scene, recording it or a diagnostic
    fn apply(&mut self, operation: Operation, report: &mut CycleReport) -> bool {
        match self.scene.apply(&operation) {
            Ok(()) => {
                tracing::trace!(%operation, "applied");
                report.operations.push(operation);
                true
            }
            Err(err) => {
                let kind = match (&err, &operation) {
                    (SceneError::UnknownId(_), Operation::Update(_)) => DiagnosticKind::StaleUpdate,
                    (SceneError::UnknownId(_), Operation::Delete(_)) => DiagnosticKind::StaleDelete,
                    (SceneError::UnknownId(_), _) => DiagnosticKind::StaleUpdate,
                    (SceneError::DuplicateId(_), _) => DiagnosticKind::DuplicateElement,
                    (SceneError::UnknownParent { .. }, _) => DiagnosticKind::UnknownParent,
                };
                report
                    .diagnostics
                    .push(Diagnostic::new(kind, operation.id(), err.to_string()));
                false
            }
        }
    }

    fn delete_phase(
        &mut self,
        new: &ComponentCollection,
        old: &ComponentCollection,
        changes: &ComponentDiff<'_>,
        report: &mut CycleReport,
    ) {
        let mut removed = Vec::new();

        for id in &changes.deleted {
            if self.suppressed.remove(id) {
                continue;
            }
            if old.get_by_id(id).is_some_and(|c| !c.is_visible()) {
                continue;
            }
            self.delete_element(id, &mut removed, report);
        }

        // References switching to another model lose their current children
        for component in &changes.updated {
            let Some(model_id) = component.model_id() else {
                continue;
            };
            let previous = old.get_by_id(component.id()).and_then(|c| c.model_id());
            if previous != Some(model_id) {
                self.delete_children(component.id(), &mut removed, report);
                self.circular.remove(component.id());
            }
        }

        if removed.is_empty() {
            return;
        }

        let orphans = {
            let pointers: Vec<PointerRef<'_>> = self
                .scene
                .iter()
                .filter_map(|element| {
                    let id = element.component.id();
                    // Endpoints as delivered now, so reconnected pointers survive
                    let current = match new.get_by_id(id) {
                        Some(delivered) if delivered.is_pointer() => delivered,
                        _ => &element.component,
                    };
                    let (from, to) = current.endpoints()?;
                    Some(PointerRef {
                        id,
                        from: from.component_id(),
                        to: to.component_id(),
                    })
                })
                .collect();
            orphan_closure(&removed, &pointers)
        };

        for id in orphans {
            self.delete_element(&id, &mut removed, report);
            if new.contains(&id) {
                self.suppressed.insert(id.clone());
            }
            report.orphaned.push(id);
        }
    }

    /// Delete an element and everything added under it. Substituted children
    /// go back to their home parent first.
    fn delete_element(&mut self, id: &str, removed: &mut Vec<String>, report: &mut CycleReport) {
        let guests: Vec<String> = self
            .substituted
            .iter()
            .filter(|(_, replacement)| replacement.as_str() == id)
            .map(|(replaced, _)| replaced.clone())
            .collect();
        for replaced in guests {
            self.substituted.remove(&replaced);
            self.restore_home(&replaced, report);
        }

        self.delete_children(id, removed, report);
        self.substituted.remove(id);
        if self.apply(Operation::Delete(id.to_string()), report) {
            removed.push(id.to_string());
        }
    }

    fn delete_children(&mut self, id: &str, removed: &mut Vec<String>, report: &mut CycleReport) {
        let children: Vec<String> = self
            .scene
            .home_children(id)
            .into_iter()
            .map(str::to_string)
            .collect();
        // Pointers go before the shapes they connect
        let (pointers, shapes): (Vec<String>, Vec<String>) = children.into_iter().partition(|c| {
            self.scene
                .component(c)
                .is_some_and(|component| component.is_pointer())
        });
        for child in pointers.iter().chain(shapes.iter()) {
            if self.scene.contains(child) {
                self.delete_element(child, removed, report);
            }
        }
    }

    fn restore_home(&mut self, id: &str, report: &mut CycleReport) {
        let Some(home) = self.scene.element(id).map(|e| e.home.clone()) else {
            return;
        };
        if self.scene.parent_id(id) != home.as_deref() {
            self.apply(
                Operation::Reparent {
                    id: id.to_string(),
                    parent: home,
                },
                report,
            );
        }
    }

    /// Returns the ids of suppressed pointers added back this cycle
    fn add_phase(
        &mut self,
        new: &ComponentCollection,
        changes: &ComponentDiff<'_>,
        report: &mut CycleReport,
    ) -> HashSet<String> {
        let additions = pointers_last(changes.added.iter().copied().filter(|c| c.is_visible()));
        for component in additions {
            self.apply(Operation::add(component.clone()), report);
        }

        self.revive_suppressed(new, report)
    }

    /// Orphans whose endpoints exist again, to a fixed point since orphans
    /// may point at each other. Returns the revived ids.
    fn revive_suppressed(
        &mut self,
        new: &ComponentCollection,
        report: &mut CycleReport,
    ) -> HashSet<String> {
        let mut revived = HashSet::new();
        loop {
            let ready: Vec<Component> = self
                .suppressed
                .iter()
                .filter_map(|id| new.get_by_id(id))
                .filter(|pointer| {
                    pointer.endpoints().is_some_and(|(from, to)| {
                        self.endpoint_present(from) && self.endpoint_present(to)
                    })
                })
                .cloned()
                .collect();
            if ready.is_empty() {
                break;
            }
            for pointer in ready {
                self.suppressed.remove(pointer.id());
                revived.insert(pointer.id().to_string());
                self.apply(Operation::add(pointer), report);
            }
        }

        revived
    }

    /// Revival again once static model children are attached, since
    /// orphans may point at them
    fn revive_attached(&mut self, report: &mut CycleReport) {
        if self.suppressed.is_empty() {
            return;
        }
        let current = std::mem::take(&mut self.collection);
        self.revive_suppressed(&current, report);
        self.collection = current;
    }

    fn endpoint_present(&self, endpoint: &Endpoint) -> bool {
        match endpoint {
            Endpoint::Point(_) => true,
            Endpoint::Component(id) => self.scene.contains(id),
        }
    }

    fn update_phase(
        &mut self,
        changes: &ComponentDiff<'_>,
        revived: &HashSet<String>,
        report: &mut CycleReport,
    ) {
        for component in &changes.updated {
            if !component.is_visible()
                || self.suppressed.contains(component.id())
                || revived.contains(component.id())
            {
                continue;
            }
            self.apply(Operation::Update((*component).clone()), report);
        }
    }

    /// Attach loaded children to every static model reference that has none
    fn attach_phase(&mut self, report: &mut CycleReport) {
        let mut worklist: VecDeque<String> = self
            .scene
            .iter()
            .filter(|e| e.component.model_id().is_some())
            .map(|e| e.component.id().to_string())
            .collect();

        while let Some(reference_id) = worklist.pop_front() {
            let Some(reference) = self.scene.component(&reference_id).cloned() else {
                continue;
            };
            let Some(model_id) = reference.model_id() else {
                continue;
            };
            if !self.scene.home_children(&reference_id).is_empty() {
                continue;
            }

            let Some(children) = self.models.get(model_id) else {
                if self.requested.insert(model_id.to_string()) {
                    tracing::debug!(model_id, reference = %reference_id, "requesting static model");
                    report.load_requests.push(model_id.to_string());
                }
                continue;
            };

            if self.ancestor_models(&reference_id).contains(model_id) {
                if self.circular.insert(reference_id.clone()) {
                    report.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::CircularModel,
                        reference_id.as_str(),
                        format!("static model '{}' contains itself", model_id),
                    ));
                }
                continue;
            }

            let expansion = expand(&reference, children, &self.config);
            let attached = pointers_last(expansion.relative_to_self.iter().filter(|c| c.is_visible()));
            for child in attached {
                let nested = child.model_id().is_some();
                let id = child.id().to_string();
                if self.apply(Operation::add_child(child.clone(), reference_id.as_str()), report)
                    && nested
                {
                    worklist.push_back(id);
                }
            }
        }
    }

    /// Model ids of the references enclosing `id`, itself excluded
    fn ancestor_models(&self, id: &str) -> BTreeSet<String> {
        let mut models = BTreeSet::new();
        let mut current = self.scene.element(id).and_then(|e| e.home.clone());
        while let Some(ancestor) = current {
            let Some(element) = self.scene.element(&ancestor) else {
                break;
            };
            if let Some(model_id) = element.component.model_id() {
                models.insert(model_id.to_string());
            }
            current = element.home.clone();
        }
        models
    }

    /// Make scene parentage follow the substitution overlay
    fn substitution_phase(&mut self, report: &mut CycleReport) {
        let ignored_now: BTreeSet<String> = self
            .overlay
            .ignored()
            .iter()
            .map(|i| i.substitution_id.clone())
            .collect();
        for ignored in self.overlay.ignored() {
            if !self.ignored_substitutions.contains(&ignored.substitution_id) {
                report.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::IgnoredSubstitution,
                    ignored.substitution_id.as_str(),
                    ignored.reason.to_string(),
                ));
            }
        }
        self.ignored_substitutions = ignored_now;

        let wanted: Vec<(String, String)> = self
            .overlay
            .applied()
            .filter(|a| self.scene.contains(&a.replaced_id) && self.scene.contains(&a.replacement_id))
            .map(|a| (a.replaced_id.clone(), a.replacement_id.clone()))
            .collect();

        let stale: Vec<String> = self
            .substituted
            .iter()
            .filter(|(replaced, replacement)| {
                !wanted
                    .iter()
                    .any(|(r, p)| r == *replaced && p == *replacement)
            })
            .map(|(replaced, _)| replaced.clone())
            .collect();
        for replaced in stale {
            self.substituted.remove(&replaced);
            self.restore_home(&replaced, report);
        }

        for (replaced, replacement) in wanted {
            if self.substituted.get(&replaced) == Some(&replacement) {
                continue;
            }
            let moved = self.apply(
                Operation::Reparent {
                    id: replaced.clone(),
                    parent: Some(replacement.clone()),
                },
                report,
            );
            if moved {
                self.substituted.insert(replaced, replacement);
            }
        }
    }

    fn refresh(&mut self) {
        let displayed: ComponentCollection = self
            .collection
            .iter()
            .filter(|c| !self.suppressed.contains(c.id()))
            .cloned()
            .collect();
        self.flattened = displayed.all_including_nested(&self.models, &self.config);
        self.overlay = SubstitutionOverlay::from_collection(&self.flattened);
    }
}

/// Operations that turn `old` into `new`.
///
/// Runs a fresh session with the default configuration: `old` is delivered
/// first to build the target, then `new`.
pub fn reconcile(new: &[Component], old: &[Component], models: &LoadedModels) -> Vec<Operation> {
    let mut session = Session::default().with_models(models.clone());
    session.receive(old.to_vec());
    session.receive(new.to_vec()).operations
}
