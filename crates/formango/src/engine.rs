//! State shared by a form and every handle it gives out.
//!
//! [`FormState`] holds the data: document, path table, per-node flags and
//! the validation driver. Its methods are plain `&mut self` operations with
//! no callbacks. [`Shared`] wraps it in a `RefCell` together with the
//! collaborators (schema, inspector, watchers) and is responsible for never
//! holding a borrow while user code runs.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use formango_path::Path;
use formango_util::{json_equal, IdGenerator};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::FormError;
use crate::id::{FieldId, FormId, SlotId};
use crate::inspector::Inspector;
use crate::issue::{FormattedError, Issue};
use crate::path_table::PathTable;
use crate::reactive::{Memo, Revision, WatchId, Watchers};
use crate::reconcile;
use crate::schema::IssueSource;
use crate::scope::{scoped_errors, scoped_raw_errors};
use crate::store::DocumentStore;
use crate::validation::ValidationDriver;

/// Which view of a node a derived value is computed for. One identity can
/// be registered both as a field and as a field array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum View {
    Field,
    Array,
}

type ScopeStamp = (Revision, Revision);

pub(crate) struct NodeState {
    own_touched: bool,
    changed: bool,
    /// Dirty baseline of the field view when the snapshot has nothing.
    fallback: Value,
    is_field: bool,
    /// Slot identities, present once the node was registered as an array.
    slots: Option<Vec<SlotId>>,
    errors: Memo<ScopeStamp, Vec<FormattedError>>,
    raw_errors: Memo<ScopeStamp, Vec<Issue>>,
}

impl NodeState {
    fn new() -> Self {
        Self {
            own_touched: false,
            changed: false,
            fallback: Value::Null,
            is_field: false,
            slots: None,
            errors: Memo::new(),
            raw_errors: Memo::new(),
        }
    }
}

enum NodeEvent {
    Registered(FieldId, Path),
    Unregistered(FieldId),
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Array(array)) => array.is_empty(),
        _ => false,
    }
}

fn array_len(value: Option<&Value>) -> usize {
    value.and_then(Value::as_array).map_or(0, Vec::len)
}

pub(crate) struct FormState {
    pub(crate) store: DocumentStore,
    paths: PathTable,
    nodes: IndexMap<FieldId, NodeState>,
    pub(crate) validation: ValidationDriver,
    ids: IdGenerator,
    initial_state: Option<Value>,
    pub(crate) submitting: bool,
    pub(crate) has_attempted: bool,
    formatted: Memo<Revision, Vec<FormattedError>>,
    journal: Vec<NodeEvent>,
}

impl FormState {
    fn new(initial_state: Option<Value>, ids: IdGenerator) -> Self {
        let mut store = DocumentStore::new(Value::Object(Default::default()));
        if let Some(state) = &initial_state {
            store.assign_top_level(state);
            store.replace_initial(state.clone());
        }
        Self {
            store,
            paths: PathTable::default(),
            nodes: IndexMap::new(),
            validation: ValidationDriver::default(),
            ids,
            initial_state,
            submitting: false,
            has_attempted: false,
            formatted: Memo::new(),
            journal: Vec::new(),
        }
    }

    fn fresh_field_id(&mut self) -> FieldId {
        FieldId::new(self.ids.next_id("field"))
    }

    fn fresh_slot(&mut self) -> SlotId {
        SlotId::new(self.ids.next_id("slot"))
    }

    pub fn path_of(&self, id: &FieldId) -> Option<&Path> {
        self.paths.path_of(id)
    }

    fn attached_path(&self, id: &FieldId) -> Result<Path, FormError> {
        self.paths
            .path_of(id)
            .cloned()
            .ok_or_else(|| FormError::Detached { id: id.to_string() })
    }

    fn slots_mut(&mut self, id: &FieldId) -> Result<&mut Vec<SlotId>, FormError> {
        self.nodes
            .get_mut(id)
            .and_then(|node| node.slots.as_mut())
            .ok_or_else(|| FormError::Detached { id: id.to_string() })
    }

    pub fn slots(&self, id: &FieldId) -> Vec<SlotId> {
        self.nodes
            .get(id)
            .and_then(|node| node.slots.clone())
            .unwrap_or_default()
    }

    /// Pad the slot list of `id` with fresh slots up to `len` entries.
    fn fill_slots(&mut self, id: &FieldId, len: usize) -> Result<(), FormError> {
        let have = self.slots_mut(id)?.len();
        let extra: Vec<SlotId> = (have..len).map(|_| self.fresh_slot()).collect();
        self.slots_mut(id)?.extend(extra);
        Ok(())
    }

    /// Drop every registration whose path no longer resolves after the
    /// document was reassigned wholesale.
    fn prune_unresolved(&mut self) {
        let stale: Vec<FieldId> = self
            .paths
            .iter()
            .filter(|(_, path)| self.store.get(path).is_none())
            .map(|(id, _)| id.clone())
            .collect();
        if stale.is_empty() {
            return;
        }
        for id in &stale {
            self.paths.remove(id);
        }
        debug!(removed = stale.len(), "pruned unresolved registrations");
        self.drop_nodes(stale);
    }

    /// Bring the path table and every slot list back in line with the document.
    fn resync_slots(&mut self) {
        self.prune_unresolved();
        let targets: Vec<(FieldId, usize)> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.slots.is_some())
            .filter_map(|(id, _)| {
                let path = self.paths.path_of(id)?;
                Some((id.clone(), array_len(self.store.get(path))))
            })
            .collect();
        for (id, len) in targets {
            if let Ok(slots) = self.slots_mut(&id) {
                slots.truncate(len);
            }
            let _ = self.fill_slots(&id, len);
        }
    }

    pub fn value_of(&self, id: &FieldId) -> Value {
        self.paths
            .path_of(id)
            .and_then(|path| self.store.get(path))
            .cloned()
            .unwrap_or(Value::Null)
    }

    // Registration

    pub fn register(&mut self, path: &Path, default: Option<Value>) -> Result<FieldId, FormError> {
        if let Some(id) = self.paths.id_of(path).cloned() {
            let node = self.nodes.entry(id.clone()).or_insert_with(NodeState::new);
            node.is_field = true;
            if let Some(default) = default {
                node.fallback = default.clone();
                if is_blank(self.store.get(path)) {
                    self.write(path, default)?;
                }
            }
            return Ok(id);
        }

        if self.store.get(path).map_or(true, Value::is_null) {
            self.store.set(path, default.clone().unwrap_or(Value::Null))?;
        }
        let id = self.fresh_field_id();
        self.paths.insert(id.clone(), path.clone());
        let mut node = NodeState::new();
        node.is_field = true;
        node.fallback = default.unwrap_or(Value::Null);
        self.nodes.insert(id.clone(), node);
        debug!(%id, %path, "registered field");
        self.journal.push(NodeEvent::Registered(id.clone(), path.clone()));
        self.register_parent_paths(path)?;
        Ok(id)
    }

    pub fn register_array(&mut self, path: &Path, default: Option<Vec<Value>>) -> Result<FieldId, FormError> {
        let len = match self.store.get(path) {
            None | Some(Value::Null) => {
                self.store.set(path, Value::Array(Vec::new()))?;
                0
            }
            Some(Value::Array(array)) => array.len(),
            Some(_) => return Err(FormError::NotAnArray { path: path.to_string() }),
        };

        let ids = &mut self.ids;
        let (id, created) = self
            .paths
            .register_or_lookup(path, || FieldId::new(ids.next_id("field")));
        let needs_slots = self.nodes.get(&id).map_or(true, |node| node.slots.is_none());
        if needs_slots {
            let slots: Vec<SlotId> = (0..len).map(|_| self.fresh_slot()).collect();
            self.nodes.entry(id.clone()).or_insert_with(NodeState::new).slots = Some(slots);
        }

        if let Some(default) = default {
            if len == 0 {
                for element in default {
                    self.append(&id, Some(element))?;
                }
            }
        }

        if created {
            debug!(%id, %path, "registered field array");
            self.journal.push(NodeEvent::Registered(id.clone(), path.clone()));
            self.register_parent_paths(path)?;
        }
        Ok(id)
    }

    /// Register the element paths enclosing `path`, so `a.0.b.1.c` also
    /// registers `a.0.b.1` and `a.0`.
    fn register_parent_paths(&mut self, path: &Path) -> Result<(), FormError> {
        for parent in reconcile::parent_element_paths(path) {
            if self.paths.id_of(&parent).is_none() {
                self.register(&parent, None)?;
            }
        }
        Ok(())
    }

    pub fn register_child(&mut self, id: &FieldId, child: &str, default: Option<Value>) -> Result<FieldId, FormError> {
        let path = self.attached_path(id)?.join(&Path::parse(child)?);
        self.register(&path, default)
    }

    pub fn register_child_array(
        &mut self,
        id: &FieldId,
        child: &str,
        default: Option<Vec<Value>>,
    ) -> Result<FieldId, FormError> {
        let path = self.attached_path(id)?.join(&Path::parse(child)?);
        self.register_array(&path, default)
    }

    /// Like [`register_child`](Self::register_child) on an array node,
    /// keeping one slot per element up to the child's leading index.
    pub fn register_element_child(
        &mut self,
        id: &FieldId,
        child: &str,
        default: Option<Value>,
    ) -> Result<FieldId, FormError> {
        self.fill_slots_for_child(id, child)?;
        self.register_child(id, child, default)
    }

    pub fn register_element_child_array(
        &mut self,
        id: &FieldId,
        child: &str,
        default: Option<Vec<Value>>,
    ) -> Result<FieldId, FormError> {
        self.fill_slots_for_child(id, child)?;
        self.register_child_array(id, child, default)
    }

    fn fill_slots_for_child(&mut self, id: &FieldId, child: &str) -> Result<(), FormError> {
        let child = Path::parse(child)?;
        if let Some(index) = child.steps().first().and_then(|step| step.as_index()) {
            self.fill_slots(id, index + 1)?;
        }
        Ok(())
    }

    pub fn unregister(&mut self, path: &Path) -> Result<(), FormError> {
        if let (Some(parent), Some(index)) = (path.parent(), path.last_index()) {
            if index < array_len(self.store.get(&parent)) {
                self.store.unset(path);
                let removed = reconcile::remove_index(&mut self.paths, &parent, index);
                if let Some(parent_id) = self.paths.id_of(&parent).cloned() {
                    if let Ok(slots) = self.slots_mut(&parent_id) {
                        if index < slots.len() {
                            slots.remove(index);
                        }
                    }
                }
                debug!(%path, removed = removed.len(), "unregistered array element");
                self.drop_nodes(removed);
                return Ok(());
            }
        }

        let id = self
            .paths
            .id_of(path)
            .cloned()
            .ok_or_else(|| FormError::PathNotRegistered { path: path.to_string() })?;
        self.store.unset(path);
        let orphans: Vec<FieldId> = self
            .paths
            .descendants_of(path)
            .into_iter()
            .filter(|child| {
                self.paths
                    .path_of(child)
                    .map_or(true, |child_path| self.store.get(child_path).is_none())
            })
            .collect();
        let mut removed = vec![id];
        removed.extend(orphans);
        for id in &removed {
            self.paths.remove(id);
        }
        debug!(%path, removed = removed.len(), "unregistered field");
        self.drop_nodes(removed);
        Ok(())
    }

    fn drop_nodes(&mut self, ids: Vec<FieldId>) {
        for id in ids {
            self.nodes.shift_remove(&id);
            self.journal.push(NodeEvent::Unregistered(id));
        }
    }

    // Writes

    fn write(&mut self, path: &Path, value: Value) -> Result<(), FormError> {
        let value = match value {
            Value::String(s) if s.is_empty() => Value::Null,
            other => other,
        };
        trace!(%path, "write");
        self.store.set(path, value)?;
        Ok(())
    }

    /// Write through a node's current path. Writes to a detached node are dropped.
    pub fn set_value(&mut self, id: &FieldId, value: Value) -> Result<(), FormError> {
        match self.paths.path_of(id).cloned() {
            Some(path) => self.write(&path, value),
            None => Ok(()),
        }
    }

    pub fn set_values(&mut self, values: &Value) -> Result<(), FormError> {
        if let Value::Object(map) = values {
            for (key, value) in map {
                self.store.set(&Path::parse(key)?, value.clone())?;
            }
        }
        self.resync_slots();
        debug!("values set");
        Ok(())
    }

    // Field-array mutations

    fn element_count(&self, array: &Path) -> usize {
        array_len(self.store.get(array))
    }

    pub fn insert(&mut self, id: &FieldId, index: usize, value: Option<Value>) -> Result<FieldId, FormError> {
        let path = self.attached_path(id)?;
        let len = self.element_count(&path);
        let slot = self.fresh_slot();
        if index < len {
            if let Some(array) = self.store.array_mut(&path) {
                array.insert(index, Value::Null);
            }
            reconcile::insert_index(&mut self.paths, &path, index);
            let slots = self.slots_mut(id)?;
            let at = index.min(slots.len());
            slots.insert(at, slot);
        } else {
            self.fill_slots(id, index)?;
            let slots = self.slots_mut(id)?;
            if slots.len() == index {
                slots.push(slot);
            } else {
                slots[index] = slot;
            }
        }
        self.register(&path.child(index), value)
    }

    pub fn append(&mut self, id: &FieldId, value: Option<Value>) -> Result<FieldId, FormError> {
        let len = self.element_count(&self.attached_path(id)?);
        self.insert(id, len, value)
    }

    pub fn remove(&mut self, id: &FieldId, index: usize) -> Result<(), FormError> {
        let path = self.attached_path(id)?;
        let len = self.element_count(&path);
        if index >= len {
            return Err(FormError::IndexOutOfBounds {
                path: path.to_string(),
                index,
                len,
            });
        }
        self.unregister(&path.child(index))
    }

    pub fn pop(&mut self, id: &FieldId) -> Result<(), FormError> {
        match self.element_count(&self.attached_path(id)?) {
            0 => Ok(()),
            len => self.remove(id, len - 1),
        }
    }

    pub fn shift(&mut self, id: &FieldId) -> Result<(), FormError> {
        match self.element_count(&self.attached_path(id)?) {
            0 => Ok(()),
            _ => self.remove(id, 0),
        }
    }

    pub fn empty(&mut self, id: &FieldId) -> Result<(), FormError> {
        let len = self.element_count(&self.attached_path(id)?);
        for index in (0..len).rev() {
            self.remove(id, index)?;
        }
        Ok(())
    }

    pub fn set_array(&mut self, id: &FieldId, values: Vec<Value>) -> Result<(), FormError> {
        self.empty(id)?;
        for value in values {
            self.append(id, Some(value))?;
        }
        Ok(())
    }

    pub fn move_element(&mut self, id: &FieldId, from: usize, to: usize) -> Result<(), FormError> {
        let path = self.attached_path(id)?;
        let len = self.element_count(&path);
        for index in [from, to] {
            if index >= len {
                return Err(FormError::IndexOutOfBounds {
                    path: path.to_string(),
                    index,
                    len,
                });
            }
        }
        if from == to {
            return Ok(());
        }
        let slots = self.slots_mut(id)?;
        if from < slots.len() && to < slots.len() {
            slots.swap(from, to);
        }
        if let Some(array) = self.store.array_mut(&path) {
            array.swap(from, to);
        }
        reconcile::swap_indices(&mut self.paths, &path, from, to);
        debug!(%path, from, to, "moved array element");
        Ok(())
    }

    // Flags

    pub fn mark_blurred(&mut self, id: &FieldId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.own_touched = true;
        }
    }

    pub fn mark_changed(&mut self, id: &FieldId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.changed = true;
        }
    }

    /// Mark every registered field strictly below `id` as touched, and `id`
    /// itself for the field view.
    pub fn blur_descendants(&mut self, id: &FieldId, view: View) {
        let Some(path) = self.paths.path_of(id).cloned() else {
            return;
        };
        if view == View::Field {
            self.mark_blurred(id);
        }
        for child in self.paths.descendants_of(&path) {
            if let Some(node) = self.nodes.get_mut(&child) {
                if node.is_field {
                    node.own_touched = true;
                }
            }
        }
    }

    pub fn blur_all(&mut self) {
        for node in self.nodes.values_mut().filter(|node| node.is_field) {
            node.own_touched = true;
        }
    }

    pub fn is_changed(&self, id: &FieldId) -> bool {
        self.nodes.get(id).is_some_and(|node| node.changed)
    }

    pub fn is_touched(&self, id: &FieldId) -> bool {
        let Some(path) = self.paths.path_of(id) else {
            return false;
        };
        if self.nodes.get(id).is_some_and(|node| node.own_touched) {
            return true;
        }
        self.paths
            .descendants_of(path)
            .iter()
            .any(|child| self.nodes.get(child).is_some_and(|node| node.own_touched))
    }

    pub fn is_dirty(&self, id: &FieldId, view: View) -> bool {
        let (Some(path), Some(node)) = (self.paths.path_of(id), self.nodes.get(id)) else {
            return false;
        };
        let baseline = match view {
            View::Field => node.fallback.clone(),
            View::Array => Value::Array(Vec::new()),
        };
        let initial = match self.store.initial_at(path) {
            Some(value) if !value.is_null() => value.clone(),
            _ => baseline,
        };
        let current = self.store.get(path).cloned().unwrap_or(Value::Null);
        if current.as_str() == Some("") && initial.is_null() {
            return false;
        }
        !json_equal(&current, &initial)
    }

    pub fn is_form_dirty(&self) -> bool {
        self.nodes.iter().any(|(id, node)| {
            (node.is_field && self.is_dirty(id, View::Field)) || (node.slots.is_some() && self.is_dirty(id, View::Array))
        })
    }

    // Errors

    pub fn errors_of(&mut self, id: &FieldId) -> Vec<FormattedError> {
        let Some(path) = self.paths.path_of(id) else {
            return Vec::new();
        };
        let stamp = (self.paths.revision(), self.validation.revision());
        let issues = self.validation.issues();
        match self.nodes.get_mut(id) {
            Some(node) => node.errors.get_or_compute(stamp, || scoped_errors(issues, path)).clone(),
            None => scoped_errors(issues, path),
        }
    }

    pub fn raw_errors_of(&mut self, id: &FieldId) -> Vec<Issue> {
        let Some(path) = self.paths.path_of(id) else {
            return Vec::new();
        };
        let stamp = (self.paths.revision(), self.validation.revision());
        let issues = self.validation.issues();
        match self.nodes.get_mut(id) {
            Some(node) => node.raw_errors.get_or_compute(stamp, || scoped_raw_errors(issues, path)).clone(),
            None => scoped_raw_errors(issues, path),
        }
    }

    pub fn is_node_valid(&mut self, id: &FieldId) -> bool {
        self.paths.path_of(id).is_some() && self.errors_of(id).is_empty()
    }

    pub fn formatted_errors(&mut self) -> Vec<FormattedError> {
        let issues = self.validation.issues();
        self.formatted
            .get_or_compute(self.validation.revision(), || issues.iter().map(FormattedError::from).collect())
            .clone()
    }

    pub fn add_errors(&mut self, errors: impl IntoIterator<Item = FormattedError>) {
        self.validation.append(errors.into_iter().map(FormattedError::into_issue));
    }

    // Lifecycle

    pub fn reset(&mut self) -> Result<(), FormError> {
        let initial = self.initial_state.clone().ok_or(FormError::MissingInitialState)?;
        self.store.assign_top_level(&initial);
        let snapshot = self.store.value().clone();
        self.store.replace_initial(snapshot);
        for node in self.nodes.values_mut() {
            node.own_touched = false;
        }
        self.has_attempted = false;
        self.resync_slots();
        debug!("form reset");
        Ok(())
    }

    pub fn update_initial_state(&mut self, state: Value) -> bool {
        if self.is_form_dirty() {
            debug!("initial state update skipped, form is dirty");
            return false;
        }
        self.store.assign_top_level(&state);
        self.store.replace_initial(state.clone());
        self.initial_state = Some(state);
        self.resync_slots();
        true
    }

    pub fn replace_initial(&mut self, snapshot: Value) {
        self.store.replace_initial(snapshot);
    }

    pub fn registered_count(&self) -> usize {
        self.paths.len()
    }
}

/// A form's state plus its collaborators, shared by the form and its handles.
pub(crate) struct Shared {
    pub(crate) id: FormId,
    state: RefCell<FormState>,
    schema: Rc<dyn IssueSource>,
    inspector: Option<Rc<dyn Inspector>>,
    watchers: RefCell<Watchers>,
    batch_depth: Cell<usize>,
}

impl Shared {
    pub fn new(
        schema: Rc<dyn IssueSource>,
        initial_state: Option<Value>,
        inspector: Option<Rc<dyn Inspector>>,
        id_seed: Option<u64>,
    ) -> Self {
        let mut ids = id_seed.map_or_else(IdGenerator::new, IdGenerator::seeded);
        let id = FormId::new(ids.next_id("form"));
        Self {
            id,
            state: RefCell::new(FormState::new(initial_state, ids)),
            schema,
            inspector,
            watchers: RefCell::new(Watchers::default()),
            batch_depth: Cell::new(0),
        }
    }

    pub fn inspector(&self) -> Option<&Rc<dyn Inspector>> {
        self.inspector.as_ref()
    }

    /// Read the state without triggering validation.
    pub fn read<R>(&self, f: impl FnOnce(&FormState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Read derived state that depends on the issue list.
    pub fn read_validated<R>(&self, f: impl FnOnce(&mut FormState) -> R) -> R {
        self.ensure_validated();
        let mut state = self.state.borrow_mut();
        f(&mut state)
    }

    /// Run a mutation inside a batch, then report node changes to the inspector.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut FormState) -> R) -> R {
        self.batch(|| {
            let (result, events) = {
                let mut state = self.state.borrow_mut();
                let result = f(&mut state);
                (result, std::mem::take(&mut state.journal))
            };
            self.report(events);
            result
        })
    }

    fn report(&self, events: Vec<NodeEvent>) {
        let Some(inspector) = &self.inspector else {
            return;
        };
        for event in events {
            match event {
                NodeEvent::Registered(field, path) => inspector.register_field(&self.id, &field, &path),
                NodeEvent::Unregistered(field) => inspector.unregister_field(&field),
            }
        }
    }

    /// Coalesce mutations: watchers and revalidation run once, when the
    /// outermost batch ends.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.batch_depth.set(self.batch_depth.get() + 1);
        let result = f();
        let depth = self.batch_depth.get() - 1;
        self.batch_depth.set(depth);
        if depth == 0 {
            self.flush();
        }
        result
    }

    fn flush(&self) {
        self.ensure_validated();
        let revision = self.state.borrow().store.revision();
        let taken = self.watchers.borrow_mut().begin_notify(revision);
        if let Some(mut taken) = taken {
            let document = self.state.borrow().store.value().clone();
            for (_, watcher) in taken.iter_mut() {
                watcher(&document);
            }
            self.watchers.borrow_mut().end_notify(taken);
        }
    }

    pub fn watch(&self, watcher: Box<dyn FnMut(&Value)>) -> WatchId {
        self.watchers.borrow_mut().add(watcher)
    }

    pub fn unwatch(&self, id: WatchId) -> bool {
        self.watchers.borrow_mut().remove(id)
    }

    /// Start a validation pass if the document moved since the last one.
    pub fn ensure_validated(&self) {
        let (revision, document) = {
            let state = self.state.borrow();
            let revision = state.store.revision();
            if !state.validation.is_stale(revision) {
                return;
            }
            (revision, state.store.value().clone())
        };
        debug!(revision = revision.get(), "validating document");
        let outcome = self.schema.issues(&document);
        self.state.borrow_mut().validation.apply(revision, outcome);
    }

    /// Drive pending validation passes until the issue list describes the
    /// current document.
    pub async fn settle(&self) {
        loop {
            self.ensure_validated();
            let pending = self.state.borrow_mut().validation.take_pending();
            let Some((started, future)) = pending else {
                break;
            };
            let issues = future.await;
            let mut state = self.state.borrow_mut();
            let current = state.store.revision();
            state.validation.finish_pending(started, current, issues);
        }
    }
}
