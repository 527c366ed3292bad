use std::fmt;
use std::rc::Rc;

use formango_path::Path;
use serde_json::Value;

use crate::engine::{Shared, View};
use crate::error::FormError;
use crate::field_array::FieldArray;
use crate::id::FieldId;
use crate::issue::{FormattedError, Issue};

/// Handle to a registered field.
///
/// Handles are cheap to clone; every clone and every handle returned by a
/// repeated `register` of the same path observes the same live state. Once
/// the field is unregistered the handle is detached: reads return neutral
/// values and writes are dropped.
#[derive(Clone)]
pub struct Field {
    id: FieldId,
    shared: Rc<Shared>,
}

impl Field {
    pub(crate) fn new(id: FieldId, shared: Rc<Shared>) -> Self {
        Self { id, shared }
    }

    pub fn id(&self) -> &FieldId {
        &self.id
    }

    /// Current path, or `None` once the field is unregistered.
    pub fn path(&self) -> Option<Path> {
        self.shared.read(|state| state.path_of(&self.id).cloned())
    }

    /// Current value in the document; `null` when detached or missing.
    pub fn model_value(&self) -> Value {
        self.shared.read(|state| state.value_of(&self.id))
    }

    pub fn value(&self) -> Value {
        self.model_value()
    }

    /// Write a value at the field's current path. An empty string is stored
    /// as `null`.
    pub fn set_value(&self, value: Value) -> Result<(), FormError> {
        self.shared.mutate(|state| state.set_value(&self.id, value))
    }

    /// Input binding alias of [`set_value`](Self::set_value).
    pub fn update_model_value(&self, value: Value) -> Result<(), FormError> {
        self.set_value(value)
    }

    pub fn on_blur(&self) {
        self.shared.mutate(|state| state.mark_blurred(&self.id));
    }

    pub fn on_change(&self) {
        self.shared.mutate(|state| state.mark_changed(&self.id));
    }

    /// Mark this field and every field registered below it as touched.
    pub fn blur_all(&self) {
        self.shared.mutate(|state| state.blur_descendants(&self.id, View::Field));
    }

    /// Blurred itself, or any field registered below it was.
    pub fn is_touched(&self) -> bool {
        self.shared.read(|state| state.is_touched(&self.id))
    }

    pub fn is_dirty(&self) -> bool {
        self.shared.read(|state| state.is_dirty(&self.id, View::Field))
    }

    /// Sticky: stays set once `on_change` fired, even if the value reverts.
    pub fn is_changed(&self) -> bool {
        self.shared.read(|state| state.is_changed(&self.id))
    }

    pub fn is_valid(&self) -> bool {
        self.shared.read_validated(|state| state.is_node_valid(&self.id))
    }

    /// Errors at or below this field, with paths relative to it.
    pub fn errors(&self) -> Vec<FormattedError> {
        self.shared.read_validated(|state| state.errors_of(&self.id))
    }

    pub fn raw_errors(&self) -> Vec<Issue> {
        self.shared.read_validated(|state| state.raw_errors_of(&self.id))
    }

    /// Register a path relative to this field.
    pub fn register(&self, child: &str, default: Option<Value>) -> Result<Field, FormError> {
        let id = self.shared.mutate(|state| state.register_child(&self.id, child, default))?;
        Ok(Field::new(id, self.shared.clone()))
    }

    pub fn register_array(&self, child: &str, default: Option<Vec<Value>>) -> Result<FieldArray, FormError> {
        let id = self
            .shared
            .mutate(|state| state.register_child_array(&self.id, child, default))?;
        Ok(FieldArray::new(id, self.shared.clone()))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("id", &self.id)
            .field("path", &self.path())
            .finish()
    }
}
