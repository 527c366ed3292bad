use std::fmt;
use std::rc::Rc;

use formango_path::Path;
use serde_json::Value;

use crate::engine::{Shared, View};
use crate::error::FormError;
use crate::field::Field;
use crate::id::{FieldId, SlotId};
use crate::issue::{FormattedError, Issue};

/// Handle to a registered field array.
///
/// Structural operations keep three things in step: the document array, the
/// slot list returned by [`fields`](Self::fields), and the paths of every
/// field registered below the array.
///
/// # Example
///
/// ```
/// use formango::{schema_fn, Form, FormOptions, Validation};
/// use serde_json::{json, Value};
///
/// let form = Form::new(FormOptions::new(schema_fn(|doc: &Value| Validation::Valid(doc.clone()))));
/// let tags = form.register_array("tags", None).unwrap();
/// let first = tags.append(Some(json!("foo"))).unwrap();
/// tags.append(Some(json!("bar"))).unwrap();
///
/// tags.move_field(0, 1).unwrap();
/// assert_eq!(first.path().unwrap().to_string(), "tags.1");
/// assert_eq!(form.state(), json!({"tags": ["bar", "foo"]}));
/// ```
#[derive(Clone)]
pub struct FieldArray {
    id: FieldId,
    shared: Rc<Shared>,
}

impl FieldArray {
    pub(crate) fn new(id: FieldId, shared: Rc<Shared>) -> Self {
        Self { id, shared }
    }

    pub fn id(&self) -> &FieldId {
        &self.id
    }

    pub fn path(&self) -> Option<Path> {
        self.shared.read(|state| state.path_of(&self.id).cloned())
    }

    /// One stable key per element, for keyed list rendering.
    pub fn fields(&self) -> Vec<SlotId> {
        self.shared.read(|state| state.slots(&self.id))
    }

    pub fn model_value(&self) -> Value {
        self.shared.read(|state| state.value_of(&self.id))
    }

    pub fn value(&self) -> Value {
        self.model_value()
    }

    /// Insert an element at `index`. Elements at or after `index` shift right;
    /// an index past the end pads the array with `null`.
    pub fn insert(&self, index: usize, value: Option<Value>) -> Result<Field, FormError> {
        let id = self.shared.mutate(|state| state.insert(&self.id, index, value))?;
        Ok(Field::new(id, self.shared.clone()))
    }

    pub fn append(&self, value: Option<Value>) -> Result<Field, FormError> {
        let id = self.shared.mutate(|state| state.append(&self.id, value))?;
        Ok(Field::new(id, self.shared.clone()))
    }

    pub fn prepend(&self, value: Option<Value>) -> Result<Field, FormError> {
        self.insert(0, value)
    }

    /// Remove the element at `index`, renumbering the fields after it.
    pub fn remove(&self, index: usize) -> Result<(), FormError> {
        self.shared.mutate(|state| state.remove(&self.id, index))
    }

    pub fn pop(&self) -> Result<(), FormError> {
        self.shared.mutate(|state| state.pop(&self.id))
    }

    pub fn shift(&self) -> Result<(), FormError> {
        self.shared.mutate(|state| state.shift(&self.id))
    }

    /// Swap the elements at `from` and `to`, carrying their registered
    /// fields along.
    pub fn move_field(&self, from: usize, to: usize) -> Result<(), FormError> {
        self.shared.mutate(|state| state.move_element(&self.id, from, to))
    }

    pub fn empty(&self) -> Result<(), FormError> {
        self.shared.mutate(|state| state.empty(&self.id))
    }

    /// Replace every element, giving each a fresh slot and registration.
    pub fn set_value(&self, values: Vec<Value>) -> Result<(), FormError> {
        self.shared.mutate(|state| state.set_array(&self.id, values))
    }

    /// Mark every field registered below the array as touched.
    pub fn blur_all(&self) {
        self.shared.mutate(|state| state.blur_descendants(&self.id, View::Array));
    }

    pub fn is_touched(&self) -> bool {
        self.shared.read(|state| state.is_touched(&self.id))
    }

    pub fn is_dirty(&self) -> bool {
        self.shared.read(|state| state.is_dirty(&self.id, View::Array))
    }

    pub fn is_valid(&self) -> bool {
        self.shared.read_validated(|state| state.is_node_valid(&self.id))
    }

    pub fn errors(&self) -> Vec<FormattedError> {
        self.shared.read_validated(|state| state.errors_of(&self.id))
    }

    pub fn raw_errors(&self) -> Vec<Issue> {
        self.shared.read_validated(|state| state.raw_errors_of(&self.id))
    }

    /// Register a path relative to the array, such as `0.name`. Slots are
    /// added up to the child's leading index.
    pub fn register(&self, child: &str, default: Option<Value>) -> Result<Field, FormError> {
        let id = self
            .shared
            .mutate(|state| state.register_element_child(&self.id, child, default))?;
        Ok(Field::new(id, self.shared.clone()))
    }

    pub fn register_array(&self, child: &str, default: Option<Vec<Value>>) -> Result<FieldArray, FormError> {
        let id = self
            .shared
            .mutate(|state| state.register_element_child_array(&self.id, child, default))?;
        Ok(FieldArray::new(id, self.shared.clone()))
    }
}

impl fmt::Debug for FieldArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldArray")
            .field("id", &self.id)
            .field("path", &self.path())
            .field("fields", &self.fields().len())
            .finish()
    }
}
