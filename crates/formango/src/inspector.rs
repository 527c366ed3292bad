//! Optional introspection side channel.
//!
//! A form reports its creation and every field it registers or drops to an
//! [`Inspector`]. Inspectors are purely observational: nothing they do can
//! affect the form.

use std::cell::RefCell;

use formango_path::Path;
use indexmap::IndexMap;

use crate::id::{FieldId, FormId};

pub trait Inspector {
    fn register_form(&self, form: &FormId, name: Option<&str>);

    /// Called once per new registration with the path it was registered at.
    /// Later renumbering is not reported; only the id is stable.
    fn register_field(&self, form: &FormId, field: &FieldId, path: &Path);

    fn unregister_field(&self, field: &FieldId);
}

/// What an [`InspectorRegistry`] knows about one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectedForm {
    pub name: Option<String>,
    /// Live fields, each with the path it was registered at. The path is
    /// not updated when array operations renumber the field.
    pub fields: IndexMap<FieldId, Path>,
}

/// In-memory [`Inspector`] recording every form and its live fields.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
///
/// use formango::{schema_fn, Form, FormOptions, InspectorRegistry, Validation};
/// use serde_json::Value;
///
/// let registry = Rc::new(InspectorRegistry::default());
/// let schema = schema_fn(|doc: &Value| Validation::Valid(doc.clone()));
/// let form = Form::new(FormOptions::new(schema).name("signup").inspector(registry.clone()));
/// form.register("email", None).unwrap();
///
/// let inspected = registry.form(form.id()).unwrap();
/// assert_eq!(inspected.name.as_deref(), Some("signup"));
/// assert_eq!(inspected.fields.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InspectorRegistry {
    forms: RefCell<IndexMap<FormId, InspectedForm>>,
}

impl InspectorRegistry {
    pub fn form(&self, id: &FormId) -> Option<InspectedForm> {
        self.forms.borrow().get(id).cloned()
    }

    pub fn form_ids(&self) -> Vec<FormId> {
        self.forms.borrow().keys().cloned().collect()
    }

    pub fn field_count(&self) -> usize {
        self.forms.borrow().values().map(|form| form.fields.len()).sum()
    }
}

impl Inspector for InspectorRegistry {
    fn register_form(&self, form: &FormId, name: Option<&str>) {
        self.forms.borrow_mut().entry(form.clone()).or_default().name = name.map(str::to_string);
    }

    fn register_field(&self, form: &FormId, field: &FieldId, path: &Path) {
        self.forms
            .borrow_mut()
            .entry(form.clone())
            .or_default()
            .fields
            .insert(field.clone(), path.clone());
    }

    fn unregister_field(&self, field: &FieldId) {
        for form in self.forms.borrow_mut().values_mut() {
            form.fields.shift_remove(field);
        }
    }
}
