use std::fmt;
use std::rc::Rc;

use formango_path::Path;
use serde_json::Value;
use tracing::{debug, warn};

use crate::engine::Shared;
use crate::error::FormError;
use crate::error_tree::ErrorTree;
use crate::field::Field;
use crate::field_array::FieldArray;
use crate::id::FormId;
use crate::issue::{FormattedError, Issue};
use crate::options::{FormOptions, SubmitError, SubmitErrorHandler, SubmitHandler};
use crate::reactive::WatchId;
use crate::schema::{IssueSource, Schema, Validation};

/// A form over one document, validated by `S`.
///
/// # Example
///
/// ```
/// use formango::{schema_fn, Form, FormOptions, Issue, Validation};
/// use serde_json::{json, Value};
///
/// let schema = schema_fn(|doc: &Value| match doc["name"].as_str() {
///     Some(name) if !name.is_empty() => Validation::Valid(name.to_string()),
///     _ => Validation::Invalid(vec![Issue::at("Required", "name")]),
/// });
/// let form = Form::new(FormOptions::new(schema));
/// let name = form.register("name", None).unwrap();
/// assert!(!form.is_valid());
/// assert_eq!(name.errors()[0].message, "Required");
///
/// name.set_value(json!("John")).unwrap();
/// assert!(form.is_valid());
/// assert!(name.is_dirty());
/// ```
pub struct Form<S: Schema> {
    shared: Rc<Shared>,
    schema: Rc<S>,
    on_submit: Option<SubmitHandler<S::Output>>,
    on_submit_error: Option<SubmitErrorHandler>,
}

impl<S> Form<S>
where
    S: Schema + 'static,
    S::Output: 'static,
{
    /// Create a form and run the first validation pass.
    pub fn new(options: FormOptions<S>) -> Self {
        let schema = Rc::new(options.schema);
        let source: Rc<dyn IssueSource> = schema.clone();
        let shared = Rc::new(Shared::new(source, options.initial_state, options.inspector, options.id_seed));
        if let Some(inspector) = shared.inspector() {
            inspector.register_form(&shared.id, options.name.as_deref());
        }
        debug!(form = %shared.id, "form created");
        shared.ensure_validated();
        Self {
            shared,
            schema,
            on_submit: options.on_submit,
            on_submit_error: options.on_submit_error,
        }
    }

    pub fn id(&self) -> &FormId {
        &self.shared.id
    }

    /// Register a field at a dotted path, or look up the one already there.
    ///
    /// A missing or `null` value is seeded with `default`. Registering an
    /// existing path returns a handle to the same field; if its value is
    /// `null` or an empty array the default is written.
    pub fn register(&self, path: &str, default: Option<Value>) -> Result<Field, FormError> {
        let path = Path::parse(path)?;
        let id = self.shared.mutate(|state| state.register(&path, default))?;
        Ok(Field::new(id, self.shared.clone()))
    }

    /// Register a field array. A missing value becomes `[]`; `default`
    /// elements are appended only when the array is empty.
    pub fn register_array(&self, path: &str, default: Option<Vec<Value>>) -> Result<FieldArray, FormError> {
        let path = Path::parse(path)?;
        let id = self.shared.mutate(|state| state.register_array(&path, default))?;
        Ok(FieldArray::new(id, self.shared.clone()))
    }

    /// Drop a registration and its value. Array element paths renumber the
    /// fields of the following elements.
    pub fn unregister(&self, path: &str) -> Result<(), FormError> {
        let path = Path::parse(path)?;
        self.shared.mutate(|state| state.unregister(&path))
    }

    /// Write several values at once. Keys are dotted paths; each value
    /// replaces what was there.
    pub fn set_values(&self, values: &Value) -> Result<(), FormError> {
        self.shared.mutate(|state| state.set_values(values))
    }

    /// Append externally produced errors, such as server-side validation,
    /// to the current issue list. The next validation pass replaces them.
    pub fn add_errors(&self, errors: impl IntoIterator<Item = FormattedError>) {
        self.shared.ensure_validated();
        self.shared.mutate(|state| state.add_errors(errors));
    }

    /// Mark every registered field as touched.
    pub fn blur_all(&self) {
        self.shared.mutate(|state| state.blur_all());
    }

    /// Restore the configured initial state and clear touched flags and the
    /// submit attempt.
    pub fn reset(&self) -> Result<(), FormError> {
        self.shared.mutate(|state| state.reset())
    }

    /// Adopt a new initial state unless the form is dirty. Returns whether
    /// it was applied.
    pub fn update_initial_state(&self, state: Value) -> bool {
        self.shared.mutate(|form| form.update_initial_state(state))
    }

    /// Validate and hand the typed output to the submit handler.
    ///
    /// An invalid document is not an error: the error callback receives the
    /// document and its errors and `Ok(())` is returned. A submit started
    /// while another one is in flight is ignored.
    ///
    /// # Errors
    ///
    /// `FormError::MissingSubmitHandler` when the document is valid but no
    /// submit handler was configured.
    pub async fn submit(&self) -> Result<(), FormError> {
        if self.is_submitting() {
            warn!(form = %self.shared.id, "submit ignored, already submitting");
            return Ok(());
        }
        // Claimed before the first await so overlapping calls see it.
        self.shared.mutate(|state| {
            state.has_attempted = true;
            state.submitting = true;
            state.blur_all();
        });
        self.shared.settle().await;
        if !self.is_valid() {
            debug!(form = %self.shared.id, "submit refused, form is invalid");
            self.shared.mutate(|state| state.submitting = false);
            self.report_submit_error();
            return Ok(());
        }

        let (snapshot, revision) = self
            .shared
            .read(|state| (state.store.value().clone(), state.store.revision()));
        let Some(handler) = self.on_submit.clone() else {
            self.shared.mutate(|state| state.submitting = false);
            return Err(FormError::MissingSubmitHandler);
        };
        debug!(form = %self.shared.id, "submitting");

        match self.schema.validate(&snapshot).resolve().await {
            Validation::Invalid(issues) => {
                self.shared.mutate(|state| {
                    if state.store.revision() == revision {
                        state.validation.replace(issues);
                    }
                    state.submitting = false;
                });
                self.report_submit_error();
            }
            Validation::Valid(output) => {
                handler(output).await;
                self.shared.mutate(|state| {
                    state.replace_initial(snapshot);
                    state.submitting = false;
                });
                debug!(form = %self.shared.id, "submitted");
            }
        }
        Ok(())
    }

    fn report_submit_error(&self) {
        let Some(callback) = &self.on_submit_error else {
            return;
        };
        let error = SubmitError {
            data: self.state(),
            errors: self.errors(),
        };
        callback(&error);
    }

    /// Wait until the issue list reflects the current document.
    pub async fn settle(&self) {
        self.shared.settle().await;
    }

    /// Run `f` as one batch: watchers and revalidation run once at the end.
    pub fn batch<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        self.shared.batch(|| f(self))
    }

    /// Observe document changes. Called once per batch that changed it.
    pub fn watch(&self, watcher: impl FnMut(&Value) + 'static) -> WatchId {
        self.shared.watch(Box::new(watcher))
    }

    pub fn unwatch(&self, id: WatchId) -> bool {
        self.shared.unwatch(id)
    }

    /// A copy of the current document.
    pub fn state(&self) -> Value {
        self.shared.read(|state| state.store.value().clone())
    }

    pub fn errors(&self) -> Vec<FormattedError> {
        self.shared.read_validated(|state| state.formatted_errors())
    }

    pub fn raw_errors(&self) -> Vec<Issue> {
        self.shared.read_validated(|state| state.validation.issues().to_vec())
    }

    pub fn error_tree(&self) -> ErrorTree {
        self.shared
            .read_validated(|state| ErrorTree::from_issues(state.validation.issues()))
    }

    pub fn is_valid(&self) -> bool {
        self.shared.read_validated(|state| state.validation.issues().is_empty())
    }

    /// Whether any registered field or field array is dirty.
    pub fn is_dirty(&self) -> bool {
        self.shared.read(|state| state.is_form_dirty())
    }

    pub fn is_submitting(&self) -> bool {
        self.shared.read(|state| state.submitting)
    }

    pub fn has_attempted_to_submit(&self) -> bool {
        self.shared.read(|state| state.has_attempted)
    }

    /// Number of registered paths.
    pub fn field_count(&self) -> usize {
        self.shared.read(|state| state.registered_count())
    }
}

impl<S: Schema> fmt::Debug for Form<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form").field("id", &self.shared.id).finish_non_exhaustive()
    }
}
