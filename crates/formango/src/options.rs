//! Form configuration.

use std::future::Future;
use std::rc::Rc;

use serde_json::Value;

use crate::inspector::Inspector;
use crate::issue::FormattedError;
use crate::schema::{LocalFuture, Schema};

pub(crate) type SubmitHandler<T> = Rc<dyn Fn(T) -> LocalFuture<()>>;
pub(crate) type SubmitErrorHandler = Rc<dyn Fn(&SubmitError)>;

/// Passed to the submit error callback when a submit is refused.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitError {
    /// The document as it was when validation failed.
    pub data: Value,
    pub errors: Vec<FormattedError>,
}

/// Options for [`Form::new`](crate::Form::new), built by chaining.
///
/// # Example
///
/// ```
/// use formango::{schema_fn, FormOptions, Validation};
/// use serde_json::{json, Value};
///
/// let schema = schema_fn(|doc: &Value| Validation::Valid(doc.clone()));
/// let options = FormOptions::new(schema)
///     .initial_state(json!({"name": "John"}))
///     .on_submit(|data: Value| println!("submitted {data}"))
///     .id_seed(7);
/// # let _ = options;
/// ```
pub struct FormOptions<S: Schema> {
    pub(crate) schema: S,
    pub(crate) initial_state: Option<Value>,
    pub(crate) on_submit: Option<SubmitHandler<S::Output>>,
    pub(crate) on_submit_error: Option<SubmitErrorHandler>,
    pub(crate) inspector: Option<Rc<dyn Inspector>>,
    pub(crate) name: Option<String>,
    pub(crate) id_seed: Option<u64>,
}

impl<S> FormOptions<S>
where
    S: Schema + 'static,
    S::Output: 'static,
{
    pub fn new(schema: S) -> Self {
        Self {
            schema,
            initial_state: None,
            on_submit: None,
            on_submit_error: None,
            inspector: None,
            name: None,
            id_seed: None,
        }
    }

    /// Document the form starts from and returns to on `reset`.
    pub fn initial_state(mut self, state: Value) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Handler receiving the validated output of a successful submit.
    pub fn on_submit<F>(mut self, handler: F) -> Self
    where
        F: Fn(S::Output) + 'static,
    {
        self.on_submit = Some(Rc::new(move |output: S::Output| -> LocalFuture<()> {
            handler(output);
            Box::pin(async {})
        }));
        self
    }

    /// Like [`on_submit`](Self::on_submit), for handlers that suspend. The
    /// form stays submitting until the returned future completes.
    pub fn on_submit_async<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(S::Output) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.on_submit = Some(Rc::new(move |output: S::Output| -> LocalFuture<()> { Box::pin(handler(output)) }));
        self
    }

    pub fn on_submit_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&SubmitError) + 'static,
    {
        self.on_submit_error = Some(Rc::new(handler));
        self
    }

    pub fn inspector(mut self, inspector: Rc<dyn Inspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    /// Display name reported to the inspector.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Seed identity generation, making generated ids reproducible.
    pub fn id_seed(mut self, seed: u64) -> Self {
        self.id_seed = Some(seed);
        self
    }
}
