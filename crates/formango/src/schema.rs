//! The schema collaborator.
//!
//! A form only needs one capability from a schema library: validate a whole
//! document and either hand back a typed value or a flat list of
//! path-tagged [`Issue`]s. Validation may finish immediately or later.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use serde_json::Value;

use crate::issue::Issue;

/// A boxed, non-`Send` future. Forms are single-threaded.
pub type LocalFuture<T> = Pin<Box<dyn Future<Output = T>>>;

/// A value that is either available now or produced by a future.
pub enum MaybeAsync<T> {
    Ready(T),
    Pending(LocalFuture<T>),
}

impl<T: 'static> MaybeAsync<T> {
    pub fn pending(future: impl Future<Output = T> + 'static) -> Self {
        MaybeAsync::Pending(Box::pin(future))
    }

    pub fn map<U, F>(self, f: F) -> MaybeAsync<U>
    where
        F: FnOnce(T) -> U + 'static,
    {
        match self {
            MaybeAsync::Ready(value) => MaybeAsync::Ready(f(value)),
            MaybeAsync::Pending(future) => MaybeAsync::Pending(Box::pin(async move { f(future.await) })),
        }
    }

    pub async fn resolve(self) -> T {
        match self {
            MaybeAsync::Ready(value) => value,
            MaybeAsync::Pending(future) => future.await,
        }
    }
}

/// Outcome of validating a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation<T> {
    Valid(T),
    Invalid(Vec<Issue>),
}

impl<T> Validation<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn into_issues(self) -> Vec<Issue> {
        match self {
            Validation::Valid(_) => Vec::new(),
            Validation::Invalid(issues) => issues,
        }
    }
}

pub trait Schema {
    /// The typed value handed to the submit handler.
    type Output;

    fn validate(&self, value: &Value) -> MaybeAsync<Validation<Self::Output>>;
}

/// A [`Schema`] backed by a synchronous closure. See [`schema_fn`].
pub struct SchemaFn<F, T> {
    validate: F,
    _output: PhantomData<fn() -> T>,
}

/// Adapt a closure into a [`Schema`].
///
/// # Example
///
/// ```
/// use formango::{schema_fn, Issue, Schema, Validation};
/// use serde_json::{json, Value};
///
/// let schema = schema_fn(|doc: &Value| match doc.get("name").and_then(Value::as_str) {
///     Some(name) => Validation::Valid(name.to_string()),
///     None => Validation::Invalid(vec![Issue::at("Required", "name")]),
/// });
/// assert!(schema.validate(&json!({"name": "John"})).is_ready_and_valid());
/// ```
pub fn schema_fn<F, T>(validate: F) -> SchemaFn<F, T>
where
    F: Fn(&Value) -> Validation<T>,
{
    SchemaFn {
        validate,
        _output: PhantomData,
    }
}

impl<F, T> Schema for SchemaFn<F, T>
where
    F: Fn(&Value) -> Validation<T>,
{
    type Output = T;

    fn validate(&self, value: &Value) -> MaybeAsync<Validation<T>> {
        MaybeAsync::Ready((self.validate)(value))
    }
}

impl<T> MaybeAsync<Validation<T>> {
    /// `true` when validation finished synchronously and succeeded.
    pub fn is_ready_and_valid(&self) -> bool {
        matches!(self, MaybeAsync::Ready(Validation::Valid(_)))
    }
}

/// Type-erased view of a schema used by the watched revalidation, which only
/// cares about issues.
pub(crate) trait IssueSource {
    fn issues(&self, value: &Value) -> MaybeAsync<Vec<Issue>>;
}

impl<S> IssueSource for S
where
    S: Schema,
    S::Output: 'static,
{
    fn issues(&self, value: &Value) -> MaybeAsync<Vec<Issue>> {
        self.validate(value).map(Validation::into_issues)
    }
}
