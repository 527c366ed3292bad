//! Schema-validated form state.
//!
//! A [`Form`] owns a JSON document and hands out [`Field`] and
//! [`FieldArray`] handles bound to dotted paths inside it. Each handle has
//! a stable identity that survives array insertions, removals and moves,
//! and exposes derived state: value, dirty, touched, validity and the
//! validation errors scoped to its path.
//!
//! Validation is delegated to a [`Schema`], which only has to turn a
//! document into a typed value or a flat list of path-tagged [`Issue`]s.
//!
//! # Example
//!
//! ```
//! use formango::{schema_fn, Form, FormOptions, Issue, Validation};
//! use serde_json::{json, Value};
//!
//! let schema = schema_fn(|doc: &Value| {
//!     let issues: Vec<Issue> = doc["tags"]
//!         .as_array()
//!         .into_iter()
//!         .flatten()
//!         .enumerate()
//!         .filter(|(_, tag)| !tag.is_string())
//!         .map(|(i, _)| Issue::at("Expected string", &format!("tags.{i}")))
//!         .collect();
//!     if issues.is_empty() {
//!         Validation::Valid(doc.clone())
//!     } else {
//!         Validation::Invalid(issues)
//!     }
//! });
//!
//! let form = Form::new(FormOptions::new(schema));
//! let tags = form.register_array("tags", None).unwrap();
//! tags.append(Some(json!("Foo"))).unwrap();
//! let bar = tags.append(Some(json!("Bar"))).unwrap();
//!
//! tags.remove(0).unwrap();
//! assert_eq!(bar.path().unwrap().to_string(), "tags.0");
//! assert_eq!(bar.value(), json!("Bar"));
//!
//! tags.append(None).unwrap();
//! assert_eq!(tags.errors()[0].path.as_deref(), Some("1"));
//! ```

mod engine;
mod path_table;
mod reconcile;
mod scope;
mod store;
mod validation;

pub mod error;
pub mod error_tree;
pub mod field;
pub mod field_array;
pub mod form;
pub mod id;
pub mod inspector;
pub mod issue;
pub mod options;
pub mod reactive;
pub mod schema;

pub use error::FormError;
pub use error_tree::ErrorTree;
pub use field::Field;
pub use field_array::FieldArray;
pub use form::Form;
pub use formango_path::{Path, PathError, PathStep};
pub use id::{FieldId, FormId, SlotId};
pub use inspector::{InspectedForm, Inspector, InspectorRegistry};
pub use issue::{FormattedError, Issue, IssuePathItem, PathKey};
pub use options::{FormOptions, SubmitError};
pub use reactive::WatchId;
pub use schema::{schema_fn, LocalFuture, MaybeAsync, Schema, SchemaFn, Validation};
