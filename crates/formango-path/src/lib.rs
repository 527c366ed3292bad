//! Dotted form paths.
//!
//! This crate implements the path primitives used by the form engine: a
//! dotted path string such as `users.0.name` is parsed once into a [`Path`]
//! of typed [`PathStep`]s, and every prefix, renumbering and document access
//! operation works on those steps instead of on raw strings.
//!
//! # Example
//!
//! ```
//! use formango_path::{get, set, Path};
//! use serde_json::json;
//!
//! let path = Path::parse("users.0.name").unwrap();
//! assert_eq!(path.to_string(), "users.0.name");
//!
//! let mut doc = json!({});
//! set(&mut doc, &path, json!("John")).unwrap();
//! assert_eq!(doc, json!({"users": [{"name": "John"}]}));
//! assert_eq!(get(&doc, &path), Some(&json!("John")));
//! ```

use thiserror::Error;

pub mod document;
pub mod path;

pub use document::{get, get_mut, set, unset};
pub use path::{is_valid_index, Path, PathStep};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path must not be empty")]
    EmptyPath,
    #[error("cannot address key segment of `{path}` inside an array")]
    KeyOnArray { path: String },
}
