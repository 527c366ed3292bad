use formango_path::PathError;
use thiserror::Error;

/// Usage errors raised by form operations.
///
/// Validation failures are never reported through this type; they are data
/// exposed by `errors()` and `raw_errors()`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("path `{path}` is not registered")]
    PathNotRegistered { path: String },
    #[error("attempted to submit form but no submit handler is registered")]
    MissingSubmitHandler,
    #[error("in order to reset the form, you need to provide an initial state")]
    MissingInitialState,
    #[error("field `{id}` is no longer registered")]
    Detached { id: String },
    #[error("value at `{path}` is not an array")]
    NotAnArray { path: String },
    #[error("index {index} is out of bounds for `{path}` (length {len})")]
    IndexOutOfBounds { path: String, index: usize, len: usize },
}
