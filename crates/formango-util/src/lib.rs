//! formango-util - helpers shared by the formango crates.
//!
//! Identity generation for fields, slots and forms, and the JSON equality
//! used by dirty tracking.

pub mod id;
pub mod json_equal;

pub use id::IdGenerator;
pub use json_equal::json_equal;
