//! The live document and its initial snapshot.

use formango_path::{self as doc, Path, PathError};
use serde_json::{Map, Value};

use crate::reactive::Revision;

/// Owns the form document. All writes go through here so the document
/// revision moves on every mutation.
#[derive(Debug)]
pub(crate) struct DocumentStore {
    current: Value,
    initial: Value,
    revision: Revision,
}

impl DocumentStore {
    /// A store whose document and snapshot both start as `value`.
    pub fn new(value: Value) -> Self {
        Self {
            initial: value.clone(),
            current: value,
            revision: Revision::default(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.current
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn get(&self, path: &Path) -> Option<&Value> {
        doc::get(&self.current, path)
    }

    /// Value of the initial snapshot at `path`.
    pub fn initial_at(&self, path: &Path) -> Option<&Value> {
        doc::get(&self.initial, path)
    }

    pub fn set(&mut self, path: &Path, value: Value) -> Result<(), PathError> {
        doc::set(&mut self.current, path, value)?;
        self.revision.bump();
        Ok(())
    }

    pub fn unset(&mut self, path: &Path) {
        doc::unset(&mut self.current, path);
        self.revision.bump();
    }

    /// Mutable access to the array stored at `path`, if there is one.
    pub fn array_mut(&mut self, path: &Path) -> Option<&mut Vec<Value>> {
        let array = doc::get_mut(&mut self.current, path)?.as_array_mut()?;
        self.revision.bump();
        Some(array)
    }

    pub fn replace_initial(&mut self, snapshot: Value) {
        self.initial = snapshot;
    }

    /// Copy the top-level properties of `source` onto the document,
    /// replacing same-named properties and keeping the others.
    pub fn assign_top_level(&mut self, source: &Value) {
        let Value::Object(source) = source else {
            return;
        };
        if !self.current.is_object() {
            self.current = Value::Object(Map::new());
        }
        if let Value::Object(target) = &mut self.current {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }
        self.revision.bump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn test_writes_move_revision_but_not_snapshot() {
        let mut store = DocumentStore::new(json!({"name": "John"}));
        let start = store.revision();
        store.set(&p("name"), json!("Joe")).unwrap();
        assert!(store.revision() > start);
        assert_eq!(store.get(&p("name")), Some(&json!("Joe")));
        assert_eq!(store.initial_at(&p("name")), Some(&json!("John")));
    }

    #[test]
    fn test_assign_top_level_keeps_unrelated_keys() {
        let mut store = DocumentStore::new(json!({"a": 1, "b": {"c": 2}}));
        store.assign_top_level(&json!({"b": {"d": 3}}));
        assert_eq!(store.value(), &json!({"a": 1, "b": {"d": 3}}));
    }

    #[test]
    fn test_array_mut_requires_array() {
        let mut store = DocumentStore::new(json!({"tags": ["a"], "name": "x"}));
        assert!(store.array_mut(&p("name")).is_none());
        store.array_mut(&p("tags")).unwrap().push(json!("b"));
        assert_eq!(store.get(&p("tags")), Some(&json!(["a", "b"])));
    }
}
