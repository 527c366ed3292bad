//! Reading and writing JSON documents through [`Path`]s.

use serde_json::{Map, Value};

use crate::{Path, PathError, PathStep};

fn step_ref<'a>(current: &'a Value, step: &PathStep) -> Option<&'a Value> {
    match (current, step) {
        (Value::Array(arr), PathStep::Index(index)) => arr.get(*index),
        (Value::Object(map), step) => map.get(&step.to_string()),
        _ => None,
    }
}

fn step_mut<'a>(current: &'a mut Value, step: &PathStep) -> Option<&'a mut Value> {
    match (current, step) {
        (Value::Array(arr), PathStep::Index(index)) => arr.get_mut(*index),
        (Value::Object(map), step) => map.get_mut(&step.to_string()),
        _ => None,
    }
}

/// Get a value from a document by path.
///
/// Walks the path segment by segment and returns `None` as soon as an
/// intermediate value is missing or not a container. When the walk finds
/// nothing, the literal dotted string is tried as a top-level key, which
/// supports documents that store flat-keyed values.
///
/// # Example
///
/// ```
/// use formango_path::{get, Path};
/// use serde_json::json;
///
/// let doc = json!({"a": {"b": [1, 2]}, "x.y": true});
/// assert_eq!(get(&doc, &Path::parse("a.b.1").unwrap()), Some(&json!(2)));
/// assert_eq!(get(&doc, &Path::parse("x.y").unwrap()), Some(&json!(true)));
/// assert_eq!(get(&doc, &Path::parse("a.c").unwrap()), None);
/// ```
pub fn get<'a>(doc: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = doc;
    let mut found = true;
    for step in path.steps() {
        match step_ref(current, step) {
            Some(next) => current = next,
            None => {
                found = false;
                break;
            }
        }
    }
    if found {
        return Some(current);
    }
    match doc {
        Value::Object(map) if path.len() > 1 => map.get(&path.to_string()),
        _ => None,
    }
}

/// Get a mutable reference to a value by path. No flat-key fallback.
pub fn get_mut<'a>(doc: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    let mut current = doc;
    for step in path.steps() {
        current = step_mut(current, step)?;
    }
    Some(current)
}

/// Return the child slot for `step`, turning `container` into an array or an
/// object first when it is not one already.
fn vivify<'a>(container: &'a mut Value, step: &PathStep, path: &Path) -> Result<&'a mut Value, PathError> {
    match container {
        Value::Array(arr) => match step {
            PathStep::Index(index) => {
                if arr.len() <= *index {
                    arr.resize(*index + 1, Value::Null);
                }
                Ok(&mut arr[*index])
            }
            PathStep::Key(_) => Err(PathError::KeyOnArray {
                path: path.to_string(),
            }),
        },
        Value::Object(map) => Ok(map.entry(step.to_string()).or_insert(Value::Null)),
        other => {
            *other = match step {
                PathStep::Index(_) => Value::Array(Vec::new()),
                PathStep::Key(_) => Value::Object(Map::new()),
            };
            vivify(other, step, path)
        }
    }
}

/// Set a value in a document by path.
///
/// Missing or scalar intermediates are replaced by a container whose kind is
/// chosen by the segment that follows them: an array when it is an index,
/// an object otherwise. Arrays are padded with `null` up to the written index.
///
/// # Errors
///
/// `PathError::KeyOnArray` when a key segment would be written into an
/// existing array.
///
/// # Example
///
/// ```
/// use formango_path::{set, Path};
/// use serde_json::json;
///
/// let mut doc = json!({});
/// set(&mut doc, &Path::parse("array.0.0.name").unwrap(), json!("John")).unwrap();
/// assert_eq!(doc, json!({"array": [[{"name": "John"}]]}));
/// ```
pub fn set(doc: &mut Value, path: &Path, value: Value) -> Result<(), PathError> {
    let mut current = doc;
    for step in path.steps() {
        current = vivify(current, step, path)?;
    }
    *current = value;
    Ok(())
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Array(arr) => arr.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Remove the value at `path`.
///
/// Array elements are spliced out. Object properties are deleted unless
/// they hold an array, so a field-array keeps its (possibly empty) array.
/// When the containing value is left empty, the removal walks up and drops
/// the container from its parent object too, never touching the document
/// root. Pruning stops at array elements so sibling indices stay put.
///
/// # Example
///
/// ```
/// use formango_path::{unset, Path};
/// use serde_json::json;
///
/// let mut doc = json!({"a": {"b": {"c": 1}}, "list": ["x"]});
/// unset(&mut doc, &Path::parse("a.b.c").unwrap());
/// unset(&mut doc, &Path::parse("list.0").unwrap());
/// assert_eq!(doc, json!({"list": []}));
/// ```
pub fn unset(doc: &mut Value, path: &Path) {
    let (Some(parent), Some(last)) = (path.parent(), path.last()) else {
        return;
    };
    let Some(container) = get_mut(doc, &parent) else {
        return;
    };
    match (&mut *container, last) {
        (Value::Array(arr), PathStep::Index(index)) => {
            if *index < arr.len() {
                arr.remove(*index);
            }
        }
        (Value::Object(map), step) => {
            let key = step.to_string();
            if !matches!(map.get(&key), Some(Value::Array(_))) {
                map.remove(&key);
            }
        }
        _ => {}
    }
    if path.len() > 1 && is_empty_container(container) {
        prune(doc, &parent);
    }
}

fn prune(doc: &mut Value, path: &Path) {
    let (Some(parent), Some(last)) = (path.parent(), path.last()) else {
        return;
    };
    let Some(Value::Object(map)) = get_mut(doc, &parent) else {
        return;
    };
    let key = last.to_string();
    if matches!(map.get(&key), Some(Value::Array(_))) {
        return;
    }
    map.remove(&key);
    if path.len() > 1 && map.is_empty() {
        prune(doc, &parent);
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
    fn test_get_nested() {
        let doc = json!({"a": {"b": [{"c": "x"}]}});
        assert_eq!(get(&doc, &p("a.b.0.c")), Some(&json!("x")));
        assert_eq!(get(&doc, &p("a.b.1.c")), None);
        assert_eq!(get(&doc, &Path::root()), Some(&doc));
    }

    #[test]
    fn test_get_explicit_null() {
        let doc = json!({"name": null});
        assert_eq!(get(&doc, &p("name")), Some(&Value::Null));
        assert_eq!(get(&doc, &p("name.first")), None);
    }

    #[test]
    fn test_get_index_on_object() {
        let doc = json!({"map": {"0": "zero"}});
        assert_eq!(get(&doc, &p("map.0")), Some(&json!("zero")));
    }

    #[test]
    fn test_set_vivifies_by_next_segment() {
        let mut doc = json!({});
        set(&mut doc, &p("a.b"), json!(1)).unwrap();
        set(&mut doc, &p("list.2"), json!("c")).unwrap();
        assert_eq!(doc, json!({"a": {"b": 1}, "list": [null, null, "c"]}));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut doc = json!({"a": null});
        set(&mut doc, &p("a.b"), json!("x")).unwrap();
        assert_eq!(doc, json!({"a": {"b": "x"}}));
    }

    #[test]
    fn test_set_key_on_array_fails() {
        let mut doc = json!({"list": []});
        let err = set(&mut doc, &p("list.name"), json!(1)).unwrap_err();
        assert_eq!(
            err,
            PathError::KeyOnArray {
                path: "list.name".to_string()
            }
        );
    }

    #[test]
    fn test_unset_property() {
        let mut doc = json!({"name": "John", "age": 3});
        unset(&mut doc, &p("name"));
        assert_eq!(doc, json!({"age": 3}));
    }

    #[test]
    fn test_unset_keeps_array_properties() {
        let mut doc = json!({"list": [1]});
        unset(&mut doc, &p("list"));
        assert_eq!(doc, json!({"list": [1]}));
    }

    #[test]
    fn test_unset_prunes_empty_objects() {
        let mut doc = json!({"a": {"b": {"c": 1}}, "d": 2});
        unset(&mut doc, &p("a.b.c"));
        assert_eq!(doc, json!({"d": 2}));
    }

    #[test]
    fn test_unset_nested_array_element() {
        let mut doc = json!({"array": [["x"], ["y"]]});
        unset(&mut doc, &p("array.0.0"));
        assert_eq!(doc, json!({"array": [[], ["y"]]}));
    }

    #[test]
    fn test_unset_does_not_prune_array_elements() {
        let mut doc = json!({"users": [{"name": "a"}, {"name": "b"}]});
        unset(&mut doc, &p("users.0.name"));
        assert_eq!(doc, json!({"users": [{}, {"name": "b"}]}));
    }

    #[test]
    fn test_unset_missing_is_noop() {
        let mut doc = json!({"a": 1});
        unset(&mut doc, &p("b.c"));
        unset(&mut doc, &p("a.0"));
        assert_eq!(doc, json!({"a": 1}));
    }
}
