mod common;

use common::{any_form, path_string};
use formango::FormError;
use serde_json::{json, Value};

#[test]
fn test_unregister_index_renumbers_siblings() {
    let form = any_form();
    let foo = form.register("tags.0", Some(json!("Foo"))).unwrap();
    let bar = form.register("tags.1", Some(json!("Bar"))).unwrap();

    form.unregister("tags.0").unwrap();

    assert_eq!(form.state(), json!({"tags": ["Bar"]}));
    assert_eq!(path_string(bar.path()).as_deref(), Some("tags.0"));
    assert_eq!(bar.value(), json!("Bar"));

    assert_eq!(foo.path(), None);
    assert_eq!(foo.value(), Value::Null);
    assert!(!foo.is_dirty());
    assert!(!foo.is_valid());
}

#[test]
fn test_reregister_renumbered_path_returns_moved_field() {
    let form = any_form();
    form.register("tags.0", Some(json!("Foo"))).unwrap();
    let bar = form.register("tags.1", Some(json!("Bar"))).unwrap();
    form.unregister("tags.0").unwrap();

    let again = form.register("tags.0", None).unwrap();
    assert_eq!(again.id(), bar.id());
}

#[test]
fn test_unregister_index_removes_element_subtree() {
    let form = any_form();
    let first_name = form.register("users.0.name", Some(json!("a"))).unwrap();
    let second_name = form.register("users.1.name", Some(json!("b"))).unwrap();
    let second_age = form.register("users.1.age", Some(json!(3))).unwrap();
    // users.0, users.0.name, users.1, users.1.name, users.1.age
    assert_eq!(form.field_count(), 5);

    form.unregister("users.0").unwrap();

    assert_eq!(form.state(), json!({"users": [{"name": "b", "age": 3}]}));
    assert_eq!(first_name.path(), None);
    assert_eq!(path_string(second_name.path()).as_deref(), Some("users.0.name"));
    assert_eq!(path_string(second_age.path()).as_deref(), Some("users.0.age"));
    assert_eq!(form.field_count(), 3);
}

#[test]
fn test_unregister_field_removes_value() {
    let form = any_form();
    let name = form.register("name", Some(json!("John"))).unwrap();
    form.register("age", Some(json!(30))).unwrap();

    form.unregister("name").unwrap();

    assert_eq!(form.state(), json!({"age": 30}));
    assert_eq!(name.path(), None);
    assert_eq!(form.field_count(), 1);

    // Writes through a detached handle are dropped.
    name.set_value(json!("Joe")).unwrap();
    assert_eq!(form.state(), json!({"age": 30}));
}

#[test]
fn test_unregister_object_drops_orphaned_children() {
    let form = any_form();
    let email = form.register("user.email", Some(json!("a@b.c"))).unwrap();
    form.register("user", None).unwrap();

    form.unregister("user").unwrap();

    assert_eq!(form.state(), json!({}));
    assert_eq!(email.path(), None);
    assert_eq!(form.field_count(), 0);
}

#[test]
fn test_unregister_unknown_path_fails() {
    let form = any_form();
    let err = form.unregister("missing").unwrap_err();
    assert_eq!(err, FormError::PathNotRegistered { path: "missing".into() });
}

#[test]
fn test_reregister_after_unregister_gets_fresh_identity() {
    let form = any_form();
    let first = form.register("name", None).unwrap();
    form.unregister("name").unwrap();
    let second = form.register("name", None).unwrap();
    assert_ne!(first.id(), second.id());
    assert_eq!(first.path(), None);
}
