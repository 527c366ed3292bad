mod common;

use common::{any_form, options, Rule};
use formango::{Form, FormError};
use serde_json::json;

fn form_with(initial: serde_json::Value) -> Form<common::TestSchema> {
    Form::new(options(Rule::Any).initial_state(initial))
}

#[test]
fn test_reset_without_initial_state_fails() {
    let form = any_form();
    form.register("name", None).unwrap();
    assert_eq!(form.reset(), Err(FormError::MissingInitialState));
}

#[test]
fn test_reset_restores_values_and_clears_flags() {
    let form = form_with(json!({"name": "John"}));
    let name = form.register("name", None).unwrap();
    name.set_value(json!("Joe")).unwrap();
    name.on_blur();
    assert!(name.is_dirty());

    form.reset().unwrap();

    assert_eq!(name.value(), json!("John"));
    assert!(!name.is_touched());
    assert!(!name.is_dirty());
    assert!(!form.is_dirty());
}

#[test]
fn test_reset_keeps_properties_outside_initial_state() {
    let form = form_with(json!({"name": "John"}));
    form.register("name", None).unwrap();
    let extra = form.register("extra", Some(json!("kept"))).unwrap();

    form.reset().unwrap();

    assert_eq!(extra.value(), json!("kept"));
    assert_eq!(form.state(), json!({"name": "John", "extra": "kept"}));
}

#[tokio::test]
async fn test_reset_clears_submit_attempt() {
    let form = Form::new(
        options(common::object(vec![("name", common::min(3))]))
            .initial_state(json!({"name": "Jo"}))
            .on_submit(|_| {}),
    );
    form.register("name", None).unwrap();
    form.submit().await.unwrap();
    assert!(form.has_attempted_to_submit());

    form.reset().unwrap();
    assert!(!form.has_attempted_to_submit());
}

#[test]
fn test_reset_resyncs_array_fields() {
    let form = form_with(json!({"tags": ["a", "b"]}));
    let tags = form.register_array("tags", None).unwrap();
    assert_eq!(tags.fields().len(), 2);
    tags.append(Some(json!("c"))).unwrap();
    assert_eq!(tags.fields().len(), 3);

    form.reset().unwrap();

    assert_eq!(tags.value(), json!(["a", "b"]));
    assert_eq!(tags.fields().len(), 2);
    assert!(!tags.is_dirty());
}

#[test]
fn test_update_initial_state_when_pristine() {
    let form = form_with(json!({"name": "John"}));
    let name = form.register("name", None).unwrap();

    assert!(form.update_initial_state(json!({"name": "Jane"})));
    assert_eq!(name.value(), json!("Jane"));
    assert!(!name.is_dirty());

    form.reset().unwrap();
    assert_eq!(name.value(), json!("Jane"));
}

#[test]
fn test_update_initial_state_skipped_when_dirty() {
    let form = form_with(json!({"name": "John"}));
    let name = form.register("name", None).unwrap();
    name.set_value(json!("Joe")).unwrap();

    assert!(!form.update_initial_state(json!({"name": "Jane"})));
    assert_eq!(name.value(), json!("Joe"));

    form.reset().unwrap();
    assert_eq!(name.value(), json!("John"));
}

#[test]
fn test_reset_drops_fields_of_vanished_elements() {
    let form = form_with(json!({"tags": ["a"]}));
    let tags = form.register_array("tags", None).unwrap();
    let first = form.register("tags.0", None).unwrap();
    let second = tags.append(Some(json!("b"))).unwrap();
    second.on_change();
    assert_eq!(form.field_count(), 3);

    form.reset().unwrap();

    assert_eq!(second.path(), None);
    assert_eq!(form.field_count(), 2);
    assert_eq!(common::path_string(first.path()).as_deref(), Some("tags.0"));

    let third = tags.append(Some(json!("c"))).unwrap();
    assert_ne!(third.id(), second.id());
    assert!(!third.is_changed());
    assert_eq!(common::path_string(third.path()).as_deref(), Some("tags.1"));
}
