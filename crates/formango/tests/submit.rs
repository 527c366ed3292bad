mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{min, object, options, string, AsyncSchema, Rule};
use formango::{Form, FormError, FormOptions, FormattedError, SubmitError};
use serde_json::{json, Value};

fn name_rule() -> Rule {
    object(vec![("name", min(3))])
}

#[tokio::test]
async fn test_invalid_submit_reports_errors() {
    let submitted = Rc::new(Cell::new(0));
    let failures: Rc<RefCell<Vec<SubmitError>>> = Rc::default();
    let form = {
        let submitted = submitted.clone();
        let failures = failures.clone();
        Form::new(
            options(name_rule())
                .on_submit(move |_| submitted.set(submitted.get() + 1))
                .on_submit_error(move |error| failures.borrow_mut().push(error.clone())),
        )
    };
    let name = form.register("name", Some(json!("Jo"))).unwrap();

    form.submit().await.unwrap();

    assert_eq!(submitted.get(), 0);
    assert!(form.has_attempted_to_submit());
    assert!(name.is_touched());
    assert!(!form.is_submitting());
    let failures = failures.borrow();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].data, json!({"name": "Jo"}));
    assert_eq!(
        failures[0].errors,
        vec![FormattedError::new(
            "String must contain at least 3 character(s)",
            Some("name")
        )]
    );
}

#[tokio::test]
async fn test_valid_submit_passes_output_and_resets_dirty() {
    let received: Rc<RefCell<Option<Value>>> = Rc::default();
    let form = {
        let received = received.clone();
        Form::new(options(name_rule()).on_submit(move |data| *received.borrow_mut() = Some(data)))
    };
    let name = form.register("name", None).unwrap();
    name.set_value(json!("John")).unwrap();
    assert!(form.is_dirty());

    form.submit().await.unwrap();

    assert_eq!(*received.borrow(), Some(json!({"name": "John"})));
    assert!(!form.is_dirty());
    assert!(!name.is_dirty());
    assert!(!form.is_submitting());
    assert!(form.has_attempted_to_submit());
}

#[tokio::test]
async fn test_submit_without_handler_fails() {
    let form = Form::new(options(object(vec![("name", string())])));
    form.register("name", Some(json!("John"))).unwrap();
    assert_eq!(form.submit().await, Err(FormError::MissingSubmitHandler));
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn test_invalid_submit_without_handler_is_not_an_error() {
    let form = Form::new(options(name_rule()));
    form.register("name", None).unwrap();
    assert_eq!(form.submit().await, Ok(()));
}

#[tokio::test]
async fn test_async_handler_keeps_form_submitting() {
    let calls = Rc::new(Cell::new(0));
    let form = {
        let calls = calls.clone();
        Form::new(options(Rule::Any).on_submit_async(move |_| {
            calls.set(calls.get() + 1);
            async {
                tokio::task::yield_now().await;
            }
        }))
    };
    form.register("name", Some(json!("John"))).unwrap();

    let (first, second) = tokio::join!(form.submit(), async {
        assert!(form.is_submitting());
        // Re-entrant submit is ignored while one is in flight.
        form.submit().await
    });

    assert_eq!(first, Ok(()));
    assert_eq!(second, Ok(()));
    assert_eq!(calls.get(), 1);
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn test_async_schema_settles() {
    let form = Form::new(FormOptions::new(AsyncSchema { rule: name_rule() }).id_seed(1));
    let name = form.register("name", Some(json!("Jo"))).unwrap();

    form.settle().await;
    assert!(!form.is_valid());
    assert_eq!(name.errors().len(), 1);

    name.set_value(json!("John")).unwrap();
    form.settle().await;
    assert!(form.is_valid());
}

#[tokio::test]
async fn test_async_schema_submit() {
    let failures = Rc::new(Cell::new(0));
    let form = {
        let failures = failures.clone();
        Form::new(
            FormOptions::new(AsyncSchema { rule: name_rule() })
                .on_submit(|_| {})
                .on_submit_error(move |_| failures.set(failures.get() + 1)),
        )
    };
    let name = form.register("name", Some(json!("Jo"))).unwrap();

    form.submit().await.unwrap();
    assert_eq!(failures.get(), 1);

    name.set_value(json!("John")).unwrap();
    form.submit().await.unwrap();
    assert_eq!(failures.get(), 1);
    assert!(!form.is_dirty());
}

#[tokio::test]
async fn test_overlapping_submits_with_async_schema() {
    let calls = Rc::new(Cell::new(0));
    let form = {
        let calls = calls.clone();
        Form::new(FormOptions::new(AsyncSchema { rule: Rule::Any }).on_submit_async(move |_| {
            calls.set(calls.get() + 1);
            async {}
        }))
    };
    form.register("name", Some(json!("John"))).unwrap();

    let (first, second) = tokio::join!(form.submit(), form.submit());

    assert_eq!(first, Ok(()));
    assert_eq!(second, Ok(()));
    assert_eq!(calls.get(), 1);
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn test_submitting_is_cleared_after_async_refusal() {
    let form = Form::new(FormOptions::new(AsyncSchema { rule: name_rule() }).on_submit(|_| {}));
    form.register("name", Some(json!("Jo"))).unwrap();

    let (result, during) = tokio::join!(form.submit(), async { form.is_submitting() });

    assert_eq!(result, Ok(()));
    assert!(during);
    assert!(!form.is_submitting());
}
