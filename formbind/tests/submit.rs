//! Tests for the submission pipeline and the async helpers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use formbind::{
    bind, Data, Errors, FieldNode, FieldPath, FieldValue, FormConfig, SubmitError, SubmitOverrides,
    Validator,
};
use formdom::{Element, EventKind};

fn text(value: &str) -> FieldNode<FieldValue> {
    FieldNode::Leaf(FieldValue::Text(value.to_string()))
}

fn error_at(path: &str, message: &str) -> Errors {
    let mut errors = Errors::map();
    errors.set_leaf(&FieldPath::parse(path), vec![message.to_string()]);
    errors
}

fn require_email(data: &Data) -> Option<Errors> {
    match data.get(&FieldPath::parse("email")) {
        Some(FieldNode::Leaf(FieldValue::Text(s))) if !s.is_empty() => Some(Errors::map()),
        _ => Some(error_at("email", "required")),
    }
}

#[tokio::test]
async fn test_submit_calls_handler_with_snapshot() {
    let email = Element::text_input("email").value("a@b.c");
    let form = Element::form().child(email);

    let submitted = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&submitted);
    let handle = bind(
        &form,
        FormConfig::new().on_submit(move |data, cx| {
            let sink = Arc::clone(&sink);
            async move {
                assert!(cx.form.is_form());
                assert_eq!(cx.controls.len(), 1);
                *sink.lock().unwrap() = Some(data);
                Ok(())
            }
        }),
    )
    .unwrap();

    handle.submit().await.unwrap();
    let data = submitted.lock().unwrap().clone().unwrap();
    assert_eq!(data.get(&FieldPath::parse("email")), Some(&text("a@b.c")));
    assert!(!handle.stores().is_submitting.get());
}

#[tokio::test]
async fn test_invalid_submission_blocks_handler_and_touches_all() {
    let form = Element::form()
        .child(Element::text_input("email"))
        .child(Element::text_input("name"));

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let handle = bind(
        &form,
        FormConfig::new()
            .validate(require_email)
            .on_submit(move |_data, _cx| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            }),
    )
    .unwrap();

    handle.submit().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let touched = handle.stores().touched.get();
    assert_eq!(touched.get(&FieldPath::parse("email")), Some(&FieldNode::Leaf(true)));
    assert_eq!(touched.get(&FieldPath::parse("name")), Some(&FieldNode::Leaf(true)));
    assert!(!handle.stores().is_valid().get());
}

#[tokio::test]
async fn test_handler_error_propagates_without_recovery_hook() {
    let form = Element::form().child(Element::text_input("email").value("a@b.c"));
    let handle = bind(
        &form,
        FormConfig::new().on_submit(|_data, _cx| async { Err(SubmitError::message("server down")) }),
    )
    .unwrap();

    let err = handle.submit().await.unwrap_err();
    assert!(err.to_string().contains("server down"));
    assert!(!handle.stores().is_submitting.get());
}

#[tokio::test]
async fn test_recovery_hook_maps_failure_to_errors() {
    let form = Element::form().child(Element::text_input("email").value("taken@b.c"));
    let handle = bind(
        &form,
        FormConfig::new()
            .on_submit(|_data, _cx| async { Err(SubmitError::message("409")) })
            .on_error(|err| {
                assert!(err.to_string().contains("409"));
                Some(error_at("email", "already registered"))
            }),
    )
    .unwrap();

    handle.submit().await.unwrap();
    assert_eq!(
        handle.stores().errors.get().get(&FieldPath::parse("email")),
        Some(&FieldNode::Leaf(vec!["already registered".to_string()]))
    );
}

#[tokio::test]
async fn test_validator_panic_escalates_on_submit() {
    let form = Element::form().child(Element::text_input("email"));
    let handle = bind(&form, FormConfig::new()).unwrap();

    let overrides =
        SubmitOverrides::new().validator(Validator::sync(|_| panic!("submit-time crash")));
    let submit = handle.create_submit_handler(overrides);
    let err = submit().await.unwrap_err();
    assert!(matches!(err, SubmitError::ValidatorPanic(_)));
    assert!(err.to_string().contains("submit-time crash"));
}

#[tokio::test]
async fn test_is_submitting_visible_during_handler() {
    let form = Element::form().child(Element::text_input("email").value("x"));
    let observed = Arc::new(Mutex::new(false));

    let handle = bind(&form, FormConfig::new()).unwrap();
    let stores = handle.stores().clone();
    let sink = Arc::clone(&observed);
    let overrides = SubmitOverrides::new().on_submit(move |_data, _cx| {
        let stores = stores.clone();
        let sink = Arc::clone(&sink);
        async move {
            *sink.lock().unwrap() = stores.is_submitting.get();
            Ok(())
        }
    });
    let submit = handle.create_submit_handler(overrides);
    submit().await.unwrap();
    assert!(*observed.lock().unwrap());
    assert!(!handle.stores().is_submitting.get());
}

#[tokio::test]
async fn test_submit_event_drives_pipeline() {
    let form = Element::form().child(Element::text_input("email").value("x"));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let _handle = bind(
        &form,
        FormConfig::new().on_submit(move |_data, _cx| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        }),
    )
    .unwrap();

    form.emit(EventKind::Submit);
    // The event handler spawns the pipeline; give it a moment.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_async_validator_runs_reactively() {
    let email = Element::text_input("email");
    let form = Element::form().child(email.clone());
    let handle = bind(
        &form,
        FormConfig::new().validate_async(|data: Data| async move {
            match data.get(&FieldPath::parse("email")) {
                Some(FieldNode::Leaf(FieldValue::Text(s))) if s == "taken" => {
                    Some(error_at("email", "taken"))
                }
                _ => Some(Errors::map()),
            }
        }),
    )
    .unwrap();

    email.set_value("taken");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        handle.stores().errors.get().get(&FieldPath::parse("email")),
        Some(&FieldNode::Leaf(vec!["taken".to_string()]))
    );
    assert!(!handle.stores().is_validating().get());
}

#[tokio::test(start_paused = true)]
async fn test_debounced_validator_fires_once_after_quiet_period() {
    let email = Element::text_input("email");
    let form = Element::form().child(email.clone());

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let _handle = bind(
        &form,
        FormConfig::new()
            .debounce_delay(Duration::from_millis(100))
            .debounced_validator(Validator::asynchronous(move |_data| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Some(Errors::map())
                }
            })),
    )
    .unwrap();

    // A burst of edits within the window schedules only the last run.
    email.set_value("a");
    email.set_value("ab");
    email.set_value("abc");
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_validate_helper_publishes_and_returns() {
    let form = Element::form().child(Element::text_input("email"));
    let handle = bind(&form, FormConfig::new()).unwrap();
    // No validators configured.
    assert!(handle.validate().await.is_none());

    let form2 = Element::form().child(Element::text_input("email"));
    let handle2 = bind(&form2, FormConfig::new().validate(require_email)).unwrap();
    let errors = handle2.validate().await.unwrap();
    assert_eq!(
        errors.get(&FieldPath::parse("email")),
        Some(&FieldNode::Leaf(vec!["required".to_string()]))
    );
    assert!(!handle2.stores().is_valid().get());
}

#[tokio::test]
async fn test_helpers_set_and_unset_fields() {
    let form = Element::form().child(Element::text_input("email"));
    let handle = bind(&form, FormConfig::new()).unwrap();

    handle.set_field("email", "a@b.c", true);
    assert_eq!(
        handle.stores().data.get().get(&FieldPath::parse("email")),
        Some(&text("a@b.c"))
    );
    assert_eq!(
        handle.stores().touched.get().get(&FieldPath::parse("email")),
        Some(&FieldNode::Leaf(true))
    );

    handle.set_error("email", vec!["bad".to_string()]);
    assert!(!handle.stores().is_valid().get());

    handle.unset_field("email");
    assert!(handle.stores().data.get().get(&FieldPath::parse("email")).is_none());
    assert!(handle
        .stores()
        .touched
        .get()
        .get(&FieldPath::parse("email"))
        .is_none());
    assert_eq!(handle.get_field("email"), None);
}

#[tokio::test]
async fn test_set_fields_replaces_whole_data_tree() {
    let form = Element::form()
        .child(Element::text_input("email"))
        .child(Element::text_input("profile.name"));
    let handle = bind(&form, FormConfig::new()).unwrap();

    let mut snapshot = Data::map();
    snapshot.set_leaf(&FieldPath::parse("email"), FieldValue::from("a@b.c"));
    snapshot.set_leaf(&FieldPath::parse("profile.name"), FieldValue::from("Ada"));
    handle.set_fields(snapshot.clone());

    assert_eq!(handle.stores().data.get(), snapshot);
    assert!(handle.stores().is_dirty.get());
}

#[tokio::test]
async fn test_reset_restores_initial_state() {
    let email = Element::text_input("email").value("initial");
    let form = Element::form().child(email.clone());
    let handle = bind(&form, FormConfig::new()).unwrap();

    email.set_value("edited");
    email.emit(EventKind::Input);
    assert!(handle.stores().is_dirty.get());

    handle.reset();
    assert_eq!(
        handle.stores().data.get().get(&FieldPath::parse("email")),
        Some(&text("initial"))
    );
    assert_eq!(
        handle.stores().touched.get().get(&FieldPath::parse("email")),
        Some(&FieldNode::Leaf(false))
    );
    assert!(!handle.stores().is_dirty.get());
    assert!(handle.stores().interacted.get().is_none());

    // Resetting twice is harmless.
    handle.reset();
    assert!(!handle.stores().is_dirty.get());
}

// ==== End to end ====

#[tokio::test]
async fn test_login_flow() {
    let email = Element::text_input("email").id("email");
    let password = Element::input(formdom::InputType::Password)
        .name("password")
        .id("password");
    let form = Element::form().child(email.clone()).child(password.clone());

    let submitted = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&submitted);
    let handle = bind(
        &form,
        FormConfig::new()
            .validate(|data: &Data| {
                let mut errors = Errors::map();
                for field in ["email", "password"] {
                    let empty = match data.get(&FieldPath::parse(field)) {
                        Some(FieldNode::Leaf(FieldValue::Text(s))) => s.is_empty(),
                        _ => true,
                    };
                    if empty {
                        errors.set_leaf(&FieldPath::parse(field), vec!["required".to_string()]);
                    }
                }
                Some(errors)
            })
            .on_submit(move |data, _cx| {
                let sink = Arc::clone(&sink);
                async move {
                    *sink.lock().unwrap() = Some(data.to_json());
                    Ok(())
                }
            }),
    )
    .unwrap();

    // Empty form: submission blocked, everything touched.
    handle.submit().await.unwrap();
    assert!(submitted.lock().unwrap().is_none());
    assert!(!handle.stores().is_valid().get());

    // Fill in both fields the way a user would.
    email.set_value("user@example.com");
    email.emit(EventKind::Input);
    email.emit(EventKind::Blur);
    password.set_value("hunter2");
    password.emit(EventKind::Input);
    password.emit(EventKind::Blur);
    assert!(handle.stores().is_valid().get());
    assert!(handle.stores().is_dirty.get());

    handle.submit().await.unwrap();
    let payload = submitted.lock().unwrap().clone().unwrap();
    assert_eq!(
        payload,
        serde_json::json!({ "email": "user@example.com", "password": "hunter2" })
    );
}
