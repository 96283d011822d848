//! Tests for binding: event flow, watchers, mutations, and teardown.
//!
//! Everything here uses synchronous validators only, so no runtime is
//! needed; the async paths are covered in the submit tests.

use formbind::{bind, BindError, Data, Errors, FieldNode, FieldPath, FieldValue, FormConfig};
use formdom::{Element, EventKind};

fn text(value: &str) -> FieldNode<FieldValue> {
    FieldNode::Leaf(FieldValue::Text(value.to_string()))
}

fn login_form() -> (Element, Element, Element) {
    let email = Element::text_input("email").id("email");
    let password = Element::input(formdom::InputType::Password)
        .name("password")
        .id("password");
    let form = Element::form().child(email.clone()).child(password.clone());
    (form, email, password)
}

#[test]
fn test_bind_rejects_non_form() {
    let not_a_form = Element::container();
    let err = bind(&not_a_form, FormConfig::new()).unwrap_err();
    assert!(matches!(err, BindError::NotAForm { .. }));
}

#[test]
fn test_bind_rejects_double_bind() {
    let (form, _, _) = login_form();
    let handle = bind(&form, FormConfig::new()).unwrap();
    let err = bind(&form, FormConfig::new()).unwrap_err();
    assert!(matches!(err, BindError::AlreadyBound { .. }));

    // After destroy the form can be bound again.
    handle.destroy();
    assert!(bind(&form, FormConfig::new()).is_ok());
}

#[test]
fn test_bind_seeds_data_from_defaults_and_initial_values() {
    let form = Element::form()
        .child(Element::text_input("email").value("from-dom"))
        .child(Element::text_input("name").value("default-name"));

    let mut initial = Data::map();
    initial.set_leaf(&FieldPath::parse("email"), FieldValue::from("from-config"));

    let handle = bind(&form, FormConfig::new().initial_values(initial)).unwrap();
    let data = handle.stores().data.get();
    // Config-supplied values win over extracted defaults.
    assert_eq!(data.get(&FieldPath::parse("email")), Some(&text("from-config")));
    assert_eq!(data.get(&FieldPath::parse("name")), Some(&text("default-name")));
    assert!(!handle.stores().is_dirty.get());
}

#[test]
fn test_input_event_updates_data_and_touched() {
    let (form, email, _) = login_form();
    let handle = bind(&form, FormConfig::new()).unwrap();

    email.set_value("a@b.c");
    email.emit(EventKind::Input);

    let data = handle.stores().data.get();
    assert_eq!(data.get(&FieldPath::parse("email")), Some(&text("a@b.c")));
    assert_eq!(
        handle.stores().touched.get().get(&FieldPath::parse("email")),
        Some(&FieldNode::Leaf(true))
    );
    assert_eq!(handle.stores().interacted.get(), Some("email".to_string()));
    assert!(handle.stores().is_dirty.get());
}

#[test]
fn test_blur_touches_without_writing() {
    let (form, email, _) = login_form();
    let handle = bind(&form, FormConfig::new()).unwrap();

    email.emit(EventKind::Blur);
    assert_eq!(
        handle.stores().touched.get().get(&FieldPath::parse("email")),
        Some(&FieldNode::Leaf(true))
    );
    assert_eq!(handle.stores().data.get().get(&FieldPath::parse("email")), Some(&text("")));
    assert!(!handle.stores().is_dirty.get());
}

#[test]
fn test_change_commits_discrete_controls() {
    let checkbox = Element::checkbox("accept", "yes");
    let select = Element::named_select("color")
        .option("red", true)
        .option("blue", false);
    let form = Element::form().child(checkbox.clone()).child(select.clone());
    let handle = bind(&form, FormConfig::new()).unwrap();

    checkbox.set_checked(true);
    checkbox.emit(EventKind::Change);
    select.select_value("blue");
    select.emit(EventKind::Change);

    let data = handle.stores().data.get();
    assert_eq!(
        data.get(&FieldPath::parse("accept")),
        Some(&FieldNode::Leaf(FieldValue::Bool(true)))
    );
    assert_eq!(data.get(&FieldPath::parse("color")), Some(&text("blue")));
    // Change does not touch under the default triggers.
    assert_eq!(
        handle.stores().touched.get().get(&FieldPath::parse("accept")),
        Some(&FieldNode::Leaf(false))
    );
}

#[test]
fn test_programmatic_mutation_updates_data_without_touching() {
    let (form, email, _) = login_form();
    let handle = bind(&form, FormConfig::new()).unwrap();

    // No event, only the property watcher.
    email.set_value("typed-by-code");

    assert_eq!(
        handle.stores().data.get().get(&FieldPath::parse("email")),
        Some(&text("typed-by-code"))
    );
    assert_eq!(
        handle.stores().touched.get().get(&FieldPath::parse("email")),
        Some(&FieldNode::Leaf(false))
    );
    assert!(handle.stores().is_dirty.get());
}

#[test]
fn test_sync_validation_runs_on_every_change() {
    let (form, email, _) = login_form();
    let handle = bind(
        &form,
        FormConfig::new().validate(|data: &Data| {
            let mut errors = Errors::map();
            let empty = match data.get(&FieldPath::parse("email")) {
                Some(FieldNode::Leaf(FieldValue::Text(s))) => s.is_empty(),
                _ => true,
            };
            if empty {
                errors.set_leaf(&FieldPath::parse("email"), vec!["required".to_string()]);
            }
            Some(errors)
        }),
    )
    .unwrap();

    // Validation ran at bind time against the initial data.
    assert!(!handle.stores().is_valid().get());
    // Errors are visible even though the field was never touched.
    assert_eq!(
        handle.stores().errors.get().get(&FieldPath::parse("email")),
        Some(&FieldNode::Leaf(vec!["required".to_string()]))
    );

    email.set_value("a@b.c");
    email.emit(EventKind::Input);
    assert!(handle.stores().is_valid().get());
}

#[test]
fn test_validation_messages_reflect_onto_controls() {
    let (form, email, _) = login_form();
    let handle = bind(
        &form,
        FormConfig::new().validate(|data: &Data| {
            let mut errors = Errors::map();
            if data.get(&FieldPath::parse("email")) == Some(&text("")) {
                errors.set_leaf(
                    &FieldPath::parse("email"),
                    vec!["required".to_string(), "too short".to_string()],
                );
            }
            Some(errors)
        }),
    )
    .unwrap();

    assert_eq!(
        email.get_data("validation-message").as_deref(),
        Some("required\ntoo short")
    );
    assert_eq!(form.get_attr("novalidate").as_deref(), Some("true"));

    email.set_value("a@b.c");
    assert!(email.get_data("validation-message").is_none());
    drop(handle);
}

#[test]
fn test_validator_panic_retains_previous_errors() {
    let (form, email, _) = login_form();
    let handle = bind(
        &form,
        FormConfig::new().validate(|data: &Data| {
            if data.get(&FieldPath::parse("email")) == Some(&text("boom")) {
                panic!("validator crashed");
            }
            let mut errors = Errors::map();
            errors.set_leaf(&FieldPath::parse("email"), vec!["always".to_string()]);
            Some(errors)
        }),
    )
    .unwrap();

    assert!(!handle.stores().is_valid().get());
    email.set_value("boom");
    // The panic is swallowed and the previous errors stay put.
    assert_eq!(
        handle.stores().errors.get().get(&FieldPath::parse("email")),
        Some(&FieldNode::Leaf(vec!["always".to_string()]))
    );
}

#[test]
fn test_transformers_run_on_every_write() {
    let (form, email, _) = login_form();
    let handle = bind(
        &form,
        FormConfig::new().transform(|mut data: Data| {
            if let Some(FieldNode::Leaf(FieldValue::Text(s))) =
                data.get(&FieldPath::parse("email")).cloned()
            {
                data.set_leaf(&FieldPath::parse("email"), FieldValue::Text(s.to_lowercase()));
            }
            data
        }),
    )
    .unwrap();

    email.set_value("USER@Example.COM");
    assert_eq!(
        handle.stores().data.get().get(&FieldPath::parse("email")),
        Some(&text("user@example.com"))
    );
}

#[test]
fn test_added_control_joins_the_form() {
    let (form, _, _) = login_form();
    let handle = bind(&form, FormConfig::new()).unwrap();

    let nickname = Element::text_input("nickname").value("ada");
    form.append_child(nickname.clone());

    let data = handle.stores().data.get();
    assert_eq!(data.get(&FieldPath::parse("nickname")), Some(&text("ada")));
    assert_eq!(
        handle.stores().touched.get().get(&FieldPath::parse("nickname")),
        Some(&FieldNode::Leaf(false))
    );
    // Joining with its default value does not dirty the form.
    assert!(!handle.stores().is_dirty.get());

    // The watcher is live on the new control.
    nickname.set_value("grace");
    assert_eq!(
        handle.stores().data.get().get(&FieldPath::parse("nickname")),
        Some(&text("grace"))
    );
}

#[test]
fn test_removed_control_unsets_when_marked() {
    let marked = Element::text_input("temp").data("unset-on-remove", "true");
    let kept = Element::text_input("stable");
    let form = Element::form().child(marked.clone()).child(kept.clone());
    let handle = bind(&form, FormConfig::new()).unwrap();

    assert!(handle.stores().data.get().get(&FieldPath::parse("temp")).is_some());
    form.remove_child(&marked);
    assert!(handle.stores().data.get().get(&FieldPath::parse("temp")).is_none());
    assert!(handle
        .stores()
        .touched
        .get()
        .get(&FieldPath::parse("temp"))
        .is_none());
    assert!(handle.stores().data.get().get(&FieldPath::parse("stable")).is_some());
}

#[test]
fn test_removed_control_keeps_value_by_default() {
    let input = Element::text_input("kept").value("v");
    let form = Element::form().child(input.clone());
    let handle = bind(&form, FormConfig::new()).unwrap();

    form.remove_child(&input);
    assert_eq!(
        handle.stores().data.get().get(&FieldPath::parse("kept")),
        Some(&text("v"))
    );
}

#[test]
fn test_removed_fieldset_control_unsets_nested_path() {
    let street = Element::text_input("street").value("main");
    let fieldset = Element::fieldset()
        .name("address")
        .data("unset-on-remove", "true")
        .child(street);
    let form = Element::form().child(fieldset.clone());
    let handle = bind(&form, FormConfig::new()).unwrap();

    assert!(handle
        .stores()
        .data
        .get()
        .get(&FieldPath::parse("address.street"))
        .is_some());
    form.remove_child(&fieldset);
    assert!(handle
        .stores()
        .data
        .get()
        .get(&FieldPath::parse("address.street"))
        .is_none());
}

#[test]
fn test_destroy_disconnects_everything() {
    let (form, email, _) = login_form();
    let handle = bind(&form, FormConfig::new()).unwrap();
    handle.destroy();

    email.set_value("after-destroy");
    email.emit(EventKind::Input);
    assert_eq!(
        handle.stores().data.get().get(&FieldPath::parse("email")),
        Some(&text(""))
    );
    assert!(form.get_data("bound").is_none());

    // Idempotent.
    handle.destroy();
}

#[test]
fn test_dropping_last_handle_unbinds() {
    let (form, _, _) = login_form();
    let handle = bind(&form, FormConfig::new()).unwrap();
    assert!(form.get_data("bound").is_some());
    drop(handle);
    assert!(form.get_data("bound").is_none());
}

#[test]
fn test_ignored_control_stays_out() {
    let secret = Element::text_input("secret").data("ignore", "");
    let form = Element::form().child(secret.clone());
    let handle = bind(&form, FormConfig::new()).unwrap();

    secret.set_value("hidden");
    secret.emit(EventKind::Input);
    assert!(handle.stores().data.get().get(&FieldPath::parse("secret")).is_none());
}
