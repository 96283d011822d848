//! Tests for event dispatch and bubbling.

use std::sync::{Arc, Mutex};

use formdom::{Element, EventKind};

fn recorder(
    log: &Arc<Mutex<Vec<String>>>,
    label: &str,
) -> impl Fn(&formdom::FormEvent) + Send + Sync + 'static {
    let log = Arc::clone(log);
    let label = label.to_string();
    move |_| log.lock().unwrap().push(label.clone())
}

#[test]
fn test_emit_reaches_target_then_ancestors() {
    let input = Element::text_input("field");
    let fieldset = Element::fieldset().child(input.clone());
    let form = Element::form().child(fieldset.clone());

    let log = Arc::new(Mutex::new(Vec::new()));
    input.add_listener(EventKind::Input, recorder(&log, "input"));
    fieldset.add_listener(EventKind::Input, recorder(&log, "fieldset"));
    form.add_listener(EventKind::Input, recorder(&log, "form"));

    input.emit(EventKind::Input);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["input".to_string(), "fieldset".to_string(), "form".to_string()]
    );
}

#[test]
fn test_listeners_filter_by_kind() {
    let input = Element::text_input("field");
    let form = Element::form().child(input.clone());

    let log = Arc::new(Mutex::new(Vec::new()));
    form.add_listener(EventKind::Blur, recorder(&log, "blur"));
    form.add_listener(EventKind::Change, recorder(&log, "change"));

    input.emit(EventKind::Blur);
    input.emit(EventKind::Input);
    assert_eq!(*log.lock().unwrap(), vec!["blur".to_string()]);
}

#[test]
fn test_event_carries_target() {
    let input = Element::text_input("field").id("the-input");
    let form = Element::form().child(input.clone());

    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    form.add_listener(EventKind::Change, move |event| {
        *sink.lock().unwrap() = Some(event.target.element_id());
    });

    input.emit(EventKind::Change);
    assert_eq!(seen.lock().unwrap().as_deref(), Some("the-input"));
}

#[test]
fn test_remove_listener() {
    let form = Element::form();
    let log = Arc::new(Mutex::new(Vec::new()));
    let id = form.add_listener(EventKind::Submit, recorder(&log, "submit"));

    form.emit(EventKind::Submit);
    assert!(form.remove_listener(id));
    form.emit(EventKind::Submit);

    assert_eq!(log.lock().unwrap().len(), 1);
    assert!(!form.remove_listener(id));
}

#[test]
fn test_delegated_listener_sees_every_control() {
    let a = Element::text_input("a");
    let b = Element::text_input("b");
    let form = Element::form().child(a.clone()).child(b.clone());

    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    form.add_listener(EventKind::Input, move |event| {
        sink.lock().unwrap().push(event.target.control_name());
    });

    a.emit(EventKind::Input);
    b.emit(EventKind::Input);
    assert_eq!(
        *log.lock().unwrap(),
        vec![Some("a".to_string()), Some("b".to_string())]
    );
}
