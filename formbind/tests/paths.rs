//! Tests for field path parsing and resolution.

use formbind::path::{
    effective_unset_on_remove, fieldset_prefix, is_ignored, resolve_path, resolve_removed_path,
};
use formbind::FieldPath;
use formdom::Element;

#[test]
fn test_parse_and_display() {
    let path = FieldPath::parse("account.emails.0");
    assert_eq!(path.segments(), ["account", "emails", "0"]);
    assert_eq!(path.to_string(), "account.emails.0");

    assert!(FieldPath::parse("").is_empty());
    assert_eq!(FieldPath::from("a.b").to_string(), "a.b");
}

#[test]
fn test_resolve_plain_name() {
    let input = Element::text_input("email");
    let _form = Element::form().child(input.clone());
    assert_eq!(resolve_path(&input), Some(FieldPath::parse("email")));
}

#[test]
fn test_resolve_dotted_name() {
    let input = Element::text_input("account.email");
    let _form = Element::form().child(input.clone());
    assert_eq!(resolve_path(&input), Some(FieldPath::parse("account.email")));
}

#[test]
fn test_unnamed_control_has_no_path() {
    let input = Element::input(formdom::InputType::Text);
    assert!(resolve_path(&input).is_none());
}

#[test]
fn test_field_override_beats_name() {
    let input = Element::text_input("ignored-name").data("field", "profile.bio");
    assert_eq!(resolve_path(&input), Some(FieldPath::parse("profile.bio")));
}

#[test]
fn test_fieldset_prefixes_nest_outermost_first() {
    let input = Element::text_input("street");
    let inner = Element::fieldset().name("address").child(input.clone());
    let outer = Element::fieldset().name("account").child(inner);
    let _form = Element::form().child(outer);

    assert_eq!(
        resolve_path(&input),
        Some(FieldPath::parse("account.address.street"))
    );
    assert_eq!(fieldset_prefix(&input), "account.address");
}

#[test]
fn test_unnamed_fieldset_contributes_nothing() {
    let input = Element::text_input("field");
    let _form = Element::form().child(Element::fieldset().child(input.clone()));
    assert_eq!(resolve_path(&input), Some(FieldPath::parse("field")));
    assert_eq!(fieldset_prefix(&input), "");
}

#[test]
fn test_fieldset_outside_form_is_not_counted() {
    // A fieldset above the form boundary must not leak into paths.
    let input = Element::text_input("inside");
    let form = Element::form().child(input.clone());
    let _outer = Element::fieldset().name("outside").child(form);
    assert_eq!(resolve_path(&input), Some(FieldPath::parse("inside")));
}

#[test]
fn test_index_appends_slot_and_value() {
    let input = Element::checkbox("choices", "a").data("index", "2");
    let _form = Element::form().child(input.clone());
    assert_eq!(resolve_path(&input), Some(FieldPath::parse("choices.2.value")));
}

#[test]
fn test_resolve_removed_path_uses_reflected_prefix() {
    let input = Element::text_input("street").data("fieldset", "account.address");
    // No ancestors at all; the reflected prefix stands in for them.
    assert_eq!(
        resolve_removed_path(&input),
        Some(FieldPath::parse("account.address.street"))
    );

    let bare = Element::text_input("lone");
    assert_eq!(resolve_removed_path(&bare), Some(FieldPath::parse("lone")));
}

#[test]
fn test_ignore_marker_on_self_and_ancestor() {
    let direct = Element::text_input("a").data("ignore", "");
    assert!(is_ignored(&direct));

    let nested = Element::text_input("b");
    let _form = Element::form().child(
        Element::fieldset()
            .data("ignore", "")
            .child(nested.clone()),
    );
    assert!(is_ignored(&nested));

    let plain = Element::text_input("c");
    let _form2 = Element::form().child(plain.clone());
    assert!(!is_ignored(&plain));
}

#[test]
fn test_unset_on_remove_nearest_marker_wins() {
    let input = Element::text_input("a").data("unset-on-remove", "false");
    let _form = Element::form().child(
        Element::fieldset()
            .data("unset-on-remove", "true")
            .child(input.clone()),
    );
    assert!(!effective_unset_on_remove(&input));

    let inherited = Element::text_input("b");
    let _form2 = Element::form().child(
        Element::fieldset()
            .data("unset-on-remove", "true")
            .child(inherited.clone()),
    );
    assert!(effective_unset_on_remove(&inherited));

    let unmarked = Element::text_input("c");
    assert!(!effective_unset_on_remove(&unmarked));
}
