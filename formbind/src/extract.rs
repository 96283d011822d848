//! Default-value extraction from a form tree.

use formdom::{collect_controls, Element, ElementKind, InputType};

use crate::dataset;
use crate::path::{is_ignored, resolve_path};
use crate::value::{Data, FieldNode, FieldValue};

/// Every addressable control under `form`, in tree order.
///
/// A control is addressable when it resolves to a path and no `ignore`
/// marker excludes it.
pub fn addressable_controls(form: &Element) -> Vec<Element> {
    collect_controls(form)
        .into_iter()
        .filter(|c| !is_ignored(c))
        .filter(|c| resolve_path(c).is_some())
        .collect()
}

/// Build the default data tree for a form, plus the ordered control list.
///
/// Later controls that resolve to the same path overwrite earlier ones,
/// except checkbox and radio groups, which aggregate over their peers.
pub fn default_values(form: &Element) -> (Data, Vec<Element>) {
    let controls = addressable_controls(form);
    let mut data = Data::map();
    for control in &controls {
        let Some(path) = resolve_path(control) else {
            continue;
        };
        data.set(&path, control_value(form, control));
    }
    (data, controls)
}

/// The current value of a control, per its type.
///
/// Checkbox and radio values are group-aware: all addressable peers that
/// resolve to the same path are consulted, matching what the control
/// actually represents in the data tree.
pub fn control_value(form: &Element, control: &Element) -> Data {
    match control.kind() {
        ElementKind::Input(InputType::Checkbox) => checkbox_value(form, control),
        ElementKind::Input(InputType::Radio) => radio_value(form, control),
        ElementKind::Input(InputType::File) => file_value(control),
        ElementKind::Select => select_value(control),
        _ => FieldNode::Leaf(text_or_number(control)),
    }
}

/// The text-or-number rule: number-like inputs parse their raw value,
/// resolving to `Empty` when unparseable; everything else stays text.
pub fn text_or_number(control: &Element) -> FieldValue {
    let raw = control.value_str();
    match control.input_type() {
        Some(t) if t.is_numeric() => raw
            .trim()
            .parse::<f64>()
            .map(FieldValue::Number)
            .unwrap_or(FieldValue::Empty),
        _ => FieldValue::Text(raw),
    }
}

fn checkbox_value(form: &Element, control: &Element) -> Data {
    // Explicitly-indexed checkboxes address their own slot.
    if control.get_data(dataset::INDEX).is_some() {
        return FieldNode::Leaf(FieldValue::Bool(control.is_checked()));
    }
    let peers = path_peers(form, control, InputType::Checkbox);
    if peers.len() <= 1 {
        return FieldNode::Leaf(FieldValue::Bool(control.is_checked()));
    }
    FieldNode::List(
        peers
            .iter()
            .filter(|peer| peer.is_checked())
            .map(|peer| FieldNode::Leaf(FieldValue::Text(peer.value_str())))
            .collect(),
    )
}

fn radio_value(form: &Element, control: &Element) -> Data {
    let peers = path_peers(form, control, InputType::Radio);
    let checked = peers.iter().find(|peer| peer.is_checked());
    match checked {
        Some(peer) => FieldNode::Leaf(FieldValue::Text(peer.value_str())),
        None => FieldNode::Leaf(FieldValue::Empty),
    }
}

fn file_value(control: &Element) -> Data {
    let files = control.files();
    if files.is_empty() {
        return FieldNode::Leaf(FieldValue::Empty);
    }
    if control.is_multiple() {
        FieldNode::List(
            files
                .into_iter()
                .map(|f| FieldNode::Leaf(FieldValue::File(f)))
                .collect(),
        )
    } else {
        FieldNode::Leaf(FieldValue::File(files[0].clone()))
    }
}

fn select_value(control: &Element) -> Data {
    if control.is_multiple() {
        FieldNode::List(
            control
                .selected_values()
                .into_iter()
                .map(|v| FieldNode::Leaf(FieldValue::Text(v)))
                .collect(),
        )
    } else {
        let selected = control.selected_values().into_iter().next();
        FieldNode::Leaf(FieldValue::Text(selected.unwrap_or_default()))
    }
}

/// Addressable controls of the given input type resolving to the same
/// path as `control`, in tree order.
fn path_peers(form: &Element, control: &Element, input_type: InputType) -> Vec<Element> {
    let Some(path) = resolve_path(control) else {
        return vec![control.clone()];
    };
    let peers: Vec<Element> = addressable_controls(form)
        .into_iter()
        .filter(|peer| peer.input_type() == Some(input_type.clone()))
        .filter(|peer| resolve_path(peer).as_ref() == Some(&path))
        .collect();
    if peers.is_empty() {
        vec![control.clone()]
    } else {
        peers
    }
}

/// Shared guard for event handlers: is this element a control the binder
/// should process for the given form?
pub(crate) fn is_addressable(control: &Element) -> bool {
    control.is_control() && !is_ignored(control) && resolve_path(control).is_some()
}
