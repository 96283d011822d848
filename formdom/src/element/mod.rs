mod kind;
mod node;

pub use kind::{ElementKind, InputType};
pub use node::{Element, SelectOption, WatcherId};

/// Find an element by ID in the tree.
pub fn find_element(root: &Element, id: &str) -> Option<Element> {
    if root.element_id() == id {
        return Some(root.clone());
    }

    for child in root.children() {
        if let Some(found) = find_element(&child, id) {
            return Some(found);
        }
    }

    None
}

/// Collect every form control under `root`, depth-first in tree order.
///
/// A control is an input, select, or textarea element. `root` itself is
/// included when it is a control.
pub fn collect_controls(root: &Element) -> Vec<Element> {
    let mut out = Vec::new();
    collect_controls_into(root, &mut out);
    out
}

fn collect_controls_into(node: &Element, out: &mut Vec<Element>) {
    if node.is_control() {
        out.push(node.clone());
    }
    for child in node.children() {
        collect_controls_into(&child, out);
    }
}
