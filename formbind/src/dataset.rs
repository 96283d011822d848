//! Dataset keys the engine reads from and reflects onto elements.
//!
//! These are the interop surface for non-reactive consumers: styling,
//! declarative markup, and error display mechanisms that only see the tree.

/// Path override; takes priority over the control's `name`.
pub const FIELD: &str = "field";

/// Numeric slot annotation for explicitly-indexed repeated fields.
pub const INDEX: &str = "index";

/// Excludes an element and its whole subtree from binding.
pub const IGNORE: &str = "ignore";

/// `"true"` / `"false"`: delete the field from data when the control is
/// removed from the tree. Nearest explicit marker wins.
pub const UNSET_ON_REMOVE: &str = "unset-on-remove";

/// Reflected: the dotted ancestor-fieldset path of a control.
pub const FIELDSET: &str = "fieldset";

/// Reflected: the control's current error messages, newline-joined.
/// Removed when there is no error.
pub const VALIDATION_MESSAGE: &str = "validation-message";

/// Marks a form as bound; a second bind on the same element fails.
pub const BOUND: &str = "bound";
