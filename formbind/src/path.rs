//! Field paths and path resolution for form controls.

use formdom::Element;

use crate::dataset;

/// Dotted path addressing a leaf in the nested data tree.
///
/// Segments that parse as integers address list slots; everything else
/// addresses map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted path. Empty input yields the root path.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::new();
        }
        Self(path.split('.').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    pub(crate) fn from_segments(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

/// Compute the dotted path of a control from its name (or `field` dataset
/// override) and its ancestor fieldsets, innermost last.
///
/// Returns `None` for a control with neither a name nor an override: such
/// a control is inert and skipped by every other component.
pub fn resolve_path(control: &Element) -> Option<FieldPath> {
    let base = control
        .get_data(dataset::FIELD)
        .or_else(|| control.control_name())?;

    let mut segments = fieldset_segments(control);
    segments.extend(base.split('.').map(str::to_string));

    if let Some(index) = control.get_data(dataset::INDEX) {
        if let Ok(index) = index.parse::<usize>() {
            segments.push(index.to_string());
            segments.push("value".to_string());
        }
    }

    Some(FieldPath::from_segments(segments))
}

/// Path segments contributed by ancestor fieldsets, outermost first.
/// Stops at the form boundary.
fn fieldset_segments(control: &Element) -> Vec<String> {
    let mut segments = Vec::new();
    for ancestor in control.ancestors() {
        if ancestor.is_form() {
            break;
        }
        if ancestor.is_fieldset() {
            if let Some(name) = ancestor.control_name() {
                let mut outer: Vec<String> = name.split('.').map(str::to_string).collect();
                outer.extend(segments);
                segments = outer;
            }
        }
    }
    segments
}

/// The dotted ancestor-fieldset prefix of a control, for dataset
/// reflection. Empty when the control sits outside any named fieldset.
pub fn fieldset_prefix(control: &Element) -> String {
    fieldset_segments(control).join(".")
}

/// Resolve the path of a control that has been detached from the tree,
/// using the `fieldset` prefix reflected onto it while it was attached.
pub fn resolve_removed_path(control: &Element) -> Option<FieldPath> {
    let base = control
        .get_data(dataset::FIELD)
        .or_else(|| control.control_name())?;

    let mut segments: Vec<String> = match control.get_data(dataset::FIELDSET) {
        Some(prefix) if !prefix.is_empty() => prefix.split('.').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    segments.extend(base.split('.').map(str::to_string));

    if let Some(index) = control.get_data(dataset::INDEX) {
        if let Ok(index) = index.parse::<usize>() {
            segments.push(index.to_string());
            segments.push("value".to_string());
        }
    }

    Some(FieldPath::from_segments(segments))
}

/// Whether a control is excluded from binding by an `ignore` marker on
/// itself or any ancestor up to the form boundary.
pub fn is_ignored(control: &Element) -> bool {
    if control.get_data(dataset::IGNORE).is_some() {
        return true;
    }
    for ancestor in control.ancestors() {
        if ancestor.get_data(dataset::IGNORE).is_some() {
            return true;
        }
        if ancestor.is_form() {
            break;
        }
    }
    false
}

/// Effective `unset-on-remove` value for a control: the nearest explicit
/// marker (the control itself, then each ancestor outward) wins; absent
/// markers default to `false`.
pub fn effective_unset_on_remove(control: &Element) -> bool {
    if let Some(value) = control.get_data(dataset::UNSET_ON_REMOVE) {
        return value == "true";
    }
    for ancestor in control.ancestors() {
        if let Some(value) = ancestor.get_data(dataset::UNSET_ON_REMOVE) {
            return value == "true";
        }
        if ancestor.is_form() {
            break;
        }
    }
    false
}
