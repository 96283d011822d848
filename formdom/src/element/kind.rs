/// What flavor of element a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Form,
    Fieldset,
    Input(InputType),
    Select,
    TextArea,
    /// Non-form element (layout container, label, ...). Inert for binding.
    Other(String),
}

impl ElementKind {
    /// Whether this element carries a user-editable value.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            ElementKind::Input(_) | ElementKind::Select | ElementKind::TextArea
        )
    }
}

/// The `type` of an input element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    Text,
    Email,
    Password,
    Hidden,
    Number,
    Range,
    Checkbox,
    Radio,
    File,
    Other(String),
}

impl InputType {
    /// Number-like inputs parse their raw value instead of keeping text.
    pub fn is_numeric(&self) -> bool {
        matches!(self, InputType::Number | InputType::Range)
    }
}
