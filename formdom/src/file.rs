use serde::Serialize;

/// Handle to a file attached to a file control.
///
/// A headless stand-in for a platform file object: the binding layer only
/// needs identity and size, never the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHandle {
    pub name: String,
    pub size: u64,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}
