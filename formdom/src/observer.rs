use std::sync::atomic::{AtomicU64, Ordering};

use crate::element::Element;

/// One structural mutation: children attached to or detached from `target`.
///
/// Records are delivered synchronously to every observer registered on
/// `target` or any of its ancestors, once per `append_child` /
/// `remove_child` call. Batching across calls is the host's concern.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    /// The element whose child list changed.
    pub target: Element,
    pub added: Vec<Element>,
    pub removed: Vec<Element>,
}

/// Identifier for a registered mutation observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}
