use std::sync::atomic::{AtomicU64, Ordering};

use crate::element::Element;

/// Event categories a form binding cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A character-level edit on a text-like control.
    Input,
    /// A committed value change (checkbox toggle, select pick, file pick).
    Change,
    /// The control lost focus.
    Blur,
    /// The form was asked to submit.
    Submit,
}

/// An event in flight, targeted at a specific element.
///
/// Events bubble: listeners registered on the target and on each of its
/// ancestors (nearest first) are invoked synchronously.
#[derive(Debug, Clone)]
pub struct FormEvent {
    pub kind: EventKind,
    pub target: Element,
}

/// Identifier for a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}
