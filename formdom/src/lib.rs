//! Headless form document model.
//!
//! `formdom` provides the element tree a form-state engine binds to when no
//! browser is present. It models the pieces of a live form that matter for
//! data binding:
//!
//! - a shared, mutable element tree (form / fieldset / controls) with
//!   attribute and dataset maps
//! - control value properties (`value`, `checked`, `files`, select options)
//!   whose writers notify registered **property watchers**
//! - synchronous event dispatch (`Input` / `Change` / `Blur` / `Submit`)
//!   that bubbles from the target to its ancestors
//! - **mutation observers** notified when children are attached or detached
//!   anywhere under an observed element
//!
//! Property watchers and mutation observers replace the accessor
//! interception and subtree observation a browser would provide: any host
//! that mutates a control through the element API keeps every observer
//! informed, with no polling and no diffing on the consumer side.

pub mod element;
pub mod event;
pub mod file;
pub mod observer;

pub use element::{collect_controls, find_element, Element, ElementKind, InputType, SelectOption, WatcherId};
pub use event::{EventKind, FormEvent, ListenerId};
pub use file::FileHandle;
pub use observer::{MutationRecord, ObserverId};
