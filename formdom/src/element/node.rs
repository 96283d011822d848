use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use log::trace;

use super::kind::{ElementKind, InputType};
use crate::event::{EventKind, FormEvent, ListenerId};
use crate::file::FileHandle;
use crate::observer::{MutationRecord, ObserverId};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn generate_id(prefix: &str) -> String {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id}")
}

/// Identifier for a registered property watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(u64);

impl WatcherId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// One option of a select element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

type ListenerFn = Arc<dyn Fn(&FormEvent) + Send + Sync>;
type WatcherFn = Arc<dyn Fn(&Element) + Send + Sync>;
type ObserverFn = Arc<dyn Fn(&MutationRecord) + Send + Sync>;

struct ElementInner {
    // Identity
    id: String,
    kind: ElementKind,
    name: Option<String>,

    // Attributes and dataset
    attrs: HashMap<String, String>,
    data: HashMap<String, String>,

    // Control value properties
    value: String,
    default_value: String,
    checked: bool,
    default_checked: bool,
    multiple: bool,
    files: Vec<FileHandle>,
    options: Vec<SelectOption>,

    // Tree
    children: Vec<Element>,
    parent: Weak<RwLock<ElementInner>>,

    // Hooks
    listeners: Vec<(ListenerId, EventKind, ListenerFn)>,
    watchers: Vec<(WatcherId, WatcherFn)>,
    observers: Vec<(ObserverId, ObserverFn)>,
}

impl ElementInner {
    fn new(kind: ElementKind, prefix: &str) -> Self {
        Self {
            id: generate_id(prefix),
            kind,
            name: None,
            attrs: HashMap::new(),
            data: HashMap::new(),
            value: String::new(),
            default_value: String::new(),
            checked: false,
            default_checked: false,
            multiple: false,
            files: Vec::new(),
            options: Vec::new(),
            children: Vec::new(),
            parent: Weak::new(),
            listeners: Vec::new(),
            watchers: Vec::new(),
            observers: Vec::new(),
        }
    }
}

/// A node in the form document tree.
///
/// `Element` is a cheap-clone handle to shared state; clones refer to the
/// same node. Value setters (`set_value`, `set_checked`, `set_files`,
/// select mutators) notify registered property watchers after the write,
/// so programmatic mutation is as observable as user-driven events.
#[derive(Clone)]
pub struct Element {
    inner: Arc<RwLock<ElementInner>>,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Element {}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        write!(f, "Element({:?}, id={})", inner.kind, inner.id)
    }
}

impl Element {
    fn new(kind: ElementKind, prefix: &str) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ElementInner::new(kind, prefix))),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ElementInner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ElementInner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Constructors

    pub fn form() -> Self {
        Self::new(ElementKind::Form, "form")
    }

    pub fn fieldset() -> Self {
        Self::new(ElementKind::Fieldset, "fieldset")
    }

    pub fn input(input_type: InputType) -> Self {
        Self::new(ElementKind::Input(input_type), "input")
    }

    pub fn select() -> Self {
        Self::new(ElementKind::Select, "select")
    }

    pub fn textarea() -> Self {
        Self::new(ElementKind::TextArea, "textarea")
    }

    pub fn container() -> Self {
        Self::new(ElementKind::Other("div".to_string()), "el")
    }

    pub fn other(tag: impl Into<String>) -> Self {
        Self::new(ElementKind::Other(tag.into()), "el")
    }

    /// Create a named text input.
    pub fn text_input(name: impl Into<String>) -> Self {
        Self::input(InputType::Text).name(name)
    }

    /// Create a named number input.
    pub fn number_input(name: impl Into<String>) -> Self {
        Self::input(InputType::Number).name(name)
    }

    /// Create a named checkbox with its submit value.
    pub fn checkbox(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::input(InputType::Checkbox).name(name).value(value)
    }

    /// Create a named radio button with its submit value.
    pub fn radio(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::input(InputType::Radio).name(name).value(value)
    }

    /// Create a named file input.
    pub fn file_input(name: impl Into<String>) -> Self {
        Self::input(InputType::File).name(name)
    }

    /// Create a named select.
    pub fn named_select(name: impl Into<String>) -> Self {
        Self::select().name(name)
    }

    // Builder methods

    pub fn id(self, id: impl Into<String>) -> Self {
        self.write().id = id.into();
        self
    }

    pub fn name(self, name: impl Into<String>) -> Self {
        self.write().name = Some(name.into());
        self
    }

    /// Set the current and default value.
    pub fn value(self, value: impl Into<String>) -> Self {
        {
            let mut inner = self.write();
            let value = value.into();
            inner.value.clone_from(&value);
            inner.default_value = value;
        }
        self
    }

    /// Set the current and default checked state.
    pub fn checked(self, checked: bool) -> Self {
        {
            let mut inner = self.write();
            inner.checked = checked;
            inner.default_checked = checked;
        }
        self
    }

    pub fn multiple(self, multiple: bool) -> Self {
        self.write().multiple = multiple;
        self
    }

    pub fn attr(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.write().attrs.insert(key.into(), value.into());
        self
    }

    pub fn data(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.write().data.insert(key.into(), value.into());
        self
    }

    /// Add a select option.
    pub fn option(self, value: impl Into<String>, selected: bool) -> Self {
        self.write().options.push(SelectOption {
            value: value.into(),
            selected,
        });
        self
    }

    pub fn child(self, child: Element) -> Self {
        self.append_child(child);
        self
    }

    pub fn children_from(self, children: impl IntoIterator<Item = Element>) -> Self {
        for child in children {
            self.append_child(child);
        }
        self
    }

    // Identity and classification

    pub fn element_id(&self) -> String {
        self.read().id.clone()
    }

    pub fn kind(&self) -> ElementKind {
        self.read().kind.clone()
    }

    pub fn input_type(&self) -> Option<InputType> {
        match &self.read().kind {
            ElementKind::Input(t) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn is_control(&self) -> bool {
        self.read().kind.is_control()
    }

    pub fn is_form(&self) -> bool {
        self.read().kind == ElementKind::Form
    }

    pub fn is_fieldset(&self) -> bool {
        self.read().kind == ElementKind::Fieldset
    }

    pub fn control_name(&self) -> Option<String> {
        self.read().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.write().name = Some(name.into());
    }

    // Attributes and dataset

    pub fn get_attr(&self, key: &str) -> Option<String> {
        self.read().attrs.get(key).cloned()
    }

    pub fn set_attr(&self, key: impl Into<String>, value: impl Into<String>) {
        self.write().attrs.insert(key.into(), value.into());
    }

    pub fn remove_attr(&self, key: &str) -> Option<String> {
        self.write().attrs.remove(key)
    }

    pub fn get_data(&self, key: &str) -> Option<String> {
        self.read().data.get(key).cloned()
    }

    pub fn set_data(&self, key: impl Into<String>, value: impl Into<String>) {
        self.write().data.insert(key.into(), value.into());
    }

    pub fn remove_data(&self, key: &str) -> Option<String> {
        self.write().data.remove(key)
    }

    // Value properties. Setters notify property watchers.

    pub fn value_str(&self) -> String {
        self.read().value.clone()
    }

    pub fn set_value(&self, value: impl Into<String>) {
        self.write().value = value.into();
        self.notify_watchers();
    }

    pub fn default_value(&self) -> String {
        self.read().default_value.clone()
    }

    pub fn is_checked(&self) -> bool {
        self.read().checked
    }

    pub fn set_checked(&self, checked: bool) {
        self.write().checked = checked;
        self.notify_watchers();
    }

    pub fn default_checked(&self) -> bool {
        self.read().default_checked
    }

    pub fn is_multiple(&self) -> bool {
        self.read().multiple
    }

    pub fn files(&self) -> Vec<FileHandle> {
        self.read().files.clone()
    }

    pub fn set_files(&self, files: Vec<FileHandle>) {
        self.write().files = files;
        self.notify_watchers();
    }

    pub fn options(&self) -> Vec<SelectOption> {
        self.read().options.clone()
    }

    pub fn selected_values(&self) -> Vec<String> {
        self.read()
            .options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.clone())
            .collect()
    }

    /// Select a single option by value, deselecting all others.
    pub fn select_value(&self, value: &str) {
        {
            let mut inner = self.write();
            for option in &mut inner.options {
                option.selected = option.value == value;
            }
        }
        self.notify_watchers();
    }

    /// Mark exactly the given option values as selected (multiple selects).
    pub fn set_selected_values(&self, values: &[&str]) {
        {
            let mut inner = self.write();
            for option in &mut inner.options {
                option.selected = values.contains(&option.value.as_str());
            }
        }
        self.notify_watchers();
    }

    // Tree

    pub fn parent(&self) -> Option<Element> {
        let weak = self.read().parent.clone();
        weak.upgrade().map(|inner| Element { inner })
    }

    pub fn children(&self) -> Vec<Element> {
        self.read().children.clone()
    }

    /// Ancestors of this element, nearest first.
    pub fn ancestors(&self) -> Vec<Element> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(node) = current {
            current = node.parent();
            out.push(node);
        }
        out
    }

    /// Whether `other` is this element or one of its descendants.
    pub fn contains(&self, other: &Element) -> bool {
        if self == other {
            return true;
        }
        other.ancestors().iter().any(|a| a == self)
    }

    /// Attach a child, reparenting it under this element.
    ///
    /// Observers on this element and its ancestors receive one record.
    pub fn append_child(&self, child: Element) {
        {
            let mut child_inner = child.write();
            child_inner.parent = Arc::downgrade(&self.inner);
        }
        self.write().children.push(child.clone());
        trace!("appended {:?} under {:?}", child, self);
        self.notify_mutation(vec![child], Vec::new());
    }

    /// Detach a child. Returns false when `child` is not a direct child.
    ///
    /// The detached subtree keeps its dataset, so consumers can still read
    /// reflected annotations from removed nodes.
    pub fn remove_child(&self, child: &Element) -> bool {
        let removed = {
            let mut inner = self.write();
            let before = inner.children.len();
            inner.children.retain(|c| c != child);
            before != inner.children.len()
        };
        if removed {
            child.write().parent = Weak::new();
            trace!("removed {:?} from {:?}", child, self);
            self.notify_mutation(Vec::new(), vec![child.clone()]);
        }
        removed
    }

    // Event listeners

    pub fn add_listener(
        &self,
        kind: EventKind,
        listener: impl Fn(&FormEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId::next();
        self.write().listeners.push((id, kind, Arc::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.write();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _, _)| *lid != id);
        before != inner.listeners.len()
    }

    /// Dispatch an event targeted at this element.
    ///
    /// Listeners on the target run first, then listeners on each ancestor,
    /// nearest first. Delivery is synchronous.
    pub fn emit(&self, kind: EventKind) {
        let event = FormEvent {
            kind,
            target: self.clone(),
        };
        let mut chain = vec![self.clone()];
        chain.extend(self.ancestors());

        let mut callbacks = Vec::new();
        for node in &chain {
            let inner = node.read();
            for (_, listener_kind, listener) in &inner.listeners {
                if *listener_kind == kind {
                    callbacks.push(Arc::clone(listener));
                }
            }
        }

        for callback in callbacks {
            callback(&event);
        }
    }

    // Property watchers

    pub fn watch(&self, watcher: impl Fn(&Element) + Send + Sync + 'static) -> WatcherId {
        let id = WatcherId::next();
        self.write().watchers.push((id, Arc::new(watcher)));
        id
    }

    pub fn unwatch(&self, id: WatcherId) -> bool {
        let mut inner = self.write();
        let before = inner.watchers.len();
        inner.watchers.retain(|(wid, _)| *wid != id);
        before != inner.watchers.len()
    }

    fn notify_watchers(&self) {
        let callbacks: Vec<WatcherFn> = self
            .read()
            .watchers
            .iter()
            .map(|(_, w)| Arc::clone(w))
            .collect();
        for callback in callbacks {
            callback(self);
        }
    }

    // Mutation observers

    pub fn observe(&self, observer: impl Fn(&MutationRecord) + Send + Sync + 'static) -> ObserverId {
        let id = ObserverId::next();
        self.write().observers.push((id, Arc::new(observer)));
        id
    }

    pub fn unobserve(&self, id: ObserverId) -> bool {
        let mut inner = self.write();
        let before = inner.observers.len();
        inner.observers.retain(|(oid, _)| *oid != id);
        before != inner.observers.len()
    }

    fn notify_mutation(&self, added: Vec<Element>, removed: Vec<Element>) {
        let record = MutationRecord {
            target: self.clone(),
            added,
            removed,
        };
        let mut chain = vec![self.clone()];
        chain.extend(self.ancestors());

        let mut callbacks = Vec::new();
        for node in &chain {
            let inner = node.read();
            for (_, observer) in &inner.observers {
                callbacks.push(Arc::clone(observer));
            }
        }

        for callback in callbacks {
            callback(&record);
        }
    }
}
