//! Minimal observable value containers.
//!
//! A [`Store`] is a single-writer, multi-reader observable: `set` and
//! `update` replace the value and synchronously notify every subscriber in
//! subscription order. There is no batching and no deduplication; every
//! write is a separate notification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

type SubscriberFn<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct StoreInner<T> {
    value: RwLock<T>,
    subscribers: RwLock<Vec<(SubscriberId, SubscriberFn<T>)>>,
}

/// Observable value container with subscribe/set/update semantics.
///
/// Cheap to clone; clones share the same value and subscriber list.
pub struct Store<T> {
    inner: Arc<StoreInner<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self
            .inner
            .value
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        write!(f, "Store({value:?})")
    }
}

impl<T: Clone + Send + Sync + 'static> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                value: RwLock::new(value),
                subscribers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// A clone of the current value.
    pub fn get(&self) -> T {
        self.inner
            .value
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        {
            let mut guard = self
                .inner
                .value
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = value;
        }
        self.notify();
    }

    /// Mutate the value in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut guard = self
                .inner
                .value
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&mut guard);
        }
        self.notify();
    }

    /// Register a subscriber. It is invoked immediately with the current
    /// value, then once per subsequent write, in subscription order.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes.
    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = SubscriberId::next();
        let callback: SubscriberFn<T> = Arc::new(f);
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, Arc::clone(&callback)));
        callback(&self.get());

        let weak: Weak<StoreInner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Mutex::new(Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner
                        .subscribers
                        .write()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .retain(|(sid, _)| *sid != id);
                }
            }))),
        }
    }

    fn notify(&self) {
        let value = self.get();
        let callbacks: Vec<SubscriberFn<T>> = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(_, f)| Arc::clone(f))
            .collect();
        for callback in callbacks {
            callback(&value);
        }
    }
}

/// RAII guard for a store subscription; unsubscribes on drop.
pub struct Subscription {
    cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    /// Unsubscribe explicitly.
    pub fn unsubscribe(self) {
        self.run_cancel();
    }

    fn run_cancel(&self) {
        let cancel = self
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subscription")
    }
}

/// Read-only view of a derived store: subscribe and read, never write.
#[derive(Debug)]
pub struct Derived<T> {
    store: Store<T>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Derived<T> {
    pub(crate) fn new(store: Store<T>) -> Self {
        Self { store }
    }

    pub fn get(&self) -> T {
        self.store.get()
    }

    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.store.subscribe(f)
    }
}
