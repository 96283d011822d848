//! Validation orchestration: running validators and merging their output.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Mutex;
use std::time::Duration;

use futures::FutureExt;
use log::warn;
use tokio::task::JoinHandle;

use crate::config::Validator;
use crate::error::ValidatorPanic;
use crate::value::{Data, Errors, FieldNode};

/// Extract a human-readable message from a panic payload.
fn extract_panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run every validator against `data` and merge their results.
///
/// Validators run without short-circuiting; async ones run concurrently.
/// Results merge leaf-wise in declaration order: messages for the same
/// leaf concatenate, first validator first. Returns `Ok(None)` only when
/// `validators` is empty. A panicking validator fails the whole run so
/// callers can apply their fail-soft or escalation policy.
pub async fn execute_validation(
    data: &Data,
    validators: &[Validator],
) -> Result<Option<Errors>, ValidatorPanic> {
    if validators.is_empty() {
        return Ok(None);
    }

    let runs = validators.iter().map(|v| run_guarded(v, data));
    let results = futures::future::join_all(runs).await;

    let mut merged: Option<Errors> = None;
    for result in results {
        merged = merge_optional(merged, result?);
    }
    Ok(Some(merged.unwrap_or_else(Errors::map)))
}

/// Synchronous variant for validator sets known to contain no async
/// entries; async entries are skipped with a warning.
pub(crate) fn execute_validation_sync(
    data: &Data,
    validators: &[Validator],
) -> Result<Option<Errors>, ValidatorPanic> {
    if validators.is_empty() {
        return Ok(None);
    }
    let mut merged: Option<Errors> = None;
    for validator in validators {
        match validator {
            Validator::Sync(f) => {
                let result = std::panic::catch_unwind(AssertUnwindSafe(|| f(data)))
                    .map_err(|panic| ValidatorPanic {
                        message: extract_panic_message(&panic),
                    })?;
                merged = merge_optional(merged, result);
            }
            Validator::Async(_) => {
                warn!("skipping async validator in synchronous validation run");
            }
        }
    }
    Ok(Some(merged.unwrap_or_else(Errors::map)))
}

async fn run_guarded(
    validator: &Validator,
    data: &Data,
) -> Result<Option<Errors>, ValidatorPanic> {
    match validator {
        Validator::Sync(f) => std::panic::catch_unwind(AssertUnwindSafe(|| f(data)))
            .map_err(|panic| ValidatorPanic {
                message: extract_panic_message(&panic),
            }),
        Validator::Async(f) => AssertUnwindSafe(f(data.clone()))
            .catch_unwind()
            .await
            .map_err(|panic| ValidatorPanic {
                message: extract_panic_message(&panic),
            }),
    }
}

/// Merge two error trees leaf-wise.
///
/// Matching leaves concatenate their messages, `a`'s first. Maps union
/// recursively; lists merge slot by slot, the longer side padding. On a
/// shape mismatch the side that still carries messages wins, preferring
/// `b` when both do.
pub fn merge_errors(a: Errors, b: Errors) -> Errors {
    match (a, b) {
        (FieldNode::Leaf(mut x), FieldNode::Leaf(y)) => {
            x.extend(y);
            FieldNode::Leaf(x)
        }
        (FieldNode::Map(mut m), FieldNode::Map(n)) => {
            for (key, node) in n {
                match m.remove(&key) {
                    Some(existing) => {
                        m.insert(key, merge_errors(existing, node));
                    }
                    None => {
                        m.insert(key, node);
                    }
                }
            }
            FieldNode::Map(m)
        }
        (FieldNode::List(xs), FieldNode::List(ys)) => {
            let mut xs = xs.into_iter();
            let mut ys = ys.into_iter();
            let mut merged = Vec::new();
            loop {
                match (xs.next(), ys.next()) {
                    (Some(x), Some(y)) => merged.push(merge_errors(x, y)),
                    (Some(x), None) => merged.push(x),
                    (None, Some(y)) => merged.push(y),
                    (None, None) => break,
                }
            }
            FieldNode::List(merged)
        }
        (x, y) => {
            if y.deep_some(&|messages| !messages.is_empty()) {
                y
            } else {
                x
            }
        }
    }
}

pub(crate) fn merge_optional(a: Option<Errors>, b: Option<Errors>) -> Option<Errors> {
    match (a, b) {
        (Some(a), Some(b)) => Some(merge_errors(a, b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

/// Trailing-edge debouncer for expensive validators.
///
/// Each `schedule` aborts the previously scheduled run and starts a new
/// timer, so only the last data change within the delay window triggers
/// the work.
pub(crate) struct Debouncer {
    delay: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            task: Mutex::new(None),
        }
    }

    pub(crate) fn schedule(&self, work: impl Future<Output = ()> + Send + 'static) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("debounced validation requires a tokio runtime; skipping");
            return;
        };
        let delay = self.delay;
        let mut slot = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        }));
    }

    pub(crate) fn cancel(&self) {
        let mut slot = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}
