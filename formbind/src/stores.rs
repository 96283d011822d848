//! The store bundle backing one bound form.

use std::sync::Arc;

use crate::store::{Derived, Store, Subscription};
use crate::value::{Data, Errors, Touched};

/// Every observable piece of form state.
///
/// Cheap to clone; clones share state. `is_valid` and `is_validating` are
/// derived and exposed read-only: `is_valid` tracks whether the errors
/// tree is free of messages, `is_validating` whether any validation run
/// is in flight.
#[derive(Clone)]
pub struct FormStores {
    pub data: Store<Data>,
    pub touched: Store<Touched>,
    pub errors: Store<Errors>,
    pub warnings: Store<Errors>,
    pub is_submitting: Store<bool>,
    pub is_dirty: Store<bool>,
    /// ID of the control the user last interacted with.
    pub interacted: Store<Option<String>>,
    is_valid: Store<bool>,
    validating_runs: Store<usize>,
    is_validating: Store<bool>,
    // Keeps the derived wiring alive for as long as any clone exists.
    _wiring: Arc<Vec<Subscription>>,
}

impl FormStores {
    /// Seed stores for a fresh bind: `data` holds the merged initial
    /// values, `touched` an all-false mirror of the same shape.
    pub fn new(initial: Data) -> Self {
        let touched = initial.mirror(false);
        let data = Store::new(initial);
        let touched = Store::new(touched);
        let errors = Store::new(Errors::map());
        let warnings = Store::new(Errors::map());
        let is_submitting = Store::new(false);
        let is_dirty = Store::new(false);
        let interacted = Store::new(None);
        let is_valid = Store::new(true);
        let validating_runs = Store::new(0usize);
        let is_validating = Store::new(false);

        let mut wiring = Vec::new();
        {
            let is_valid = is_valid.clone();
            wiring.push(errors.subscribe(move |errors: &Errors| {
                is_valid.set(!errors.deep_some(&|messages| !messages.is_empty()));
            }));
        }
        {
            let is_validating = is_validating.clone();
            wiring.push(validating_runs.subscribe(move |runs: &usize| {
                is_validating.set(*runs > 0);
            }));
        }

        Self {
            data,
            touched,
            errors,
            warnings,
            is_submitting,
            is_dirty,
            interacted,
            is_valid,
            validating_runs,
            is_validating,
            _wiring: Arc::new(wiring),
        }
    }

    pub fn is_valid(&self) -> Derived<bool> {
        Derived::new(self.is_valid.clone())
    }

    pub fn is_validating(&self) -> Derived<bool> {
        Derived::new(self.is_validating.clone())
    }

    pub(crate) fn begin_validation(&self) {
        self.validating_runs.update(|runs| *runs += 1);
    }

    pub(crate) fn end_validation(&self) {
        self.validating_runs.update(|runs| *runs = runs.saturating_sub(1));
    }
}

/// Guard for one in-flight validation run. Decrements the run counter on
/// drop, so aborted tasks never leave `is_validating` stuck.
pub(crate) struct ValidationRun {
    stores: FormStores,
}

impl ValidationRun {
    pub(crate) fn begin(stores: &FormStores) -> Self {
        stores.begin_validation();
        Self {
            stores: stores.clone(),
        }
    }
}

impl Drop for ValidationRun {
    fn drop(&mut self) {
        self.stores.end_validation();
    }
}
