//! Imperative helpers on [`FormHandle`].
//!
//! Everything here is the programmatic counterpart of user interaction:
//! writing fields, flagging touched state, seeding errors, validating,
//! resetting, and submitting outside of a Submit event.

use log::warn;

use crate::binder::FormHandle;
use crate::config::BoxFuture;
use crate::error::SubmitError;
use crate::path::FieldPath;
use crate::submit::{run_submit, SubmitOverrides};
use crate::validation::execute_validation;
use crate::value::{Data, Errors};

impl FormHandle {
    /// Write a field, running transformers. With `touch` the field is
    /// also marked touched, as if the user had edited it.
    pub fn set_field(&self, path: impl Into<FieldPath>, value: impl Into<Data>, touch: bool) {
        let path = path.into();
        self.engine.write_data_at(&path, value.into());
        if touch {
            self.engine.stores.touched.update(|touched| {
                touched.set_all(&path, true);
            });
        }
    }

    /// Replace the whole data tree, running transformers.
    pub fn set_fields(&self, data: Data) {
        self.engine.set_fields(data);
    }

    /// Remove a field from data, touched, errors, and warnings.
    pub fn unset_field(&self, path: impl Into<FieldPath>) {
        let path = path.into();
        self.engine.stores.touched.update(|touched| {
            touched.unset(&path);
        });
        self.engine.stores.errors.update(|errors| {
            errors.unset(&path);
        });
        self.engine.stores.warnings.update(|warnings| {
            warnings.unset(&path);
        });
        self.engine.stores.data.update(|data| {
            data.unset(&path);
        });
    }

    /// The data subtree at `path`, if any.
    pub fn get_field(&self, path: impl Into<FieldPath>) -> Option<Data> {
        self.engine.stores.data.get().get(&path.into()).cloned()
    }

    pub fn set_touched(&self, path: impl Into<FieldPath>, touched: bool) {
        let path = path.into();
        self.engine.stores.touched.update(|tree| {
            tree.set_all(&path, touched);
        });
    }

    /// Replace the whole errors tree, bypassing validators.
    pub fn set_errors(&self, errors: Errors) {
        self.engine.overwrite_errors(errors);
    }

    /// Set the messages for a single field, bypassing validators.
    pub fn set_error(&self, path: impl Into<FieldPath>, messages: Vec<String>) {
        let path = path.into();
        let mut errors = self.engine.stores.errors.get();
        errors.set_leaf(&path, messages);
        self.engine.overwrite_errors(errors);
    }

    /// Replace the whole warnings tree.
    pub fn set_warnings(&self, warnings: Errors) {
        self.engine.overwrite_warnings(warnings);
    }

    /// Set the warning messages for a single field.
    pub fn set_warning(&self, path: impl Into<FieldPath>, messages: Vec<String>) {
        let path = path.into();
        let mut warnings = self.engine.stores.warnings.get();
        warnings.set_leaf(&path, messages);
        self.engine.overwrite_warnings(warnings);
    }

    /// Run every validator (immediate and debounced) against the current
    /// data and publish the result.
    ///
    /// Returns the merged errors, or `None` when no validators are
    /// configured. A panicking validator is logged and the previous
    /// errors are reported instead.
    pub async fn validate(&self) -> Option<Errors> {
        let data = self.engine.stores.data.get();
        let validators = self.engine.all_validators();
        let warners = self.engine.all_warners();
        if validators.is_empty() && warners.is_empty() {
            return None;
        }
        let run = crate::stores::ValidationRun::begin(&self.engine.stores);
        let errors = execute_validation(&data, &validators).await;
        let warnings = execute_validation(&data, &warners).await;
        drop(run);
        match (errors, warnings) {
            (Ok(errors), Ok(warnings)) => {
                self.engine.apply_submit_validation(errors, warnings);
                Some(self.engine.stores.errors.get())
            }
            (errors, warnings) => {
                for panic in [errors.err(), warnings.err()].into_iter().flatten() {
                    warn!("validator panicked; keeping previous results: {panic}");
                }
                Some(self.engine.stores.errors.get())
            }
        }
    }

    /// Restore the initial values: data reverts, every touched flag
    /// clears, and the interacted marker resets. Idempotent.
    pub fn reset(&self) {
        self.engine.reset_state();
    }

    /// Replace the baseline used for dirty checking and reset.
    pub fn set_initial_values(&self, values: Data) {
        {
            let mut initial = self
                .engine
                .initial
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *initial = values;
        }
        let data = self.engine.stores.data.get();
        let initial = self
            .engine
            .initial
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        self.engine.stores.is_dirty.set(data != initial);
    }

    pub fn set_is_submitting(&self, value: bool) {
        self.engine.stores.is_submitting.set(value);
    }

    pub fn set_is_dirty(&self, value: bool) {
        self.engine.stores.is_dirty.set(value);
    }

    pub fn set_interacted(&self, id: Option<String>) {
        self.engine.stores.interacted.set(id);
    }

    /// Run the full submission pipeline programmatically.
    pub async fn submit(&self) -> Result<(), SubmitError> {
        run_submit(&self.engine, &SubmitOverrides::default()).await
    }

    /// Build a reusable submit closure with per-call overrides, for
    /// callers that wire submission into their own event plumbing.
    pub fn create_submit_handler(
        &self,
        overrides: SubmitOverrides,
    ) -> impl Fn() -> BoxFuture<'static, Result<(), SubmitError>> + Send + Sync + 'static {
        let engine = self.engine.clone();
        move || {
            let engine = engine.clone();
            let overrides = overrides.clone();
            Box::pin(async move { run_submit(&engine, &overrides).await })
        }
    }
}
