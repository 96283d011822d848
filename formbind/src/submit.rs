//! The submission pipeline.
//!
//! A submission snapshots the data, runs every validator (immediate and
//! debounced alike) against the snapshot, marks all fields touched, and
//! only calls the submit handler when the snapshot validated clean.
//! Handler failures route through the recovery hook when one is
//! configured; otherwise they propagate to the caller.

use std::sync::Arc;

use formdom::Element;

use crate::binder::BoundForm;
use crate::config::{RecoverFn, SubmitFn, Validator};
use crate::error::SubmitError;
use crate::stores::ValidationRun;
use crate::validation::execute_validation;
use crate::value::Errors;

/// Context handed to the submit handler alongside the data snapshot.
#[derive(Debug, Clone)]
pub struct SubmitContext {
    pub form: Element,
    pub controls: Vec<Element>,
}

/// Per-call overrides for one submission, used by submit handlers created
/// with [`crate::FormHandle::create_submit_handler`].
#[derive(Clone, Default)]
pub struct SubmitOverrides {
    pub(crate) on_submit: Option<SubmitFn>,
    pub(crate) on_error: Option<RecoverFn>,
    pub(crate) validators: Option<Vec<Validator>>,
}

impl SubmitOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configured submit handler for this call.
    pub fn on_submit<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(crate::value::Data, SubmitContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), SubmitError>> + Send + 'static,
    {
        self.on_submit = Some(Arc::new(move |data, cx| Box::pin(f(data, cx))));
        self
    }

    /// Replace the configured recovery hook for this call.
    pub fn on_error(
        mut self,
        f: impl Fn(&SubmitError) -> Option<Errors> + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Replace the configured validator set for this call.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.get_or_insert_with(Vec::new).push(validator);
        self
    }
}

pub(crate) async fn run_submit(
    engine: &Arc<BoundForm>,
    overrides: &SubmitOverrides,
) -> Result<(), SubmitError> {
    engine.stores.is_submitting.set(true);
    let result = run_submit_inner(engine, overrides).await;
    engine.stores.is_submitting.set(false);
    result
}

async fn run_submit_inner(
    engine: &Arc<BoundForm>,
    overrides: &SubmitOverrides,
) -> Result<(), SubmitError> {
    let data = engine.stores.data.get();

    let validators = overrides
        .validators
        .clone()
        .unwrap_or_else(|| engine.all_validators());
    let warners = engine.all_warners();

    let validated = {
        let _run = ValidationRun::begin(&engine.stores);
        let errors = execute_validation(&data, &validators).await;
        let warnings = execute_validation(&data, &warners).await;
        errors.and_then(|errors| warnings.map(|warnings| (errors, warnings)))
    };

    engine.stores.touched.update(|touched| {
        touched.fill_with(true);
    });

    let (errors, warnings) = match validated {
        Ok(result) => result,
        Err(panic) => {
            let err = SubmitError::ValidatorPanic(panic.message);
            return recover(engine, overrides, err);
        }
    };
    engine.apply_submit_validation(errors, warnings);

    let errors = engine.stores.errors.get();
    if errors.deep_some(&|messages| !messages.is_empty()) {
        engine.notify_submit_error(&data, &errors);
        return Ok(());
    }

    let handler = overrides.on_submit.clone().or_else(|| engine.on_submit.clone());
    let Some(handler) = handler else {
        return Ok(());
    };
    let cx = SubmitContext {
        form: engine.form.clone(),
        controls: crate::binder::FormHandle {
            engine: Arc::clone(engine),
        }
        .controls(),
    };
    match handler(data.clone(), cx).await {
        Ok(()) => Ok(()),
        Err(err) => recover(engine, overrides, err),
    }
}

/// Route a failure through the recovery hook. Without a hook the error
/// propagates; with one, the submission is considered handled and any
/// errors the hook produces surface through the stores and extenders.
fn recover(
    engine: &Arc<BoundForm>,
    overrides: &SubmitOverrides,
    err: SubmitError,
) -> Result<(), SubmitError> {
    let hook = overrides.on_error.clone().or_else(|| engine.on_error.clone());
    let Some(hook) = hook else {
        return Err(err);
    };
    if let Some(errors) = hook(&err) {
        engine.overwrite_errors(errors.clone());
        engine.notify_submit_error(&engine.stores.data.get(), &errors);
    }
    Ok(())
}
