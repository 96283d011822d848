//! Bind-time configuration.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::error::SubmitError;
use crate::extend::Extender;
use crate::submit::SubmitContext;
use crate::value::{Data, Errors};

/// Type alias for boxed futures used across the engine.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type SyncValidateFn = Arc<dyn Fn(&Data) -> Option<Errors> + Send + Sync>;
type AsyncValidateFn = Arc<dyn Fn(Data) -> BoxFuture<'static, Option<Errors>> + Send + Sync>;

/// The configured submit handler.
pub type SubmitFn =
    Arc<dyn Fn(Data, SubmitContext) -> BoxFuture<'static, Result<(), SubmitError>> + Send + Sync>;

/// Recovery hook for submit failures. Returning an errors tree surfaces
/// it through the `errors` store and the extenders.
pub type RecoverFn = Arc<dyn Fn(&SubmitError) -> Option<Errors> + Send + Sync>;

/// Transformer applied to the whole data tree on every engine-side write.
pub type Transformer = Arc<dyn Fn(Data) -> Data + Send + Sync>;

/// A validation (or warning) function over a data snapshot.
///
/// Returning `None` or omitting a leaf contributes nothing for that leaf.
#[derive(Clone)]
pub enum Validator {
    Sync(SyncValidateFn),
    Async(AsyncValidateFn),
}

impl Validator {
    pub fn sync(f: impl Fn(&Data) -> Option<Errors> + Send + Sync + 'static) -> Self {
        Validator::Sync(Arc::new(f))
    }

    pub fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn(Data) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Errors>> + Send + 'static,
    {
        Validator::Async(Arc::new(move |data| Box::pin(f(data))))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Validator::Async(_))
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Validator::Sync(_) => write!(f, "Validator::Sync"),
            Validator::Async(_) => write!(f, "Validator::Async"),
        }
    }
}

/// Which events mark a field as touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchTriggers {
    pub input: bool,
    pub change: bool,
    pub blur: bool,
}

impl Default for TouchTriggers {
    fn default() -> Self {
        Self {
            input: true,
            change: false,
            blur: true,
        }
    }
}

/// Configuration for one bind. Immutable for the lifetime of the bind.
#[derive(Clone, Default)]
pub struct FormConfig {
    pub(crate) initial_values: Option<Data>,
    pub(crate) validators: Vec<Validator>,
    pub(crate) warners: Vec<Validator>,
    pub(crate) debounced_validators: Vec<Validator>,
    pub(crate) debounced_warners: Vec<Validator>,
    pub(crate) debounce_delay: Option<Duration>,
    pub(crate) transformers: Vec<Transformer>,
    pub(crate) on_submit: Option<SubmitFn>,
    pub(crate) on_error: Option<RecoverFn>,
    pub(crate) touch_triggers: TouchTriggers,
    pub(crate) extenders: Vec<Arc<dyn Extender>>,
}

impl FormConfig {
    /// Trailing-edge debounce delay applied when none is configured.
    pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

    pub fn new() -> Self {
        Self::default()
    }

    /// Caller-supplied initial values, merged over extracted defaults
    /// (caller values win at the leaf level).
    pub fn initial_values(mut self, values: Data) -> Self {
        self.initial_values = Some(values);
        self
    }

    /// Add a synchronous validator.
    pub fn validate(mut self, f: impl Fn(&Data) -> Option<Errors> + Send + Sync + 'static) -> Self {
        self.validators.push(Validator::sync(f));
        self
    }

    /// Add an asynchronous validator.
    pub fn validate_async<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Data) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Errors>> + Send + 'static,
    {
        self.validators.push(Validator::asynchronous(f));
        self
    }

    /// Add a validator value directly.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Add a synchronous warning validator. Warnings never block
    /// submission and never mix with errors.
    pub fn warn(mut self, f: impl Fn(&Data) -> Option<Errors> + Send + Sync + 'static) -> Self {
        self.warners.push(Validator::sync(f));
        self
    }

    /// Add an asynchronous warning validator.
    pub fn warn_async<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Data) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Errors>> + Send + 'static,
    {
        self.warners.push(Validator::asynchronous(f));
        self
    }

    /// Add a debounced validator: runs on a trailing-edge timer reset by
    /// subsequent data changes, and never blocks the immediate merge.
    pub fn debounced_validator(mut self, validator: Validator) -> Self {
        self.debounced_validators.push(validator);
        self
    }

    /// Add a debounced warning validator.
    pub fn debounced_warner(mut self, validator: Validator) -> Self {
        self.debounced_warners.push(validator);
        self
    }

    pub fn debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = Some(delay);
        self
    }

    /// Add a data transformer, applied on every engine-side data write in
    /// registration order.
    pub fn transform(mut self, f: impl Fn(Data) -> Data + Send + Sync + 'static) -> Self {
        self.transformers.push(Arc::new(f));
        self
    }

    /// Set the submit handler.
    pub fn on_submit<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Data, SubmitContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), SubmitError>> + Send + 'static,
    {
        self.on_submit = Some(Arc::new(move |data, cx| Box::pin(f(data, cx))));
        self
    }

    /// Set the submit-failure recovery hook.
    pub fn on_error(mut self, f: impl Fn(&SubmitError) -> Option<Errors> + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn touch_triggers(mut self, triggers: TouchTriggers) -> Self {
        self.touch_triggers = triggers;
        self
    }

    /// Register an extender.
    pub fn extend(mut self, extender: impl Extender + 'static) -> Self {
        self.extenders.push(Arc::new(extender));
        self
    }
}
