//! Extenders: plugins instantiated at bind time.
//!
//! An [`Extender`] is a factory registered on the config; `bind` calls it
//! with an [`ExtenderContext`] and keeps the returned handle alive until
//! the form is destroyed. When controls are added to or removed from the
//! form, handles are destroyed and the factories run again so every
//! extender observes a fresh control list. Through the context an
//! extender can read the stores, register extra validators or
//! transformers, and drive the engine.

use std::sync::Weak;

use formdom::Element;

use crate::binder::BoundForm;
use crate::config::{Transformer, Validator};
use crate::stores::FormStores;
use crate::value::{Data, Errors};

/// Factory for per-bind plugin instances.
pub trait Extender: Send + Sync {
    fn create(&self, cx: ExtenderContext) -> Box<dyn ExtenderHandle>;
}

/// A live plugin instance attached to one bound form.
///
/// Both hooks have no-op defaults; implement only what the plugin needs.
pub trait ExtenderHandle: Send + Sync {
    /// Called when the form is destroyed or the instance is replaced
    /// after a control-list change.
    fn destroy(&mut self) {}

    /// Called after a submission was blocked by validation errors, or
    /// after a recovery hook produced errors for a failed submit.
    fn on_submit_error(&mut self, _data: &Data, _errors: &Errors) {}
}

/// Everything an extender gets to work with.
pub struct ExtenderContext {
    pub form: Element,
    pub controls: Vec<Element>,
    pub stores: FormStores,
    pub(crate) engine: Weak<BoundForm>,
}

impl ExtenderContext {
    /// Register an additional validator on the running engine.
    pub fn add_validator(&self, validator: Validator) {
        if let Some(engine) = self.engine.upgrade() {
            engine.add_validator(validator);
        }
    }

    /// Register an additional warning validator.
    pub fn add_warner(&self, validator: Validator) {
        if let Some(engine) = self.engine.upgrade() {
            engine.add_warner(validator);
        }
    }

    /// Register an additional data transformer.
    pub fn add_transformer(&self, transformer: Transformer) {
        if let Some(engine) = self.engine.upgrade() {
            engine.add_transformer(transformer);
        }
    }

    /// Replace the whole data tree, running transformers.
    pub fn set_fields(&self, data: Data) {
        if let Some(engine) = self.engine.upgrade() {
            engine.set_fields(data);
        }
    }

    /// Trigger a validation run over the current data.
    pub fn request_validation(&self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.run_reactive();
        }
    }

    /// Reset the form to its initial values.
    pub fn reset(&self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.reset_state();
        }
    }
}
