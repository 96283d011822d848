//! Error types for binding and submission.

use thiserror::Error;

/// Contract violations surfaced at bind time.
#[derive(Debug, Error)]
pub enum BindError {
    /// The element passed to `bind` is not a form.
    #[error("element '{id}' is not a form")]
    NotAForm { id: String },

    /// The form is already bound; one bind per element at a time.
    #[error("form '{id}' is already bound")]
    AlreadyBound { id: String },
}

/// Failure raised by a submit handler or escalated from submit-time
/// validation.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The configured submit handler failed.
    #[error("submit failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A validator panicked while validating the submission snapshot.
    #[error("validator panicked during submit: {0}")]
    ValidatorPanic(String),
}

impl SubmitError {
    pub fn failed(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        SubmitError::Failed(err.into())
    }

    /// A submit failure described by a plain message.
    pub fn message(msg: impl Into<String>) -> Self {
        SubmitError::Failed(msg.into().into())
    }
}

/// A validator panicked during a reactive (non-submit) run.
///
/// Reactive validation is fail-soft: the previous errors state is
/// retained and the panic is logged, never propagated.
#[derive(Debug, Error)]
#[error("validator panicked: {message}")]
pub struct ValidatorPanic {
    pub message: String,
}
