//! Reactive form-state engine over [`formdom`] element trees.
//!
//! Binding a form wires its controls to a bundle of observable stores:
//! nested data, per-field touched flags, validation errors and warnings,
//! and submission state. User events, programmatic control mutation, and
//! tree changes all flow into the same stores; validators run reactively
//! on every data change and again on submit.
//!
//! ```no_run
//! use formbind::prelude::*;
//! use formdom::Element;
//!
//! let form = Element::form()
//!     .child(Element::text_input("email"))
//!     .child(Element::input(formdom::InputType::Password).name("password"));
//!
//! let handle = bind(
//!     &form,
//!     FormConfig::new().validate(|data| {
//!         let mut errors = Errors::map();
//!         let email = FieldPath::parse("email");
//!         if data.get(&email).is_none() {
//!             errors.set_leaf(&email, vec!["required".to_string()]);
//!         }
//!         Some(errors)
//!     }),
//! )?;
//!
//! let _sub = handle
//!     .stores()
//!     .data
//!     .subscribe(|data| println!("{}", data.to_json()));
//! # Ok::<(), formbind::BindError>(())
//! ```

pub mod binder;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extend;
pub mod extract;
pub mod helpers;
pub mod path;
pub mod registry;
pub mod store;
pub mod stores;
pub mod submit;
pub mod validation;
pub mod value;

pub use binder::{bind, BoundForm, FormHandle};
pub use config::{BoxFuture, FormConfig, TouchTriggers, Validator};
pub use error::{BindError, SubmitError, ValidatorPanic};
pub use extend::{Extender, ExtenderContext, ExtenderHandle};
pub use extract::{addressable_controls, control_value, default_values, text_or_number};
pub use path::{resolve_path, FieldPath};
pub use registry::ConfigRegistry;
pub use store::{Derived, Store, Subscription};
pub use stores::FormStores;
pub use submit::{SubmitContext, SubmitOverrides};
pub use validation::{execute_validation, merge_errors};
pub use value::{Data, Errors, FieldNode, FieldValue, Touched};

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::binder::{bind, FormHandle};
    pub use crate::config::{FormConfig, TouchTriggers, Validator};
    pub use crate::error::{BindError, SubmitError};
    pub use crate::extend::{Extender, ExtenderContext, ExtenderHandle};
    pub use crate::path::FieldPath;
    pub use crate::registry::ConfigRegistry;
    pub use crate::store::{Derived, Store, Subscription};
    pub use crate::stores::FormStores;
    pub use crate::submit::{SubmitContext, SubmitOverrides};
    pub use crate::value::{Data, Errors, FieldNode, FieldValue, Touched};
}
