//! The reform form store.
//!
//! A [`Form`] owns the values tree, the registered fields, and the reaction
//! scheduler. Fields are registered from a [`FieldSpec`]; every value write
//! runs the reaction cascade to a fixed point before returning, so reads
//! after a write observe fully propagated state. Validation and remote
//! option loads are async and cancellation-safe: a superseded run never
//! writes feedback or options.
//!
//! # Example
//!
//! ```rust
//! use reform_core::Registry;
//! use reform_form::{FieldSpec, Form, Reaction, StatePatch};
//! use reform_path::path;
//! use reform_rules::Rule;
//!
//! let form = Form::new(Registry::new());
//! form.create_field(
//!     FieldSpec::new("plan")
//!         .label("Plan")
//!         .initial_value("free"),
//! )?;
//! form.create_field(
//!     FieldSpec::new("billing.card")
//!         .label("Card number")
//!         .rule(Rule::new().required())
//!         .reaction(Reaction::declarative(
//!             ["plan"],
//!             |watched| watched[0] == "paid".into(),
//!             StatePatch::new().visible(true).required(true),
//!             StatePatch::new().visible(false).required(false),
//!         )),
//! )?;
//!
//! form.set_field_value(&path!("plan"), "paid")?;
//! assert!(form.field_state(&path!("billing.card")).unwrap().visible);
//! # Ok::<(), reform_form::FormError>(())
//! ```

mod error;
mod form;
mod reaction;
mod spec;

pub use error::FormError;
pub use form::{FieldFeedback, Form, SubmitResult, DEFAULT_MAX_CASCADE};
pub use reaction::{FieldOps, Reaction, ReactionBody, ReactionContext, RunFn, StatePatch, WhenFn};
pub use spec::FieldSpec;
