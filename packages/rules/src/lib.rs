//! Validation rules for reform fields.
//!
//! A field carries an ordered list of [`Rule`]s; the engine evaluates them
//! against the field's value with cross-field lookups through a
//! [`ValidatorContext`]. Sync checks run inline; async validators run after
//! a rule's sync checks pass and are raced against an
//! [`AbortSignal`](reform_core::AbortSignal), so a superseded run
//! contributes nothing.
//!
//! # Example
//!
//! ```rust
//! use reform_core::{Registry, Value};
//! use reform_path::path;
//! use reform_rules::{validate_sync, Rule, ValidatorContext};
//!
//! let registry = Registry::new();
//! let values = Value::map();
//! let p = path!("email");
//! let ctx = ValidatorContext {
//!     values: &values,
//!     path: &p,
//!     label: "Email",
//!     registry: &registry,
//! };
//! let rules = vec![Rule::new().required().format("email")];
//! let verdict = validate_sync(&Value::from("not an email"), &rules, &ctx, None);
//! assert!(!verdict.is_valid());
//! ```

mod engine;
mod rule;

pub use engine::{validate, validate_sync, ValidatorContext, Verdict};
pub use rule::{AsyncValidator, Level, Rule, SyncValidator, Trigger};
