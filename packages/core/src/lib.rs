//! Core reform contracts: the values tree and everything fields share.
//!
//! This layer owns the data model the rest of the runtime operates on:
//! - [`Value`]: the tree-shaped form values structure
//! - [`ops`]: path-addressed get/set/delete/exists with intermediate creation
//! - [`FieldState`]/[`FieldCell`]: per-field flags, feedback, options, and
//!   the generation counter that orders async results
//! - [`Registry`]: format validators, locale messages, transport adapters,
//!   injected into a form at construction
//! - [`Transport`]: the seam a data-source load crosses to reach the network
//!
//! # Example
//!
//! ```rust
//! use reform_core::{ops, Value};
//! use reform_path::path;
//!
//! let mut values = Value::map();
//! ops::set_in(&mut values, &path!("vehicle.brand"), Value::from("bmw"));
//! assert_eq!(
//!     values.get(&path!("vehicle.brand")),
//!     Some(&Value::from("bmw"))
//! );
//! ```

mod field;
mod formats;
mod messages;
pub mod ops;
mod registry;
mod transport;
mod value;

pub use field::{AbortSignal, DataOption, FieldCell, FieldMode, FieldState};
pub use messages::{MessageBundle, RuleKind};
pub use registry::{FormatValidator, Registry};
pub use transport::{Method, RequestConfig, Transport, TransportError};
pub use value::Value;

// Re-export the path layer for convenience.
pub use reform_path::{path, Path, Pattern, Segment};
