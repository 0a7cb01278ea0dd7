//! Remote data sources for reform fields.
//!
//! A [`DataSourceDescriptor`] declares where a field's options come from;
//! the [`SourceLoader`] resolves `$values.*` param templates, consults the
//! cache, and issues the request through a named [`Transport`]
//! (reform_core::Transport) adapter. Staleness between rapidly superseding
//! loads for the same field is settled by the field's generation token, so
//! cascading selects stay race-safe whatever order responses arrive in.

mod descriptor;
mod error;
mod http;
mod loader;

pub use descriptor::{CachePolicy, DataSourceDescriptor, TransformFn};
pub use error::SourceError;
pub use http::HttpTransport;
pub use loader::SourceLoader;
