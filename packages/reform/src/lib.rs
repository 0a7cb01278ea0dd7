//! Reform: configuration-driven reactive forms.
//!
//! Reform models a form as a values tree plus per-field state, with
//! dependencies between fields expressed as reactions over dotted/indexed
//! paths. Everything flows through the same few pieces: [`Path`] addresses
//! a slot, [`Rule`]s validate it, [`Reaction`]s recompute dependent state,
//! and a [`DataSourceDescriptor`] loads remote options whose parameters
//! resolve against the live values.
//!
//! This crate re-exports the public surface of the workspace members.

pub use reform_core::{
    ops, AbortSignal, DataOption, FieldCell, FieldMode, FieldState, FormatValidator, Method,
    MessageBundle, Registry, RequestConfig, RuleKind, Transport, TransportError, Value,
};
pub use reform_form::{
    FieldFeedback, FieldOps, FieldSpec, Form, FormError, Reaction, ReactionBody, ReactionContext,
    StatePatch, SubmitResult,
};
pub use reform_path::{path, Path, Pattern, Segment};
pub use reform_rules::{
    validate, validate_sync, AsyncValidator, Level, Rule, Trigger, ValidatorContext, Verdict,
};
pub use reform_source::{
    CachePolicy, DataSourceDescriptor, HttpTransport, SourceError, SourceLoader, TransformFn,
};
