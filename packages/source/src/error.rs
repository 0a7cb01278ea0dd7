use reform_core::TransportError;

/// Errors surfaced by a data-source load that is still current.
///
/// Superseded loads are not errors: they resolve `Ok` and mutate nothing.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("no transport adapter registered under {name:?}")]
    UnknownAdapter { name: String },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
