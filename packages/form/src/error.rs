use reform_path::Path;
use reform_source::SourceError;

/// Errors at the form layer.
#[derive(thiserror::Error, Debug)]
pub enum FormError {
    /// A reaction cascade exceeded the configured pass bound. This is a
    /// fatal configuration error (a mis-authored cyclic dependency), not a
    /// normal cascade.
    #[error("reaction cascade did not settle after {passes} passes; check for cyclic reactions")]
    ReactionCycle { passes: usize },

    /// An operation addressed a path with no registered field.
    #[error("no field registered at {path}")]
    UnknownField { path: Path },

    /// A data-source operation addressed a field without a descriptor.
    #[error("field {path} has no data source descriptor")]
    NoDataSource { path: Path },

    #[error(transparent)]
    Source(#[from] SourceError),
}
