//! Error types for the on-disk Vamana/DiskANN index format.

use thiserror::Error;

/// All errors that can occur while building or reading a Vamana-style index artifact.
#[derive(Error, Debug)]
pub enum AnnError {
    /// A write-side precondition was violated before any byte was emitted.
    #[error("precondition violation: {0}")]
    PreconditionViolation(String),

    /// The artifact is structurally invalid.
    #[error("format error: {0}")]
    FormatError(String),

    /// An operation requires a feature the view does not carry.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for this crate.
pub type AnnResult<T> = Result<T, AnnError>;

impl AnnError {
    /// Construct a `PreconditionViolation` from a `Display`-able reason.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionViolation(msg.into())
    }

    /// Construct a `FormatError` from a `Display`-able reason.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::FormatError(msg.into())
    }

    /// Construct an `Unsupported` error from a `Display`-able reason.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}
