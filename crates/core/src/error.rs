//! Validation errors raised while building fragment records.

use thiserror::Error;

/// A violated record invariant. Raised before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("fragment is missing an owner id")]
    MissingOwner,

    #[error("fragment is missing a type")]
    MissingType,

    #[error("fragment size cannot be negative: {0}")]
    NegativeSize(String),

    #[error("fragment size must be a whole number: {0}")]
    NonNumericSize(String),

    #[error("unsupported fragment type: {0}")]
    UnsupportedType(String),
}

/// Result type alias for record construction.
pub type Result<T> = std::result::Result<T, ValidationError>;
