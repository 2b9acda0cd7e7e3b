//! Service error types.

use fragments_convert::ConvertError;
use fragments_core::{FragmentId, ValidationError};
use fragments_storage::StorageError;
use thiserror::Error;

/// Fragment service errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Absent, or owned by someone else. The two are never distinguished.
    #[error("fragment not found: {0}")]
    NotFound(FragmentId),

    #[error("fragment type cannot change: stored {stored}, declared {declared}")]
    TypeImmutable { stored: String, declared: String },

    #[error("unsupported conversion: {from} -> {to}")]
    UnsupportedConversion { from: String, to: String },

    #[error("conversion failed: {0}")]
    Conversion(ConvertError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ConvertError> for ServiceError {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::Unsupported { from, to } => Self::UnsupportedConversion { from, to },
            other => Self::Conversion(other),
        }
    }
}

impl ServiceError {
    /// Stable error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::TypeImmutable { .. } => "type_immutable",
            Self::UnsupportedConversion { .. } => "unsupported_conversion",
            Self::Conversion(_) => "conversion_error",
            Self::Storage(_) => "storage_error",
            Self::Config(_) => "config_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
