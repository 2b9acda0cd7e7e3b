//! Conversion error types.

use thiserror::Error;

/// Conversion errors.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported conversion: {from} -> {to}")]
    Unsupported { from: String, to: String },

    #[error("invalid JSON source: {0}")]
    Json(#[from] serde_json::Error),

    #[error("markdown source is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl ConvertError {
    /// Whether the pair has no entry in the matrix, as opposed to a supported
    /// pair whose input could not be converted.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Result type for conversions.
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
