//! Centralized error types for formwire.

use thiserror::Error;

/// All errors produced by the formwire library.
#[derive(Error, Debug)]
pub enum FormError {
    /// The bytes do not start with any known image signature
    /// (or are too short to hold one).
    #[error("Unsupported image type")]
    UnsupportedImageType,

    /// The JSON payload could not be serialized.
    #[error("Failed to marshal payload: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The multipart writer could not open a new part.
    #[error("Failed to create part '{field}': {source}")]
    PartCreation {
        field: String,
        source: std::io::Error,
    },

    /// Reading a file source or writing a part body failed.
    #[error("I/O error writing part '{field}': {source}")]
    Io {
        field: String,
        source: std::io::Error,
    },

    /// Writing the closing delimiter failed.
    #[error("Failed to close multipart writer: {0}")]
    Finalization(#[source] std::io::Error),

    /// A caller-supplied boundary is not valid per RFC 2046.
    #[error("Invalid multipart boundary: {0:?}")]
    InvalidBoundary(String),

    /// A string could not be decoded as a base64 image data URI.
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
}

/// Convenience alias for `Result<T, FormError>`.
pub type Result<T> = std::result::Result<T, FormError>;

impl FormError {
    /// Create an `Io` variant for the named form field.
    pub fn io(field: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            field: field.into(),
            source,
        }
    }

    /// Create a `PartCreation` variant for the named form field.
    pub fn part_creation(field: impl Into<String>, source: std::io::Error) -> Self {
        Self::PartCreation {
            field: field.into(),
            source,
        }
    }
}
