//! Error types for the relayout library.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for relayout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors. Page-, block- and run-scoped problems are reported as
/// [`Diagnostic`](crate::model::Diagnostic)s instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The persisted schema version is not supported.
    #[error("Unsupported schema version {found} (supported: {supported})")]
    SchemaIncompatibility { found: u64, supported: u32 },

    /// The persisted form is malformed or lacks required fields.
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    /// A page failed to decode in strict mode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// No page could be extracted.
    #[error("No pages extracted: every page failed to decode")]
    NoPagesExtracted,

    /// Error while producing draw operations or previews.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Invalid option values.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Error::Render(err.to_string())
    }
}

/// A source page could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to decode page {page}: {message}")]
pub struct DecodeError {
    pub page: u32,
    pub message: String,
}

impl DecodeError {
    pub fn new(page: u32, message: impl Into<String>) -> Self {
        Self {
            page,
            message: message.into(),
        }
    }
}

/// Failure of a translation or OCR request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// Worth retrying (rate limits, dropped connections).
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Retrying will not help (bad request, unsupported language).
    #[error("Permanent failure: {0}")]
    Permanent(String),

    /// The request did not complete in time.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl CollaboratorError {
    /// Check if a retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CollaboratorError::Transient(_) | CollaboratorError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::SchemaIncompatibility {
            found: 7,
            supported: 1,
        };
        assert_eq!(err.to_string(), "Unsupported schema version 7 (supported: 1)");

        let err: Error = DecodeError::new(3, "truncated stream").into();
        assert_eq!(err.to_string(), "Failed to decode page 3: truncated stream");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_collaborator_retryable() {
        assert!(CollaboratorError::Transient("503".into()).is_retryable());
        assert!(CollaboratorError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!CollaboratorError::Permanent("bad language".into()).is_retryable());
    }
}
