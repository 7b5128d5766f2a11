//! Error types module
//!
//! This module provides the error type returned by the fallible pixelgate operations
//! (sanitization, encoding, file access). Validation findings are not errors in this
//! sense: they are collected into a [`ValidationResult`](crate::ValidationResult).

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like bad input
    Debug,
    /// Warning level - for recoverable issues like throttling
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be reported to callers
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "SANITIZATION_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the caller
    fn suggested_action(&self) -> Option<&'static str>;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Sanitization failed: {0}")]
    SanitizationFailed(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedOutputFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for IntakeError {
    fn from(err: anyhow::Error) -> Self {
        IntakeError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn intake_error_static_metadata(
    err: &IntakeError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        IntakeError::RateLimited { .. } => (
            "RATE_LIMITED",
            true,
            Some("Wait for the retry-after period before uploading again"),
            LogLevel::Warn,
        ),
        IntakeError::SanitizationFailed(_) => (
            "SANITIZATION_FAILED",
            false,
            Some("Check image format and try a different file"),
            LogLevel::Warn,
        ),
        IntakeError::EncodingFailed(_) => (
            "ENCODING_FAILED",
            false,
            Some("Try a different output format"),
            LogLevel::Error,
        ),
        IntakeError::UnsupportedOutputFormat(_) => (
            "UNSUPPORTED_OUTPUT_FORMAT",
            false,
            Some("Choose one of jpeg, png, webp or avif"),
            LogLevel::Debug,
        ),
        IntakeError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check parameters and try again"),
            LogLevel::Debug,
        ),
        IntakeError::Io(_) => (
            "IO_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        IntakeError::InternalWithSource { .. } => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for IntakeError {
    fn error_code(&self) -> &'static str {
        intake_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        intake_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        intake_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        intake_error_static_metadata(self).3
    }
}
