//! Pixelgate Core Library
//!
//! This crate provides the domain models, format tables, error types and configuration
//! shared by every pixelgate component, plus the [`FileDescriptor`] abstraction the
//! intake pipeline reads candidate files through.

pub mod config;
pub mod error;
pub mod file;
pub mod formats;
pub mod models;

// Re-export commonly used types
pub use config::{IntakeConfig, RateLimitConfig};
pub use error::{ErrorMetadata, IntakeError, LogLevel};
pub use file::FileDescriptor;
pub use models::{
    Confidence, DetectionMethod, DimensionCheck, Dimensions, FormatDetectionResult,
    OutputFormat, QualityPreset, Quota, RateLimitDecision, RawConversionCheck, SecurityLevel,
    SecuritySummary, SecurityThreat, ValidationError, ValidationMetadata, ValidationResult,
    ValidationWarning,
};
