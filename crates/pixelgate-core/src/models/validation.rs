use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::format::FormatDetectionResult;
use super::rate_limit::Quota;

/// Errors or threats at or above this count push a result to high risk.
pub const HIGH_RISK_ISSUE_THRESHOLD: usize = 2;

fn megabytes(bytes: &u64) -> String {
    format!("{:.2} MB", *bytes as f64 / (1024.0 * 1024.0))
}

/// Fatal findings: any of these makes a file invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("No file provided")]
    NoFile,

    #[error("Invalid file type: {mime_type} is not an allowed MIME type")]
    InvalidFileType { mime_type: String },

    #[error("Unsupported file format")]
    UnsupportedFormat,

    #[error("File is empty")]
    EmptyFile,

    #[error("File too large: {} (maximum: {})", megabytes(.size), megabytes(.max))]
    FileTooLarge { size: u64, max: u64 },

    #[error(
        "File content exceeds the maximum of {} (declared size: {})",
        megabytes(.max),
        megabytes(.declared)
    )]
    ContentTooLarge { declared: u64, max: u64 },

    #[error("Filename too long: {length} characters (maximum: {max})")]
    FilenameTooLong { length: usize, max: usize },

    #[error("Image dimensions too large: {width}x{height} (maximum: {max}px per side)")]
    DimensionsTooLarge { width: u32, height: u32, max: u32 },

    #[error("Too many pixels: {pixels} (maximum: {max})")]
    TooManyPixels { pixels: u64, max: u64 },

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("RAW files can only be converted to JPEG or PNG (requested: {target})")]
    RawConversionNotAllowed { target: String },

    #[error("Rate limit exceeded: {quota}. Try again in {retry_after_secs} seconds")]
    RateLimitExceeded { quota: Quota, retry_after_secs: u64 },
}

/// Advisory findings: reported to the caller, never block a file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationWarning {
    #[error("No MIME type provided")]
    MissingMimeType,

    #[error("Generic MIME type {mime_type}; format inferred from .{extension} extension")]
    GenericMimeType {
        mime_type: String,
        extension: String,
    },

    #[error("MIME type mismatch: declared {declared}, file signature indicates {detected}")]
    SignatureMismatch { declared: String, detected: String },

    #[error("Could not read file header: {reason}")]
    HeaderUnreadable { reason: String },

    #[error("Could not validate image dimensions: {reason}")]
    DimensionsUnavailable { reason: String },

    #[error("Large image ({pixels} pixels) may be slow to process")]
    LargeImage { pixels: u64 },

    #[error("{message}")]
    Format { message: String },
}

/// Suspicious findings: informational, weighed by the security summary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum SecurityThreat {
    #[error("Dangerous characters in filename: {characters}")]
    DangerousCharacters { characters: String },

    #[error("Path traversal sequence in filename")]
    PathTraversal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMetadata {
    pub original_name: String,
    pub sanitized_name: String,
    pub size: u64,
    /// Declared MIME type, lowercased; empty when the host reported none
    pub mime_type: String,
    /// MIME type implied by the file's magic bytes
    pub detected_mime_type: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Aggregated verdict of the validation pipeline.
///
/// Validity is derived from `errors`, never stored, so a result cannot claim to be valid
/// while carrying an error. The serialized form still includes `is_valid`; it is ignored
/// when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ValidationResultRecord", from = "ValidationResultRecord")]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub threats: Vec<SecurityThreat>,
    pub metadata: Option<ValidationMetadata>,
    pub format: Option<FormatDetectionResult>,
}

/// Wire shape of [`ValidationResult`].
#[derive(Serialize, Deserialize)]
struct ValidationResultRecord {
    #[serde(default)]
    is_valid: bool,
    #[serde(default)]
    errors: Vec<ValidationError>,
    #[serde(default)]
    warnings: Vec<ValidationWarning>,
    #[serde(default)]
    threats: Vec<SecurityThreat>,
    metadata: Option<ValidationMetadata>,
    format: Option<FormatDetectionResult>,
}

impl From<ValidationResult> for ValidationResultRecord {
    fn from(result: ValidationResult) -> Self {
        Self {
            is_valid: result.is_valid(),
            errors: result.errors,
            warnings: result.warnings,
            threats: result.threats,
            metadata: result.metadata,
            format: result.format,
        }
    }
}

impl From<ValidationResultRecord> for ValidationResult {
    fn from(record: ValidationResultRecord) -> Self {
        Self {
            errors: record.errors,
            warnings: record.warnings,
            threats: record.threats,
            metadata: record.metadata,
            format: record.format,
        }
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            threats: Vec::new(),
            metadata: None,
            format: None,
        }
    }

    pub fn no_file() -> Self {
        let mut result = Self::new();
        result.push_error(ValidationError::NoFile);
        result
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn push_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    pub fn push_threat(&mut self, threat: SecurityThreat) {
        self.threats.push(threat);
    }

    /// Whether the verdict includes a throttling denial (retryable, unlike content errors).
    pub fn is_rate_limited(&self) -> bool {
        self.retry_after_secs().is_some()
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        self.errors.iter().find_map(|e| match e {
            ValidationError::RateLimitExceeded {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        })
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }

    pub fn threat_messages(&self) -> Vec<String> {
        self.threats.iter().map(|t| t.to_string()).collect()
    }

    pub fn security_summary(&self) -> SecuritySummary {
        SecuritySummary::from_result(self)
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityLevel {
    Secure,
    LowRisk,
    MediumRisk,
    HighRisk,
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityLevel::Secure => write!(f, "secure"),
            SecurityLevel::LowRisk => write!(f, "low-risk"),
            SecurityLevel::MediumRisk => write!(f, "medium-risk"),
            SecurityLevel::HighRisk => write!(f, "high-risk"),
        }
    }
}

/// Read-only severity view derived from a [`ValidationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySummary {
    pub security_level: SecurityLevel,
    pub is_secure: bool,
    pub total_issues: usize,
    pub critical_issues: usize,
    pub threats: usize,
}

impl SecuritySummary {
    pub fn from_result(result: &ValidationResult) -> Self {
        let errors = result.errors.len();
        let warnings = result.warnings.len();
        let threats = result.threats.len();

        let security_level =
            if errors >= HIGH_RISK_ISSUE_THRESHOLD || threats >= HIGH_RISK_ISSUE_THRESHOLD {
                SecurityLevel::HighRisk
            } else if errors > 0 || threats > 0 {
                SecurityLevel::MediumRisk
            } else if warnings > 0 {
                SecurityLevel::LowRisk
            } else {
                SecurityLevel::Secure
            };

        Self {
            security_level,
            is_secure: result.is_valid() && threats == 0,
            total_issues: errors + warnings + threats,
            critical_issues: errors + threats,
            threats,
        }
    }
}

/// Result of a standalone width/height check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionCheck {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}
