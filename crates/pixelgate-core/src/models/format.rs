use serde::{Deserialize, Serialize};
use std::fmt;

/// How certain the classifier is about a format match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Which signal produced a format match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMethod {
    MimeType,
    Extension,
    Signature,
    Unknown,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionMethod::MimeType => write!(f, "mime-type"),
            DetectionMethod::Extension => write!(f, "extension"),
            DetectionMethod::Signature => write!(f, "signature"),
            DetectionMethod::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of classifying a candidate file.
///
/// Built only through the constructors below so that `confidence` always agrees with
/// `detection_method`: a MIME-type match is high confidence, extension and signature
/// matches cap at medium, and an unsupported file is low.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDetectionResult {
    pub is_valid: bool,
    pub is_raw: bool,
    /// Normalized lowercase format name ("jpeg", "png", "cr2", ...)
    pub detected_format: Option<String>,
    pub confidence: Confidence,
    pub detection_method: DetectionMethod,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl FormatDetectionResult {
    fn matched(format: &str, is_raw: bool, confidence: Confidence, method: DetectionMethod) -> Self {
        let warnings = if is_raw {
            vec![format!(
                "RAW format ({}) requires specialized decoding before editing",
                format.to_uppercase()
            )]
        } else {
            Vec::new()
        };

        Self {
            is_valid: true,
            is_raw,
            detected_format: Some(format.to_string()),
            confidence,
            detection_method: method,
            warnings,
            errors: Vec::new(),
        }
    }

    pub fn from_mime_type(format: &str, is_raw: bool) -> Self {
        Self::matched(format, is_raw, Confidence::High, DetectionMethod::MimeType)
    }

    pub fn from_extension(format: &str, is_raw: bool) -> Self {
        Self::matched(format, is_raw, Confidence::Medium, DetectionMethod::Extension)
    }

    pub fn from_signature(format: &str, is_raw: bool) -> Self {
        Self::matched(format, is_raw, Confidence::Medium, DetectionMethod::Signature)
    }

    pub fn unsupported() -> Self {
        Self {
            is_valid: false,
            is_raw: false,
            detected_format: None,
            confidence: Confidence::Low,
            detection_method: DetectionMethod::Unknown,
            warnings: Vec::new(),
            errors: vec!["Unsupported file format".to_string()],
        }
    }
}

/// Verdict for a requested RAW → standard conversion target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConversionCheck {
    pub is_valid: bool,
    pub error: Option<String>,
    pub suggested_formats: Vec<String>,
}
