pub mod format;
pub mod output;
pub mod rate_limit;
pub mod validation;

pub use format::{Confidence, DetectionMethod, FormatDetectionResult, RawConversionCheck};
pub use output::{OutputFormat, QualityPreset};
pub use rate_limit::{Quota, RateLimitDecision};
pub use validation::{
    DimensionCheck, Dimensions, SecurityLevel, SecuritySummary, SecurityThreat, ValidationError,
    ValidationMetadata, ValidationResult, ValidationWarning, HIGH_RISK_ISSUE_THRESHOLD,
};
