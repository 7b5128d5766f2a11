//! Security validator
//!
//! Runs every intake stage over a candidate file and collects the findings into one
//! [`ValidationResult`]. Stages never abort the pipeline: a file that is too large still has
//! its filename inspected, so the caller sees every problem in a single pass. Only a missing
//! file short-circuits.

use pixelgate_core::formats;
use pixelgate_core::{
    DimensionCheck, Dimensions, FileDescriptor, FormatDetectionResult, IntakeConfig,
    RateLimitDecision, ValidationError, ValidationMetadata, ValidationResult,
    ValidationWarning,
};
use pixelgate_infra::RateLimiterStore;
use std::sync::Arc;

use crate::classifier::FormatClassifier;
use crate::filename;
use crate::image::{ImageDecoder, NativeImageDecoder};
use crate::signature::{self, MagicSignature};

/// Identity used for rate limiting when the caller supplies none.
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Per-call overrides for [`SecurityValidator::validate`].
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Size limit in bytes for this call, instead of the configured maximum
    pub max_size: Option<u64>,
    pub skip_rate_limiting: bool,
    /// Rate-limit key (user id, session, client address)
    pub identity: Option<String>,
    /// Intended conversion target; RAW sources may only target JPEG or PNG
    pub target_format: Option<String>,
}

/// Standalone width/height check against the configured limits.
pub fn validate_image_dimensions(width: u32, height: u32, config: &IntakeConfig) -> DimensionCheck {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if width == 0 || height == 0 {
        errors.push(ValidationError::InvalidDimensions { width, height });
    } else {
        let max = config.max_image_dimension;
        if width > max || height > max {
            errors.push(ValidationError::DimensionsTooLarge { width, height, max });
        }

        let pixels = Dimensions { width, height }.pixels();
        if pixels > config.max_image_pixels {
            errors.push(ValidationError::TooManyPixels {
                pixels,
                max: config.max_image_pixels,
            });
        } else if pixels > config.large_image_pixels {
            warnings.push(ValidationWarning::LargeImage { pixels });
        }
    }

    DimensionCheck {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

pub struct SecurityValidator {
    config: IntakeConfig,
    classifier: FormatClassifier,
    rate_limiter: Arc<RateLimiterStore>,
    decoder: Arc<dyn ImageDecoder>,
}

impl SecurityValidator {
    pub fn new(
        config: IntakeConfig,
        rate_limiter: Arc<RateLimiterStore>,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Self {
        Self {
            config,
            classifier: FormatClassifier::new(),
            rate_limiter,
            decoder,
        }
    }

    /// Validator with its own rate-limit store and the native decoder.
    pub fn from_config(config: IntakeConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiterStore::new(config.rate_limit.clone()));
        let decoder = Arc::new(NativeImageDecoder::from_config(&config));
        Self::new(config, rate_limiter, decoder)
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn classifier(&self) -> &FormatClassifier {
        &self.classifier
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiterStore> {
        &self.rate_limiter
    }

    pub fn decoder(&self) -> Arc<dyn ImageDecoder> {
        self.decoder.clone()
    }

    /// Non-mutating quota probe.
    pub async fn rate_limit_status(&self, identity: &str) -> RateLimitDecision {
        self.rate_limiter.status(identity).await
    }

    pub fn validate_image_dimensions(&self, width: u32, height: u32) -> DimensionCheck {
        validate_image_dimensions(width, height, &self.config)
    }

    #[tracing::instrument(skip_all, fields(file_name = file.map(|f| f.name())))]
    pub async fn validate(
        &self,
        file: Option<&dyn FileDescriptor>,
        options: &ValidationOptions,
    ) -> ValidationResult {
        let Some(file) = file else {
            tracing::debug!("Validation requested without a file");
            return ValidationResult::no_file();
        };

        let mut result = ValidationResult::new();
        let declared_mime = file
            .mime_type()
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty());
        let classification = self.classifier.classify(file);

        self.check_mime_type(
            &mut result,
            declared_mime.as_deref(),
            file.name(),
            &classification,
        );
        let sniffed = self
            .check_signature(&mut result, file, declared_mime.as_deref())
            .await;
        let max_size = options.max_size.unwrap_or(self.config.max_file_size_bytes);
        let size_ok = self.check_size(&mut result, file.size(), max_size);
        let sanitized_name = self.check_filename(&mut result, file.name());

        let dimensions = if size_ok && needs_dimension_check(&classification, sniffed) {
            self.check_dimensions(&mut result, file, max_size).await
        } else {
            None
        };

        if let Some(target) = options.target_format.as_deref() {
            self.check_raw_target(&mut result, &classification, target);
        }

        if !options.skip_rate_limiting {
            let identity = options.identity.as_deref().unwrap_or(ANONYMOUS_IDENTITY);
            self.check_rate_limit(&mut result, identity, file.size())
                .await;
        }

        for message in &classification.warnings {
            result.push_warning(ValidationWarning::Format {
                message: message.clone(),
            });
        }

        result.metadata = Some(ValidationMetadata {
            original_name: file.name().to_string(),
            sanitized_name,
            size: file.size(),
            mime_type: declared_mime.unwrap_or_default(),
            detected_mime_type: sniffed.map(|s| s.mime_type.to_string()),
            dimensions,
            last_modified: file.last_modified(),
        });
        result.format = Some(classification);

        tracing::debug!(
            is_valid = result.is_valid(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            threats = result.threats.len(),
            "Validation complete"
        );

        result
    }

    fn check_mime_type(
        &self,
        result: &mut ValidationResult,
        declared: Option<&str>,
        filename: &str,
        classification: &FormatDetectionResult,
    ) {
        match declared {
            None => {
                result.push_warning(ValidationWarning::MissingMimeType);
                if !classification.is_valid {
                    result.push_error(ValidationError::UnsupportedFormat);
                }
            }
            Some(mime) if self.config.is_content_type_allowed(mime) => {}
            Some(mime) if formats::is_generic_mime(mime) && classification.is_raw => {
                result.push_warning(ValidationWarning::GenericMimeType {
                    mime_type: mime.to_string(),
                    extension: formats::extension_of(filename).unwrap_or_default(),
                });
            }
            Some(mime) => {
                result.push_error(ValidationError::InvalidFileType {
                    mime_type: mime.to_string(),
                });
            }
        }
    }

    /// Returns the signature matching the file's leading bytes, if recognized.
    async fn check_signature(
        &self,
        result: &mut ValidationResult,
        file: &dyn FileDescriptor,
        declared: Option<&str>,
    ) -> Option<&'static MagicSignature> {
        let header = match file.read_header(self.config.header_read_bytes).await {
            Ok(header) => header,
            Err(e) => {
                tracing::debug!(error = %e, "Could not read file header");
                result.push_warning(ValidationWarning::HeaderUnreadable {
                    reason: e.to_string(),
                });
                return None;
            }
        };

        let sniffed = signature::sniff(&header);

        if let Some(declared) = declared.filter(|_| !header.is_empty()) {
            if signature::check_declared(declared, &header) == Some(false) {
                let detected = sniffed.map(|s| s.mime_type).unwrap_or("unknown");
                tracing::debug!(declared = %declared, detected = %detected, "Signature mismatch");
                result.push_warning(ValidationWarning::SignatureMismatch {
                    declared: declared.to_string(),
                    detected: detected.to_string(),
                });
            }
        }

        sniffed
    }

    /// Returns whether the size is within limits.
    fn check_size(&self, result: &mut ValidationResult, size: u64, max: u64) -> bool {
        if size == 0 {
            result.push_error(ValidationError::EmptyFile);
            return false;
        }

        if size > max {
            result.push_error(ValidationError::FileTooLarge { size, max });
            return false;
        }

        true
    }

    /// Returns the sanitized filename.
    fn check_filename(&self, result: &mut ValidationResult, name: &str) -> String {
        let max = self.config.max_filename_length;
        let inspection = filename::inspect_filename(name, max);

        if inspection.length > max {
            result.push_error(ValidationError::FilenameTooLong {
                length: inspection.length,
                max,
            });
        }

        for threat in inspection.threats {
            tracing::warn!(
                threat = %threat,
                sanitized_name = %inspection.sanitized,
                "Suspicious filename"
            );
            result.push_threat(threat);
        }

        inspection.sanitized
    }

    /// Reads at most `max_size + 1` bytes: content larger than the limit is rejected
    /// even when the declared size passed the size stage.
    async fn check_dimensions(
        &self,
        result: &mut ValidationResult,
        file: &dyn FileDescriptor,
        max_size: u64,
    ) -> Option<Dimensions> {
        let limit = usize::try_from(max_size.saturating_add(1)).unwrap_or(usize::MAX);
        let data = match file.read_header(limit).await {
            Ok(data) => data,
            Err(e) => {
                result.push_warning(ValidationWarning::DimensionsUnavailable {
                    reason: e.to_string(),
                });
                return None;
            }
        };

        if data.len() as u64 > max_size {
            tracing::warn!(
                declared_size = file.size(),
                max_size = max_size,
                "File content exceeds its declared size"
            );
            result.push_error(ValidationError::ContentTooLarge {
                declared: file.size(),
                max: max_size,
            });
            return None;
        }

        let decoder = self.decoder.clone();
        // Image decode is CPU-bound; run off the async pool to avoid blocking other tasks.
        let probed = tokio::task::spawn_blocking(move || decoder.dimensions(&data)).await;

        let dimensions = match probed {
            Ok(Ok(dimensions)) => dimensions,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Dimension probe failed");
                result.push_warning(ValidationWarning::DimensionsUnavailable {
                    reason: e.to_string(),
                });
                return None;
            }
            Err(e) => {
                tracing::error!(error = %e, "Dimension probe task failed");
                result.push_warning(ValidationWarning::DimensionsUnavailable {
                    reason: e.to_string(),
                });
                return None;
            }
        };

        let check = self.validate_image_dimensions(dimensions.width, dimensions.height);
        for error in check.errors {
            result.push_error(error);
        }
        for warning in check.warnings {
            result.push_warning(warning);
        }

        Some(dimensions)
    }

    fn check_raw_target(
        &self,
        result: &mut ValidationResult,
        classification: &FormatDetectionResult,
        target: &str,
    ) {
        if !classification.is_raw {
            return;
        }

        if !self.classifier.validate_raw_conversion(target).is_valid {
            result.push_error(ValidationError::RawConversionNotAllowed {
                target: target.trim().to_lowercase(),
            });
        }
    }

    async fn check_rate_limit(&self, result: &mut ValidationResult, identity: &str, size: u64) {
        let decision = self.rate_limiter.check(identity, size).await;
        if let Some(quota) = decision.exceeded {
            let retry_after_secs = decision.retry_after_secs().unwrap_or(1);
            tracing::warn!(
                identity = %identity,
                quota = %quota,
                retry_after_secs = retry_after_secs,
                "Upload rate limit exceeded"
            );
            result.push_error(ValidationError::RateLimitExceeded {
                quota,
                retry_after_secs,
            });
        }
    }
}

/// Whether the dimension stage applies. Recognized content decides over the declared
/// label, so relabelling a decodable image (as HEIC, or with a RAW extension) cannot skip
/// the pixel limits. TIFF content under a RAW label is a camera container and is left to
/// the RAW pipeline.
fn needs_dimension_check(
    classification: &FormatDetectionResult,
    sniffed: Option<&MagicSignature>,
) -> bool {
    match sniffed {
        Some(signature) if signature.is_raw => false,
        Some(signature) if classification.is_raw && signature.format == "tiff" => false,
        Some(signature) => {
            formats::standard_by_name(signature.format).is_some_and(|format| format.decodable)
        }
        None => is_decodable(classification),
    }
}

fn is_decodable(classification: &FormatDetectionResult) -> bool {
    classification.is_valid
        && !classification.is_raw
        && classification
            .detected_format
            .as_deref()
            .and_then(formats::standard_by_name)
            .is_some_and(|format| format.decodable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::MemoryFile;
    use crate::image::DecodeError;
    use image::DynamicImage;
    use pixelgate_core::{Quota, RateLimitConfig, SecurityLevel};

    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0];

    /// Reports fixed dimensions without looking at the bytes
    struct FixedDecoder(Dimensions);

    impl ImageDecoder for FixedDecoder {
        fn dimensions(&self, _data: &[u8]) -> Result<Dimensions, DecodeError> {
            Ok(self.0)
        }

        fn decode(&self, _data: &[u8]) -> Result<DynamicImage, DecodeError> {
            Err(DecodeError::UnknownFormat)
        }
    }

    struct FailingDecoder;

    impl ImageDecoder for FailingDecoder {
        fn dimensions(&self, _data: &[u8]) -> Result<Dimensions, DecodeError> {
            Err(DecodeError::UnknownFormat)
        }

        fn decode(&self, _data: &[u8]) -> Result<DynamicImage, DecodeError> {
            Err(DecodeError::UnknownFormat)
        }
    }

    fn validator_with(decoder: Arc<dyn ImageDecoder>) -> SecurityValidator {
        let config = IntakeConfig::default();
        let limiter = Arc::new(RateLimiterStore::new(config.rate_limit.clone()));
        SecurityValidator::new(config, limiter, decoder)
    }

    fn validator(width: u32, height: u32) -> SecurityValidator {
        validator_with(Arc::new(FixedDecoder(Dimensions { width, height })))
    }

    fn no_rate_limit() -> ValidationOptions {
        ValidationOptions {
            skip_rate_limiting: true,
            ..Default::default()
        }
    }

    fn jpeg(name: &str) -> MemoryFile {
        MemoryFile::new(name, Some("image/jpeg"), JPEG_HEADER.to_vec())
    }

    #[tokio::test]
    async fn test_no_file() {
        let result = validator(10, 10).validate(None, &no_rate_limit()).await;
        assert!(!result.is_valid());
        assert_eq!(result.errors, vec![ValidationError::NoFile]);
        assert!(result.metadata.is_none());
    }

    #[tokio::test]
    async fn test_clean_file_is_secure() {
        let file = jpeg("photo.jpg");
        let result = validator(640, 480).validate(Some(&file), &no_rate_limit()).await;

        assert!(result.is_valid(), "{:?}", result);
        let summary = result.security_summary();
        assert_eq!(summary.security_level, SecurityLevel::Secure);
        assert_eq!(summary.total_issues, 0);

        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.original_name, "photo.jpg");
        assert_eq!(metadata.sanitized_name, "photo.jpg");
        assert_eq!(metadata.mime_type, "image/jpeg");
        assert_eq!(metadata.detected_mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(metadata.dimensions, Some(Dimensions { width: 640, height: 480 }));
    }

    #[tokio::test]
    async fn test_disallowed_mime_is_fatal() {
        let file = MemoryFile::new("doc.pdf", Some("application/pdf"), b"%PDF-1.7".to_vec());
        let result = validator(10, 10).validate(Some(&file), &no_rate_limit()).await;
        assert!(!result.is_valid());
        assert!(result.errors.contains(&ValidationError::InvalidFileType {
            mime_type: "application/pdf".to_string()
        }));
    }

    #[tokio::test]
    async fn test_missing_mime_is_warning() {
        let file = MemoryFile::new("photo.jpg", None, JPEG_HEADER.to_vec());
        let result = validator(10, 10).validate(Some(&file), &no_rate_limit()).await;
        assert!(result.is_valid());
        assert!(result.warnings.contains(&ValidationWarning::MissingMimeType));
    }

    #[tokio::test]
    async fn test_missing_mime_and_unknown_extension_is_fatal() {
        let file = MemoryFile::new("payload.exe", None, b"MZ\x90\x00".to_vec());
        let result = validator(10, 10).validate(Some(&file), &no_rate_limit()).await;
        assert!(!result.is_valid());
        assert!(result.errors.contains(&ValidationError::UnsupportedFormat));
    }

    #[tokio::test]
    async fn test_generic_mime_for_raw_is_warning() {
        let file = MemoryFile::new("DSC_0001.NEF", Some("application/octet-stream"), vec![1u8; 32]);
        let result = validator(10, 10).validate(Some(&file), &no_rate_limit()).await;
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(result.warnings.contains(&ValidationWarning::GenericMimeType {
            mime_type: "application/octet-stream".to_string(),
            extension: "nef".to_string(),
        }));
        // RAW files are never probed for dimensions
        assert!(result.metadata.unwrap().dimensions.is_none());
        assert!(result.format.unwrap().is_raw);
    }

    #[tokio::test]
    async fn test_signature_mismatch_is_warning() {
        let file = MemoryFile::new("photo.png", Some("image/png"), JPEG_HEADER.to_vec());
        let result = validator(10, 10).validate(Some(&file), &no_rate_limit()).await;
        assert!(result.is_valid());
        assert!(result.warnings.contains(&ValidationWarning::SignatureMismatch {
            declared: "image/png".to_string(),
            detected: "image/jpeg".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_empty_file() {
        let file = MemoryFile::new("photo.jpg", Some("image/jpeg"), Vec::new());
        let result = validator(10, 10).validate(Some(&file), &no_rate_limit()).await;
        assert!(!result.is_valid());
        assert!(result.error_messages().contains(&"File is empty".to_string()));
        // Nothing to probe or compare
        assert!(!result
            .warnings
            .iter()
            .any(|w| matches!(w, ValidationWarning::SignatureMismatch { .. })));
        assert!(result.metadata.unwrap().dimensions.is_none());
    }

    #[tokio::test]
    async fn test_file_too_large_uses_per_call_limit() {
        let file = jpeg("photo.jpg").with_declared_size(2048);
        let options = ValidationOptions {
            max_size: Some(1024),
            ..no_rate_limit()
        };
        let result = validator(10, 10).validate(Some(&file), &options).await;
        assert!(result.errors.contains(&ValidationError::FileTooLarge {
            size: 2048,
            max: 1024
        }));
    }

    #[tokio::test]
    async fn test_filename_threats_do_not_invalidate() {
        let file = jpeg("test<script>.jpg");
        let result = validator(10, 10).validate(Some(&file), &no_rate_limit()).await;
        assert!(result.is_valid());
        assert_eq!(result.threats.len(), 1);
        assert_eq!(result.metadata.unwrap().sanitized_name, "testscript.jpg");
    }

    #[tokio::test]
    async fn test_filename_too_long() {
        let file = jpeg(&format!("{}.jpg", "x".repeat(260)));
        let result = validator(10, 10).validate(Some(&file), &no_rate_limit()).await;
        assert!(result.errors.contains(&ValidationError::FilenameTooLong {
            length: 264,
            max: 255
        }));
    }

    #[tokio::test]
    async fn test_dimension_limits() {
        let file = jpeg("photo.jpg");

        let result = validator(9000, 100).validate(Some(&file), &no_rate_limit()).await;
        assert!(matches!(
            result.errors.as_slice(),
            [ValidationError::DimensionsTooLarge { width: 9000, .. }]
        ));

        let result = validator(8000, 8000).validate(Some(&file), &no_rate_limit()).await;
        assert!(matches!(
            result.errors.as_slice(),
            [ValidationError::TooManyPixels { .. }]
        ));
    }

    #[tokio::test]
    async fn test_relabelled_jpeg_still_checks_dimensions() {
        // Declared as HEIC, which the decoder cannot read
        let file = MemoryFile::new("wide.heic", Some("image/heic"), JPEG_HEADER.to_vec());
        let result = validator(9000, 100).validate(Some(&file), &no_rate_limit()).await;
        assert!(!result.is_valid());
        assert!(matches!(
            result.errors.as_slice(),
            [ValidationError::DimensionsTooLarge { width: 9000, .. }]
        ));
        assert!(result.warnings.contains(&ValidationWarning::SignatureMismatch {
            declared: "image/heic".to_string(),
            detected: "image/jpeg".to_string(),
        }));
        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.detected_mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(metadata.dimensions, Some(Dimensions { width: 9000, height: 100 }));

        // RAW extension on JPEG content
        let file = jpeg("IMG_0001.cr2");
        let result = validator(8000, 8000).validate(Some(&file), &no_rate_limit()).await;
        assert!(result.format.as_ref().unwrap().is_raw);
        assert!(!result.is_valid());
        assert!(matches!(
            result.errors.as_slice(),
            [ValidationError::TooManyPixels { .. }]
        ));
    }

    #[tokio::test]
    async fn test_undecodable_and_raw_content_skip_dimensions() {
        let mut heic = vec![0, 0, 0, 0x18];
        heic.extend_from_slice(b"ftypheic");
        heic.extend_from_slice(&[0u8; 16]);
        let file = MemoryFile::new("photo.heic", Some("image/heic"), heic);
        let result = validator(9000, 9000).validate(Some(&file), &no_rate_limit()).await;
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(result.metadata.unwrap().dimensions.is_none());

        // TIFF-based camera container under a RAW name
        let mut nef = b"MM\0*\0\0\0\x08".to_vec();
        nef.extend_from_slice(&[0u8; 24]);
        let file = MemoryFile::new("DSC_0001.NEF", Some("application/octet-stream"), nef);
        let result = validator(9000, 9000).validate(Some(&file), &no_rate_limit()).await;
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(result.metadata.unwrap().dimensions.is_none());
    }

    #[tokio::test]
    async fn test_content_larger_than_declared_is_fatal() {
        let mut data = JPEG_HEADER.to_vec();
        data.resize(4096, 0);
        let file = MemoryFile::new("photo.jpg", Some("image/jpeg"), data).with_declared_size(100);
        let options = ValidationOptions {
            max_size: Some(1024),
            ..no_rate_limit()
        };
        let result = validator(10, 10).validate(Some(&file), &options).await;
        assert!(!result.is_valid());
        assert_eq!(
            result.errors,
            vec![ValidationError::ContentTooLarge {
                declared: 100,
                max: 1024
            }]
        );
        assert!(result.metadata.unwrap().dimensions.is_none());

        // Content exactly at the limit is read and checked
        let mut data = JPEG_HEADER.to_vec();
        data.resize(1024, 0);
        let file = MemoryFile::new("photo.jpg", Some("image/jpeg"), data).with_declared_size(100);
        let result = validator(10, 10).validate(Some(&file), &options).await;
        assert!(result.is_valid(), "{:?}", result.errors);
    }

    #[tokio::test]
    async fn test_decode_failure_is_warning() {
        let file = jpeg("photo.jpg");
        let result = validator_with(Arc::new(FailingDecoder))
            .validate(Some(&file), &no_rate_limit())
            .await;
        assert!(result.is_valid());
        assert!(result
            .warning_messages()
            .iter()
            .any(|w| w.starts_with("Could not validate image dimensions")));
    }

    #[tokio::test]
    async fn test_raw_target_format() {
        let file = MemoryFile::new("IMG_0001.CR2", Some("image/x-canon-cr2"), vec![1u8; 32]);
        let options = ValidationOptions {
            target_format: Some("WebP".to_string()),
            ..no_rate_limit()
        };
        let result = validator(10, 10).validate(Some(&file), &options).await;
        assert!(result.errors.contains(&ValidationError::RawConversionNotAllowed {
            target: "webp".to_string()
        }));

        let options = ValidationOptions {
            target_format: Some("jpg".to_string()),
            ..no_rate_limit()
        };
        assert!(validator(10, 10).validate(Some(&file), &options).await.is_valid());

        // Standard sources may target anything
        let options = ValidationOptions {
            target_format: Some("webp".to_string()),
            ..no_rate_limit()
        };
        let file = jpeg("photo.jpg");
        assert!(validator(10, 10).validate(Some(&file), &options).await.is_valid());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_stage() {
        let mut config = IntakeConfig::default();
        config.rate_limit = RateLimitConfig {
            files_per_minute: 2,
            files_per_hour: 10,
            ..RateLimitConfig::default()
        };
        let limiter = Arc::new(RateLimiterStore::new(config.rate_limit.clone()));
        let validator = SecurityValidator::new(
            config,
            limiter,
            Arc::new(FixedDecoder(Dimensions { width: 10, height: 10 })),
        );
        let options = ValidationOptions {
            identity: Some("user-1".to_string()),
            ..Default::default()
        };
        let file = jpeg("photo.jpg");

        assert!(validator.validate(Some(&file), &options).await.is_valid());
        assert!(validator.validate(Some(&file), &options).await.is_valid());

        let denied = validator.validate(Some(&file), &options).await;
        assert!(!denied.is_valid());
        assert!(denied.is_rate_limited());
        assert!(matches!(
            denied.errors.as_slice(),
            [ValidationError::RateLimitExceeded {
                quota: Quota::FilesPerMinute,
                retry_after_secs: 60
            }]
        ));

        // Other identities and skipped checks are unaffected
        let other = ValidationOptions {
            identity: Some("user-2".to_string()),
            ..Default::default()
        };
        assert!(validator.validate(Some(&file), &other).await.is_valid());
        assert!(validator.validate(Some(&file), &no_rate_limit()).await.is_valid());

        let status = validator.rate_limit_status("user-1").await;
        assert!(!status.allowed);
    }

    #[test]
    fn test_validate_image_dimensions() {
        let config = IntakeConfig::default();

        let check = validate_image_dimensions(1920, 1080, &config);
        assert!(check.valid);
        assert!(check.errors.is_empty());
        assert!(check.warnings.is_empty());

        let check = validate_image_dimensions(0, 100, &config);
        assert!(!check.valid);
        assert_eq!(
            check.errors,
            vec![ValidationError::InvalidDimensions {
                width: 0,
                height: 100
            }]
        );

        let check = validate_image_dimensions(8192, 8192, &config);
        assert!(!check.valid);
        assert!(matches!(
            check.errors.as_slice(),
            [ValidationError::TooManyPixels { pixels: 67_108_864, .. }]
        ));

        let check = validate_image_dimensions(5000, 4000, &config);
        assert!(check.valid);
        assert_eq!(
            check.warnings,
            vec![ValidationWarning::LargeImage { pixels: 20_000_000 }]
        );
    }
}
