use pixelgate_core::formats::{self, RawFormat};
use pixelgate_core::{FileDescriptor, FormatDetectionResult, OutputFormat, RawConversionCheck};

use crate::signature;

/// Conversion targets accepted for RAW sources.
const RAW_CONVERSION_TARGETS: &[&str] = &["jpeg", "jpg", "png"];

/// Classifies candidate files as standard images, RAW camera files or unsupported.
///
/// MIME type beats extension, and RAW beats standard: a camera file reported as
/// `application/octet-stream` must still be recognized by its extension before the generic
/// standard-format lookups get a chance to reject it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatClassifier;

impl FormatClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, file: &dyn FileDescriptor) -> FormatDetectionResult {
        self.classify_parts(file.name(), file.mime_type())
    }

    /// Classify from a filename and declared MIME type without a descriptor.
    pub fn classify_parts(
        &self,
        filename: &str,
        mime_type: Option<&str>,
    ) -> FormatDetectionResult {
        let mime_type = mime_type.map(|m| m.trim().to_lowercase());
        let mime_type = mime_type.as_deref().filter(|m| !m.is_empty());
        let extension = formats::extension_of(filename);
        let extension = extension.as_deref();

        let result = if let Some(raw) = mime_type.and_then(formats::raw_by_mime) {
            FormatDetectionResult::from_mime_type(raw.extension, true)
        } else if let Some(raw) = extension.and_then(formats::raw_by_extension) {
            FormatDetectionResult::from_extension(raw.extension, true)
        } else if let Some(format) = mime_type.and_then(formats::standard_by_mime) {
            FormatDetectionResult::from_mime_type(format.name, false)
        } else if let Some(format) = extension.and_then(formats::standard_by_extension) {
            FormatDetectionResult::from_extension(format.name, false)
        } else {
            FormatDetectionResult::unsupported()
        };

        tracing::debug!(
            filename = %filename,
            mime_type = ?mime_type,
            detected_format = ?result.detected_format,
            confidence = %result.confidence,
            method = %result.detection_method,
            "Classified file"
        );

        result
    }

    /// Classify from leading bytes alone.
    pub fn detect_from_signature(&self, header: &[u8]) -> FormatDetectionResult {
        match signature::sniff(header) {
            Some(signature) => {
                FormatDetectionResult::from_signature(signature.format, signature.is_raw)
            }
            None => FormatDetectionResult::unsupported(),
        }
    }

    /// Output targets offered for this file: everything for standard images, JPEG and PNG
    /// for RAW sources, nothing for unsupported files.
    pub fn available_output_formats(&self, file: &dyn FileDescriptor) -> Vec<OutputFormat> {
        let classification = self.classify(file);
        if !classification.is_valid {
            Vec::new()
        } else if classification.is_raw {
            OutputFormat::RAW_TARGETS.to_vec()
        } else {
            OutputFormat::ALL.to_vec()
        }
    }

    pub fn validate_raw_conversion(&self, target_format: &str) -> RawConversionCheck {
        let target = target_format.trim().to_lowercase();
        if RAW_CONVERSION_TARGETS.contains(&target.as_str()) {
            return RawConversionCheck {
                is_valid: true,
                error: None,
                suggested_formats: Vec::new(),
            };
        }

        RawConversionCheck {
            is_valid: false,
            error: Some(format!(
                "RAW files can only be converted to {} (requested: {})",
                RAW_CONVERSION_TARGETS.join(", "),
                target
            )),
            suggested_formats: RAW_CONVERSION_TARGETS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn raw_format_info(&self, extension: &str) -> Option<&'static RawFormat> {
        formats::raw_by_extension(&extension.trim_start_matches('.').to_lowercase())
    }
}
