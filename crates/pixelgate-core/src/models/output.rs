use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::IntakeError;

/// Quality presets for re-encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    #[default]
    Normal, // Default quality, balanced size and quality
    Better,   // Higher quality, ≈125% file size
    Best,     // Near pristine quality, ≈170% file size
    Lighter,  // Smaller files, ≈80% file size
    Lightest, // Maximum compression, ≈50% file size
}

impl QualityPreset {
    pub fn parse(s: &str) -> Result<Self, IntakeError> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(QualityPreset::Normal),
            "better" => Ok(QualityPreset::Better),
            "best" => Ok(QualityPreset::Best),
            "lighter" => Ok(QualityPreset::Lighter),
            "lightest" => Ok(QualityPreset::Lightest),
            _ => Err(IntakeError::InvalidInput(format!(
                "Invalid quality preset: {}",
                s
            ))),
        }
    }

    /// Get quality value for JPEG (0-100)
    pub fn jpeg_quality(self) -> u8 {
        match self {
            QualityPreset::Normal => 75,
            QualityPreset::Better => 85,
            QualityPreset::Best => 95,
            QualityPreset::Lighter => 65,
            QualityPreset::Lightest => 50,
        }
    }

    /// Get quality value for WebP (0-100)
    pub fn webp_quality(self) -> f32 {
        match self {
            QualityPreset::Normal => 80.0,
            QualityPreset::Better => 90.0,
            QualityPreset::Best => 98.0,
            QualityPreset::Lighter => 70.0,
            QualityPreset::Lightest => 55.0,
        }
    }

    /// Get quality value for AVIF (0-100)
    pub fn avif_quality(self) -> u8 {
        match self {
            QualityPreset::Normal => 70,
            QualityPreset::Better => 80,
            QualityPreset::Best => 90,
            QualityPreset::Lighter => 60,
            QualityPreset::Lightest => 45,
        }
    }
}

/// Target format for re-encoded images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Avif,
}

impl OutputFormat {
    /// Every standard output target, in preference order.
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::WebP,
        OutputFormat::Avif,
    ];

    /// Targets allowed for RAW sources.
    pub const RAW_TARGETS: [OutputFormat; 2] = [OutputFormat::Jpeg, OutputFormat::Png];

    pub fn parse(s: &str) -> Result<Self, IntakeError> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            "avif" => Ok(OutputFormat::Avif),
            _ => Err(IntakeError::UnsupportedOutputFormat(s.to_string())),
        }
    }

    /// Map a normalized detected format name to an output target, if one exists.
    pub fn from_format_name(name: &str) -> Option<Self> {
        match name {
            "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "webp" => Some(OutputFormat::WebP),
            "avif" => Some(OutputFormat::Avif),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Avif => "image/avif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_preset_parse() {
        assert_eq!(
            QualityPreset::parse("normal").unwrap(),
            QualityPreset::Normal
        );
        assert_eq!(QualityPreset::parse("BEST").unwrap(), QualityPreset::Best);
        assert_eq!(
            QualityPreset::parse("lightest").unwrap(),
            QualityPreset::Lightest
        );
        assert!(QualityPreset::parse("ultra").is_err());
    }

    #[test]
    fn test_quality_ordering() {
        assert!(QualityPreset::Best.jpeg_quality() > QualityPreset::Normal.jpeg_quality());
        assert!(QualityPreset::Lightest.webp_quality() < QualityPreset::Lighter.webp_quality());
        assert!(QualityPreset::Better.avif_quality() > QualityPreset::Normal.avif_quality());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("jpg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("JPEG").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("WebP").unwrap(), OutputFormat::WebP);
        assert!(matches!(
            OutputFormat::parse("gif"),
            Err(IntakeError::UnsupportedOutputFormat(_))
        ));
    }

    #[test]
    fn test_output_format_mime_types() {
        assert_eq!(OutputFormat::Jpeg.to_mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Avif.to_mime_type(), "image/avif");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn test_from_format_name() {
        assert_eq!(OutputFormat::from_format_name("png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_format_name("gif"), None);
        assert_eq!(OutputFormat::from_format_name("cr2"), None);
    }
}
