//! Sanitizer
//!
//! Decode → redraw → re-encode. The output is built from a freshly allocated pixel
//! surface, so EXIF blocks, comments, embedded scripts and trailing polyglot payloads in
//! the original byte stream have nowhere to survive.

use bytes::Bytes;
use chrono::Utc;
use image::{imageops, DynamicImage, RgbaImage};
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::webp::WebP;
use img_parts::ImageEXIF;
use pixelgate_core::{FileDescriptor, IntakeError, OutputFormat, QualityPreset};
use std::sync::Arc;

use crate::classifier::FormatClassifier;
use crate::encoder::ImageEncoder;
use crate::file::MemoryFile;
use crate::image::{ImageDecoder, ImageOrientation};

#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizeOptions {
    /// Output format; defaults to the source format, or PNG when the source format has no
    /// encoder
    pub format: Option<OutputFormat>,
    pub quality: QualityPreset,
}

pub struct Sanitizer {
    decoder: Arc<dyn ImageDecoder>,
    classifier: FormatClassifier,
}

impl Sanitizer {
    pub fn new(decoder: Arc<dyn ImageDecoder>) -> Self {
        Self {
            decoder,
            classifier: FormatClassifier::new(),
        }
    }

    /// Output format used when the caller does not request one.
    pub fn default_output_format(&self, file: &dyn FileDescriptor) -> OutputFormat {
        self.classifier
            .classify(file)
            .detected_format
            .as_deref()
            .and_then(OutputFormat::from_format_name)
            .unwrap_or(OutputFormat::Png)
    }

    /// Re-encode an accepted file. Call only after validation returned a valid verdict.
    #[tracing::instrument(skip(self, file, options), fields(file_name = %file.name()))]
    pub async fn sanitize(
        &self,
        file: &dyn FileDescriptor,
        options: &SanitizeOptions,
    ) -> Result<MemoryFile, IntakeError> {
        let classification = self.classifier.classify(file);
        if classification.is_raw {
            return Err(IntakeError::SanitizationFailed(format!(
                "RAW {} files must be converted before sanitizing",
                classification
                    .detected_format
                    .as_deref()
                    .unwrap_or("camera")
                    .to_uppercase()
            )));
        }

        let target = options
            .format
            .unwrap_or_else(|| self.default_output_format(file));
        let quality = options.quality;

        let data = file.read_all().await?;
        let original_len = data.len();
        let decoder = self.decoder.clone();

        // Decode and encode are CPU-bound; run off the async pool to avoid blocking other tasks.
        let (encoded, had_exif) = tokio::task::spawn_blocking(move || {
            let decoded = decoder
                .decode(&data)
                .map_err(|e| IntakeError::SanitizationFailed(e.to_string()))?;
            let oriented = ImageOrientation::apply_exif_orientation(decoded, &data);
            let redrawn = redraw(&oriented);
            let encoded = ImageEncoder::encode(&redrawn, target, quality)?;
            Ok::<_, IntakeError>((encoded, has_exif_block(&data)))
        })
        .await
        .map_err(anyhow::Error::from)??;

        tracing::info!(
            format = %target,
            original_bytes = original_len,
            sanitized_bytes = encoded.len(),
            exif_removed = had_exif,
            "Image sanitized"
        );

        Ok(MemoryFile::new(file.name(), Some(target.to_mime_type()), encoded)
            .with_last_modified(Utc::now()))
    }
}

/// Copy the pixels onto a new RGBA canvas of the same size.
fn redraw(img: &DynamicImage) -> DynamicImage {
    let source = img.to_rgba8();
    let mut canvas = RgbaImage::new(source.width(), source.height());
    imageops::replace(&mut canvas, &source, 0, 0);
    DynamicImage::ImageRgba8(canvas)
}

fn has_exif_block(data: &[u8]) -> bool {
    let bytes = Bytes::copy_from_slice(data);
    if let Ok(jpeg) = Jpeg::from_bytes(bytes.clone()) {
        return jpeg.exif().is_some();
    }
    if let Ok(png) = Png::from_bytes(bytes.clone()) {
        return png.exif().is_some();
    }
    if let Ok(webp) = WebP::from_bytes(bytes) {
        return webp.exif().is_some();
    }
    false
}
