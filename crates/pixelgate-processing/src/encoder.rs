use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use pixelgate_core::{IntakeError, OutputFormat, QualityPreset};
use std::io::Cursor;

/// Re-encodes decoded pixels into one of the supported output formats.
///
/// Encoders only ever see pixel buffers, never the original byte stream, so nothing but
/// pixel data can survive into the output.
pub struct ImageEncoder;

impl ImageEncoder {
    pub fn encode(
        img: &DynamicImage,
        format: OutputFormat,
        quality: QualityPreset,
    ) -> Result<Bytes, IntakeError> {
        let encoded = match format {
            OutputFormat::Jpeg => Self::encode_jpeg(img, quality)?,
            OutputFormat::Png => Self::encode_png(img)?,
            OutputFormat::WebP => Self::encode_webp(img, quality),
            OutputFormat::Avif => Self::encode_avif(img, quality)?,
        };

        tracing::debug!(
            format = %format,
            quality = ?quality,
            width = img.width(),
            height = img.height(),
            encoded_bytes = encoded.len(),
            "Encoded image"
        );

        Ok(encoded)
    }

    /// JPEG has no alpha channel; transparent pixels flatten to their color values.
    fn encode_jpeg(img: &DynamicImage, quality: QualityPreset) -> Result<Bytes, IntakeError> {
        let rgb_img = img.to_rgb8();
        let mut buffer = Vec::new();

        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.jpeg_quality());
        encoder
            .encode_image(&rgb_img)
            .map_err(|e| IntakeError::EncodingFailed(format!("jpeg: {}", e)))?;

        Ok(Bytes::from(buffer))
    }

    fn encode_png(img: &DynamicImage) -> Result<Bytes, IntakeError> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        img.write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| IntakeError::EncodingFailed(format!("png: {}", e)))?;

        Ok(Bytes::from(buffer))
    }

    fn encode_webp(img: &DynamicImage, quality: QualityPreset) -> Bytes {
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder.encode(quality.webp_quality());

        Bytes::copy_from_slice(&webp_data)
    }

    fn encode_avif(img: &DynamicImage, quality: QualityPreset) -> Result<Bytes, IntakeError> {
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        let pixels: Vec<rgb::RGBA8> = rgba_img
            .as_raw()
            .chunks_exact(4)
            .map(|chunk| rgb::RGBA8::new(chunk[0], chunk[1], chunk[2], chunk[3]))
            .collect();

        let img_buf = ravif::Img::new(pixels.as_slice(), width as usize, height as usize);

        let encoder = ravif::Encoder::new()
            .with_quality(quality.avif_quality() as f32)
            .with_speed(6);

        let avif_data = encoder
            .encode_rgba(img_buf)
            .map_err(|e| IntakeError::EncodingFailed(format!("avif: {}", e)))?;

        Ok(Bytes::from(avif_data.avif_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn test_image() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(24, 16, |x, y| {
            Rgba([(x * 10) as u8, (y * 15) as u8, 128, 255])
        }))
    }

    #[test]
    fn test_encode_jpeg() {
        let encoded = ImageEncoder::encode(&test_image(), OutputFormat::Jpeg, QualityPreset::Normal)
            .unwrap();
        assert_eq!(&encoded[..3], &[0xFF, 0xD8, 0xFF]);
        assert_eq!(
            image::guess_format(&encoded).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_encode_png_round_trips_pixels() {
        let img = test_image();
        let encoded = ImageEncoder::encode(&img, OutputFormat::Png, QualityPreset::Normal).unwrap();
        let decoded = image::load_from_memory(&encoded).unwrap();
        assert_eq!(decoded.to_rgba8(), img.to_rgba8());
    }

    #[test]
    fn test_encode_webp() {
        let encoded =
            ImageEncoder::encode(&test_image(), OutputFormat::WebP, QualityPreset::Better).unwrap();
        assert_eq!(&encoded[..4], b"RIFF");
        assert_eq!(&encoded[8..12], b"WEBP");
    }

    #[test]
    fn test_jpeg_quality_affects_size() {
        let img = test_image();
        let best = ImageEncoder::encode(&img, OutputFormat::Jpeg, QualityPreset::Best).unwrap();
        let lightest =
            ImageEncoder::encode(&img, OutputFormat::Jpeg, QualityPreset::Lightest).unwrap();
        assert!(best.len() > lightest.len());
    }
}
