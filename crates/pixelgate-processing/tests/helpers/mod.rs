//! Test fixtures: images synthesized with the `image` crate, plus builders for the
//! hostile variants (EXIF blocks, polyglot trailers) the sanitizer has to strip.

#![allow(dead_code)]

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use img_parts::jpeg::Jpeg;
use img_parts::ImageEXIF;
use pixelgate_core::IntakeConfig;
use pixelgate_infra::RateLimiterStore;
use pixelgate_processing::{MemoryFile, NativeImageDecoder, Sanitizer, SecurityValidator};
use std::io::Cursor;
use std::sync::Arc;

/// Appended to images to simulate a polyglot payload.
pub const POLYGLOT_PAYLOAD: &[u8] = b"<script>alert('pixelgate')</script>";

pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 200, 255])
    });
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 64])
    });
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, 90)
        .encode_image(&img)
        .unwrap();
    buffer
}

/// Big-endian TIFF blob holding a single IFD0 Orientation entry.
pub fn exif_orientation_blob(orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\0*");
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes());
    tiff
}

/// JPEG carrying an APP1 EXIF segment with the given orientation.
pub fn create_jpeg_with_exif(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(create_test_jpeg(width, height))).unwrap();
    jpeg.set_exif(Some(Bytes::from(exif_orientation_blob(orientation))));
    jpeg.encoder().bytes().to_vec()
}

pub fn with_trailing_payload(mut data: Vec<u8>) -> Vec<u8> {
    data.extend_from_slice(POLYGLOT_PAYLOAD);
    data
}

pub fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

pub fn jpeg_file(name: &str, data: Vec<u8>) -> MemoryFile {
    MemoryFile::new(name, Some("image/jpeg"), data)
}

pub fn png_file(name: &str, data: Vec<u8>) -> MemoryFile {
    MemoryFile::new(name, Some("image/png"), data)
}

pub fn validator() -> SecurityValidator {
    validator_with_config(IntakeConfig::default())
}

pub fn validator_with_config(config: IntakeConfig) -> SecurityValidator {
    let limiter = Arc::new(RateLimiterStore::new(config.rate_limit.clone()));
    let decoder = Arc::new(NativeImageDecoder::from_config(&config));
    SecurityValidator::new(config, limiter, decoder)
}

pub fn sanitizer() -> Sanitizer {
    Sanitizer::new(Arc::new(NativeImageDecoder::default()))
}
