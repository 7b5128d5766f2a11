use image::{DynamicImage, ImageReader, Limits};
use pixelgate_core::{Dimensions, IntakeConfig};
use std::io::{self, Cursor};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unrecognized image format")]
    UnknownFormat,

    #[error("image has {pixels} pixels (maximum: {max})")]
    TooManyPixels { pixels: u64, max: u64 },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reads dimensions and pixels from encoded image bytes.
///
/// Both methods are CPU bound; async callers run them on the blocking pool.
pub trait ImageDecoder: Send + Sync {
    /// Natural width and height, read from the header where the codec allows it.
    fn dimensions(&self, data: &[u8]) -> Result<Dimensions, DecodeError>;

    fn decode(&self, data: &[u8]) -> Result<DynamicImage, DecodeError>;
}

/// [`ImageDecoder`] backed by the `image` crate.
///
/// Decoding is bounded by the configured per-side and total pixel limits, checked against
/// the header before any pixel buffer is allocated. A small, highly compressed file cannot
/// expand into an arbitrarily large allocation, whatever it was labelled as.
#[derive(Debug, Clone)]
pub struct NativeImageDecoder {
    max_dimension: u32,
    max_pixels: u64,
}

impl NativeImageDecoder {
    pub fn new(max_dimension: u32, max_pixels: u64) -> Self {
        Self {
            max_dimension,
            max_pixels,
        }
    }

    pub fn from_config(config: &IntakeConfig) -> Self {
        Self::new(config.max_image_dimension, config.max_image_pixels)
    }

    fn reader<'a>(&self, data: &'a [u8]) -> Result<ImageReader<Cursor<&'a [u8]>>, DecodeError> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        if reader.format().is_none() {
            return Err(DecodeError::UnknownFormat);
        }
        Ok(reader)
    }
}

impl Default for NativeImageDecoder {
    fn default() -> Self {
        Self::from_config(&IntakeConfig::default())
    }
}

impl ImageDecoder for NativeImageDecoder {
    fn dimensions(&self, data: &[u8]) -> Result<Dimensions, DecodeError> {
        let (width, height) = self.reader(data)?.into_dimensions()?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, data: &[u8]) -> Result<DynamicImage, DecodeError> {
        let pixels = self.dimensions(data)?.pixels();
        if pixels > self.max_pixels {
            return Err(DecodeError::TooManyPixels {
                pixels,
                max: self.max_pixels,
            });
        }

        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);

        let mut reader = self.reader(data)?;
        reader.limits(limits);
        Ok(reader.decode()?)
    }
}
