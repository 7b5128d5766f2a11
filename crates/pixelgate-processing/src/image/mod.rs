//! Image decoding capability
//!
//! Dimension probing and pixel decoding sit behind [`ImageDecoder`] so the validator and
//! sanitizer do not depend on a particular codec backend.

pub mod decoder;
pub mod orientation;

pub use decoder::{DecodeError, ImageDecoder, NativeImageDecoder};
pub use orientation::ImageOrientation;
