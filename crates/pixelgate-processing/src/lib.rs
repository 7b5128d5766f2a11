//! Pixelgate Processing Library
//!
//! This crate holds the intake pipeline itself: format classification, the security
//! validator, and the sanitizer that re-encodes accepted images into clean files.

pub mod classifier;
pub mod encoder;
pub mod file;
pub mod filename;
pub mod image;
pub mod sanitizer;
pub mod signature;
pub mod validator;

pub use classifier::FormatClassifier;
pub use encoder::ImageEncoder;
pub use file::{content_type_for_extension, LocalFile, MemoryFile};
pub use filename::{inspect_filename, sanitize_filename, FilenameInspection};
pub use self::image::{DecodeError, ImageDecoder, ImageOrientation, NativeImageDecoder};
pub use sanitizer::{SanitizeOptions, Sanitizer};
pub use validator::{
    validate_image_dimensions, SecurityValidator, ValidationOptions, ANONYMOUS_IDENTITY,
};
