//! Configuration module
//!
//! This module provides the intake pipeline limits and rate-limit quotas. Values default
//! to the reference policy and can be overridden from the environment.

use std::env;

use crate::formats::default_allowed_content_types;
use crate::models::QualityPreset;

// Reference policy
const MAX_FILE_SIZE_MB: u64 = 50;
const MAX_IMAGE_DIMENSION: u32 = 8192;
const MAX_IMAGE_PIXELS: u64 = 32 * 1024 * 1024;
const LARGE_IMAGE_PIXELS: u64 = 16 * 1024 * 1024;
const MAX_FILENAME_LENGTH: usize = 255;
const HEADER_READ_BYTES: usize = 16;
const UPLOAD_FILES_PER_MINUTE: u32 = 20;
const UPLOAD_FILES_PER_HOUR: u32 = 100;
const UPLOAD_MB_PER_HOUR: u64 = 500;
const RATE_LIMITER_SHARD_COUNT: usize = 16;
const RATE_LIMITER_MAX_IDENTITIES_PER_SHARD: usize = 10_000;

const MB: u64 = 1024 * 1024;

/// Convert a megabyte setting to bytes, rejecting values that overflow `u64`.
pub fn megabytes_to_bytes(name: &str, megabytes: u64) -> Result<u64, anyhow::Error> {
    megabytes
        .checked_mul(MB)
        .ok_or_else(|| anyhow::anyhow!("{} is too large: {} MB", name, megabytes))
}

/// Per-identity upload quotas
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub files_per_minute: u32,
    pub files_per_hour: u32,
    pub bytes_per_hour: u64,
    pub shard_count: usize,
    /// Identities tracked per shard before the least recently active one is evicted
    pub max_identities_per_shard: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            files_per_minute: UPLOAD_FILES_PER_MINUTE,
            files_per_hour: UPLOAD_FILES_PER_HOUR,
            bytes_per_hour: UPLOAD_MB_PER_HOUR * MB,
            shard_count: RATE_LIMITER_SHARD_COUNT,
            max_identities_per_shard: RATE_LIMITER_MAX_IDENTITIES_PER_SHARD,
        }
    }
}

/// Intake pipeline configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntakeConfig {
    pub max_file_size_bytes: u64,
    pub max_image_dimension: u32,
    pub max_image_pixels: u64,
    /// Pixel count above which an accepted image carries a performance warning
    pub large_image_pixels: u64,
    pub max_filename_length: usize,
    /// Leading bytes read for the signature check
    pub header_read_bytes: usize,
    /// Lowercase MIME allow-list
    pub allowed_content_types: Vec<String>,
    pub rate_limit: RateLimitConfig,
    pub sanitize_quality: QualityPreset,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: MAX_FILE_SIZE_MB * MB,
            max_image_dimension: MAX_IMAGE_DIMENSION,
            max_image_pixels: MAX_IMAGE_PIXELS,
            large_image_pixels: LARGE_IMAGE_PIXELS,
            max_filename_length: MAX_FILENAME_LENGTH,
            header_read_bytes: HEADER_READ_BYTES,
            allowed_content_types: default_allowed_content_types(),
            rate_limit: RateLimitConfig::default(),
            sanitize_quality: QualityPreset::default(),
        }
    }
}

impl IntakeConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Self::default();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|types| !types.is_empty())
            .unwrap_or(defaults.allowed_content_types);

        let sanitize_quality = match env::var("SANITIZE_QUALITY") {
            Ok(s) => QualityPreset::parse(&s)
                .map_err(|e| anyhow::anyhow!("SANITIZE_QUALITY: {}", e))?,
            Err(_) => QualityPreset::default(),
        };

        let upload_mb_per_hour = env::var("UPLOAD_MB_PER_HOUR")
            .unwrap_or_else(|_| UPLOAD_MB_PER_HOUR.to_string())
            .parse::<u64>()
            .unwrap_or(UPLOAD_MB_PER_HOUR);

        let config = IntakeConfig {
            max_file_size_bytes: megabytes_to_bytes("MAX_FILE_SIZE_MB", max_file_size_mb)?,
            max_image_dimension: env::var("MAX_IMAGE_DIMENSION")
                .unwrap_or_else(|_| MAX_IMAGE_DIMENSION.to_string())
                .parse()
                .unwrap_or(MAX_IMAGE_DIMENSION),
            max_image_pixels: env::var("MAX_IMAGE_PIXELS")
                .unwrap_or_else(|_| MAX_IMAGE_PIXELS.to_string())
                .parse()
                .unwrap_or(MAX_IMAGE_PIXELS),
            large_image_pixels: env::var("LARGE_IMAGE_PIXELS")
                .unwrap_or_else(|_| LARGE_IMAGE_PIXELS.to_string())
                .parse()
                .unwrap_or(LARGE_IMAGE_PIXELS),
            max_filename_length: env::var("MAX_FILENAME_LENGTH")
                .unwrap_or_else(|_| MAX_FILENAME_LENGTH.to_string())
                .parse()
                .unwrap_or(MAX_FILENAME_LENGTH),
            header_read_bytes: HEADER_READ_BYTES,
            allowed_content_types,
            rate_limit: RateLimitConfig {
                files_per_minute: env::var("UPLOAD_FILES_PER_MINUTE")
                    .unwrap_or_else(|_| UPLOAD_FILES_PER_MINUTE.to_string())
                    .parse()
                    .unwrap_or(UPLOAD_FILES_PER_MINUTE),
                files_per_hour: env::var("UPLOAD_FILES_PER_HOUR")
                    .unwrap_or_else(|_| UPLOAD_FILES_PER_HOUR.to_string())
                    .parse()
                    .unwrap_or(UPLOAD_FILES_PER_HOUR),
                bytes_per_hour: megabytes_to_bytes("UPLOAD_MB_PER_HOUR", upload_mb_per_hour)?,
                shard_count: env::var("RATE_LIMITER_SHARD_COUNT")
                    .unwrap_or_else(|_| RATE_LIMITER_SHARD_COUNT.to_string())
                    .parse()
                    .unwrap_or(RATE_LIMITER_SHARD_COUNT),
                max_identities_per_shard: RATE_LIMITER_MAX_IDENTITIES_PER_SHARD,
            },
            sanitize_quality,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.max_image_dimension == 0 {
            return Err(anyhow::anyhow!("MAX_IMAGE_DIMENSION must be greater than 0"));
        }

        if self.max_image_pixels == 0 {
            return Err(anyhow::anyhow!("MAX_IMAGE_PIXELS must be greater than 0"));
        }

        if self.max_filename_length == 0 {
            return Err(anyhow::anyhow!("MAX_FILENAME_LENGTH must be greater than 0"));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_CONTENT_TYPES must list at least one MIME type"
            ));
        }

        if self.rate_limit.shard_count == 0 {
            return Err(anyhow::anyhow!(
                "RATE_LIMITER_SHARD_COUNT must be greater than 0"
            ));
        }

        if self.rate_limit.files_per_minute > self.rate_limit.files_per_hour {
            return Err(anyhow::anyhow!(
                "UPLOAD_FILES_PER_MINUTE ({}) cannot exceed UPLOAD_FILES_PER_HOUR ({})",
                self.rate_limit.files_per_minute,
                self.rate_limit.files_per_hour
            ));
        }

        Ok(())
    }

    pub fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let normalized = content_type.to_lowercase();
        self.allowed_content_types.iter().any(|ct| ct == &normalized)
    }
}
