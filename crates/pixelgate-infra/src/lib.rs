//! Pixelgate Infrastructure Library
//!
//! This crate provides shared infrastructure components used by the intake pipeline:
//! - Rate limiting (per-identity sliding windows)
//! - Telemetry initialization

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-export commonly used types
#[cfg(feature = "observability-basic")]
pub use telemetry::init_telemetry;

#[cfg(feature = "rate-limit")]
pub use rate_limit::RateLimiterStore;
