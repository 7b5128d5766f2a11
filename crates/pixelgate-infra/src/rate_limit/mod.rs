//! Rate limiting service
//!
//! This module provides per-identity upload quotas tracked over sliding time windows.

pub use limiter::RateLimiterStore;

mod limiter;
