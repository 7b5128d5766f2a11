use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One of the per-identity upload quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quota {
    FilesPerMinute,
    FilesPerHour,
    BytesPerHour,
}

impl Quota {
    pub const fn window(self) -> Duration {
        match self {
            Quota::FilesPerMinute => Duration::from_secs(60),
            Quota::FilesPerHour | Quota::BytesPerHour => Duration::from_secs(3600),
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quota::FilesPerMinute => write!(f, "too many files per minute"),
            Quota::FilesPerHour => write!(f, "too many files per hour"),
            Quota::BytesPerHour => write!(f, "upload volume per hour exceeded"),
        }
    }
}

/// Outcome of a rate-limit check or status probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Files still admissible before the tightest file quota is reached
    pub remaining: u32,
    /// Set when denied: the first quota found exhausted
    pub exceeded: Option<Quota>,
    /// Set when denied: time until the oldest entry counted against `exceeded` expires
    pub retry_after: Option<Duration>,
}

impl RateLimitDecision {
    pub fn allow(remaining: u32) -> Self {
        Self {
            allowed: true,
            remaining,
            exceeded: None,
            retry_after: None,
        }
    }

    pub fn deny(quota: Quota, retry_after: Duration) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            exceeded: Some(quota),
            retry_after: Some(retry_after),
        }
    }

    /// Retry-after rounded up to whole seconds, at least 1.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after.map(|d| {
            let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
            secs.max(1)
        })
    }
}
