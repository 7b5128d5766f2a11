use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use pixelgate_core::{Quota, RateLimitConfig, RateLimitDecision};

const MINUTE: Duration = Quota::FilesPerMinute.window();
/// Longest quota window; admissions older than this no longer count anywhere.
const HOUR: Duration = Quota::FilesPerHour.window();

#[derive(Debug, Clone, Copy)]
struct Admission {
    at: Instant,
    bytes: u64,
}

/// Sliding log of one identity's admissions over the longest window (one hour).
///
/// Entries are appended in time order, so the front is always the oldest.
#[derive(Debug, Default)]
struct RateLimitRecord {
    admissions: VecDeque<Admission>,
}

impl RateLimitRecord {
    fn purge(&mut self, now: Instant) {
        while let Some(front) = self.admissions.front() {
            if now.duration_since(front.at) >= HOUR {
                self.admissions.pop_front();
            } else {
                break;
            }
        }
    }

    fn last_activity(&self) -> Option<Instant> {
        self.admissions.back().map(|a| a.at)
    }

    fn is_idle(&self, now: Instant) -> bool {
        self.last_activity()
            .map_or(true, |at| now.duration_since(at) >= HOUR)
    }

    /// Index of the first admission still inside `window`.
    fn window_start(&self, now: Instant, window: Duration) -> usize {
        self.admissions
            .iter()
            .position(|a| now.duration_since(a.at) < window)
            .unwrap_or(self.admissions.len())
    }

    /// Time until the file count inside `window` drops below `limit`.
    fn retry_for_count(&self, now: Instant, window: Duration, limit: u32) -> Duration {
        let start = self.window_start(now, window);
        let count = self.admissions.len() - start;
        let limit = limit as usize;
        if limit == 0 || count < limit {
            return window;
        }
        // Expiring the oldest (count - limit + 1) entries frees one slot
        self.admissions
            .get(start + count - limit)
            .map(|a| (a.at + window).saturating_duration_since(now))
            .unwrap_or(window)
    }

    /// Time until enough hourly volume expires to admit `incoming` more bytes.
    fn retry_for_bytes(&self, now: Instant, incoming: u64, limit: u64) -> Duration {
        let window = Quota::BytesPerHour.window();
        let start = self.window_start(now, window);
        let mut in_window: u64 = self.admissions.iter().skip(start).map(|a| a.bytes).sum();
        for admission in self.admissions.iter().skip(start) {
            in_window = in_window.saturating_sub(admission.bytes);
            if in_window < limit && in_window + incoming <= limit {
                return (admission.at + window).saturating_duration_since(now);
            }
        }
        window
    }

    /// Decide whether one more file of `incoming` bytes fits every quota.
    ///
    /// Counts only entries inside each window, so the record does not need to be purged
    /// first and the evaluation itself never mutates.
    fn evaluate(&self, now: Instant, incoming: u64, config: &RateLimitConfig) -> RateLimitDecision {
        let minute_files = (self.admissions.len() - self.window_start(now, MINUTE)) as u32;
        if minute_files >= config.files_per_minute {
            return RateLimitDecision::deny(
                Quota::FilesPerMinute,
                self.retry_for_count(now, MINUTE, config.files_per_minute),
            );
        }

        let hour_start = self.window_start(now, HOUR);
        let hour_files = (self.admissions.len() - hour_start) as u32;
        if hour_files >= config.files_per_hour {
            return RateLimitDecision::deny(
                Quota::FilesPerHour,
                self.retry_for_count(now, HOUR, config.files_per_hour),
            );
        }

        let hour_bytes: u64 = self
            .admissions
            .iter()
            .skip(hour_start)
            .map(|a| a.bytes)
            .sum();
        if hour_bytes >= config.bytes_per_hour
            || hour_bytes.saturating_add(incoming) > config.bytes_per_hour
        {
            return RateLimitDecision::deny(
                Quota::BytesPerHour,
                self.retry_for_bytes(now, incoming, config.bytes_per_hour),
            );
        }

        RateLimitDecision::allow(
            (config.files_per_minute - minute_files).min(config.files_per_hour - hour_files),
        )
    }

    fn admit(&mut self, now: Instant, bytes: u64) {
        self.admissions.push_back(Admission { at: now, bytes });
    }
}

/// Per-identity upload quota store.
///
/// Tracks files per minute, files per hour and bytes per hour for each identity. Sharded
/// like the other in-memory limiters so that unrelated identities rarely contend on the
/// same lock. Check and record happen inside one critical section, so two concurrent
/// validations for the same identity can never both be admitted into the last slot.
#[derive(Clone)]
pub struct RateLimiterStore {
    shards: Vec<Arc<Mutex<HashMap<String, RateLimitRecord>>>>,
    config: RateLimitConfig,
}

impl RateLimiterStore {
    pub fn new(config: RateLimitConfig) -> Self {
        let shard_count = config.shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self { shards, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn shard_index(&self, identity: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        identity.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    /// Make room for a new identity in a full shard: drop idle records first, then the
    /// least recently active one.
    fn make_room(&self, records: &mut HashMap<String, RateLimitRecord>, now: Instant) {
        if records.len() < self.config.max_identities_per_shard {
            return;
        }

        records.retain(|_, record| !record.is_idle(now));

        if records.len() >= self.config.max_identities_per_shard {
            let oldest = records
                .iter()
                .min_by_key(|(_, record)| record.last_activity())
                .map(|(k, _)| k.clone());

            if let Some(identity) = oldest {
                records.remove(&identity);
                tracing::debug!(
                    evicted_identity = %identity,
                    remaining = records.len(),
                    "Evicted least recently active rate limit record"
                );
            }
        }
    }

    /// Check the quotas for one more file and, when allowed, record it before returning.
    #[tracing::instrument(skip(self))]
    pub async fn check(&self, identity: &str, file_size: u64) -> RateLimitDecision {
        let now = Instant::now();
        let mut records = self.shards[self.shard_index(identity)].lock().await;

        if !records.contains_key(identity) {
            self.make_room(&mut records, now);
        }
        let record = records.entry(identity.to_string()).or_default();
        record.purge(now);

        let decision = record.evaluate(now, file_size, &self.config);
        if decision.allowed {
            record.admit(now, file_size);
            tracing::trace!(remaining = decision.remaining, "Upload admitted");
            RateLimitDecision::allow(decision.remaining.saturating_sub(1))
        } else {
            tracing::debug!(
                quota = ?decision.exceeded,
                retry_after_ms = decision.retry_after.map(|d| d.as_millis() as u64),
                "Upload rate limit reached"
            );
            decision
        }
    }

    /// Record an admission without checking quotas.
    #[tracing::instrument(skip(self))]
    pub async fn record(&self, identity: &str, file_size: u64) {
        let now = Instant::now();
        let mut records = self.shards[self.shard_index(identity)].lock().await;

        if !records.contains_key(identity) {
            self.make_room(&mut records, now);
        }
        let record = records.entry(identity.to_string()).or_default();
        record.purge(now);
        record.admit(now, file_size);
    }

    /// Current quota state for an identity, without recording anything.
    pub async fn status(&self, identity: &str) -> RateLimitDecision {
        let now = Instant::now();
        let records = self.shards[self.shard_index(identity)].lock().await;

        match records.get(identity) {
            Some(record) => record.evaluate(now, 0, &self.config),
            None => RateLimitDecision::allow(
                self.config.files_per_minute.min(self.config.files_per_hour),
            ),
        }
    }

    /// Forget every identity.
    pub async fn reset(&self) {
        for shard in &self.shards {
            shard.lock().await.clear();
        }
        tracing::debug!("Rate limit store reset");
    }

    pub async fn reset_identity(&self, identity: &str) {
        self.shards[self.shard_index(identity)]
            .lock()
            .await
            .remove(identity);
    }

    /// Number of identities currently tracked across all shards.
    pub async fn tracked_identities(&self) -> usize {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.lock().await.len();
        }
        total
    }
}

impl Default for RateLimiterStore {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
