//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//!
//! NOTE: All atomics use Relaxed ordering intentionally—these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions;
//! seat-claim correctness lives in the ledger, never here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Prometheus-style exponential bucket boundaries (microseconds)
/// Buckets: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200
pub const METRICS_BUCKET_BOUNDS: [u64; 10] =
    [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200];
pub const METRICS_NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    METRICS_BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Load all bucket values without resetting
#[inline]
fn load_buckets(buckets: &[AtomicU64; METRICS_NUM_BUCKETS]) -> [u64; METRICS_NUM_BUCKETS] {
    let mut result = [0u64; METRICS_NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.load(Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; METRICS_NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile) as u64;
    let mut cumulative = 0u64;

    const BUCKET_UPPER_BOUNDS: [u64; METRICS_NUM_BUCKETS] =
        [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200, 102400];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[METRICS_NUM_BUCKETS - 1]
}

/// Lock-free metrics collector for the reservation workflow
pub struct Metrics {
    /// Pending reservations successfully created (monotonic)
    reservations_created: AtomicU64,
    /// Reservations confirmed via finalize (monotonic)
    reservations_confirmed: AtomicU64,
    /// Reservations cancelled (monotonic)
    reservations_cancelled: AtomicU64,
    /// Pending reservations reclaimed on deadline (monotonic)
    reservations_expired: AtomicU64,
    /// Reserve attempts rejected with a seat conflict (monotonic)
    claim_conflicts: AtomicU64,
    /// Reserve attempts rejected before the claim (validation) (monotonic)
    rejected_requests: AtomicU64,
    /// Expiry sweeps completed (monotonic)
    sweeps_completed: AtomicU64,
    /// Reserve-path latency histogram buckets (monotonic)
    reserve_latency_buckets: [AtomicU64; METRICS_NUM_BUCKETS],
    /// Sum of reserve-path latencies in microseconds (monotonic)
    reserve_latency_sum_us: AtomicU64,
    /// Reserve attempts measured (monotonic)
    reserve_attempts: AtomicU64,
    /// When this collector was created
    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            reservations_created: AtomicU64::new(0),
            reservations_confirmed: AtomicU64::new(0),
            reservations_cancelled: AtomicU64::new(0),
            reservations_expired: AtomicU64::new(0),
            claim_conflicts: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
            sweeps_completed: AtomicU64::new(0),
            reserve_latency_buckets: Default::default(),
            reserve_latency_sum_us: AtomicU64::new(0),
            reserve_attempts: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn record_reservation_created(&self) {
        self.reservations_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reservation_confirmed(&self) {
        self.reservations_confirmed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reservation_cancelled(&self) {
        self.reservations_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reservations_expired(&self, count: u64) {
        self.reservations_expired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_claim_conflict(&self) {
        self.claim_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_request(&self) {
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sweep(&self) {
        self.sweeps_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reserve_latency(&self, latency_us: u64) {
        self.reserve_attempts.fetch_add(1, Ordering::Relaxed);
        self.reserve_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.reserve_latency_buckets[bucket_index(latency_us)].fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot current values for reporting; counters keep running
    pub fn report(&self) -> MetricsSummary {
        let buckets = load_buckets(&self.reserve_latency_buckets);
        let attempts = self.reserve_attempts.load(Ordering::Relaxed);
        let sum_us = self.reserve_latency_sum_us.load(Ordering::Relaxed);

        MetricsSummary {
            uptime_secs: self.started_at.elapsed().as_secs(),
            reservations_created: self.reservations_created.load(Ordering::Relaxed),
            reservations_confirmed: self.reservations_confirmed.load(Ordering::Relaxed),
            reservations_cancelled: self.reservations_cancelled.load(Ordering::Relaxed),
            reservations_expired: self.reservations_expired.load(Ordering::Relaxed),
            claim_conflicts: self.claim_conflicts.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            sweeps_completed: self.sweeps_completed.load(Ordering::Relaxed),
            reserve_attempts: attempts,
            reserve_latency_avg_us: if attempts > 0 { sum_us / attempts } else { 0 },
            reserve_latency_p50_us: percentile_from_buckets(&buckets, 0.50),
            reserve_latency_p95_us: percentile_from_buckets(&buckets, 0.95),
            reserve_latency_p99_us: percentile_from_buckets(&buckets, 0.99),
            reserve_latency_buckets: buckets,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time metrics snapshot
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub uptime_secs: u64,
    pub reservations_created: u64,
    pub reservations_confirmed: u64,
    pub reservations_cancelled: u64,
    pub reservations_expired: u64,
    pub claim_conflicts: u64,
    pub rejected_requests: u64,
    pub sweeps_completed: u64,
    pub reserve_attempts: u64,
    pub reserve_latency_avg_us: u64,
    pub reserve_latency_p50_us: u64,
    pub reserve_latency_p95_us: u64,
    pub reserve_latency_p99_us: u64,
    pub reserve_latency_buckets: [u64; METRICS_NUM_BUCKETS],
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            uptime_secs = %self.uptime_secs,
            created = %self.reservations_created,
            confirmed = %self.reservations_confirmed,
            cancelled = %self.reservations_cancelled,
            expired = %self.reservations_expired,
            conflicts = %self.claim_conflicts,
            rejected = %self.rejected_requests,
            sweeps = %self.sweeps_completed,
            reserve_attempts = %self.reserve_attempts,
            reserve_lat_avg_us = %self.reserve_latency_avg_us,
            reserve_lat_p99_us = %self.reserve_latency_p99_us,
            "metrics_report"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_index() {
        assert_eq!(bucket_index(50), 0);
        assert_eq!(bucket_index(100), 0);
        assert_eq!(bucket_index(101), 1);
        assert_eq!(bucket_index(51200), 9);
        assert_eq!(bucket_index(99999), 10);
    }

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();
        metrics.record_reservation_created();
        metrics.record_reservation_created();
        metrics.record_reservation_confirmed();
        metrics.record_claim_conflict();
        metrics.record_reservations_expired(3);
        metrics.record_sweep();

        let summary = metrics.report();
        assert_eq!(summary.reservations_created, 2);
        assert_eq!(summary.reservations_confirmed, 1);
        assert_eq!(summary.claim_conflicts, 1);
        assert_eq!(summary.reservations_expired, 3);
        assert_eq!(summary.sweeps_completed, 1);
    }

    #[test]
    fn test_latency_percentiles() {
        let metrics = Metrics::new();
        for _ in 0..99 {
            metrics.record_reserve_latency(90);
        }
        metrics.record_reserve_latency(40_000);

        let summary = metrics.report();
        assert_eq!(summary.reserve_attempts, 100);
        assert_eq!(summary.reserve_latency_p50_us, 100);
        assert_eq!(summary.reserve_latency_p99_us, 100);
        assert!(summary.reserve_latency_avg_us > 90);
    }

    #[test]
    fn test_empty_report() {
        let summary = Metrics::new().report();
        assert_eq!(summary.reserve_latency_avg_us, 0);
        assert_eq!(summary.reserve_latency_p50_us, 0);
    }
}
