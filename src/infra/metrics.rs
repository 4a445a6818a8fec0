//! Lock-free allocation metrics and periodic reporting
//!
//! Uses atomics on the allocation path so a shared collector never contends
//! with the topology lock. `report()` swaps the interval counters to get a
//! consistent snapshot.
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only and must not drive allocation decisions.

use crate::domain::types::Tier;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Exponential bucket boundaries (microseconds)
/// Buckets: ≤1, ≤2, ≤4, ≤8, ≤16, ≤32, ≤64, ≤128, ≤256, ≤512, >512
const BUCKET_BOUNDS: [u64; 10] = [1, 2, 4, 8, 16, 32, 64, 128, 256, 512];
const NUM_BUCKETS: usize = 11;

/// Penalties are accumulated in thousandths so they fit an integer atomic
const PENALTY_SCALE: f64 = 1000.0;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile) as u64;
    let mut cumulative = 0u64;

    // Last bucket uses 2x the previous bound
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] = [1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free allocation metrics collector
pub struct AllocationMetrics {
    /// Placements in the requested zone (monotonic)
    home_total: AtomicU64,
    /// Placements in a declared-adjacent zone (monotonic)
    adjacent_total: AtomicU64,
    /// Placements from the global fallback scan (monotonic)
    global_total: AtomicU64,
    /// Requests that found no capacity anywhere (monotonic)
    rejected_total: AtomicU64,
    /// Successful releases (monotonic)
    releases_total: AtomicU64,
    /// Releases refused for bad IDs or already-free slots (monotonic)
    release_rejected_total: AtomicU64,
    /// Sum of penalties charged, in thousandths (monotonic)
    penalty_milli_total: AtomicU64,
    /// Allocation requests since last report (reset on report)
    requests_since_report: AtomicU64,
    /// Sum of decision latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max decision latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Decision latency histogram buckets (reset on report)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Last report time (only accessed from reporter, not atomic)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl AllocationMetrics {
    pub fn new() -> Self {
        Self {
            home_total: AtomicU64::new(0),
            adjacent_total: AtomicU64::new(0),
            global_total: AtomicU64::new(0),
            rejected_total: AtomicU64::new(0),
            releases_total: AtomicU64::new(0),
            release_rejected_total: AtomicU64::new(0),
            penalty_milli_total: AtomicU64::new(0),
            requests_since_report: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record a successful placement
    #[inline]
    pub fn record_placement(&self, tier: Tier, penalty: f64) {
        let counter = match tier {
            Tier::Home => &self.home_total,
            Tier::Adjacent => &self.adjacent_total,
            Tier::Global => &self.global_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        let milli = (penalty * PENALTY_SCALE).round().max(0.0) as u64;
        self.penalty_milli_total.fetch_add(milli, Ordering::Relaxed);
    }

    /// Record a request that could not be placed anywhere
    #[inline]
    pub fn record_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how long one allocation decision took
    #[inline]
    pub fn record_decision_latency(&self, latency_us: u64) {
        self.requests_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.latency_max_us, latency_us);
        self.latency_buckets[bucket_index(latency_us)].fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a release request
    #[inline]
    pub fn record_release(&self, accepted: bool) {
        if accepted {
            self.releases_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.release_rejected_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn placements_total(&self) -> u64 {
        self.home_total.load(Ordering::Relaxed)
            + self.adjacent_total.load(Ordering::Relaxed)
            + self.global_total.load(Ordering::Relaxed)
    }

    pub fn placements_for(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Home => self.home_total.load(Ordering::Relaxed),
            Tier::Adjacent => self.adjacent_total.load(Ordering::Relaxed),
            Tier::Global => self.global_total.load(Ordering::Relaxed),
        }
    }

    pub fn rejected_total(&self) -> u64 {
        self.rejected_total.load(Ordering::Relaxed)
    }

    pub fn releases_total(&self) -> u64 {
        self.releases_total.load(Ordering::Relaxed)
    }

    pub fn release_rejected_total(&self) -> u64 {
        self.release_rejected_total.load(Ordering::Relaxed)
    }

    /// Sum of all penalties charged so far
    pub fn penalty_total(&self) -> f64 {
        self.penalty_milli_total.load(Ordering::Relaxed) as f64 / PENALTY_SCALE
    }

    /// Generate a summary and reset interval counters
    pub fn report(&self) -> MetricsSummary {
        let now = Instant::now();
        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = now.duration_since(*last);
            *last = now;
            elapsed
        };

        let requests = self.requests_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let latency_max = self.latency_max_us.swap(0, Ordering::Relaxed);
        let lat_buckets = swap_buckets(&self.latency_buckets);

        let elapsed_secs = elapsed.as_secs_f64();
        let requests_per_sec = if elapsed_secs > 0.0 { requests as f64 / elapsed_secs } else { 0.0 };
        let avg_decision_latency_us = if requests > 0 { latency_sum / requests } else { 0 };

        MetricsSummary {
            home_total: self.home_total.load(Ordering::Relaxed),
            adjacent_total: self.adjacent_total.load(Ordering::Relaxed),
            global_total: self.global_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total(),
            releases_total: self.releases_total(),
            release_rejected_total: self.release_rejected_total(),
            penalty_total: self.penalty_total(),
            requests_per_sec,
            avg_decision_latency_us,
            max_decision_latency_us: latency_max,
            lat_buckets,
            lat_p50_us: percentile_from_buckets(&lat_buckets, 0.50),
            lat_p99_us: percentile_from_buckets(&lat_buckets, 0.99),
        }
    }
}

impl Default for AllocationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MetricsSummary {
    pub home_total: u64,
    pub adjacent_total: u64,
    pub global_total: u64,
    pub rejected_total: u64,
    pub releases_total: u64,
    pub release_rejected_total: u64,
    pub penalty_total: f64,
    pub requests_per_sec: f64,
    pub avg_decision_latency_us: u64,
    pub max_decision_latency_us: u64,
    /// Bounds: ≤1, ≤2, ≤4, ≤8, ≤16, ≤32, ≤64, ≤128, ≤256, ≤512, >512 µs
    pub lat_buckets: [u64; NUM_BUCKETS],
    pub lat_p50_us: u64,
    pub lat_p99_us: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            home = %self.home_total,
            adjacent = %self.adjacent_total,
            global = %self.global_total,
            rejected = %self.rejected_total,
            releases = %self.releases_total,
            release_rejected = %self.release_rejected_total,
            penalty_total = format!("{:.1}", self.penalty_total),
            requests_per_sec = format!("{:.1}", self.requests_per_sec),
            avg_latency_us = %self.avg_decision_latency_us,
            max_latency_us = %self.max_decision_latency_us,
            p50_us = %self.lat_p50_us,
            p99_us = %self.lat_p99_us,
            "metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = AllocationMetrics::new();
        assert_eq!(metrics.placements_total(), 0);
        assert_eq!(metrics.rejected_total(), 0);
        assert_eq!(metrics.penalty_total(), 0.0);
    }

    #[test]
    fn test_record_placements_per_tier() {
        let metrics = AllocationMetrics::new();

        metrics.record_placement(Tier::Home, 0.0);
        metrics.record_placement(Tier::Adjacent, 15.0);
        metrics.record_placement(Tier::Global, 25.0);
        metrics.record_placement(Tier::Global, 25.0);

        assert_eq!(metrics.placements_total(), 4);
        assert_eq!(metrics.placements_for(Tier::Home), 1);
        assert_eq!(metrics.placements_for(Tier::Adjacent), 1);
        assert_eq!(metrics.placements_for(Tier::Global), 2);
        assert_eq!(metrics.penalty_total(), 65.0);
    }

    #[test]
    fn test_record_release() {
        let metrics = AllocationMetrics::new();
        metrics.record_release(true);
        metrics.record_release(false);
        metrics.record_release(false);
        assert_eq!(metrics.releases_total(), 1);
        assert_eq!(metrics.release_rejected_total(), 2);
    }

    #[test]
    fn test_report_resets_interval_counters() {
        let metrics = AllocationMetrics::new();
        metrics.record_decision_latency(3);
        metrics.record_decision_latency(9);
        metrics.record_placement(Tier::Home, 0.0);
        metrics.record_rejected();

        let summary = metrics.report();
        assert_eq!(summary.avg_decision_latency_us, 6);
        assert_eq!(summary.max_decision_latency_us, 9);
        assert_eq!(summary.home_total, 1);
        assert_eq!(summary.rejected_total, 1);

        // Monotonic totals survive, interval latency does not
        let summary = metrics.report();
        assert_eq!(summary.avg_decision_latency_us, 0);
        assert_eq!(summary.max_decision_latency_us, 0);
        assert_eq!(summary.lat_buckets.iter().sum::<u64>(), 0);
        assert_eq!(summary.home_total, 1);
    }

    #[test]
    fn test_bucket_index() {
        assert_eq!(bucket_index(0), 0);
        assert_eq!(bucket_index(1), 0);
        assert_eq!(bucket_index(2), 1);
        assert_eq!(bucket_index(3), 2);
        assert_eq!(bucket_index(512), 9);
        assert_eq!(bucket_index(513), 10); // overflow
    }

    #[test]
    fn test_percentile_computation() {
        let metrics = AllocationMetrics::new();

        // 100 decisions at 3µs land in the ≤4 bucket
        for _ in 0..100 {
            metrics.record_decision_latency(3);
        }

        let summary = metrics.report();
        assert_eq!(summary.lat_p50_us, 4);
        assert_eq!(summary.lat_p99_us, 4);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(AllocationMetrics::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let m = metrics.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    m.record_placement(Tier::Adjacent, 15.0);
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(metrics.placements_for(Tier::Adjacent), 10_000);
        assert_eq!(metrics.penalty_total(), 150_000.0);
    }
}
