//! Submission metrics collection and reporting

use crate::forms::SubmissionOutcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Snapshot of submission counters
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionMetrics {
    /// Submissions that reached the pipeline
    pub total_submissions: u64,

    /// Submissions handed off to the collector
    pub accepted: u64,

    /// Submissions refused by the rate limiter
    pub rate_limited: u64,

    /// Submissions with at least one invalid field
    pub validation_failed: u64,

    /// Collector POSTs that failed in transport
    pub network_failures: u64,

    /// Collector responses treated as rejections (verified policy only)
    pub remote_rejected: u64,

    /// Average collector round trip (ms)
    pub avg_dispatch_time_ms: f64,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

/// Latency histogram buckets (in milliseconds)
const LATENCY_BUCKETS: &[f64] = &[
    5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
];

/// Histogram for tracking latency distribution
#[derive(Debug, Clone)]
pub struct Histogram {
    buckets: Vec<(f64, Arc<AtomicU64>)>,
    sum: Arc<AtomicU64>,
    count: Arc<AtomicU64>,
}

impl Histogram {
    fn new(buckets: &[f64]) -> Self {
        let bucket_counters = buckets
            .iter()
            .map(|&b| (b, Arc::new(AtomicU64::new(0))))
            .collect();

        Self {
            buckets: bucket_counters,
            sum: Arc::new(AtomicU64::new(0)),
            count: Arc::new(AtomicU64::new(0)),
        }
    }

    fn observe(&self, value_ms: f64) {
        self.sum.fetch_add(value_ms as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        // Cumulative: every bucket at or above the value is incremented
        for (bucket, counter) in &self.buckets {
            if value_ms <= *bucket {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    fn export_prometheus(&self, name: &str, help: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!("# HELP {} {}\n", name, help));
        output.push_str(&format!("# TYPE {} histogram\n", name));

        for (bucket, counter) in &self.buckets {
            let count = counter.load(Ordering::Relaxed);
            output.push_str(&format!("{}_bucket{{le=\"{}\"}} {}\n", name, bucket, count));
        }

        let total_count = self.count();
        output.push_str(&format!("{}_bucket{{le=\"+Inf\"}} {}\n", name, total_count));
        output.push_str(&format!("{}_sum {:.3}\n", name, self.sum() as f64));
        output.push_str(&format!("{}_count {}\n", name, total_count));

        output
    }
}

/// Counts submission outcomes and collector latency
pub struct MetricsCollector {
    start_time: Instant,
    total_submissions: AtomicU64,
    accepted: AtomicU64,
    rate_limited: AtomicU64,
    validation_failed: AtomicU64,
    network_failures: AtomicU64,
    remote_rejected: AtomicU64,
    dispatch_latency: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_submissions: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
            validation_failed: AtomicU64::new(0),
            network_failures: AtomicU64::new(0),
            remote_rejected: AtomicU64::new(0),
            dispatch_latency: Histogram::new(LATENCY_BUCKETS),
        }
    }

    /// Record the final outcome of one submission
    pub fn record_outcome(&self, outcome: &SubmissionOutcome) {
        use crate::forms::RejectReason;

        self.total_submissions.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            SubmissionOutcome::Accepted => &self.accepted,
            SubmissionOutcome::Rejected(RejectReason::RateLimited { .. }) => &self.rate_limited,
            SubmissionOutcome::Rejected(RejectReason::ValidationFailed(_)) => {
                &self.validation_failed
            }
            SubmissionOutcome::Rejected(RejectReason::NetworkFailure) => &self.network_failures,
            SubmissionOutcome::Rejected(RejectReason::RemoteRejected { .. }) => {
                &self.remote_rejected
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how long a collector POST took
    pub fn record_dispatch(&self, duration: Duration) {
        self.dispatch_latency.observe(duration.as_millis() as f64);
    }

    /// Get current metrics
    pub fn get_metrics(&self) -> SubmissionMetrics {
        let dispatches = self.dispatch_latency.count();
        let avg_dispatch_time_ms = if dispatches > 0 {
            self.dispatch_latency.sum() as f64 / dispatches as f64
        } else {
            0.0
        };

        SubmissionMetrics {
            total_submissions: self.total_submissions.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            validation_failed: self.validation_failed.load(Ordering::Relaxed),
            network_failures: self.network_failures.load(Ordering::Relaxed),
            remote_rejected: self.remote_rejected.load(Ordering::Relaxed),
            avg_dispatch_time_ms,
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let metrics = self.get_metrics();

        let mut output = format!(
            "# HELP form_intake_submissions_total Total number of submissions\n\
             # TYPE form_intake_submissions_total counter\n\
             form_intake_submissions_total {}\n\
             \n\
             # HELP form_intake_outcomes_total Submissions by outcome\n\
             # TYPE form_intake_outcomes_total counter\n\
             form_intake_outcomes_total{{outcome=\"accepted\"}} {}\n\
             form_intake_outcomes_total{{outcome=\"rate_limited\"}} {}\n\
             form_intake_outcomes_total{{outcome=\"validation_failed\"}} {}\n\
             form_intake_outcomes_total{{outcome=\"network_failure\"}} {}\n\
             form_intake_outcomes_total{{outcome=\"remote_rejected\"}} {}\n\
             \n\
             # HELP form_intake_avg_dispatch_time_ms Average collector round trip in milliseconds\n\
             # TYPE form_intake_avg_dispatch_time_ms gauge\n\
             form_intake_avg_dispatch_time_ms {:.2}\n\
             \n\
             # HELP form_intake_uptime_seconds Uptime in seconds\n\
             # TYPE form_intake_uptime_seconds counter\n\
             form_intake_uptime_seconds {}\n\
             \n",
            metrics.total_submissions,
            metrics.accepted,
            metrics.rate_limited,
            metrics.validation_failed,
            metrics.network_failures,
            metrics.remote_rejected,
            metrics.avg_dispatch_time_ms,
            metrics.uptime_secs,
        );

        output.push_str(&self.dispatch_latency.export_prometheus(
            "form_intake_dispatch_duration_ms",
            "Collector POST duration in milliseconds",
        ));

        output
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
