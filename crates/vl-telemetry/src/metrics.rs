//! Prometheus metrics for VeriLedger subsystems.
//!
//! All metrics follow the naming convention: `vl_<subsystem>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Histogram, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // JOB QUEUE METRICS
    // =========================================================================

    /// Jobs accepted into a queue, by kind
    pub static ref JOBS_ENQUEUED: CounterVec = CounterVec::new(
        Opts::new("vl_queue_jobs_enqueued_total", "Total jobs accepted into a queue"),
        &["kind"]
    ).expect("metric creation failed");

    /// Jobs that reached the completed state, by kind
    pub static ref JOBS_COMPLETED: CounterVec = CounterVec::new(
        Opts::new("vl_queue_jobs_completed_total", "Total jobs completed"),
        &["kind"]
    ).expect("metric creation failed");

    /// Jobs that exhausted their attempts, by kind
    pub static ref JOBS_FAILED: CounterVec = CounterVec::new(
        Opts::new("vl_queue_jobs_failed_total", "Total jobs failed permanently"),
        &["kind"]
    ).expect("metric creation failed");

    /// Execution attempts, including retries
    pub static ref JOB_ATTEMPTS: Counter = Counter::new(
        "vl_queue_job_attempts_total",
        "Total job execution attempts including retries"
    ).expect("metric creation failed");

    // =========================================================================
    // LEDGER CLIENT METRICS
    // =========================================================================

    /// Ledger submissions, by method and outcome
    pub static ref LEDGER_SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("vl_ledger_submissions_total", "Total ledger transaction submissions"),
        &["method", "outcome"]
    ).expect("metric creation failed");

    /// Nonce sequencer reinitializations (nonce-too-low recoveries)
    pub static ref NONCE_RESETS: Counter = Counter::new(
        "vl_ledger_nonce_resets_total",
        "Total nonce sequencer reinitializations"
    ).expect("metric creation failed");

    /// Ledger submission latency
    pub static ref SUBMISSION_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "vl_ledger_submission_duration_seconds",
            "Time from submission to confirmation"
        ).buckets(prometheus::exponential_buckets(0.1, 2.0, 12).expect("bucket creation"))
    ).expect("metric creation failed");

    // =========================================================================
    // VERIFICATION & RECONCILER METRICS
    // =========================================================================

    /// Verification requests served, by bottom-line outcome
    pub static ref VERIFICATIONS_PERFORMED: CounterVec = CounterVec::new(
        Opts::new("vl_verification_requests_total", "Total verification requests served"),
        &["verified"]
    ).expect("metric creation failed");

    /// Ledger events applied by the reconciler
    pub static ref EVENTS_RECONCILED: CounterVec = CounterVec::new(
        Opts::new("vl_reconciler_events_total", "Ledger events processed by the reconciler"),
        &["outcome"]  // applied / already_applied / unknown_document
    ).expect("metric creation failed");
}

/// Handle proving metrics were registered. Kept alive by the telemetry guard.
pub struct MetricsHandle {
    _private: (),
}

/// Register all metrics with the global registry.
///
/// Idempotent registration is not supported by prometheus; calling this
/// twice in one process returns `MetricsInit`.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(JOBS_ENQUEUED.clone()),
        Box::new(JOBS_COMPLETED.clone()),
        Box::new(JOBS_FAILED.clone()),
        Box::new(JOB_ATTEMPTS.clone()),
        Box::new(LEDGER_SUBMISSIONS.clone()),
        Box::new(NONCE_RESETS.clone()),
        Box::new(SUBMISSION_DURATION.clone()),
        Box::new(VERIFICATIONS_PERFORMED.clone()),
        Box::new(EVENTS_RECONCILED.clone()),
    ];

    for collector in collectors {
        REGISTRY
            .register(collector)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle { _private: () })
}

/// Encode the registry contents in Prometheus text exposition format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    encoder
        .encode(&families, &mut buf)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
