//! # VeriLedger Telemetry
//!
//! Structured logging and Prometheus metrics for the registry subsystems.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vl_telemetry::{TelemetryConfig, init_telemetry};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//!
//!     // Application code here; logs and metrics are now collected.
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VL_SERVICE_NAME` | `veriledger` | Service name in log output |
//! | `VL_LOG_LEVEL` | `info` | Log level filter |
//! | `VL_JSON_LOGS` | `false` | Emit JSON-formatted logs |
//! | `VL_METRICS_PORT` | `9100` | Prometheus scrape port |

mod config;
mod metrics;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, EVENTS_RECONCILED, JOBS_COMPLETED,
    JOBS_ENQUEUED, JOBS_FAILED, JOB_ATTEMPTS, LEDGER_SUBMISSIONS, NONCE_RESETS,
    SUBMISSION_DURATION, VERIFICATIONS_PERFORMED,
};

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The tracing subscriber could not be installed.
    #[error("Failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),

    /// Metric registration failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;

    let env_filter = EnvFilter::try_new(&config.log_level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shutdown.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
