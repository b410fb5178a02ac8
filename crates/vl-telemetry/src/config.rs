//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for log output
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Prometheus metrics port
    pub metrics_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "veriledger".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            metrics_port: 9100,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VL_SERVICE_NAME`: Service name (default: veriledger)
    /// - `VL_LOG_LEVEL`: Log level (default: info)
    /// - `VL_JSON_LOGS`: true/false (default: false)
    /// - `VL_METRICS_PORT`: Prometheus port (default: 9100)
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: env::var("VL_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: env::var("VL_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logs: env::var("VL_JSON_LOGS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.json_logs),
            metrics_port: env::var("VL_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.metrics_port),
        }
    }
}
