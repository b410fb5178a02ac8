//! Registry process entry point.

use anyhow::{Context, Result};
use registry_runtime::{RegistryRuntime, RuntimeConfig};
use tracing::info;
use vl_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(&TelemetryConfig::from_env())
        .context("telemetry initialization failed")?;

    let config = RuntimeConfig::from_env();
    let mut runtime = RegistryRuntime::new(config);
    runtime.start().context("runtime startup failed")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    runtime.shutdown().await;
    Ok(())
}
