//! Outbound (Driven) port for the verification audit trail.

use async_trait::async_trait;
use shared_types::{RegistryError, VerificationAuditEntry};

/// Receives one audit entry per verification performed.
///
/// Best-effort contract: the aggregator logs and swallows sink failures,
/// so a broken audit store never fails a verification.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: VerificationAuditEntry) -> Result<(), RegistryError>;
}
