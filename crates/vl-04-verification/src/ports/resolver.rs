//! Outbound (Driven) ports for identity resolution.
//!
//! Both resolvers are best-effort collaborators: a resolution error is a
//! degraded signal, never an aborted verification. The aggregator wraps
//! calls in a timeout, so implementations need not bound their own latency.

use async_trait::async_trait;
use shared_types::RegistryError;

/// Resolves a DID to its document.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolve `did`. `Ok(None)` means the DID does not exist, which is a
    /// failed identity signal; `Err` means resolution itself broke.
    async fn resolve(&self, did: &str) -> Result<Option<serde_json::Value>, RegistryError>;
}

/// Looks up DNS TXT records for a domain.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// All TXT records published at `domain`, unordered.
    async fn lookup_txt(&self, domain: &str) -> Result<Vec<String>, RegistryError>;
}
