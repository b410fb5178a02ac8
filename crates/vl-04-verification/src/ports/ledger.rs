//! Read-only ledger status queries.
//!
//! The verification path never writes to the ledger, so it gets its own
//! narrow port instead of the full provider surface.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use shared_types::{ContractCall, LedgerAddress, LedgerDocumentStatus, RegistryError};
use vl_01_ledger_client::contract as methods;
use vl_01_ledger_client::LedgerProvider;

/// Fetches the on-ledger status of a document by its hash.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    async fn document_status(&self, hash: &str) -> Result<LedgerDocumentStatus, RegistryError>;
}

/// [`LedgerQuery`] over any [`LedgerProvider`], issuing a registry
/// `getDocument` call and decoding the result.
pub struct ProviderLedgerQuery<L> {
    ledger: Arc<L>,
    registry_contract: LedgerAddress,
}

impl<L: LedgerProvider> ProviderLedgerQuery<L> {
    pub fn new(ledger: Arc<L>, registry_contract: LedgerAddress) -> Self {
        Self {
            ledger,
            registry_contract,
        }
    }
}

#[async_trait]
impl<L: LedgerProvider> LedgerQuery for ProviderLedgerQuery<L> {
    async fn document_status(&self, hash: &str) -> Result<LedgerDocumentStatus, RegistryError> {
        let call = ContractCall::new(self.registry_contract.clone(), methods::GET).arg(json!(hash));
        let value = self.ledger.query(&call).await?;
        serde_json::from_value(value)
            .map_err(|e| RegistryError::MalformedRequest(format!("undecodable ledger status: {e}")))
    }
}
