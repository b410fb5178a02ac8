//! # Transaction Submitter
//!
//! The single funnel for ledger writes. Builds registry contract calls,
//! prices them through the gas cache with estimate headroom, allocates a
//! nonce, submits, and maps receipts into typed results.
//!
//! Nonce recovery: a nonce-too-low failure resets the sequencer before the
//! error propagates. The retry itself belongs to the job queue; this layer
//! only makes sure the next attempt reseeds from the ledger.

use crate::contract as methods;
use crate::domain::gas::GasPriceCache;
use crate::domain::nonce::NonceSequencer;
use crate::ports::outbound::{LedgerProvider, SubmissionReceipt, SubmitParams, TimeSource};
use serde_json::json;
use shared_bus::LedgerEvent;
use shared_types::{
    is_valid_address, BlockNumber, ContractCall, LedgerAddress, LedgerError, LedgerId,
    RegistryError, Timestamp, TxHash,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use vl_telemetry::{LEDGER_SUBMISSIONS, SUBMISSION_DURATION};

/// Gas estimate headroom: 1.2x, in integer permille.
const GAS_HEADROOM_PERMILLE: u64 = 1_200;

/// Configuration for the submitter.
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// Registry management contract address.
    pub management_contract: LedgerAddress,
    /// The signing identity all submissions originate from.
    pub identity: LedgerAddress,
    /// Upper bound on the wait for a transaction to be mined.
    ///
    /// Generous by design: typical confirmation latency must fit well
    /// inside it, but a stuck transaction must not hold a worker forever.
    pub confirmation_timeout: Duration,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            management_contract: String::new(),
            identity: String::new(),
            confirmation_timeout: Duration::from_secs(5 * 60),
        }
    }
}

/// Data for a registry create call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreateDocumentCall {
    /// Contract category code (Transferable = 0, Verifiable = 1).
    pub category: u8,
    /// Content fingerprint (normalized hex digest).
    pub document_hash: String,
    /// Expiry timestamp carried on the ledger.
    pub expiry: Timestamp,
}

/// Result of a confirmed create call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreationReceipt {
    /// Ledger-assigned document identifier from the DocumentCreated event.
    pub ledger_id: LedgerId,
    /// Hash of the mined transaction.
    pub tx_hash: TxHash,
    /// Block the transaction landed in.
    pub block_number: BlockNumber,
}

/// Result of a confirmed verify or transfer call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConfirmationReceipt {
    /// Hash of the mined transaction.
    pub tx_hash: TxHash,
    /// Block the transaction landed in.
    pub block_number: BlockNumber,
    /// Events emitted during execution, republished to the bus by callers.
    pub events: Vec<LedgerEvent>,
}

/// Submits registry contract calls with sequenced nonces and priced gas.
pub struct TransactionSubmitter<L> {
    ledger: Arc<L>,
    nonces: NonceSequencer<L>,
    gas: GasPriceCache<L>,
    config: SubmitterConfig,
}

impl<L: LedgerProvider> TransactionSubmitter<L> {
    /// Create a submitter over `ledger` for the configured identity.
    #[must_use]
    pub fn new(ledger: Arc<L>, clock: Arc<dyn TimeSource>, config: SubmitterConfig) -> Self {
        let gas = GasPriceCache::new(ledger.clone(), clock);
        Self::with_gas_cache(ledger, gas, config)
    }

    /// Create a submitter with explicit gas cache settings.
    #[must_use]
    pub fn with_gas_cache(ledger: Arc<L>, gas: GasPriceCache<L>, config: SubmitterConfig) -> Self {
        let nonces = NonceSequencer::new(ledger.clone(), config.identity.clone());
        Self {
            ledger,
            nonces,
            gas,
            config,
        }
    }

    /// The nonce sequencer, exposed for diagnostics.
    pub fn nonce_sequencer(&self) -> &NonceSequencer<L> {
        &self.nonces
    }

    /// Submit a registry create call and extract the assigned ledger id.
    pub async fn create_document(
        &self,
        call_data: &CreateDocumentCall,
    ) -> Result<CreationReceipt, RegistryError> {
        let call = ContractCall::new(self.config.management_contract.clone(), methods::CREATE)
            .arg(json!(call_data.category))
            .arg(json!(call_data.document_hash))
            .arg(json!(call_data.expiry));

        let receipt = self.submit_with_nonce(&call).await?;

        let ledger_id = receipt.events.iter().find_map(|event| match event {
            LedgerEvent::DocumentCreated { ledger_id, .. } => Some(ledger_id.clone()),
            _ => None,
        });

        match ledger_id {
            Some(ledger_id) => {
                info!(
                    %ledger_id,
                    tx_hash = %receipt.tx_hash,
                    block = receipt.block_number,
                    "Document created on ledger"
                );
                Ok(CreationReceipt {
                    ledger_id,
                    tx_hash: receipt.tx_hash,
                    block_number: receipt.block_number,
                })
            }
            None => Err(LedgerError::MissingEvent("DocumentCreated".into()).into()),
        }
    }

    /// Submit a registry verify call for a ledger-known document.
    pub async fn verify_document(
        &self,
        ledger_id: &LedgerId,
    ) -> Result<ConfirmationReceipt, RegistryError> {
        let call = ContractCall::new(self.config.management_contract.clone(), methods::VERIFY)
            .arg(json!(ledger_id));

        let receipt = self.submit_with_nonce(&call).await?;
        info!(%ledger_id, tx_hash = %receipt.tx_hash, "Document verified on ledger");
        Ok(Self::confirmation(receipt))
    }

    /// Submit an ownership endorsement to `new_holder`.
    pub async fn transfer_document(
        &self,
        ledger_id: &LedgerId,
        new_holder: &LedgerAddress,
    ) -> Result<ConfirmationReceipt, RegistryError> {
        if !is_valid_address(new_holder) {
            return Err(RegistryError::InvalidAddress(new_holder.clone()));
        }

        let call = ContractCall::new(self.config.management_contract.clone(), methods::TRANSFER)
            .arg(json!(ledger_id))
            .arg(json!(new_holder));

        let receipt = self.submit_with_nonce(&call).await?;
        info!(%ledger_id, %new_holder, tx_hash = %receipt.tx_hash, "Document transferred on ledger");
        Ok(Self::confirmation(receipt))
    }

    fn confirmation(receipt: SubmissionReceipt) -> ConfirmationReceipt {
        ConfirmationReceipt {
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            events: receipt.events,
        }
    }

    /// Estimate, price, sequence and submit one call.
    async fn submit_with_nonce(
        &self,
        call: &ContractCall,
    ) -> Result<SubmissionReceipt, RegistryError> {
        let estimate = self.ledger.estimate_gas(call).await?;
        let gas = estimate.saturating_mul(GAS_HEADROOM_PERMILLE) / 1_000;
        let gas_price = self.gas.current().await;
        let nonce = self.nonces.allocate().await?;

        let params = SubmitParams {
            nonce,
            gas,
            gas_price,
        };

        let started = std::time::Instant::now();
        let submitted = tokio::time::timeout(
            self.config.confirmation_timeout,
            self.ledger.submit(call, params),
        )
        .await;

        let result = match submitted {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Unavailable(format!(
                "confirmation timed out after {:?}",
                self.config.confirmation_timeout
            ))),
        };

        match result {
            Ok(receipt) => {
                LEDGER_SUBMISSIONS
                    .with_label_values(&[call.method.as_str(), "confirmed"])
                    .inc();
                SUBMISSION_DURATION.observe(started.elapsed().as_secs_f64());
                Ok(receipt)
            }
            Err(error) => {
                LEDGER_SUBMISSIONS
                    .with_label_values(&[call.method.as_str(), "failed"])
                    .inc();
                if matches!(error, LedgerError::NonceTooLow { .. }) {
                    warn!(nonce, "Submission rejected with nonce too low, reseeding");
                    self.nonces.reset().await;
                }
                Err(error.into())
            }
        }
    }
}
