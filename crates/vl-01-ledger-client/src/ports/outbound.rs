//! Outbound (Driven) ports for the ledger client.
//!
//! These traits define the ledger RPC capability the subsystem depends on.
//! Implementations must report distinguishable error classes for
//! nonce-too-low, insufficient-gas and reverted (`LedgerError` variants),
//! since retry policy and nonce recovery react to each differently.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_bus::LedgerEvent;
use shared_types::{BlockNumber, ContractCall, LedgerAddress, LedgerError, Timestamp, TxHash};

/// Parameters for a transaction submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitParams {
    /// Nonce allocated by the sequencer for this identity.
    pub nonce: u64,
    /// Gas limit (estimate with headroom applied).
    pub gas: u64,
    /// Gas price in base units.
    pub gas_price: u128,
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Hash of the mined transaction.
    pub tx_hash: TxHash,
    /// Block the transaction landed in.
    pub block_number: BlockNumber,
    /// Events emitted by the contract during execution.
    pub events: Vec<LedgerEvent>,
}

/// The ledger RPC capability.
///
/// `submit` blocks until the transaction is mined or fails; callers bound
/// the wait with their own timeout. Event distribution happens on the
/// shared bus rather than through this trait: a production adapter feeds
/// its subscription stream into the bus the reconciler listens on.
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    /// Estimate gas units for a call.
    async fn estimate_gas(&self, call: &ContractCall) -> Result<u64, LedgerError>;

    /// Current gas price in base units.
    async fn gas_price(&self) -> Result<u128, LedgerError>;

    /// Number of transactions pending or confirmed for an identity.
    ///
    /// This is the seed and the floor for nonce allocation.
    async fn pending_transaction_count(&self, identity: &LedgerAddress)
        -> Result<u64, LedgerError>;

    /// Submit a contract call and wait for it to be mined.
    async fn submit(
        &self,
        call: &ContractCall,
        params: SubmitParams,
    ) -> Result<SubmissionReceipt, LedgerError>;

    /// Read-only contract query.
    async fn query(&self, call: &ContractCall) -> Result<serde_json::Value, LedgerError>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current unix timestamp in seconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Mock time source for testing.
pub struct MockClock {
    time: std::sync::atomic::AtomicU64,
}

impl MockClock {
    /// Create a clock frozen at `initial` seconds.
    #[must_use]
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    /// Advance the clock by `secs`.
    pub fn advance(&self, secs: u64) {
        self.time
            .fetch_add(secs, std::sync::atomic::Ordering::SeqCst);
    }

    /// Set the clock to an absolute time.
    pub fn set(&self, time: Timestamp) {
        self.time.store(time, std::sync::atomic::Ordering::SeqCst);
    }
}

impl TimeSource for MockClock {
    fn now(&self) -> Timestamp {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}
