//! # Nonce Sequencer
//!
//! Serializes nonce allocation for the single signing identity. The ledger
//! requires a strictly-ordered, gapless nonce stream per identity; two
//! concurrent submissions with the same nonce means one of them is
//! rejected, and a gap stalls everything behind it.
//!
//! Discipline:
//!
//! - The counter is only touched while holding the mutex; the pending-count
//!   query happens under the same lock so concurrent callers observe a
//!   consistent ordering.
//! - First use seeds the counter from the ledger's pending transaction
//!   count; every allocation re-queries and returns
//!   `max(last_allocated + 1, pending)`.
//! - A nonce-too-low submission failure means confirmed transactions exist
//!   that this process never counted; `reset()` drops the cached counter so
//!   the next allocation reseeds from the ledger.

use crate::ports::outbound::LedgerProvider;
use shared_types::{LedgerAddress, LedgerError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use vl_telemetry::NONCE_RESETS;

/// Allocates pairwise-distinct, non-decreasing nonces for one identity.
pub struct NonceSequencer<L> {
    ledger: Arc<L>,
    identity: LedgerAddress,
    /// Last allocated nonce; `None` until first use or after a reset.
    last_allocated: Mutex<Option<u64>>,
}

impl<L: LedgerProvider> NonceSequencer<L> {
    /// Create a sequencer for `identity`.
    #[must_use]
    pub fn new(ledger: Arc<L>, identity: LedgerAddress) -> Self {
        Self {
            ledger,
            identity,
            last_allocated: Mutex::new(None),
        }
    }

    /// Allocate the next nonce.
    ///
    /// Fails with `LedgerError::Unavailable` if the pending count cannot be
    /// fetched; callers must not submit a transaction without a nonce.
    pub async fn allocate(&self) -> Result<u64, LedgerError> {
        let mut guard = self.last_allocated.lock().await;

        // Re-query under the lock: external confirmations may have advanced
        // the pending count past our counter.
        let pending = self
            .ledger
            .pending_transaction_count(&self.identity)
            .await?;

        let next = match *guard {
            Some(last) => (last + 1).max(pending),
            None => pending,
        };
        *guard = Some(next);

        debug!(identity = %self.identity, nonce = next, pending, "Nonce allocated");
        Ok(next)
    }

    /// Drop the cached counter so the next allocation reseeds.
    ///
    /// Invoked whenever a submission fails with nonce-too-low: the
    /// in-process counter has fallen behind externally-confirmed
    /// transactions.
    pub async fn reset(&self) {
        let mut guard = self.last_allocated.lock().await;
        if guard.take().is_some() {
            NONCE_RESETS.inc();
            warn!(identity = %self.identity, "Nonce sequencer reinitialized");
        }
    }

    /// The last nonce handed out, if any. For diagnostics only.
    pub async fn last_allocated(&self) -> Option<u64> {
        *self.last_allocated.lock().await
    }
}
