//! Document lifecycle state machine.
//!
//! All status mutations in the system go through `DocumentStateMachine`.
//! Entering a pending status uses an atomic compare-and-set on the store,
//! which is how the one-outstanding-job-per-document invariant is enforced
//! under concurrent enqueues.

use std::sync::Arc;

use shared_types::{
    BlockNumber, DocumentId, DocumentRecord, DocumentStatus, HolderId, LedgerId, RegistryError,
    Timestamp, TxHash, VerificationDetails,
};
use tracing::{debug, info, warn};

use crate::ports::store::DocumentStore;

/// Returns true if the status change `from` → `to` is legal.
///
/// Self-transitions are illegal: confirmation handlers are idempotent at a
/// higher level (they compare confirmed fields), not by re-running the
/// transition.
#[must_use]
pub fn is_legal_transition(from: DocumentStatus, to: DocumentStatus) -> bool {
    use DocumentStatus::*;
    if from == Revoked {
        // Terminal. A revoked document never leaves Revoked.
        return false;
    }
    match to {
        // Draft is a birth state only.
        Draft => false,
        Active => from == Draft,
        PendingVerification => matches!(from, Draft | Active | Verified | Error),
        Verified => from == PendingVerification,
        PendingTransfer => matches!(from, Draft | Active | Verified | Transferred | Error),
        Transferred => from == PendingTransfer,
        Error => matches!(from, Draft | PendingVerification | PendingTransfer),
        // Revocation is observed from the ledger and wins from any live state.
        Revoked => true,
    }
}

/// Applies lifecycle transitions to cached document records.
///
/// Holds the store behind an `Arc` so the queue workers, the verification
/// aggregator and the event reconciler can share one instance.
pub struct DocumentStateMachine<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> DocumentStateMachine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Shared access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Fetch a record, mapping absence to `DocumentNotFound`.
    pub async fn require(&self, id: &DocumentId) -> Result<DocumentRecord, RegistryError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| RegistryError::DocumentNotFound(id.to_string()))
    }

    /// Move a document into a pending status before enqueuing a job.
    ///
    /// The transition is checked for legality first, then applied with an
    /// atomic compare-and-set. Losing the CAS race means another job claimed
    /// the document between the read and the write, and is reported as
    /// `PersistenceConflict`.
    pub async fn begin_job(
        &self,
        id: &DocumentId,
        pending: DocumentStatus,
    ) -> Result<(), RegistryError> {
        debug_assert!(pending.is_pending());
        let record = self.require(id).await?;
        if !is_legal_transition(record.status, pending) {
            if record.status.is_pending() {
                // A job already holds this document.
                return Err(RegistryError::PersistenceConflict {
                    document_id: id.to_string(),
                });
            }
            return Err(illegal(record.status, pending));
        }
        let won = self
            .store
            .compare_and_set_status(id, record.status, pending)
            .await?;
        if !won {
            warn!(document_id = %id, requested = ?pending, "lost status race, job already outstanding");
            return Err(RegistryError::PersistenceConflict {
                document_id: id.to_string(),
            });
        }
        debug!(document_id = %id, status = ?pending, "document entered pending status");
        Ok(())
    }

    /// Write back a record whose transition was decided against `prior`.
    ///
    /// A concurrent writer can move the document between this handler's
    /// read and its write; the conditional update detects that. If the
    /// document turned Revoked in the window the revocation stands and the
    /// revoked record is returned; any other interleaving is a persistence
    /// conflict.
    async fn commit(
        &self,
        record: DocumentRecord,
        prior: DocumentStatus,
    ) -> Result<DocumentRecord, RegistryError> {
        let id = record.id;
        if self.store.update_if_status(record.clone(), prior).await? {
            return Ok(record);
        }
        let current = self.require(&id).await?;
        if current.status == DocumentStatus::Revoked {
            info!(document_id = %id, "revocation superseded a concurrent status change");
            return Ok(current);
        }
        Err(RegistryError::PersistenceConflict {
            document_id: id.to_string(),
        })
    }

    /// Record a confirmed on-ledger creation: Draft → Active.
    ///
    /// Idempotent: if the record already carries a creation transaction
    /// hash, the confirmation was applied before and this is a no-op.
    pub async fn apply_creation_confirmed(
        &self,
        id: &DocumentId,
        ledger_id: LedgerId,
        tx_hash: TxHash,
        block_number: BlockNumber,
        now: Timestamp,
    ) -> Result<DocumentRecord, RegistryError> {
        let mut record = self.require(id).await?;
        if record.transaction_hash.is_some() {
            debug!(document_id = %id, "creation already confirmed, skipping");
            return Ok(record);
        }
        if !is_legal_transition(record.status, DocumentStatus::Active) {
            return Err(illegal(record.status, DocumentStatus::Active));
        }
        let prior = record.status;
        record.ledger_id = Some(ledger_id);
        record.transaction_hash = Some(tx_hash);
        record.block_number = Some(block_number);
        record.status = DocumentStatus::Active;
        record.last_error = None;
        record.updated_at = now;
        let record = self.commit(record, prior).await?;
        if record.status == DocumentStatus::Active {
            info!(document_id = %id, ledger_id = ?record.ledger_id, "document active on ledger");
        }
        Ok(record)
    }

    /// Record a confirmed on-ledger verify call: PendingVerification → Verified.
    pub async fn apply_verification_confirmed(
        &self,
        id: &DocumentId,
        tx_hash: TxHash,
        block_number: BlockNumber,
        now: Timestamp,
    ) -> Result<DocumentRecord, RegistryError> {
        let mut record = self.require(id).await?;
        if record.verification_tx_hash.as_deref() == Some(tx_hash.as_str()) {
            debug!(document_id = %id, "verification already confirmed, skipping");
            return Ok(record);
        }
        if !is_legal_transition(record.status, DocumentStatus::Verified) {
            return Err(illegal(record.status, DocumentStatus::Verified));
        }
        let prior = record.status;
        record.verification_tx_hash = Some(tx_hash);
        record.verification_block = Some(block_number);
        record.status = DocumentStatus::Verified;
        record.last_error = None;
        record.updated_at = now;
        let record = self.commit(record, prior).await?;
        if record.status == DocumentStatus::Verified {
            info!(document_id = %id, "document verified on ledger");
        }
        Ok(record)
    }

    /// Record a confirmed transfer: PendingTransfer → Transferred.
    ///
    /// Appends the new holder to the endorsement chain unless the chain
    /// already ends with them (redelivered confirmation).
    pub async fn apply_transfer_confirmed(
        &self,
        id: &DocumentId,
        new_holder: HolderId,
        now: Timestamp,
    ) -> Result<DocumentRecord, RegistryError> {
        let record = self.require(id).await?;
        if record.status == DocumentStatus::Transferred
            && record.endorsement_chain.last() == Some(&new_holder)
        {
            debug!(document_id = %id, "transfer already confirmed, skipping");
            return Ok(record);
        }
        if !is_legal_transition(record.status, DocumentStatus::Transferred) {
            return Err(illegal(record.status, DocumentStatus::Transferred));
        }
        let prior = record.status;
        self.store.append_endorsement(id, new_holder).await?;
        let mut record = self.require(id).await?;
        record.status = DocumentStatus::Transferred;
        record.last_error = None;
        record.updated_at = now;
        let record = self.commit(record, prior).await?;
        if record.status == DocumentStatus::Transferred {
            info!(document_id = %id, holder = ?record.endorsement_chain.last(), "document transferred");
        }
        Ok(record)
    }

    /// Record a job exhausting its attempts: pending → Error.
    ///
    /// The Error status always carries a non-empty diagnostic.
    pub async fn apply_failure(
        &self,
        id: &DocumentId,
        diagnostic: String,
        now: Timestamp,
    ) -> Result<DocumentRecord, RegistryError> {
        debug_assert!(!diagnostic.is_empty());
        let mut record = self.require(id).await?;
        if !is_legal_transition(record.status, DocumentStatus::Error) {
            return Err(illegal(record.status, DocumentStatus::Error));
        }
        let prior = record.status;
        record.status = DocumentStatus::Error;
        record.last_error = Some(diagnostic);
        record.updated_at = now;
        let record = self.commit(record, prior).await?;
        if record.status == DocumentStatus::Error {
            warn!(document_id = %id, error = ?record.last_error, "document moved to error");
        }
        Ok(record)
    }

    /// Record a revocation observed from the ledger. Legal from any live
    /// state; a no-op for an already-revoked record.
    ///
    /// Revocation always wins: losing the conditional write to a
    /// concurrent status change re-reads and tries again.
    pub async fn apply_revocation(
        &self,
        id: &DocumentId,
        now: Timestamp,
    ) -> Result<DocumentRecord, RegistryError> {
        loop {
            let mut record = self.require(id).await?;
            if record.status == DocumentStatus::Revoked {
                return Ok(record);
            }
            let prior = record.status;
            record.status = DocumentStatus::Revoked;
            record.updated_at = now;
            if self.store.update_if_status(record.clone(), prior).await? {
                info!(document_id = %id, "document revoked");
                return Ok(record);
            }
        }
    }

    /// Apply the outcome of a read-only verification run.
    ///
    /// The details are overwritten wholesale. Revocation always wins: a
    /// revoked verdict moves the record to Revoked regardless of signals.
    /// Otherwise the record moves to Verified only when every required
    /// signal permits it and the transition is legal from the current
    /// status; in all other cases the status is left untouched.
    pub async fn apply_verdict(
        &self,
        id: &DocumentId,
        details: VerificationDetails,
        now: Timestamp,
    ) -> Result<DocumentRecord, RegistryError> {
        let mut record = self.require(id).await?;
        let verified = details.on_ledger.is_passed()
            && details.document_integrity.permits_verified()
            && details.issuer_identity.permits_verified()
            && !details.revoked;
        let revoked = details.revoked;
        let prior = record.status;
        record.verification_details = details;
        record.updated_at = now;
        if revoked && record.status != DocumentStatus::Revoked {
            record.status = DocumentStatus::Revoked;
            info!(document_id = %id, "verification found document revoked");
        } else if verified && is_legal_transition(record.status, DocumentStatus::Verified) {
            record.status = DocumentStatus::Verified;
            info!(document_id = %id, "verification verdict: verified");
        } else {
            debug!(document_id = %id, verified, status = ?record.status, "verdict recorded, status unchanged");
        }
        self.commit(record, prior).await
    }
}

fn illegal(from: DocumentStatus, to: DocumentStatus) -> RegistryError {
    RegistryError::IllegalTransition {
        from: format!("{from:?}"),
        to: format!("{to:?}"),
    }
}
