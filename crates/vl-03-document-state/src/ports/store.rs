//! Outbound (Driven) port for document persistence.
//!
//! The cache/database collaborator owns the document schema; this trait is
//! the slice of it the core reads and writes. `compare_and_set_status` must
//! be atomic — it is the enforcement point for the outstanding-job
//! invariant.

use async_trait::async_trait;
use shared_types::{DocumentId, DocumentRecord, DocumentStatus, HolderId, RegistryError};

/// CRUD plus atomic conditional update on the cached document projection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new record. Fails if the id already exists.
    async fn insert(&self, record: DocumentRecord) -> Result<(), RegistryError>;

    /// Fetch by record id.
    async fn get(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RegistryError>;

    /// Fetch by normalized document hash.
    async fn find_by_hash(&self, hash: &str) -> Result<Option<DocumentRecord>, RegistryError>;

    /// Fetch by ledger-assigned identifier.
    async fn find_by_ledger_id(
        &self,
        ledger_id: &str,
    ) -> Result<Option<DocumentRecord>, RegistryError>;

    /// Replace the stored record wholesale.
    async fn update(&self, record: DocumentRecord) -> Result<(), RegistryError>;

    /// Replace the stored record, but only while its current status still
    /// equals `expected`. Returns false without writing when the status
    /// moved underneath the caller.
    ///
    /// Must be atomic for the same reason as `compare_and_set_status`: a
    /// revocation landing between a handler's read and its write must not
    /// be overwritten by the stale record.
    async fn update_if_status(
        &self,
        record: DocumentRecord,
        expected: DocumentStatus,
    ) -> Result<bool, RegistryError>;

    /// Atomically set status to `next` iff the current status is `expected`.
    ///
    /// Returns false when the current status differs; the caller treats
    /// that as losing the race.
    async fn compare_and_set_status(
        &self,
        id: &DocumentId,
        expected: DocumentStatus,
        next: DocumentStatus,
    ) -> Result<bool, RegistryError>;

    /// Append a holder to the endorsement chain if not already present.
    async fn append_endorsement(
        &self,
        id: &DocumentId,
        holder: HolderId,
    ) -> Result<(), RegistryError>;
}
