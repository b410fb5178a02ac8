//! In-memory document store.
//!
//! Backs the runtime by default and every test that needs persistence.
//! Secondary indices by document hash and ledger id are maintained inside
//! the same lock as the primary map, so reads through either index are
//! consistent with the primary.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use shared_types::{
    DocumentId, DocumentRecord, DocumentStatus, HolderId, RegistryError,
};

use crate::ports::store::DocumentStore;

#[derive(Default)]
struct StoreInner {
    records: HashMap<DocumentId, DocumentRecord>,
    by_hash: HashMap<String, DocumentId>,
    by_ledger_id: HashMap<String, DocumentId>,
}

/// Thread-safe in-memory implementation of [`DocumentStore`].
#[derive(Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.records.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, record: DocumentRecord) -> Result<(), RegistryError> {
        let mut inner = lock_write(&self.inner)?;
        if inner.records.contains_key(&record.id) {
            return Err(RegistryError::PersistenceConflict {
                document_id: record.id.to_string(),
            });
        }
        inner.by_hash.insert(record.document_hash.clone(), record.id);
        if let Some(ledger_id) = &record.ledger_id {
            inner.by_ledger_id.insert(ledger_id.clone(), record.id);
        }
        inner.records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RegistryError> {
        let inner = lock_read(&self.inner)?;
        Ok(inner.records.get(id).cloned())
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<DocumentRecord>, RegistryError> {
        let inner = lock_read(&self.inner)?;
        Ok(inner
            .by_hash
            .get(hash)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    async fn find_by_ledger_id(
        &self,
        ledger_id: &str,
    ) -> Result<Option<DocumentRecord>, RegistryError> {
        let inner = lock_read(&self.inner)?;
        Ok(inner
            .by_ledger_id
            .get(ledger_id)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    async fn update(&self, record: DocumentRecord) -> Result<(), RegistryError> {
        let mut inner = lock_write(&self.inner)?;
        if !inner.records.contains_key(&record.id) {
            return Err(RegistryError::DocumentNotFound(record.id.to_string()));
        }
        if let Some(ledger_id) = &record.ledger_id {
            inner.by_ledger_id.insert(ledger_id.clone(), record.id);
        }
        inner.by_hash.insert(record.document_hash.clone(), record.id);
        inner.records.insert(record.id, record);
        Ok(())
    }

    async fn update_if_status(
        &self,
        record: DocumentRecord,
        expected: DocumentStatus,
    ) -> Result<bool, RegistryError> {
        let mut inner = lock_write(&self.inner)?;
        match inner.records.get(&record.id) {
            None => return Err(RegistryError::DocumentNotFound(record.id.to_string())),
            Some(current) if current.status != expected => return Ok(false),
            Some(_) => {}
        }
        if let Some(ledger_id) = &record.ledger_id {
            inner.by_ledger_id.insert(ledger_id.clone(), record.id);
        }
        inner.by_hash.insert(record.document_hash.clone(), record.id);
        inner.records.insert(record.id, record);
        Ok(true)
    }

    async fn compare_and_set_status(
        &self,
        id: &DocumentId,
        expected: DocumentStatus,
        next: DocumentStatus,
    ) -> Result<bool, RegistryError> {
        let mut inner = lock_write(&self.inner)?;
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| RegistryError::DocumentNotFound(id.to_string()))?;
        if record.status != expected {
            return Ok(false);
        }
        record.status = next;
        Ok(true)
    }

    async fn append_endorsement(
        &self,
        id: &DocumentId,
        holder: HolderId,
    ) -> Result<(), RegistryError> {
        let mut inner = lock_write(&self.inner)?;
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| RegistryError::DocumentNotFound(id.to_string()))?;
        if record.endorsement_chain.last() != Some(&holder) {
            record.endorsement_chain.push(holder);
        }
        Ok(())
    }
}

fn lock_read(
    lock: &RwLock<StoreInner>,
) -> Result<std::sync::RwLockReadGuard<'_, StoreInner>, RegistryError> {
    lock.read()
        .map_err(|_| RegistryError::MalformedRequest("document store lock poisoned".into()))
}

fn lock_write(
    lock: &RwLock<StoreInner>,
) -> Result<std::sync::RwLockWriteGuard<'_, StoreInner>, RegistryError> {
    lock.write()
        .map_err(|_| RegistryError::MalformedRequest("document store lock poisoned".into()))
}
