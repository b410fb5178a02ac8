//! Mock resolvers and a recording audit sink for tests and local runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use shared_types::{RegistryError, VerificationAuditEntry};

use crate::ports::audit::AuditSink;
use crate::ports::resolver::{DidResolver, DnsResolver};

/// In-memory DID resolver backed by a registration map.
#[derive(Default)]
pub struct MockDidResolver {
    documents: RwLock<HashMap<String, serde_json::Value>>,
    fail: AtomicBool,
}

impl MockDidResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, did: impl Into<String>, document: serde_json::Value) {
        if let Ok(mut documents) = self.documents.write() {
            documents.insert(did.into(), document);
        }
    }

    /// Make every resolution fail with a resolution error.
    pub fn fail_resolution(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DidResolver for MockDidResolver {
    async fn resolve(&self, did: &str) -> Result<Option<serde_json::Value>, RegistryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RegistryError::ResolutionFailure(
                "did resolver unreachable".into(),
            ));
        }
        let documents = self
            .documents
            .read()
            .map_err(|_| RegistryError::ResolutionFailure("did registry lock poisoned".into()))?;
        Ok(documents.get(did).cloned())
    }
}

/// In-memory DNS resolver backed by a TXT record map.
#[derive(Default)]
pub struct MockDnsResolver {
    records: RwLock<HashMap<String, Vec<String>>>,
    fail: AtomicBool,
}

impl MockDnsResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, domain: impl Into<String>, records: Vec<String>) {
        if let Ok(mut map) = self.records.write() {
            map.insert(domain.into(), records);
        }
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DnsResolver for MockDnsResolver {
    async fn lookup_txt(&self, domain: &str) -> Result<Vec<String>, RegistryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RegistryError::ResolutionFailure(
                "dns resolver unreachable".into(),
            ));
        }
        let records = self
            .records
            .read()
            .map_err(|_| RegistryError::ResolutionFailure("dns record lock poisoned".into()))?;
        Ok(records.get(domain).cloned().unwrap_or_default())
    }
}

/// Audit sink that keeps entries in memory and can be scripted to fail.
#[derive(Default)]
pub struct RecordingAuditSink {
    entries: RwLock<Vec<VerificationAuditEntry>>,
    fail: AtomicBool,
}

impl RecordingAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<VerificationAuditEntry> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, entry: VerificationAuditEntry) -> Result<(), RegistryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RegistryError::MalformedRequest("audit store down".into()));
        }
        self.entries
            .write()
            .map_err(|_| RegistryError::MalformedRequest("audit lock poisoned".into()))?
            .push(entry);
        Ok(())
    }
}
