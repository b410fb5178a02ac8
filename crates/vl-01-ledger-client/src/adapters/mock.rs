//! # In-Memory Ledger
//!
//! A scriptable ledger implementation backing local runs and the test
//! suites of every downstream crate. Supports scripted submission
//! failures, adjustable pending counts and gas prices, and a minimal
//! registry contract model (create / verify / transfer / revoke).

use crate::contract as methods;
use crate::ports::outbound::{LedgerProvider, SubmissionReceipt, SubmitParams};
use async_trait::async_trait;
use shared_bus::LedgerEvent;
use shared_types::{ContractCall, LedgerAddress, LedgerDocumentStatus, LedgerError};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

/// In-memory ledger with a minimal registry contract model.
pub struct MockLedger {
    pending_count: AtomicU64,
    gas_price: AtomicU64,
    next_block: AtomicU64,
    next_ledger_id: AtomicU64,
    tx_counter: AtomicU64,

    fail_pending: AtomicBool,
    fail_gas: AtomicBool,
    fail_query: AtomicBool,
    /// Scripted errors consumed by successive `submit` calls.
    submit_failures: Mutex<VecDeque<LedgerError>>,

    /// Registry state by document hash.
    documents: RwLock<HashMap<String, LedgerDocumentStatus>>,
    /// Hash lookup by ledger id.
    hash_by_id: RwLock<HashMap<String, String>>,
    /// Every accepted submission, for assertions.
    submissions: RwLock<Vec<(ContractCall, SubmitParams)>>,
}

impl MockLedger {
    /// Create a mock ledger with empty registry state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending_count: AtomicU64::new(0),
            gas_price: AtomicU64::new(20),
            next_block: AtomicU64::new(100),
            next_ledger_id: AtomicU64::new(1),
            tx_counter: AtomicU64::new(1),
            fail_pending: AtomicBool::new(false),
            fail_gas: AtomicBool::new(false),
            fail_query: AtomicBool::new(false),
            submit_failures: Mutex::new(VecDeque::new()),
            documents: RwLock::new(HashMap::new()),
            hash_by_id: RwLock::new(HashMap::new()),
            submissions: RwLock::new(Vec::new()),
        }
    }

    /// Set the identity's pending transaction count.
    pub fn set_pending_count(&self, count: u64) {
        self.pending_count.store(count, Ordering::SeqCst);
    }

    /// Set the raw gas price returned by `gas_price()`.
    pub fn set_gas_price(&self, price: u64) {
        self.gas_price.store(price, Ordering::SeqCst);
    }

    /// Set the block number the next submission will land in.
    pub fn set_next_block(&self, block: u64) {
        self.next_block.store(block, Ordering::SeqCst);
    }

    /// Make `pending_transaction_count` fail with `Unavailable`.
    pub fn fail_pending_count(&self, fail: bool) {
        self.fail_pending.store(fail, Ordering::SeqCst);
    }

    /// Make `gas_price` fail with `Unavailable`.
    pub fn fail_gas_price(&self, fail: bool) {
        self.fail_gas.store(fail, Ordering::SeqCst);
    }

    /// Make `query` fail with `Unavailable`.
    pub fn fail_query(&self, fail: bool) {
        self.fail_query.store(fail, Ordering::SeqCst);
    }

    /// Script an error for an upcoming `submit` call (FIFO).
    pub fn push_submit_failure(&self, error: LedgerError) {
        self.submit_failures
            .lock()
            .expect("submit failure queue poisoned")
            .push_back(error);
    }

    /// Seed the registry with a document status keyed by hash.
    pub fn register_document(&self, hash: impl Into<String>, status: LedgerDocumentStatus) {
        self.documents
            .write()
            .expect("documents lock poisoned")
            .insert(hash.into(), status);
    }

    /// Mark a registered document as revoked.
    pub fn revoke_document(&self, hash: &str) {
        if let Some(status) = self
            .documents
            .write()
            .expect("documents lock poisoned")
            .get_mut(hash)
        {
            status.revoked = true;
        }
    }

    /// Accepted submissions (call + params), in order.
    #[must_use]
    pub fn submissions(&self) -> Vec<(ContractCall, SubmitParams)> {
        self.submissions
            .read()
            .expect("submissions lock poisoned")
            .clone()
    }

    fn next_tx_hash(&self) -> String {
        let seq = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        format!("0xtx{seq:08x}")
    }

    fn arg_str(call: &ContractCall, index: usize) -> Result<String, LedgerError> {
        call.args
            .get(index)
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| {
                LedgerError::Rpc(format!("{}: missing argument {index}", call.method))
            })
    }

    fn execute(
        &self,
        call: &ContractCall,
        tx_hash: String,
        block_number: u64,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        match call.method.as_str() {
            methods::CREATE => {
                let document_hash = Self::arg_str(call, 1)?;
                let expiry = call.args.get(2).and_then(serde_json::Value::as_u64);
                let ledger_id = self
                    .next_ledger_id
                    .fetch_add(1, Ordering::SeqCst)
                    .to_string();

                self.documents
                    .write()
                    .expect("documents lock poisoned")
                    .insert(
                        document_hash.clone(),
                        LedgerDocumentStatus {
                            exists: true,
                            revoked: false,
                            issuer: None,
                            current_holder: None,
                            expiry,
                        },
                    );
                self.hash_by_id
                    .write()
                    .expect("id index lock poisoned")
                    .insert(ledger_id.clone(), document_hash.clone());

                Ok(vec![LedgerEvent::DocumentCreated {
                    ledger_id,
                    document_hash,
                    tx_hash,
                    block_number,
                }])
            }
            methods::VERIFY => {
                let ledger_id = Self::arg_str(call, 0)?;
                Ok(vec![LedgerEvent::DocumentVerified {
                    ledger_id,
                    tx_hash,
                    block_number,
                }])
            }
            methods::TRANSFER => {
                let ledger_id = Self::arg_str(call, 0)?;
                let new_holder: LedgerAddress = Self::arg_str(call, 1)?;

                let hash = self
                    .hash_by_id
                    .read()
                    .expect("id index lock poisoned")
                    .get(&ledger_id)
                    .cloned();
                if let Some(hash) = hash {
                    if let Some(status) = self
                        .documents
                        .write()
                        .expect("documents lock poisoned")
                        .get_mut(&hash)
                    {
                        status.current_holder = Some(new_holder.clone());
                    }
                }

                Ok(vec![LedgerEvent::DocumentTransferred {
                    ledger_id,
                    new_holder,
                    tx_hash,
                    block_number,
                }])
            }
            methods::REVOKE => {
                let ledger_id = Self::arg_str(call, 0)?;
                let hash = self
                    .hash_by_id
                    .read()
                    .expect("id index lock poisoned")
                    .get(&ledger_id)
                    .cloned();
                if let Some(hash) = hash {
                    self.revoke_document(&hash);
                }
                Ok(vec![LedgerEvent::DocumentRevoked {
                    ledger_id,
                    tx_hash,
                    block_number,
                }])
            }
            other => Err(LedgerError::Rpc(format!("unknown method: {other}"))),
        }
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerProvider for MockLedger {
    async fn estimate_gas(&self, _call: &ContractCall) -> Result<u64, LedgerError> {
        Ok(50_000)
    }

    async fn gas_price(&self) -> Result<u128, LedgerError> {
        if self.fail_gas.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("gas price endpoint down".into()));
        }
        Ok(u128::from(self.gas_price.load(Ordering::SeqCst)))
    }

    async fn pending_transaction_count(
        &self,
        _identity: &LedgerAddress,
    ) -> Result<u64, LedgerError> {
        if self.fail_pending.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("rpc endpoint down".into()));
        }
        Ok(self.pending_count.load(Ordering::SeqCst))
    }

    async fn submit(
        &self,
        call: &ContractCall,
        params: SubmitParams,
    ) -> Result<SubmissionReceipt, LedgerError> {
        let scripted = self
            .submit_failures
            .lock()
            .expect("submit failure queue poisoned")
            .pop_front();
        if let Some(error) = scripted {
            return Err(error);
        }

        let tx_hash = self.next_tx_hash();
        let block_number = self.next_block.fetch_add(1, Ordering::SeqCst);
        let events = self.execute(call, tx_hash.clone(), block_number)?;

        self.submissions
            .write()
            .expect("submissions lock poisoned")
            .push((call.clone(), params));
        // The mined transaction counts toward the identity's total.
        self.pending_count.fetch_add(1, Ordering::SeqCst);

        Ok(SubmissionReceipt {
            tx_hash,
            block_number,
            events,
        })
    }

    async fn query(&self, call: &ContractCall) -> Result<serde_json::Value, LedgerError> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("rpc endpoint down".into()));
        }
        match call.method.as_str() {
            methods::GET => {
                let hash = Self::arg_str(call, 0)?;
                let status = self
                    .documents
                    .read()
                    .expect("documents lock poisoned")
                    .get(&hash)
                    .cloned()
                    .unwrap_or_default();
                serde_json::to_value(status).map_err(|e| LedgerError::Rpc(e.to_string()))
            }
            other => Err(LedgerError::Rpc(format!("unknown query method: {other}"))),
        }
    }
}
