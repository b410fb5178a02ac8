//! Process wiring and lifecycle.
//!
//! Builds every subsystem over shared `Arc`s, spawns the three job workers
//! and the reconciler, and tears them down through a watch channel. The
//! ledger collaborator here is the in-memory adapter; a production
//! deployment swaps an RPC-backed `LedgerProvider` into the same wiring.

use std::sync::Arc;

use anyhow::Result;
use shared_bus::{EventFilter, EventPublisher, InMemoryEventBus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;
use vl_01_ledger_client::{
    GasPriceCache, MockLedger, SubmitterConfig, SystemClock, TimeSource, TransactionSubmitter,
};
use vl_02_job_queue::{InMemoryBroker, JobKind, JobQueue, JobWorker, RetryPolicy};
use vl_03_document_state::{DocumentStateMachine, InMemoryDocumentStore};
use vl_04_verification::{
    MockDidResolver, MockDnsResolver, ProviderLedgerQuery, RecordingAuditSink,
    VerificationAggregator, VerifierConfig,
};
use vl_05_reconciler::EventReconciler;

use crate::config::RuntimeConfig;

type Store = InMemoryDocumentStore;
type Ledger = MockLedger;

/// The wired registry process.
pub struct RegistryRuntime {
    config: RuntimeConfig,
    bus: Arc<InMemoryEventBus>,
    state: Arc<DocumentStateMachine<Store>>,
    queue: Arc<JobQueue<Store, InMemoryBroker>>,
    aggregator: Arc<VerificationAggregator<Store, ProviderLedgerQuery<Ledger>>>,
    broker: Arc<InMemoryBroker>,
    submitter: Arc<TransactionSubmitter<Ledger>>,
    clock: Arc<dyn TimeSource>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl RegistryRuntime {
    /// Wire all subsystems according to `config`.
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        info!("wiring registry runtime");

        let bus = Arc::new(InMemoryEventBus::new());
        let clock: Arc<dyn TimeSource> = Arc::new(SystemClock);
        let ledger = Arc::new(MockLedger::new());
        let store = Arc::new(InMemoryDocumentStore::new());
        let state = Arc::new(DocumentStateMachine::new(store));

        let gas = GasPriceCache::with_config(
            ledger.clone(),
            clock.clone(),
            config.gas_refresh_interval,
            config.gas_floor_price,
        );
        let submitter = Arc::new(TransactionSubmitter::with_gas_cache(
            ledger.clone(),
            gas,
            SubmitterConfig {
                management_contract: config.management_contract.clone(),
                identity: config.identity.clone(),
                confirmation_timeout: config.confirmation_timeout,
            },
        ));

        let policy = RetryPolicy {
            max_attempts: config.max_attempts,
            backoff: config.retry_backoff,
        };
        let broker = Arc::new(InMemoryBroker::new(config.visibility_timeout));
        let queue = Arc::new(JobQueue::new(state.clone(), broker.clone(), policy));

        let aggregator = Arc::new(VerificationAggregator::over_provider(
            state.clone(),
            ledger,
            config.management_contract.clone(),
            Arc::new(MockDidResolver::new()),
            Arc::new(MockDnsResolver::new()),
            Arc::new(RecordingAuditSink::new()),
            clock.clone(),
            VerifierConfig {
                network_id: config.network_id,
                resolution_timeout: config.resolution_timeout,
            },
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            bus,
            state,
            queue,
            aggregator,
            broker,
            submitter,
            clock,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        }
    }

    /// Spawn the worker tasks and the reconciler.
    pub fn start(&mut self) -> Result<()> {
        info!(
            identity = %self.config.identity,
            contract = %self.config.management_contract,
            "starting registry runtime"
        );

        for kind in JobKind::ALL {
            let worker = JobWorker::new(
                kind,
                self.broker.clone(),
                self.state.clone(),
                self.submitter.clone(),
                self.bus.clone() as Arc<dyn EventPublisher>,
                self.clock.clone(),
                RetryPolicy {
                    max_attempts: self.config.max_attempts,
                    backoff: self.config.retry_backoff,
                },
            );
            let shutdown = self.shutdown_rx.clone();
            self.tasks.push(tokio::spawn(async move {
                worker.run(shutdown).await;
            }));
        }

        let reconciler = EventReconciler::new(self.state.clone(), self.clock.clone());
        let subscription = self.bus.subscribe(EventFilter::all());
        let shutdown = self.shutdown_rx.clone();
        self.tasks.push(tokio::spawn(async move {
            reconciler.run(subscription, shutdown).await;
        }));

        info!(workers = JobKind::ALL.len(), "registry runtime started");
        Ok(())
    }

    /// Signal shutdown and wait for every task to finish.
    pub async fn shutdown(&mut self) {
        info!("shutting down registry runtime");
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        info!("registry runtime stopped");
    }

    /// The enqueue surface.
    #[must_use]
    pub fn queue(&self) -> &Arc<JobQueue<Store, InMemoryBroker>> {
        &self.queue
    }

    /// The verification surface.
    #[must_use]
    pub fn aggregator(&self) -> &Arc<VerificationAggregator<Store, ProviderLedgerQuery<Ledger>>> {
        &self.aggregator
    }

    /// The document state machine (and through it, the store).
    #[must_use]
    pub fn state(&self) -> &Arc<DocumentStateMachine<Store>> {
        &self.state
    }

    /// The event bus.
    #[must_use]
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{DocumentRecord, DocumentStatus, DocumentType};
    use std::time::Duration;
    use vl_02_job_queue::EnqueueOutcome;
    use vl_03_document_state::DocumentStore;

    #[tokio::test]
    async fn test_end_to_end_creation_through_runtime() {
        let mut runtime = RegistryRuntime::new(RuntimeConfig {
            retry_backoff: Duration::from_millis(5),
            ..RuntimeConfig::default()
        });
        runtime.start().unwrap();

        let record = DocumentRecord::new_draft(
            "cafe01".into(),
            DocumentType::Verifiable,
            1_700_000_000,
        );
        let id = record.id;
        runtime.state().store().insert(record).await.unwrap();

        let outcome = runtime.queue().enqueue_creation(id).await.unwrap();
        assert!(matches!(outcome, EnqueueOutcome::Enqueued(_)));

        // Poll until the spawned worker confirms the creation.
        let mut confirmed = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let doc = runtime.state().require(&id).await.unwrap();
            if doc.status == DocumentStatus::Active {
                confirmed = true;
                break;
            }
        }
        assert!(confirmed, "creation job never confirmed");

        runtime.shutdown().await;
    }
}
