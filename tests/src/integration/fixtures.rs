//! Shared harness wiring the subsystems the integration flows exercise.

use std::sync::Arc;
use std::time::Duration;

use shared_bus::{EventPublisher, InMemoryEventBus};
use shared_types::{DocumentRecord, DocumentType};
use vl_01_ledger_client::{
    MockClock, MockLedger, SubmitterConfig, TimeSource, TransactionSubmitter,
};
use vl_02_job_queue::{InMemoryBroker, JobBroker, JobKind, JobQueue, JobWorker, RetryPolicy};
use vl_03_document_state::{DocumentStateMachine, DocumentStore, InMemoryDocumentStore};
use vl_05_reconciler::EventReconciler;

/// Everything a flow test needs, wired over one mock ledger.
pub struct Harness {
    pub ledger: Arc<MockLedger>,
    pub bus: Arc<InMemoryEventBus>,
    pub clock: Arc<MockClock>,
    pub broker: Arc<InMemoryBroker>,
    pub state: Arc<DocumentStateMachine<InMemoryDocumentStore>>,
    pub submitter: Arc<TransactionSubmitter<MockLedger>>,
    pub queue: JobQueue<InMemoryDocumentStore, InMemoryBroker>,
    pub reconciler: EventReconciler<InMemoryDocumentStore>,
    policy: RetryPolicy,
}

impl Harness {
    pub fn new() -> Self {
        let ledger = Arc::new(MockLedger::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let clock = Arc::new(MockClock::new(1_700_000_000));
        let broker = Arc::new(InMemoryBroker::default());
        let state = Arc::new(DocumentStateMachine::new(Arc::new(
            InMemoryDocumentStore::new(),
        )));
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        };
        let submitter = Arc::new(TransactionSubmitter::new(
            ledger.clone(),
            clock.clone() as Arc<dyn TimeSource>,
            SubmitterConfig::default(),
        ));
        let queue = JobQueue::new(state.clone(), broker.clone(), policy.clone());
        let reconciler = EventReconciler::new(state.clone(), clock.clone() as Arc<dyn TimeSource>);

        Self {
            ledger,
            bus,
            clock,
            broker,
            state,
            submitter,
            queue,
            reconciler,
            policy,
        }
    }

    /// A worker for `kind` sharing the harness wiring.
    pub fn worker(&self, kind: JobKind) -> JobWorker<InMemoryDocumentStore, InMemoryBroker, MockLedger> {
        JobWorker::new(
            kind,
            self.broker.clone(),
            self.state.clone(),
            self.submitter.clone(),
            self.bus.clone() as Arc<dyn EventPublisher>,
            self.clock.clone() as Arc<dyn TimeSource>,
            self.policy.clone(),
        )
    }

    /// Insert a Draft record and return it.
    pub async fn seed_draft(&self, hash: &str, document_type: DocumentType) -> DocumentRecord {
        let record = DocumentRecord::new_draft(hash.into(), document_type, self.clock.now());
        self.state
            .store()
            .insert(record.clone())
            .await
            .expect("seed insert failed");
        record
    }

    /// Drain one queue: dequeue-and-process until nothing queued remains,
    /// waiting out retry backoff delays between polls.
    pub async fn drain(&self, kind: JobKind) {
        let worker = self.worker(kind);
        loop {
            match self.broker.dequeue(kind).await {
                Ok(Some(job)) => worker.process(job).await,
                _ => {
                    if self.broker.queued_len(kind).await == 0 {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
