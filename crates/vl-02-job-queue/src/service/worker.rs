//! Per-kind worker loops.
//!
//! Each worker owns one queue: it leases a job, executes the matching
//! ledger call, applies the confirmation through the state machine and
//! republishes receipt events to the bus. Execution is idempotence-guarded
//! against the cached record, so a redelivered job after a confirmed
//! submission acks without touching the ledger again.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use shared_bus::{EventPublisher, LedgerEvent};
use shared_types::{DocumentStatus, RegistryError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use vl_01_ledger_client::{LedgerProvider, TimeSource, TransactionSubmitter};
use vl_03_document_state::{DocumentStateMachine, DocumentStore};
use vl_telemetry::{JOBS_COMPLETED, JOBS_FAILED};

use crate::domain::job::{Job, JobKind, JobPayload};
use crate::domain::retry::RetryPolicy;
use crate::ports::broker::JobBroker;

/// How long an idle worker waits before polling its queue again.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Executes jobs of a single kind against the ledger.
pub struct JobWorker<S: DocumentStore, B, L> {
    kind: JobKind,
    broker: Arc<B>,
    state: Arc<DocumentStateMachine<S>>,
    submitter: Arc<TransactionSubmitter<L>>,
    bus: Arc<dyn EventPublisher>,
    clock: Arc<dyn TimeSource>,
    policy: RetryPolicy,
    poll_interval: Duration,
}

impl<S, B, L> JobWorker<S, B, L>
where
    S: DocumentStore,
    B: JobBroker,
    L: LedgerProvider,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: JobKind,
        broker: Arc<B>,
        state: Arc<DocumentStateMachine<S>>,
        submitter: Arc<TransactionSubmitter<L>>,
        bus: Arc<dyn EventPublisher>,
        clock: Arc<dyn TimeSource>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            kind,
            broker,
            state,
            submitter,
            bus,
            clock,
            policy,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the idle poll interval (tests use a short one).
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run until the shutdown signal flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(kind = %self.kind, "job worker started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!(kind = %self.kind, "job worker shutting down");
                    break;
                }
                dequeued = self.broker.dequeue(self.kind) => {
                    match dequeued {
                        Ok(Some(job)) => self.process(job).await,
                        Ok(None) => tokio::time::sleep(self.poll_interval).await,
                        Err(err) => {
                            error!(kind = %self.kind, %err, "broker dequeue failed");
                            tokio::time::sleep(self.poll_interval).await;
                        }
                    }
                }
            }
        }
    }

    /// Execute one leased job to its ack or nack.
    pub async fn process(&self, job: Job) {
        let document_id = job.payload.document_id();
        debug!(job_id = %job.id, kind = %self.kind, %document_id, attempt = job.attempts_made, "executing job");

        match self.execute(&job).await {
            Ok(result) => {
                if let Err(err) = self.broker.ack(self.kind, job.id, result).await {
                    error!(job_id = %job.id, %err, "failed to ack completed job");
                    return;
                }
                JOBS_COMPLETED.with_label_values(&[self.kind.as_str()]).inc();
            }
            Err(err) if self.policy.should_retry(&err, job.attempts_made) => {
                warn!(
                    job_id = %job.id, kind = %self.kind, attempt = job.attempts_made, %err,
                    "transient job failure, requeuing with backoff"
                );
                // The backoff is carried by the broker as a delivery delay,
                // so the worker loop keeps draining other jobs meanwhile.
                if let Err(nack_err) = self
                    .broker
                    .nack(self.kind, job.id, err.to_string(), Some(self.policy.backoff))
                    .await
                {
                    error!(job_id = %job.id, %nack_err, "failed to requeue job");
                }
            }
            Err(err) => {
                warn!(
                    job_id = %job.id, kind = %self.kind, attempts = job.attempts_made, %err,
                    "job failed terminally"
                );
                if let Err(nack_err) = self
                    .broker
                    .nack(self.kind, job.id, err.to_string(), None)
                    .await
                {
                    error!(job_id = %job.id, %nack_err, "failed to mark job failed");
                }
                JOBS_FAILED.with_label_values(&[self.kind.as_str()]).inc();
                let diagnostic = err.to_string();
                if let Err(apply_err) = self
                    .state
                    .apply_failure(&document_id, diagnostic, self.clock.now())
                    .await
                {
                    // The record may be revoked or gone; the job record
                    // still carries the failure.
                    warn!(%document_id, %apply_err, "could not move document to error");
                }
            }
        }
    }

    async fn execute(&self, job: &Job) -> Result<serde_json::Value, RegistryError> {
        match &job.payload {
            JobPayload::Creation { document_id, call } => {
                let record = self.state.require(document_id).await?;
                if record.status == DocumentStatus::Revoked {
                    return Ok(abandoned());
                }
                if let (Some(tx_hash), Some(ledger_id)) =
                    (&record.transaction_hash, &record.ledger_id)
                {
                    // Redelivery after a confirmed submission.
                    debug!(%document_id, "creation already confirmed, acking redelivery");
                    return Ok(json!({ "ledger_id": ledger_id, "tx_hash": tx_hash }));
                }

                let receipt = self.submitter.create_document(call).await?;
                self.state
                    .apply_creation_confirmed(
                        document_id,
                        receipt.ledger_id.clone(),
                        receipt.tx_hash.clone(),
                        receipt.block_number,
                        self.clock.now(),
                    )
                    .await?;
                self.bus
                    .publish(LedgerEvent::DocumentCreated {
                        ledger_id: receipt.ledger_id.clone(),
                        document_hash: record.document_hash.clone(),
                        tx_hash: receipt.tx_hash.clone(),
                        block_number: receipt.block_number,
                    })
                    .await;
                Ok(json!({
                    "ledger_id": receipt.ledger_id,
                    "tx_hash": receipt.tx_hash,
                    "block_number": receipt.block_number,
                }))
            }

            JobPayload::Verification { document_id, .. } => {
                let record = self.state.require(document_id).await?;
                if record.status == DocumentStatus::Revoked {
                    return Ok(abandoned());
                }
                if record.status == DocumentStatus::Verified {
                    debug!(%document_id, "verification already confirmed, acking redelivery");
                    return Ok(json!({ "tx_hash": record.verification_tx_hash }));
                }
                let ledger_id = record.ledger_id.clone().ok_or_else(|| {
                    RegistryError::MalformedRequest("document has no ledger id".into())
                })?;

                let receipt = self.submitter.verify_document(&ledger_id).await?;
                self.state
                    .apply_verification_confirmed(
                        document_id,
                        receipt.tx_hash.clone(),
                        receipt.block_number,
                        self.clock.now(),
                    )
                    .await?;
                self.republish(&receipt.events).await;
                Ok(json!({
                    "tx_hash": receipt.tx_hash,
                    "block_number": receipt.block_number,
                }))
            }

            JobPayload::Transfer {
                document_id,
                new_holder,
            } => {
                let record = self.state.require(document_id).await?;
                if record.document_type != shared_types::DocumentType::Transferable {
                    return Err(RegistryError::NonTransferableDocument);
                }
                if record.status == DocumentStatus::Revoked {
                    return Ok(abandoned());
                }
                if record.status == DocumentStatus::Transferred
                    && record.endorsement_chain.last() == Some(new_holder)
                {
                    debug!(%document_id, "transfer already confirmed, acking redelivery");
                    return Ok(json!({ "new_holder": new_holder }));
                }
                let ledger_id = record.ledger_id.clone().ok_or_else(|| {
                    RegistryError::MalformedRequest("document has no ledger id".into())
                })?;

                let receipt = self.submitter.transfer_document(&ledger_id, new_holder).await?;
                self.state
                    .apply_transfer_confirmed(document_id, new_holder.clone(), self.clock.now())
                    .await?;
                self.republish(&receipt.events).await;
                Ok(json!({
                    "tx_hash": receipt.tx_hash,
                    "block_number": receipt.block_number,
                    "new_holder": new_holder,
                }))
            }
        }
    }

    async fn republish(&self, events: &[LedgerEvent]) {
        for event in events {
            self.bus.publish(event.clone()).await;
        }
    }
}

/// Result body for a job abandoned before submission.
fn abandoned() -> serde_json::Value {
    json!({ "abandoned": "document revoked" })
}
