//! Enqueue surface and job status queries.
//!
//! Prechecks live here so a request that cannot succeed never consumes a
//! queue slot: hash mismatches, non-transferable transfers and illegal
//! status transitions are all rejected before a job exists. Entry into a
//! pending status is a compare-and-set, which is what makes the
//! one-outstanding-job-per-document guarantee hold under concurrent
//! requests.

use std::sync::Arc;

use shared_types::{
    hash::normalize_hash, is_valid_address, DocumentId, DocumentStatus, LedgerAddress,
    RegistryError,
};
use tracing::{debug, info};
use uuid::Uuid;
use vl_01_ledger_client::CreateDocumentCall;
use vl_03_document_state::{DocumentStateMachine, DocumentStore};
use vl_telemetry::JOBS_ENQUEUED;

use crate::domain::job::{Job, JobKind, JobPayload, JobStatusReport};
use crate::domain::retry::RetryPolicy;
use crate::ports::broker::JobBroker;

/// Reference to an enqueued job, returned to the caller for status polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub document_id: DocumentId,
}

/// Result of an enqueue request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// A job was queued; poll it through the handle.
    Enqueued(JobHandle),
    /// The document is already `Verified`; nothing to do. The request
    /// succeeds without a job (idempotent surface).
    AlreadyVerified,
}

/// Accepts ledger-write requests and turns them into queued jobs.
pub struct JobQueue<S: DocumentStore, B> {
    state: Arc<DocumentStateMachine<S>>,
    broker: Arc<B>,
    policy: RetryPolicy,
}

impl<S: DocumentStore, B: JobBroker> JobQueue<S, B> {
    pub fn new(state: Arc<DocumentStateMachine<S>>, broker: Arc<B>, policy: RetryPolicy) -> Self {
        Self {
            state,
            broker,
            policy,
        }
    }

    /// Queue the ledger creation of a Draft (or previously failed) document.
    ///
    /// The create call data is snapshotted from the cached record at
    /// enqueue time.
    pub async fn enqueue_creation(
        &self,
        document_id: DocumentId,
    ) -> Result<EnqueueOutcome, RegistryError> {
        let record = self.state.require(&document_id).await?;
        if record.transaction_hash.is_some() {
            // Already confirmed on the ledger; a second creation would revert.
            return Err(illegal(record.status, DocumentStatus::Active));
        }
        if !matches!(record.status, DocumentStatus::Draft | DocumentStatus::Error) {
            return Err(illegal(record.status, DocumentStatus::Active));
        }

        let call = CreateDocumentCall {
            category: record.document_type.category_code(),
            document_hash: record.document_hash.clone(),
            expiry: record.expiry.unwrap_or(0),
        };
        self.push(JobPayload::Creation { document_id, call }).await
    }

    /// Queue an on-ledger verify call for a document.
    ///
    /// `supplied_hash`, when present, must match the cached record; a
    /// mismatch is rejected before any job exists. A document already
    /// `Verified` short-circuits to success without a job.
    pub async fn enqueue_verification(
        &self,
        document_id: DocumentId,
        supplied_hash: Option<&str>,
        requester: Option<String>,
    ) -> Result<EnqueueOutcome, RegistryError> {
        let record = self.state.require(&document_id).await?;
        if let Some(hash) = supplied_hash {
            if normalize_hash(hash) != record.document_hash {
                return Err(RegistryError::HashMismatch);
            }
        }
        if record.status == DocumentStatus::Verified {
            debug!(document_id = %document_id, "document already verified, no job enqueued");
            return Ok(EnqueueOutcome::AlreadyVerified);
        }

        self.state
            .begin_job(&document_id, DocumentStatus::PendingVerification)
            .await?;
        self.push(JobPayload::Verification {
            document_id,
            requester,
        })
        .await
    }

    /// Queue an ownership transfer to `new_holder`.
    pub async fn enqueue_transfer(
        &self,
        document_id: DocumentId,
        new_holder: LedgerAddress,
    ) -> Result<EnqueueOutcome, RegistryError> {
        let record = self.state.require(&document_id).await?;
        if record.document_type != shared_types::DocumentType::Transferable {
            return Err(RegistryError::NonTransferableDocument);
        }
        if !is_valid_address(&new_holder) {
            return Err(RegistryError::InvalidAddress(new_holder));
        }

        self.state
            .begin_job(&document_id, DocumentStatus::PendingTransfer)
            .await?;
        self.push(JobPayload::Transfer {
            document_id,
            new_holder,
        })
        .await
    }

    /// Report the last known state of a job.
    ///
    /// `kind` is the caller-supplied queue name; an unrecognized name is a
    /// bad request, an unknown id within a valid queue is not-found.
    pub async fn get_status(
        &self,
        kind: &str,
        job_id: &str,
    ) -> Result<JobStatusReport, RegistryError> {
        let kind =
            JobKind::parse(kind).ok_or_else(|| RegistryError::UnknownJobKind(kind.to_string()))?;
        let id = Uuid::parse_str(job_id)
            .map_err(|_| RegistryError::JobNotFound(job_id.to_string()))?;
        let job = self
            .broker
            .get(kind, id)
            .await?
            .ok_or_else(|| RegistryError::JobNotFound(job_id.to_string()))?;
        Ok(JobStatusReport::from(&job))
    }

    async fn push(&self, payload: JobPayload) -> Result<EnqueueOutcome, RegistryError> {
        let job = Job::new(payload, self.policy.max_attempts);
        let handle = JobHandle {
            job_id: job.id,
            kind: job.kind,
            document_id: job.payload.document_id(),
        };
        JOBS_ENQUEUED.with_label_values(&[job.kind.as_str()]).inc();
        info!(job_id = %job.id, kind = %job.kind, document_id = %handle.document_id, "job enqueued");
        self.broker.enqueue(job).await?;
        Ok(EnqueueOutcome::Enqueued(handle))
    }
}

fn illegal(from: DocumentStatus, to: DocumentStatus) -> RegistryError {
    RegistryError::IllegalTransition {
        from: format!("{from:?}"),
        to: format!("{to:?}"),
    }
}
