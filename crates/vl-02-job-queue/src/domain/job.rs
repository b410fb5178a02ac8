//! Job entities: kinds, payloads, lifecycle state, and the status report
//! returned to callers.

use serde::{Deserialize, Serialize};
use shared_types::{DocumentId, DocumentStatus, LedgerAddress};
use uuid::Uuid;
use vl_01_ledger_client::CreateDocumentCall;

/// The three ledger-write job streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Creation,
    Verification,
    Transfer,
}

impl JobKind {
    /// Canonical string form, used in queue names and metric labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creation => "creation",
            Self::Verification => "verification",
            Self::Transfer => "transfer",
        }
    }

    /// Parse the canonical string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "creation" => Some(Self::Creation),
            "verification" => Some(Self::Verification),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }

    /// The pending document status a job of this kind holds while
    /// outstanding. Creation jobs run against a `Draft` record and have no
    /// pending status of their own.
    #[must_use]
    pub fn pending_status(self) -> Option<DocumentStatus> {
        match self {
            Self::Creation => None,
            Self::Verification => Some(DocumentStatus::PendingVerification),
            Self::Transfer => Some(DocumentStatus::PendingTransfer),
        }
    }

    /// All kinds, in queue-spawn order.
    pub const ALL: [JobKind; 3] = [Self::Creation, Self::Verification, Self::Transfer];
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific job data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobPayload {
    Creation {
        document_id: DocumentId,
        call: CreateDocumentCall,
    },
    Verification {
        document_id: DocumentId,
        requester: Option<String>,
    },
    Transfer {
        document_id: DocumentId,
        new_holder: LedgerAddress,
    },
}

impl JobPayload {
    /// The document this job mutates.
    #[must_use]
    pub fn document_id(&self) -> DocumentId {
        match self {
            Self::Creation { document_id, .. }
            | Self::Verification { document_id, .. }
            | Self::Transfer { document_id, .. } => *document_id,
        }
    }

    /// The kind of queue this payload belongs on.
    #[must_use]
    pub fn kind(&self) -> JobKind {
        match self {
            Self::Creation { .. } => JobKind::Creation,
            Self::Verification { .. } => JobKind::Verification,
            Self::Transfer { .. } => JobKind::Transfer,
        }
    }
}

/// Job lifecycle state inside the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Waiting in the queue (initial, or requeued after a transient failure).
    Queued,
    /// Leased to a worker; redelivered if the lease expires unacked.
    Active,
    /// Finished successfully. Terminal.
    Completed,
    /// Attempts exhausted or the failure was permanent. Terminal.
    Failed,
}

impl JobState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One unit of ledger work tracked by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub payload: JobPayload,
    pub state: JobState,
    /// Executions started, including the one currently active.
    pub attempts_made: u32,
    pub max_attempts: u32,
    /// Coarse completion percentage (0 or 100; no partial progress today).
    pub progress: u8,
    /// Kind-specific result document set on completion.
    pub result: Option<serde_json::Value>,
    /// Message from the most recent failure.
    pub failure_reason: Option<String>,
}

impl Job {
    /// Build a fresh queued job for `payload`.
    #[must_use]
    pub fn new(payload: JobPayload, max_attempts: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: payload.kind(),
            payload,
            state: JobState::Queued,
            attempts_made: 0,
            max_attempts,
            progress: 0,
            result: None,
            failure_reason: None,
        }
    }
}

/// Caller-facing snapshot of a job, returned by status queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub state: JobState,
    pub progress: u8,
    pub result: Option<serde_json::Value>,
    pub failure_reason: Option<String>,
    pub attempts_made: u32,
}

impl From<&Job> for JobStatusReport {
    fn from(job: &Job) -> Self {
        Self {
            state: job.state,
            progress: job.progress,
            result: job.result.clone(),
            failure_reason: job.failure_reason.clone(),
            attempts_made: job.attempts_made,
        }
    }
}
