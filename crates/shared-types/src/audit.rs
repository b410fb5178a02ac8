//! Verification audit log entries.
//!
//! Every verification request produces an audit entry, written on a
//! best-effort basis: a failure to record the entry must never fail the
//! verification call. Entries are append-only and never mutated or deleted
//! by the core.

use crate::entities::DocumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable record of one verification attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationAuditEntry {
    /// Entry identifier.
    pub id: Uuid,
    /// Who asked for the verification.
    pub requester: String,
    /// The cached document, when the hash matched one. Verification of
    /// hashes we have never seen is legal, so this is optional.
    pub document_id: Option<DocumentId>,
    /// The hash that was verified (normalized).
    pub document_hash: String,
    /// The aggregated verdict's bottom line.
    pub successful: bool,
    /// Full verdict payload for later inspection.
    pub details: serde_json::Value,
    /// When the verification ran.
    pub timestamp: DateTime<Utc>,
}

impl VerificationAuditEntry {
    /// Build an entry stamped with the current time.
    #[must_use]
    pub fn new(
        requester: impl Into<String>,
        document_id: Option<DocumentId>,
        document_hash: impl Into<String>,
        successful: bool,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester: requester.into(),
            document_id,
            document_hash: document_hash.into(),
            successful,
            details,
            timestamp: Utc::now(),
        }
    }
}
