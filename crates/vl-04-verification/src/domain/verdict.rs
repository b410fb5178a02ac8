//! The aggregated verification verdict.

use serde::{Deserialize, Serialize};
use shared_types::{
    DocumentId, DocumentStatus, LedgerId, Signal, Timestamp, VerificationDetails,
};

/// Cached-record summary embedded in a verdict when the document is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub status: DocumentStatus,
    pub ledger_id: Option<LedgerId>,
}

/// The outcome of one verification run.
///
/// Individual signals are reported verbatim; `verified` is derived, never
/// stored independently, so it can not drift from its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    /// The document hash is known to the ledger registry.
    pub on_ledger: bool,
    /// A cached record exists for the hash.
    pub in_cache: bool,
    /// Payload fingerprint matched the supplied or cached hash.
    pub document_integrity: Signal,
    /// DID proof resolution outcome.
    pub did_verified: Signal,
    /// DNS-TXT proof lookup outcome.
    pub dns_verified: Signal,
    /// The ledger reports the document revoked.
    pub revoked: bool,
    /// The ledger expiry has passed, when an expiry is recorded.
    pub expired: Option<bool>,
    /// Human-readable notes from degraded signals.
    pub diagnostics: Vec<String>,
    /// Cached record summary, when in cache.
    pub document: Option<DocumentSummary>,
    /// When this verification ran (unix seconds).
    pub verified_at: Timestamp,
}

impl VerificationVerdict {
    /// The aggregated result.
    ///
    /// Requires ledger presence, non-vetoing integrity and identity
    /// signals, and no revocation. A `Skipped` signal does not veto:
    /// absence of a proof type is not evidence against the document.
    /// Revocation overrides everything else.
    #[must_use]
    pub fn verified(&self) -> bool {
        !self.revoked
            && self.on_ledger
            && self.document_integrity.permits_verified()
            && self.did_verified.permits_verified()
            && self.dns_verified.permits_verified()
    }

    /// Combined issuer-identity signal: any failed proof vetoes, any
    /// passed proof attests, all-skipped stays skipped.
    #[must_use]
    pub fn issuer_identity(&self) -> Signal {
        match (self.did_verified, self.dns_verified) {
            (Signal::Failed, _) | (_, Signal::Failed) => Signal::Failed,
            (Signal::Passed, _) | (_, Signal::Passed) => Signal::Passed,
            _ => Signal::Skipped,
        }
    }

    /// Project the verdict into the details stored on the cached record.
    #[must_use]
    pub fn to_details(&self) -> VerificationDetails {
        VerificationDetails {
            document_integrity: self.document_integrity,
            issuer_identity: self.issuer_identity(),
            did_verified: self.did_verified,
            dns_verified: self.dns_verified,
            on_ledger: Signal::from_check(self.on_ledger),
            revoked: self.revoked,
            last_verified: Some(self.verified_at),
        }
    }
}
