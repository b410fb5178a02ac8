//! # Error Taxonomy
//!
//! Defines error types used across subsystems. The split matters for retry
//! classification: `LedgerError` carries the distinguishable error classes
//! reported by the ledger capability, and `RegistryError` is the
//! caller-facing taxonomy of the registry core.

use thiserror::Error;

/// Errors reported by the ledger capability.
///
/// The ledger must report distinguishable classes for nonce-too-low,
/// insufficient-gas and reverted so that retry policy and nonce recovery
/// can react to each differently.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger RPC endpoint could not be reached.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// The submitted nonce is below the identity's confirmed count.
    ///
    /// Indicates the in-process nonce counter has fallen behind
    /// externally-confirmed transactions; the sequencer must reinitialize.
    #[error("Nonce too low: submitted {submitted}, ledger expects at least {expected}")]
    NonceTooLow { submitted: u64, expected: u64 },

    /// The supplied gas was insufficient for the call.
    #[error("Insufficient gas: supplied {supplied}, required {required}")]
    InsufficientGas { supplied: u64, required: u64 },

    /// The transaction was mined but reverted. Permanent for this payload.
    #[error("Transaction reverted: {reason}")]
    Reverted { reason: String },

    /// The receipt did not carry the event the caller required.
    #[error("Transaction did not emit expected event: {0}")]
    MissingEvent(String),

    /// Any other RPC-level failure.
    #[error("Ledger RPC error: {0}")]
    Rpc(String),
}

impl LedgerError {
    /// Returns true if retrying the identical submission can succeed.
    ///
    /// `Reverted` is permanent for the payload; resubmitting the same
    /// parameters would revert again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Reverted { .. } | Self::MissingEvent(_))
    }
}

/// Caller-facing errors of the registry core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A ledger operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// No cached document with the given identifier.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// The supplied hash does not match the cached record.
    #[error("Document hash does not match the cached record")]
    HashMismatch,

    /// Transfer requested for a document that is not Transferable.
    #[error("Document is not transferable")]
    NonTransferableDocument,

    /// The outstanding-job invariant would be violated.
    ///
    /// A job is already queued or active for this document; the enqueue is
    /// rejected rather than corrupting state.
    #[error("A job is already outstanding for document {document_id}")]
    PersistenceConflict { document_id: String },

    /// The document's current status does not permit the transition.
    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    /// All attempts for a job failed; the document moved to Error.
    #[error("Job exhausted after {attempts} attempts: {last_error}")]
    JobExhausted { attempts: u32, last_error: String },

    /// No job with the given id in the named queue.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// The job kind in a status query is not one of creation|verification|transfer.
    #[error("Unknown job kind: {0}")]
    UnknownJobKind(String),

    /// DID or DNS resolution failed. Verification signals degrade rather
    /// than abort, so this surfaces only in diagnostics.
    #[error("Resolution failure: {0}")]
    ResolutionFailure(String),

    /// The request itself is malformed (e.g. neither hash nor payload).
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// An address argument failed format validation.
    #[error("Invalid ledger address: {0}")]
    InvalidAddress(String),
}

impl RegistryError {
    /// Returns true if a job failing with this error should be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_transient(),
            // Everything else is a precondition or policy failure; retrying
            // with identical input cannot change the outcome.
            _ => false,
        }
    }
}
