//! # Core Domain Entities
//!
//! Defines the document registry entities shared across subsystems.
//!
//! ## Clusters
//!
//! - **Documents**: `DocumentRecord`, `DocumentStatus`, `DocumentType`
//! - **Verification**: `Signal`, `VerificationDetails`, `VerificationVerdict` summary
//! - **Ledger**: `ContractCall`, `LedgerDocumentStatus`, address/hash aliases

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a cached document record.
pub type DocumentId = Uuid;

/// Ledger-assigned document identifier, set once creation confirms.
pub type LedgerId = String;

/// Transaction hash on the ledger (0x-prefixed hex).
pub type TxHash = String;

/// Block number on the ledger.
pub type BlockNumber = u64;

/// Identifier of a party holding or endorsing a document.
pub type HolderId = String;

/// A ledger account address (0x-prefixed, 40 hex chars).
pub type LedgerAddress = String;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Returns true if `addr` is a well-formed ledger address.
#[must_use]
pub fn is_valid_address(addr: &str) -> bool {
    let hex_part = match addr.strip_prefix("0x") {
        Some(h) => h,
        None => return false,
    };
    hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Document category on the ledger contract.
///
/// The create call encodes the document type as a numeric category:
/// Transferable = 0, Verifiable = 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    /// Ownership can be endorsed to new holders.
    Transferable,
    /// Can only be verified, never transferred.
    Verifiable,
}

impl DocumentType {
    /// Numeric category code used by the ledger create call.
    #[must_use]
    pub fn category_code(self) -> u8 {
        match self {
            Self::Transferable => 0,
            Self::Verifiable => 1,
        }
    }
}

/// Document lifecycle status.
///
/// Mutated only through the document state machine:
///
/// ```text
/// Draft ──→ Active ──→ PendingVerification ──→ Verified
///             │                │                   │
///             │                └──→ Error          └──→ PendingTransfer
///             └──→ PendingTransfer ──→ Transferred
///
/// any state ──→ Revoked (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DocumentStatus {
    /// Created locally, no ledger confirmation yet.
    #[default]
    Draft,
    /// Creation confirmed on the ledger.
    Active,
    /// A verification job is outstanding.
    PendingVerification,
    /// Verification succeeded (rest state, may transfer later).
    Verified,
    /// A transfer job is outstanding.
    PendingTransfer,
    /// Transfer confirmed on the ledger (rest state).
    Transferred,
    /// Revoked on the ledger. Terminal: no outgoing transitions.
    Revoked,
    /// A job exhausted its attempts. May be re-enqueued.
    Error,
}

impl DocumentStatus {
    /// Returns true if a job is outstanding for this document.
    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::PendingVerification | Self::PendingTransfer)
    }

    /// Returns true if this is the terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Revoked)
    }
}

/// Outcome of one independent verification signal.
///
/// `Skipped` means the signal could not be evaluated because the input did
/// not carry the matching proof type; it is distinct from `Failed` and does
/// not veto the aggregated verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// The signal was evaluated and passed.
    Passed,
    /// The signal was evaluated and failed.
    Failed,
    /// The signal was not applicable to this input.
    #[default]
    Skipped,
}

impl Signal {
    /// Returns true if the signal passed.
    #[must_use]
    pub fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Returns true if the signal does not veto the aggregated verdict.
    ///
    /// A skipped signal counts as non-vetoing: absence of a proof type is
    /// not evidence of forgery.
    #[must_use]
    pub fn permits_verified(self) -> bool {
        matches!(self, Self::Passed | Self::Skipped)
    }

    /// Collapse a boolean check result into a signal.
    #[must_use]
    pub fn from_check(passed: bool) -> Self {
        if passed {
            Self::Passed
        } else {
            Self::Failed
        }
    }
}

/// Structured record of the last verification outcome for a document.
///
/// Overwritten wholesale on each verification; never merged field-by-field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VerificationDetails {
    /// Content fingerprint matched the signed payload.
    pub document_integrity: Signal,
    /// Issuer identity proof (DID or DNS-TXT) checked out.
    pub issuer_identity: Signal,
    /// DID resolution succeeded and yielded a document.
    pub did_verified: Signal,
    /// DNS-TXT record matching the expected format was found.
    pub dns_verified: Signal,
    /// The document exists on the ledger.
    pub on_ledger: Signal,
    /// The ledger reports the document as revoked.
    pub revoked: bool,
    /// When this verification ran (unix seconds).
    pub last_verified: Option<Timestamp>,
}

/// A cached document record: the local projection of ledger state.
///
/// Owned by the persistence collaborator; mutated only by the document
/// state machine and the event reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Opaque identifier, assigned at creation, immutable.
    pub id: DocumentId,
    /// Content fingerprint (hex digest, no 0x prefix), immutable once set.
    pub document_hash: String,
    /// Transferable or Verifiable, immutable.
    pub document_type: DocumentType,
    /// Lifecycle status; mutated only through the state machine.
    pub status: DocumentStatus,
    /// Ledger-assigned identifier; empty until creation confirms.
    pub ledger_id: Option<LedgerId>,
    /// Creation transaction hash; empty until creation confirms.
    pub transaction_hash: Option<TxHash>,
    /// Block the creation transaction landed in.
    pub block_number: Option<BlockNumber>,
    /// Transaction hash of the on-ledger verify call, if any.
    pub verification_tx_hash: Option<TxHash>,
    /// Block of the on-ledger verify call, if any.
    pub verification_block: Option<BlockNumber>,
    /// Ordered holders; append-only, grows on transfer.
    pub endorsement_chain: Vec<HolderId>,
    /// Last verification outcome, overwritten wholesale each run.
    pub verification_details: VerificationDetails,
    /// Diagnostic from the last failed job against this document.
    pub last_error: Option<String>,
    /// Expiry timestamp carried into the ledger create call.
    pub expiry: Option<Timestamp>,
    /// Creation time of the cached record (unix seconds).
    pub created_at: Timestamp,
    /// Last mutation time of the cached record (unix seconds).
    pub updated_at: Timestamp,
}

impl DocumentRecord {
    /// Create a fresh Draft record for a newly fingerprinted document.
    #[must_use]
    pub fn new_draft(document_hash: String, document_type: DocumentType, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_hash,
            document_type,
            status: DocumentStatus::Draft,
            ledger_id: None,
            transaction_hash: None,
            block_number: None,
            verification_tx_hash: None,
            verification_block: None,
            endorsement_chain: Vec::new(),
            verification_details: VerificationDetails::default(),
            last_error: None,
            expiry: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the document's expiry timestamp has passed.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiry.is_some_and(|e| now > e)
    }
}

/// A contract call to be estimated, queried, or submitted on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    /// Target contract address.
    pub contract: LedgerAddress,
    /// Method name on the contract.
    pub method: String,
    /// ABI-agnostic argument encoding.
    pub args: Vec<serde_json::Value>,
}

impl ContractCall {
    /// Build a call against `contract` invoking `method` with `args`.
    #[must_use]
    pub fn new(contract: impl Into<LedgerAddress>, method: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            method: method.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, value: serde_json::Value) -> Self {
        self.args.push(value);
        self
    }
}

/// On-ledger status of a document, as returned by a registry query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LedgerDocumentStatus {
    /// The document hash is known to the registry contract.
    pub exists: bool,
    /// The registry reports the document as revoked.
    pub revoked: bool,
    /// Issuing identity, when known.
    pub issuer: Option<LedgerAddress>,
    /// Current holder, when known.
    pub current_holder: Option<LedgerAddress>,
    /// Expiry timestamp recorded on the ledger.
    pub expiry: Option<Timestamp>,
}

impl LedgerDocumentStatus {
    /// Returns true if the ledger expiry has passed.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiry.is_some_and(|e| now > e)
    }
}
