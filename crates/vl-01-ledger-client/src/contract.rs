//! Registry contract method names.
//!
//! Shared between the submitter (building calls) and the adapters
//! (dispatching them).

/// Create a document entry. Args: category, document hash, expiry.
pub const CREATE: &str = "createDocument";

/// Record an on-ledger verification. Args: ledger id.
pub const VERIFY: &str = "verifyDocument";

/// Endorse ownership to a new holder. Args: ledger id, holder address.
pub const TRANSFER: &str = "transferDocument";

/// Revoke a document. Args: ledger id.
pub const REVOKE: &str = "revokeDocument";

/// Read-only document status lookup. Args: document hash.
pub const GET: &str = "getDocument";
