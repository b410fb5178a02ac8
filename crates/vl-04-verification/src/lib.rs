//! # Verification Subsystem
//!
//! Aggregates independent verification signals into a single verdict:
//!
//! ```text
//! request ──→ cache lookup ──→ identity proofs ──→ ledger presence ──→ verdict
//!               (by hash)       (DID / DNS-TXT)     (+ revocation)       │
//!                                                                       ▼
//!                                                         audit (best effort)
//! ```
//!
//! Signal failures degrade, they do not abort: an unreachable resolver
//! yields a Failed signal with a diagnostic, an unreachable ledger yields
//! `on_ledger = false`, and the aggregation always completes. The only
//! error return is a request carrying neither a hash nor a payload.
//!
//! Revocation wins: a revoked document is never verified, whatever the
//! other signals say.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{MockDidResolver, MockDnsResolver, RecordingAuditSink};
pub use domain::payload::{expected_txt_record, IdentityProof, Issuer, SignedPayload};
pub use domain::verdict::{DocumentSummary, VerificationVerdict};
pub use ports::audit::AuditSink;
pub use ports::ledger::{LedgerQuery, ProviderLedgerQuery};
pub use ports::resolver::{DidResolver, DnsResolver};
pub use service::{VerificationAggregator, VerificationRequest, VerifierConfig};
