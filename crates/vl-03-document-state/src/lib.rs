//! # Document State Subsystem
//!
//! Enforces the document status state machine over the cached projection:
//!
//! ```text
//! Draft ──→ Active ──→ PendingVerification ──→ Verified
//!   │          │               │                  │
//!   │          │               └──→ Error         └──→ PendingTransfer
//!   │          └──→ PendingTransfer ──→ Transferred
//!   └──→ Error
//!
//! any state ──→ Revoked (terminal)
//! ```
//!
//! ## Invariants
//!
//! - A document in `PendingVerification`/`PendingTransfer` has exactly one
//!   outstanding job; entry into those states goes through an atomic
//!   compare-and-set on status, so a second enqueue loses the race and is
//!   rejected instead of corrupting state.
//! - A document in `Error` carries a non-empty `last_error`.
//! - Revocation wins ties: a revoked signal forces `Revoked` regardless of
//!   any concurrent transition.
//!
//! The reconciler may race a job's own completion handler, so every
//! confirmation application is idempotent: re-applying the same event is a
//! no-op detected by the current status and an already-set transaction
//! hash.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::InMemoryDocumentStore;
pub use domain::state::{is_legal_transition, DocumentStateMachine};
pub use ports::store::DocumentStore;
