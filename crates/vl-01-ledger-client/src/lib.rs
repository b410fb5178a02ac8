//! # Ledger Client Subsystem
//!
//! Signs and submits ledger transactions for the registry's single signing
//! identity. This crate is the only path to ledger writes: every submission
//! funnels through [`service::TransactionSubmitter`], which allocates a
//! nonce from the [`domain::nonce::NonceSequencer`] and prices gas through
//! the [`domain::gas::GasPriceCache`]. Bypassing the submitter is the
//! primary source of nonce-too-low failures, so nothing else in the
//! workspace holds a `LedgerProvider` write path.
//!
//! ## Module Structure
//!
//! ```text
//! ports/    - LedgerProvider and TimeSource capability traits
//! domain/   - NonceSequencer, GasPriceCache
//! adapters/ - MockLedger (in-memory ledger for tests and local runs)
//! service   - TransactionSubmitter (create/verify/transfer calls)
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod contract;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::MockLedger;
pub use domain::gas::GasPriceCache;
pub use domain::nonce::NonceSequencer;
pub use ports::outbound::{
    LedgerProvider, MockClock, SubmissionReceipt, SubmitParams, SystemClock, TimeSource,
};
pub use service::{
    ConfirmationReceipt, CreateDocumentCall, CreationReceipt, SubmitterConfig,
    TransactionSubmitter,
};
