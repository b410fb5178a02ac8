//! # Event Reconciler Subsystem
//!
//! Folds the ledger event stream into the cached document projection. The
//! job that caused an event usually applies the transition itself; the
//! reconciler covers everything else: events observed out-of-band,
//! redelivered events, and the race where reconciliation beats the job's
//! own completion handler. Application is idempotent, so whoever arrives
//! second is a no-op.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod service;

pub use service::{EventReconciler, ReconcileOutcome};
