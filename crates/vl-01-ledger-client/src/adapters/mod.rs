//! Adapters implementing the ledger capability.

pub mod mock;

pub use mock::MockLedger;
