//! Capability traits consumed by the ledger client.

pub mod outbound;
