//! # Registry Runtime
//!
//! Library side of the registry process: configuration loading and the
//! wiring that assembles the bus, store, ledger client, job queues,
//! verification aggregator and reconciler. The binary in `main.rs` is a
//! thin shell around [`RegistryRuntime`].

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod runtime;

pub use config::RuntimeConfig;
pub use runtime::RegistryRuntime;
