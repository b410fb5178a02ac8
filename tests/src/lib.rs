//! # VeriLedger Test Suite
//!
//! Unified test crate for cross-subsystem scenarios:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs       # Shared harness wiring all subsystems
//!     ├── nonce_sequencing.rs
//!     ├── job_lifecycle.rs
//!     ├── reconciliation.rs
//!     └── verification_flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vl-tests
//! cargo test -p vl-tests integration::job_lifecycle
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
