//! # Shared Types Crate
//!
//! This crate contains all domain entities and the error taxonomy shared
//! across the VeriLedger subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Status via State Machine**: `DocumentStatus` is only mutated through
//!   the document state machine; other subsystems treat it as read-only.
//! - **Append-Only Audit**: `VerificationAuditEntry` is immutable once
//!   written and never deleted by the core.

pub mod audit;
pub mod entities;
pub mod errors;
pub mod hash;

pub use audit::VerificationAuditEntry;
pub use entities::*;
pub use errors::*;
pub use hash::{fingerprint_metadata, normalize_hash};
