//! # Job Queue Subsystem
//!
//! Every ledger write goes through a job: creation, verification and
//! transfer each have their own queue so a failing stream never starves the
//! others. Delivery is at-least-once with a visibility timeout; execution
//! is guarded by idempotence checks on the cached record, so redelivery is
//! safe.
//!
//! ```text
//! enqueue ──→ [JobBroker per-kind queue] ──→ JobWorker ──→ TransactionSubmitter
//!                      ▲                        │
//!                      └──── nack / backoff ────┘ (transient, attempts left)
//! ```
//!
//! Retry is bounded: transient failures are requeued with a fixed backoff
//! until the attempt limit; a permanent failure or exhausted attempts marks
//! the job Failed and moves the document to `Error` with the last failure
//! message.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryBroker;
pub use domain::job::{Job, JobKind, JobPayload, JobState, JobStatusReport};
pub use domain::retry::RetryPolicy;
pub use ports::broker::JobBroker;
pub use service::queue::{EnqueueOutcome, JobHandle, JobQueue};
pub use service::worker::JobWorker;
