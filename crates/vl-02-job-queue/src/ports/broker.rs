//! Outbound (Driven) port for job brokering.
//!
//! Delivery contract: at-least-once. A dequeued job is leased for the
//! broker's visibility timeout; a worker that dies without acking loses the
//! lease and the job is redelivered. Consumers must tolerate redelivery.

use std::time::Duration;

use async_trait::async_trait;
use shared_types::RegistryError;
use uuid::Uuid;

use crate::domain::job::{Job, JobKind};

/// Durable per-kind job queues with leases.
#[async_trait]
pub trait JobBroker: Send + Sync {
    /// Add a queued job to its kind's queue.
    async fn enqueue(&self, job: Job) -> Result<(), RegistryError>;

    /// Lease the next queued job of `kind`, if any.
    ///
    /// The returned job is Active with `attempts_made` already counting
    /// this execution. Expired leases are reclaimed before the queue head
    /// is considered.
    async fn dequeue(&self, kind: JobKind) -> Result<Option<Job>, RegistryError>;

    /// Complete a leased job with its result.
    async fn ack(
        &self,
        kind: JobKind,
        job_id: Uuid,
        result: serde_json::Value,
    ) -> Result<(), RegistryError>;

    /// Fail a leased job. `Some(delay)` returns it to the queue, eligible
    /// again once `delay` has elapsed; `None` leaves it terminally Failed.
    ///
    /// The delay must not block delivery of other queued jobs of the same
    /// kind.
    async fn nack(
        &self,
        kind: JobKind,
        job_id: Uuid,
        reason: String,
        requeue: Option<Duration>,
    ) -> Result<(), RegistryError>;

    /// Look up a job by id within its kind's queue.
    async fn get(&self, kind: JobKind, job_id: Uuid) -> Result<Option<Job>, RegistryError>;
}
