//! In-memory job broker.
//!
//! One queue per kind behind its own mutex, so contention on one stream
//! never blocks another. Leases are tracked with a visibility timeout;
//! reclaiming expired leases happens lazily on the next dequeue of the same
//! kind.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use shared_types::RegistryError;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;
use vl_telemetry::JOB_ATTEMPTS;

use crate::domain::job::{Job, JobKind, JobState};
use crate::ports::broker::JobBroker;

/// Lease duration before an unacked job is considered abandoned.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Default)]
struct KindQueue {
    /// FIFO of queued job ids.
    ready: VecDeque<Uuid>,
    /// Earliest delivery time for jobs requeued with a backoff delay.
    ready_at: HashMap<Uuid, Instant>,
    /// Lease start per active job.
    leases: HashMap<Uuid, Instant>,
    /// All jobs ever enqueued on this kind, terminal ones included.
    jobs: HashMap<Uuid, Job>,
}

impl KindQueue {
    /// Return expired leases to the front of the queue.
    fn reclaim_expired(&mut self, visibility: Duration) {
        let now = Instant::now();
        let expired: Vec<Uuid> = self
            .leases
            .iter()
            .filter(|(_, leased_at)| now.duration_since(**leased_at) >= visibility)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            self.leases.remove(&id);
            if let Some(job) = self.jobs.get_mut(&id) {
                warn!(job_id = %id, kind = %job.kind, "lease expired, redelivering job");
                job.state = JobState::Queued;
                self.ready.push_front(id);
            }
        }
    }
}

/// Thread-safe in-memory implementation of [`JobBroker`].
pub struct InMemoryBroker {
    visibility: Duration,
    creation: Mutex<KindQueue>,
    verification: Mutex<KindQueue>,
    transfer: Mutex<KindQueue>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_TIMEOUT)
    }
}

impl InMemoryBroker {
    #[must_use]
    pub fn new(visibility: Duration) -> Self {
        Self {
            visibility,
            creation: Mutex::new(KindQueue::default()),
            verification: Mutex::new(KindQueue::default()),
            transfer: Mutex::new(KindQueue::default()),
        }
    }

    fn queue(&self, kind: JobKind) -> &Mutex<KindQueue> {
        match kind {
            JobKind::Creation => &self.creation,
            JobKind::Verification => &self.verification,
            JobKind::Transfer => &self.transfer,
        }
    }

    /// Number of queued (not leased, not terminal) jobs of `kind`.
    pub async fn queued_len(&self, kind: JobKind) -> usize {
        self.queue(kind).lock().await.ready.len()
    }
}

#[async_trait]
impl JobBroker for InMemoryBroker {
    async fn enqueue(&self, job: Job) -> Result<(), RegistryError> {
        let mut queue = self.queue(job.kind).lock().await;
        debug!(job_id = %job.id, kind = %job.kind, "job enqueued");
        queue.ready.push_back(job.id);
        queue.jobs.insert(job.id, job);
        Ok(())
    }

    async fn dequeue(&self, kind: JobKind) -> Result<Option<Job>, RegistryError> {
        let mut queue = self.queue(kind).lock().await;
        queue.reclaim_expired(self.visibility);
        // Skip jobs still inside their backoff delay; they must not block
        // the ones queued behind them.
        let now = Instant::now();
        let Some(pos) = queue
            .ready
            .iter()
            .position(|id| queue.ready_at.get(id).map_or(true, |at| *at <= now))
        else {
            return Ok(None);
        };
        let Some(id) = queue.ready.remove(pos) else {
            return Ok(None);
        };
        queue.ready_at.remove(&id);
        queue.leases.insert(id, Instant::now());
        let job = queue
            .jobs
            .get_mut(&id)
            .ok_or_else(|| RegistryError::JobNotFound(id.to_string()))?;
        job.state = JobState::Active;
        job.attempts_made += 1;
        JOB_ATTEMPTS.inc();
        Ok(Some(job.clone()))
    }

    async fn ack(
        &self,
        kind: JobKind,
        job_id: Uuid,
        result: serde_json::Value,
    ) -> Result<(), RegistryError> {
        let mut queue = self.queue(kind).lock().await;
        queue.leases.remove(&job_id);
        let job = queue
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| RegistryError::JobNotFound(job_id.to_string()))?;
        job.state = JobState::Completed;
        job.progress = 100;
        job.result = Some(result);
        job.failure_reason = None;
        Ok(())
    }

    async fn nack(
        &self,
        kind: JobKind,
        job_id: Uuid,
        reason: String,
        requeue: Option<Duration>,
    ) -> Result<(), RegistryError> {
        let mut queue = self.queue(kind).lock().await;
        queue.leases.remove(&job_id);
        let job = queue
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| RegistryError::JobNotFound(job_id.to_string()))?;
        job.failure_reason = Some(reason);
        match requeue {
            Some(delay) => {
                job.state = JobState::Queued;
                if !delay.is_zero() {
                    queue.ready_at.insert(job_id, Instant::now() + delay);
                }
                queue.ready.push_back(job_id);
            }
            None => job.state = JobState::Failed,
        }
        Ok(())
    }

    async fn get(&self, kind: JobKind, job_id: Uuid) -> Result<Option<Job>, RegistryError> {
        let queue = self.queue(kind).lock().await;
        Ok(queue.jobs.get(&job_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::JobPayload;

    fn verification_job() -> Job {
        Job::new(
            JobPayload::Verification {
                document_id: Uuid::new_v4(),
                requester: None,
            },
            3,
        )
    }

    #[tokio::test]
    async fn test_fifo_per_kind() {
        let broker = InMemoryBroker::default();
        let first = verification_job();
        let second = verification_job();
        broker.enqueue(first.clone()).await.unwrap();
        broker.enqueue(second.clone()).await.unwrap();

        let a = broker.dequeue(JobKind::Verification).await.unwrap().unwrap();
        let b = broker.dequeue(JobKind::Verification).await.unwrap().unwrap();
        assert_eq!(a.id, first.id);
        assert_eq!(b.id, second.id);
        assert!(broker.dequeue(JobKind::Verification).await.unwrap().is_none());
        // Other kinds are unaffected.
        assert!(broker.dequeue(JobKind::Creation).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dequeue_counts_attempt() {
        let broker = InMemoryBroker::default();
        broker.enqueue(verification_job()).await.unwrap();

        let job = broker.dequeue(JobKind::Verification).await.unwrap().unwrap();
        assert_eq!(job.state, JobState::Active);
        assert_eq!(job.attempts_made, 1);
    }

    #[tokio::test]
    async fn test_expired_lease_is_redelivered() {
        let broker = InMemoryBroker::new(Duration::ZERO);
        broker.enqueue(verification_job()).await.unwrap();

        let first = broker.dequeue(JobKind::Verification).await.unwrap().unwrap();
        // Lease expired immediately; same job comes back with a new attempt.
        let again = broker.dequeue(JobKind::Verification).await.unwrap().unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(again.attempts_made, 2);
    }

    #[tokio::test]
    async fn test_ack_completes_and_stops_redelivery() {
        let broker = InMemoryBroker::new(Duration::ZERO);
        broker.enqueue(verification_job()).await.unwrap();

        let job = broker.dequeue(JobKind::Verification).await.unwrap().unwrap();
        broker
            .ack(JobKind::Verification, job.id, serde_json::json!({"ok": true}))
            .await
            .unwrap();

        assert!(broker.dequeue(JobKind::Verification).await.unwrap().is_none());
        let stored = broker
            .get(JobKind::Verification, job.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.state, JobState::Completed);
        assert_eq!(stored.progress, 100);
    }

    #[tokio::test]
    async fn test_delayed_requeue_does_not_block_the_queue() {
        let broker = InMemoryBroker::default();
        let delayed = verification_job();
        broker.enqueue(delayed.clone()).await.unwrap();

        let leased = broker.dequeue(JobKind::Verification).await.unwrap().unwrap();
        broker
            .nack(
                JobKind::Verification,
                leased.id,
                "gas spike".into(),
                Some(Duration::from_millis(50)),
            )
            .await
            .unwrap();

        // A job queued behind the delayed one is still deliverable.
        let other = verification_job();
        broker.enqueue(other.clone()).await.unwrap();
        let next = broker.dequeue(JobKind::Verification).await.unwrap().unwrap();
        assert_eq!(next.id, other.id);
        assert!(broker.dequeue(JobKind::Verification).await.unwrap().is_none());

        // Once the delay elapses the job comes back with a new attempt.
        tokio::time::sleep(Duration::from_millis(60)).await;
        let retried = broker.dequeue(JobKind::Verification).await.unwrap().unwrap();
        assert_eq!(retried.id, delayed.id);
        assert_eq!(retried.attempts_made, 2);
    }

    #[tokio::test]
    async fn test_nack_requeue_and_terminal() {
        let broker = InMemoryBroker::default();
        broker.enqueue(verification_job()).await.unwrap();

        let job = broker.dequeue(JobKind::Verification).await.unwrap().unwrap();
        broker
            .nack(
                JobKind::Verification,
                job.id,
                "gas spike".into(),
                Some(Duration::ZERO),
            )
            .await
            .unwrap();
        let retried = broker.dequeue(JobKind::Verification).await.unwrap().unwrap();
        assert_eq!(retried.attempts_made, 2);

        broker
            .nack(JobKind::Verification, job.id, "reverted".into(), None)
            .await
            .unwrap();
        let stored = broker
            .get(JobKind::Verification, job.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.state, JobState::Failed);
        assert_eq!(stored.failure_reason.as_deref(), Some("reverted"));
    }
}
