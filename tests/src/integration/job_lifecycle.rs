//! Job queue flows: enqueue prechecks, bounded retry, terminal failure,
//! and the outstanding-job guarantee under concurrency.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_types::{DocumentStatus, DocumentType, LedgerError, RegistryError};
    use vl_02_job_queue::{EnqueueOutcome, JobKind, JobState};

    use crate::integration::fixtures::Harness;

    #[tokio::test]
    async fn test_creation_flow_activates_document() {
        let h = Harness::new();
        h.ledger.set_next_block(100);
        let record = h.seed_draft("cafe01", DocumentType::Transferable).await;

        let outcome = h.queue.enqueue_creation(record.id).await.unwrap();
        let EnqueueOutcome::Enqueued(handle) = outcome else {
            panic!("expected a queued creation job");
        };
        h.drain(JobKind::Creation).await;

        let doc = h.state.require(&record.id).await.unwrap();
        assert_eq!(doc.status, DocumentStatus::Active);
        assert_eq!(doc.block_number, Some(100));
        let tx_hash = doc.transaction_hash.expect("creation must record a tx hash");
        assert!(tx_hash.starts_with("0x"));

        let report = h
            .queue
            .get_status("creation", &handle.job_id.to_string())
            .await
            .unwrap();
        assert_eq!(report.state, JobState::Completed);
        assert_eq!(report.progress, 100);
    }

    #[tokio::test]
    async fn test_two_failures_then_success_completes_on_third_attempt() {
        let h = Harness::new();
        let record = h.seed_draft("cafe01", DocumentType::Verifiable).await;
        h.ledger
            .push_submit_failure(LedgerError::Unavailable("rpc down".into()));
        h.ledger
            .push_submit_failure(LedgerError::InsufficientGas {
                supplied: 50_000,
                required: 90_000,
            });

        let EnqueueOutcome::Enqueued(handle) = h.queue.enqueue_creation(record.id).await.unwrap()
        else {
            panic!("expected a queued creation job");
        };
        h.drain(JobKind::Creation).await;

        let report = h
            .queue
            .get_status("creation", &handle.job_id.to_string())
            .await
            .unwrap();
        assert_eq!(report.state, JobState::Completed);
        assert_eq!(report.attempts_made, 3);
        assert_eq!(
            h.state.require(&record.id).await.unwrap().status,
            DocumentStatus::Active
        );
    }

    #[tokio::test]
    async fn test_three_failures_exhaust_job_and_error_document() {
        let h = Harness::new();
        let record = h.seed_draft("cafe01", DocumentType::Verifiable).await;
        for _ in 0..3 {
            h.ledger
                .push_submit_failure(LedgerError::Unavailable("rpc down".into()));
        }

        let EnqueueOutcome::Enqueued(handle) = h.queue.enqueue_creation(record.id).await.unwrap()
        else {
            panic!("expected a queued creation job");
        };
        h.drain(JobKind::Creation).await;

        let report = h
            .queue
            .get_status("creation", &handle.job_id.to_string())
            .await
            .unwrap();
        assert_eq!(report.state, JobState::Failed);
        assert_eq!(report.attempts_made, 3);
        assert!(report.failure_reason.is_some());

        let doc = h.state.require(&record.id).await.unwrap();
        assert_eq!(doc.status, DocumentStatus::Error);
        assert!(doc.last_error.as_deref().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn test_error_document_can_be_requeued() {
        let h = Harness::new();
        let record = h.seed_draft("cafe01", DocumentType::Verifiable).await;
        for _ in 0..3 {
            h.ledger
                .push_submit_failure(LedgerError::Unavailable("rpc down".into()));
        }
        h.queue.enqueue_creation(record.id).await.unwrap();
        h.drain(JobKind::Creation).await;
        assert_eq!(
            h.state.require(&record.id).await.unwrap().status,
            DocumentStatus::Error
        );

        // The outage is over; a fresh job succeeds.
        h.queue.enqueue_creation(record.id).await.unwrap();
        h.drain(JobKind::Creation).await;
        assert_eq!(
            h.state.require(&record.id).await.unwrap().status,
            DocumentStatus::Active
        );
    }

    #[tokio::test]
    async fn test_transfer_of_verifiable_document_rejected() {
        let h = Harness::new();
        let record = h.seed_draft("cafe01", DocumentType::Verifiable).await;
        h.queue.enqueue_creation(record.id).await.unwrap();
        h.drain(JobKind::Creation).await;

        let err = h
            .queue
            .enqueue_transfer(record.id, "0x52908400098527886E0F7030069857D2E4169EE7".into())
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::NonTransferableDocument);
        assert_eq!(h.broker.queued_len(JobKind::Transfer).await, 0);
        // Status untouched by the rejected request.
        assert_eq!(
            h.state.require(&record.id).await.unwrap().status,
            DocumentStatus::Active
        );
    }

    #[tokio::test]
    async fn test_full_transfer_flow_appends_endorsement() {
        let h = Harness::new();
        let record = h.seed_draft("cafe01", DocumentType::Transferable).await;
        h.queue.enqueue_creation(record.id).await.unwrap();
        h.drain(JobKind::Creation).await;

        let holder = "0x52908400098527886E0F7030069857D2E4169EE7".to_string();
        h.queue
            .enqueue_transfer(record.id, holder.clone())
            .await
            .unwrap();
        assert_eq!(
            h.state.require(&record.id).await.unwrap().status,
            DocumentStatus::PendingTransfer
        );
        h.drain(JobKind::Transfer).await;

        let doc = h.state.require(&record.id).await.unwrap();
        assert_eq!(doc.status, DocumentStatus::Transferred);
        assert_eq!(doc.endorsement_chain, vec![holder]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_at_most_one_outstanding_job_under_concurrent_enqueues() {
        let h = Arc::new(Harness::new());
        let record = h.seed_draft("cafe01", DocumentType::Transferable).await;
        h.queue.enqueue_creation(record.id).await.unwrap();
        h.drain(JobKind::Creation).await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let h = h.clone();
            let id = record.id;
            handles.push(tokio::spawn(async move {
                h.queue.enqueue_verification(id, None, None).await.is_ok()
            }));
        }
        let accepted = futures::future::join_all(handles)
            .await
            .into_iter()
            .filter(|r| *r.as_ref().unwrap())
            .count();

        assert_eq!(accepted, 1, "exactly one enqueue may win the status race");
        assert_eq!(h.broker.queued_len(JobKind::Verification).await, 1);
    }

    #[tokio::test]
    async fn test_verification_flow_records_tx_hash() {
        let h = Harness::new();
        let record = h.seed_draft("cafe01", DocumentType::Verifiable).await;
        h.queue.enqueue_creation(record.id).await.unwrap();
        h.drain(JobKind::Creation).await;

        h.queue
            .enqueue_verification(record.id, Some("0xCAFE01"), None)
            .await
            .unwrap();
        h.drain(JobKind::Verification).await;

        let doc = h.state.require(&record.id).await.unwrap();
        assert_eq!(doc.status, DocumentStatus::Verified);
        assert!(doc.verification_tx_hash.is_some());
        assert!(doc.verification_block.is_some());

        // Re-verifying a Verified document succeeds without a job.
        let outcome = h
            .queue
            .enqueue_verification(record.id, None, None)
            .await
            .unwrap();
        assert_eq!(outcome, EnqueueOutcome::AlreadyVerified);
    }
}
