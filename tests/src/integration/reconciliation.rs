//! Reconciler flows: events racing job completions, redelivery, and
//! out-of-band revocation.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shared_bus::{EventFilter, LedgerEvent};
    use shared_types::{DocumentStatus, DocumentType};
    use tokio::sync::watch;
    use vl_02_job_queue::JobKind;
    use vl_05_reconciler::ReconcileOutcome;

    use crate::integration::fixtures::Harness;

    fn created(hash: &str) -> LedgerEvent {
        LedgerEvent::DocumentCreated {
            ledger_id: "42".into(),
            document_hash: hash.into(),
            tx_hash: "0xfeed".into(),
            block_number: 100,
        }
    }

    #[tokio::test]
    async fn test_double_application_leaves_projection_unchanged() {
        let h = Harness::new();
        let record = h.seed_draft("cafe01", DocumentType::Verifiable).await;

        assert_eq!(
            h.reconciler.apply(&created("cafe01")).await.unwrap(),
            ReconcileOutcome::Applied
        );
        let after_first = h.state.require(&record.id).await.unwrap();

        assert_eq!(
            h.reconciler.apply(&created("cafe01")).await.unwrap(),
            ReconcileOutcome::AlreadyApplied
        );
        let after_second = h.state.require(&record.id).await.unwrap();

        assert_eq!(after_first.status, DocumentStatus::Active);
        assert_eq!(after_second.status, after_first.status);
        assert_eq!(after_second.transaction_hash, after_first.transaction_hash);
        assert_eq!(after_second.block_number, after_first.block_number);
        assert_eq!(after_second.ledger_id, after_first.ledger_id);
    }

    #[tokio::test]
    async fn test_reconciler_noop_after_job_completion() {
        let h = Harness::new();
        let record = h.seed_draft("cafe01", DocumentType::Verifiable).await;
        h.queue.enqueue_creation(record.id).await.unwrap();
        h.drain(JobKind::Creation).await;
        let confirmed = h.state.require(&record.id).await.unwrap();

        // The ledger event for the same creation arrives afterwards.
        let event = LedgerEvent::DocumentCreated {
            ledger_id: confirmed.ledger_id.clone().unwrap(),
            document_hash: "cafe01".into(),
            tx_hash: confirmed.transaction_hash.clone().unwrap(),
            block_number: confirmed.block_number.unwrap(),
        };
        assert_eq!(
            h.reconciler.apply(&event).await.unwrap(),
            ReconcileOutcome::AlreadyApplied
        );
        let after = h.state.require(&record.id).await.unwrap();
        assert_eq!(after.transaction_hash, confirmed.transaction_hash);
    }

    #[tokio::test]
    async fn test_out_of_band_revocation_reaches_projection() {
        let h = Harness::new();
        let record = h.seed_draft("cafe01", DocumentType::Verifiable).await;
        h.queue.enqueue_creation(record.id).await.unwrap();
        h.drain(JobKind::Creation).await;
        let ledger_id = h
            .state
            .require(&record.id)
            .await
            .unwrap()
            .ledger_id
            .unwrap();

        let event = LedgerEvent::DocumentRevoked {
            ledger_id,
            tx_hash: "0xrevoke".into(),
            block_number: 200,
        };
        assert_eq!(
            h.reconciler.apply(&event).await.unwrap(),
            ReconcileOutcome::Applied
        );
        assert_eq!(
            h.state.require(&record.id).await.unwrap().status,
            DocumentStatus::Revoked
        );
    }

    #[tokio::test]
    async fn test_run_loop_consumes_bus_events() {
        let h = Harness::new();
        let record = h.seed_draft("cafe01", DocumentType::Verifiable).await;

        let subscription = h.bus.subscribe(EventFilter::all());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let reconciler = {
            // Rebuild over the same shared state so the task owns it.
            use std::sync::Arc;
            use vl_01_ledger_client::TimeSource;
            vl_05_reconciler::EventReconciler::new(
                h.state.clone(),
                h.clock.clone() as Arc<dyn TimeSource>,
            )
        };
        let task = tokio::spawn(async move {
            reconciler.run(subscription, shutdown_rx).await;
        });

        use shared_bus::EventPublisher;
        h.bus.publish(created("cafe01")).await;

        let mut applied = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if h.state.require(&record.id).await.unwrap().status == DocumentStatus::Active {
                applied = true;
                break;
            }
        }
        assert!(applied, "published event never reached the projection");

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
