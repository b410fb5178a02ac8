//! Concurrency properties of nonce allocation.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use rand::Rng;
    use vl_01_ledger_client::{MockLedger, NonceSequencer};

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_allocation_is_distinct_and_contiguous() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_pending_count(250);
        let sequencer = Arc::new(NonceSequencer::new(ledger, "0xsigner".into()));
        let allocated: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..64 {
            let sequencer = sequencer.clone();
            let allocated = allocated.clone();
            handles.push(tokio::spawn(async move {
                // Jitter so allocations interleave rather than serialize
                // behind spawn order.
                let delay = rand::thread_rng().gen_range(0..5);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                let nonce = sequencer.allocate().await.expect("allocation failed");
                allocated.lock().push(nonce);
            }));
        }
        for handle in handles {
            handle.await.expect("allocation task panicked");
        }

        let mut nonces = allocated.lock().clone();
        nonces.sort_unstable();
        let expected: Vec<u64> = (250..250 + 64).collect();
        assert_eq!(nonces, expected, "nonces must be distinct and contiguous");
    }

    #[tokio::test]
    async fn test_allocation_tracks_external_submissions() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_pending_count(5);
        let sequencer = NonceSequencer::new(ledger.clone(), "0xsigner".into());

        assert_eq!(sequencer.allocate().await.unwrap(), 5);
        assert_eq!(sequencer.allocate().await.unwrap(), 6);

        // Another process submitted from the same identity; the pending
        // count jumps past our counter.
        ledger.set_pending_count(20);
        assert_eq!(sequencer.allocate().await.unwrap(), 20);
        assert_eq!(sequencer.allocate().await.unwrap(), 21);
    }

    #[tokio::test]
    async fn test_reset_reseeds_from_ledger() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_pending_count(9);
        let sequencer = NonceSequencer::new(ledger.clone(), "0xsigner".into());

        assert_eq!(sequencer.allocate().await.unwrap(), 9);
        sequencer.reset().await;
        ledger.set_pending_count(14);
        assert_eq!(sequencer.allocate().await.unwrap(), 14);
    }

    #[tokio::test]
    async fn test_unreachable_ledger_blocks_allocation() {
        let ledger = Arc::new(MockLedger::new());
        ledger.fail_pending_count(true);
        let sequencer = NonceSequencer::new(ledger, "0xsigner".into());

        assert!(sequencer.allocate().await.is_err());
    }
}
