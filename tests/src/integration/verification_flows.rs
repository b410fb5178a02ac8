//! Verification aggregation flows across the cache, ledger and resolvers.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_types::{DocumentStatus, DocumentType, LedgerDocumentStatus, Signal};
    use vl_01_ledger_client::{MockClock, TimeSource};
    use vl_02_job_queue::JobKind;
    use vl_04_verification::{
        expected_txt_record, IdentityProof, Issuer, MockDidResolver, MockDnsResolver,
        RecordingAuditSink, SignedPayload, VerificationAggregator, VerificationRequest,
        VerifierConfig,
    };

    use crate::integration::fixtures::Harness;

    struct VerifyHarness {
        h: Harness,
        dns: Arc<MockDnsResolver>,
        did: Arc<MockDidResolver>,
        audit: Arc<RecordingAuditSink>,
        aggregator: VerificationAggregator<
            vl_03_document_state::InMemoryDocumentStore,
            vl_04_verification::ProviderLedgerQuery<vl_01_ledger_client::MockLedger>,
        >,
    }

    fn verify_harness() -> VerifyHarness {
        let h = Harness::new();
        let dns = Arc::new(MockDnsResolver::new());
        let did = Arc::new(MockDidResolver::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let aggregator = VerificationAggregator::over_provider(
            h.state.clone(),
            h.ledger.clone(),
            "0xregistry",
            did.clone(),
            dns.clone(),
            audit.clone(),
            Arc::new(MockClock::new(1_700_000_000)) as Arc<dyn TimeSource>,
            VerifierConfig::default(),
        );
        VerifyHarness {
            h,
            dns,
            did,
            audit,
            aggregator,
        }
    }

    fn dns_payload(hash: &str, location: &str) -> SignedPayload {
        SignedPayload {
            version: "1.0".into(),
            issuers: vec![Issuer {
                name: Some("Acme Registry".into()),
                identity_proof: Some(IdentityProof::DnsTxt {
                    location: location.into(),
                }),
            }],
            target_hash: hash.into(),
        }
    }

    #[tokio::test]
    async fn test_revocation_forces_unverified_despite_perfect_signals() {
        let v = verify_harness();
        v.h.ledger.register_document(
            "cafe01",
            LedgerDocumentStatus {
                exists: true,
                revoked: true,
                ..Default::default()
            },
        );
        v.dns
            .publish("example.com", vec![expected_txt_record(51, "cafe01")]);

        let verdict = v
            .aggregator
            .verify(VerificationRequest::for_payload(dns_payload(
                "cafe01",
                "example.com",
            )))
            .await
            .unwrap();
        assert!(verdict.on_ledger);
        assert_eq!(verdict.dns_verified, Signal::Passed);
        assert!(verdict.revoked);
        assert!(!verdict.verified());
    }

    #[tokio::test]
    async fn test_hash_only_verification_depends_on_ledger_alone() {
        let v = verify_harness();
        v.h.ledger.register_document(
            "cafe01",
            LedgerDocumentStatus {
                exists: true,
                ..Default::default()
            },
        );

        let verdict = v
            .aggregator
            .verify(VerificationRequest::for_hash("cafe01"))
            .await
            .unwrap();
        assert_eq!(verdict.did_verified, Signal::Skipped);
        assert_eq!(verdict.dns_verified, Signal::Skipped);
        assert!(verdict.verified());

        v.h.ledger.revoke_document("cafe01");
        let verdict = v
            .aggregator
            .verify(VerificationRequest::for_hash("cafe01"))
            .await
            .unwrap();
        assert!(!verdict.verified());
    }

    #[tokio::test]
    async fn test_created_document_verifies_end_to_end() {
        let v = verify_harness();
        let record = v.h.seed_draft("cafe01", DocumentType::Verifiable).await;
        v.h.queue.enqueue_creation(record.id).await.unwrap();
        v.h.drain(JobKind::Creation).await;

        // Creation registered the hash on the mock ledger; a verdict now
        // sees it and promotes the cached record.
        v.h.state
            .begin_job(&record.id, DocumentStatus::PendingVerification)
            .await
            .unwrap();
        let verdict = v
            .aggregator
            .verify(VerificationRequest::for_hash("cafe01").by("auditor-1"))
            .await
            .unwrap();
        assert!(verdict.in_cache);
        assert!(verdict.on_ledger);
        assert!(verdict.verified());

        let doc = v.h.state.require(&record.id).await.unwrap();
        assert_eq!(doc.status, DocumentStatus::Verified);
        assert_eq!(doc.verification_details.on_ledger, Signal::Passed);

        let entries = v.audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].requester, "auditor-1");
        assert_eq!(entries[0].document_id, Some(record.id));
        assert!(entries[0].successful);
    }

    #[tokio::test]
    async fn test_failed_did_resolution_degrades_not_aborts() {
        let v = verify_harness();
        v.h.ledger.register_document(
            "cafe01",
            LedgerDocumentStatus {
                exists: true,
                ..Default::default()
            },
        );
        v.did.fail_resolution(true);

        let payload = SignedPayload {
            version: "1.0".into(),
            issuers: vec![Issuer {
                name: None,
                identity_proof: Some(IdentityProof::Did {
                    did: "did:ethr:0xabc".into(),
                }),
            }],
            target_hash: "cafe01".into(),
        };
        let verdict = v
            .aggregator
            .verify(VerificationRequest::for_payload(payload))
            .await
            .unwrap();
        assert_eq!(verdict.did_verified, Signal::Failed);
        assert!(!verdict.verified());
        assert!(!verdict.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_expired_ledger_document_is_flagged() {
        let v = verify_harness();
        v.h.ledger.register_document(
            "cafe01",
            LedgerDocumentStatus {
                exists: true,
                expiry: Some(1_600_000_000),
                ..Default::default()
            },
        );

        let verdict = v
            .aggregator
            .verify(VerificationRequest::for_hash("cafe01"))
            .await
            .unwrap();
        assert_eq!(verdict.expired, Some(true));
    }
}
