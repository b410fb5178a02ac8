//! # Verification Aggregator
//!
//! Runs the four aggregation steps: cache lookup, identity proofs, ledger
//! presence, verdict application. Each step degrades on failure instead of
//! aborting, so one broken collaborator costs a signal, not the whole
//! verification.

use std::sync::Arc;
use std::time::Duration;

use shared_types::{hash::normalize_hash, RegistryError, Signal, VerificationAuditEntry};
use tracing::{debug, info, warn};
use vl_01_ledger_client::{LedgerProvider, TimeSource};
use vl_03_document_state::{DocumentStateMachine, DocumentStore};
use vl_telemetry::VERIFICATIONS_PERFORMED;

use crate::domain::payload::{expected_txt_record, txt_records_match, IdentityProof, SignedPayload};
use crate::domain::verdict::{DocumentSummary, VerificationVerdict};
use crate::ports::audit::AuditSink;
use crate::ports::ledger::{LedgerQuery, ProviderLedgerQuery};
use crate::ports::resolver::{DidResolver, DnsResolver};

/// Verification-side configuration.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Network id the DNS binding records must name.
    pub network_id: u64,
    /// Upper bound on one DID or DNS resolution.
    pub resolution_timeout: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            network_id: 51,
            resolution_timeout: Duration::from_secs(30),
        }
    }
}

/// One verification request: a bare hash, a signed payload, or both.
///
/// A request carrying neither is malformed and is the aggregator's only
/// error return.
#[derive(Debug, Clone, Default)]
pub struct VerificationRequest {
    pub document_hash: Option<String>,
    pub payload: Option<SignedPayload>,
    /// Recorded in the audit trail; anonymous when absent.
    pub requester: Option<String>,
}

impl VerificationRequest {
    #[must_use]
    pub fn for_hash(hash: impl Into<String>) -> Self {
        Self {
            document_hash: Some(hash.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_payload(payload: SignedPayload) -> Self {
        Self {
            payload: Some(payload),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by(mut self, requester: impl Into<String>) -> Self {
        self.requester = Some(requester.into());
        self
    }
}

/// Aggregates verification signals into a [`VerificationVerdict`].
pub struct VerificationAggregator<S: DocumentStore, Q> {
    state: Arc<DocumentStateMachine<S>>,
    ledger_query: Arc<Q>,
    did: Arc<dyn DidResolver>,
    dns: Arc<dyn DnsResolver>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn TimeSource>,
    config: VerifierConfig,
}

impl<S, L> VerificationAggregator<S, ProviderLedgerQuery<L>>
where
    S: DocumentStore,
    L: LedgerProvider,
{
    /// Convenience constructor querying the ledger through `provider`.
    pub fn over_provider(
        state: Arc<DocumentStateMachine<S>>,
        provider: Arc<L>,
        registry_contract: impl Into<String>,
        did: Arc<dyn DidResolver>,
        dns: Arc<dyn DnsResolver>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn TimeSource>,
        config: VerifierConfig,
    ) -> Self {
        Self::new(
            state,
            Arc::new(ProviderLedgerQuery::new(provider, registry_contract.into())),
            did,
            dns,
            audit,
            clock,
            config,
        )
    }
}

impl<S, Q> VerificationAggregator<S, Q>
where
    S: DocumentStore,
    Q: LedgerQuery,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: Arc<DocumentStateMachine<S>>,
        ledger_query: Arc<Q>,
        did: Arc<dyn DidResolver>,
        dns: Arc<dyn DnsResolver>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn TimeSource>,
        config: VerifierConfig,
    ) -> Self {
        Self {
            state,
            ledger_query,
            did,
            dns,
            audit,
            clock,
            config,
        }
    }

    /// Run one verification and return the aggregated verdict.
    pub async fn verify(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationVerdict, RegistryError> {
        let hash = match (&request.document_hash, &request.payload) {
            (Some(hash), _) => normalize_hash(hash),
            (None, Some(payload)) => payload.normalized_hash(),
            (None, None) => {
                return Err(RegistryError::MalformedRequest(
                    "verification needs a document hash or a signed payload".into(),
                ));
            }
        };

        let mut diagnostics = Vec::new();

        // Step 1: cache lookup. A miss is a signal, not an error.
        let cached = self.state.store().find_by_hash(&hash).await?;
        let summary = cached.as_ref().map(|record| DocumentSummary {
            id: record.id,
            status: record.status,
            ledger_id: record.ledger_id.clone(),
        });

        // Step 2: integrity and identity from the payload, when present.
        let document_integrity = match &request.payload {
            Some(payload) => {
                let supplied = request.document_hash.as_deref().map(normalize_hash);
                let reference = supplied
                    .or_else(|| cached.as_ref().map(|r| r.document_hash.clone()))
                    .unwrap_or_else(|| payload.normalized_hash());
                Signal::from_check(payload.normalized_hash() == reference)
            }
            None => Signal::Skipped,
        };
        let (did_verified, dns_verified) = match &request.payload {
            Some(payload) => self.check_identity(payload, &hash, &mut diagnostics).await,
            None => (Signal::Skipped, Signal::Skipped),
        };

        // Step 3: ledger presence and revocation.
        let (on_ledger, revoked, expired) = match self.ledger_query.document_status(&hash).await {
            Ok(status) => {
                let expired = status.expiry.map(|_| status.is_expired(self.clock.now()));
                (status.exists, status.revoked, expired)
            }
            Err(err) => {
                warn!(%err, document_hash = %hash, "ledger status query failed");
                diagnostics.push(format!("ledger status unavailable: {err}"));
                (false, false, None)
            }
        };

        let verdict = VerificationVerdict {
            on_ledger,
            in_cache: cached.is_some(),
            document_integrity,
            did_verified,
            dns_verified,
            revoked,
            expired,
            diagnostics,
            document: summary,
            verified_at: self.clock.now(),
        };
        let verified = verdict.verified();
        VERIFICATIONS_PERFORMED
            .with_label_values(&[if verified { "true" } else { "false" }])
            .inc();
        info!(document_hash = %hash, verified, on_ledger, revoked, "verification completed");

        // Step 4: audit (best effort) and cached-record update.
        self.write_audit(&request, &hash, &verdict).await;
        if let Some(record) = cached {
            self.state
                .apply_verdict(&record.id, verdict.to_details(), self.clock.now())
                .await?;
        }

        Ok(verdict)
    }

    /// Evaluate the identity proofs a payload carries. Proof types absent
    /// from the payload stay Skipped.
    async fn check_identity(
        &self,
        payload: &SignedPayload,
        hash: &str,
        diagnostics: &mut Vec<String>,
    ) -> (Signal, Signal) {
        let mut did_verified = Signal::Skipped;
        let mut dns_verified = Signal::Skipped;

        for proof in payload.identity_proofs() {
            match proof {
                IdentityProof::Did { did } => {
                    let resolved = tokio::time::timeout(
                        self.config.resolution_timeout,
                        self.did.resolve(did),
                    )
                    .await;
                    did_verified = match resolved {
                        Ok(Ok(Some(_))) => Signal::Passed,
                        Ok(Ok(None)) => {
                            diagnostics.push(format!("did not found: {did}"));
                            Signal::Failed
                        }
                        Ok(Err(err)) => {
                            diagnostics.push(format!("did resolution failed: {err}"));
                            Signal::Failed
                        }
                        Err(_) => {
                            diagnostics.push(format!("did resolution timed out: {did}"));
                            Signal::Failed
                        }
                    };
                }
                IdentityProof::DnsTxt { location } => {
                    let expected = expected_txt_record(self.config.network_id, hash);
                    let looked_up = tokio::time::timeout(
                        self.config.resolution_timeout,
                        self.dns.lookup_txt(location),
                    )
                    .await;
                    dns_verified = match looked_up {
                        Ok(Ok(records)) => {
                            let matched = txt_records_match(&records, &expected);
                            if !matched {
                                diagnostics
                                    .push(format!("no binding TXT record at {location}"));
                            }
                            Signal::from_check(matched)
                        }
                        Ok(Err(err)) => {
                            diagnostics.push(format!("dns lookup failed: {err}"));
                            Signal::Failed
                        }
                        Err(_) => {
                            diagnostics.push(format!("dns lookup timed out: {location}"));
                            Signal::Failed
                        }
                    };
                }
            }
        }
        (did_verified, dns_verified)
    }

    /// Record the audit entry; sink failures are logged and swallowed.
    async fn write_audit(
        &self,
        request: &VerificationRequest,
        hash: &str,
        verdict: &VerificationVerdict,
    ) {
        let requester = request.requester.clone().unwrap_or_else(|| "anonymous".into());
        let details = serde_json::to_value(verdict).unwrap_or_default();
        let entry = VerificationAuditEntry::new(
            requester,
            verdict.document.as_ref().map(|d| d.id),
            hash,
            verdict.verified(),
            details,
        );
        if let Err(err) = self.audit.record(entry).await {
            warn!(%err, document_hash = %hash, "audit write failed, continuing");
        } else {
            debug!(document_hash = %hash, "audit entry recorded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockDidResolver, MockDnsResolver, RecordingAuditSink};
    use crate::domain::payload::Issuer;
    use serde_json::json;
    use shared_types::{
        DocumentRecord, DocumentStatus, DocumentType, LedgerDocumentStatus,
    };
    use vl_01_ledger_client::{MockClock, MockLedger};
    use vl_03_document_state::InMemoryDocumentStore;

    struct Harness {
        ledger: Arc<MockLedger>,
        did: Arc<MockDidResolver>,
        dns: Arc<MockDnsResolver>,
        audit: Arc<RecordingAuditSink>,
        state: Arc<DocumentStateMachine<InMemoryDocumentStore>>,
        aggregator:
            VerificationAggregator<InMemoryDocumentStore, ProviderLedgerQuery<MockLedger>>,
    }

    fn harness() -> Harness {
        let ledger = Arc::new(MockLedger::new());
        let did = Arc::new(MockDidResolver::new());
        let dns = Arc::new(MockDnsResolver::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let state = Arc::new(DocumentStateMachine::new(Arc::new(
            InMemoryDocumentStore::new(),
        )));
        let aggregator = VerificationAggregator::over_provider(
            state.clone(),
            ledger.clone(),
            "0xregistry",
            did.clone(),
            dns.clone(),
            audit.clone(),
            Arc::new(MockClock::new(1_700_000_000)),
            VerifierConfig::default(),
        );
        Harness {
            ledger,
            did,
            dns,
            audit,
            state,
            aggregator,
        }
    }

    fn on_ledger(h: &Harness, hash: &str) {
        h.ledger.register_document(
            hash,
            LedgerDocumentStatus {
                exists: true,
                ..Default::default()
            },
        );
    }

    fn payload_with(proof: IdentityProof) -> SignedPayload {
        SignedPayload {
            version: "1.0".into(),
            issuers: vec![Issuer {
                name: Some("Acme Registry".into()),
                identity_proof: Some(proof),
            }],
            target_hash: "cafe01".into(),
        }
    }

    #[tokio::test]
    async fn test_hash_only_skips_identity_signals() {
        let h = harness();
        on_ledger(&h, "cafe01");

        let verdict = h
            .aggregator
            .verify(VerificationRequest::for_hash("0xCAFE01"))
            .await
            .unwrap();
        assert_eq!(verdict.did_verified, Signal::Skipped);
        assert_eq!(verdict.dns_verified, Signal::Skipped);
        assert!(verdict.on_ledger);
        assert!(verdict.verified());
    }

    #[tokio::test]
    async fn test_unknown_hash_is_a_verdict_not_an_error() {
        let h = harness();
        let verdict = h
            .aggregator
            .verify(VerificationRequest::for_hash("feed99"))
            .await
            .unwrap();
        assert!(!verdict.in_cache);
        assert!(!verdict.on_ledger);
        assert!(!verdict.verified());
    }

    #[tokio::test]
    async fn test_malformed_request_is_the_only_error() {
        let h = harness();
        let err = h
            .aggregator
            .verify(VerificationRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedRequest(_)));
    }

    #[tokio::test]
    async fn test_revocation_forces_unverified() {
        let h = harness();
        on_ledger(&h, "cafe01");
        h.ledger.revoke_document("cafe01");
        h.did.register("did:ethr:0xabc", json!({"id": "did:ethr:0xabc"}));

        let verdict = h
            .aggregator
            .verify(VerificationRequest::for_payload(payload_with(
                IdentityProof::Did {
                    did: "did:ethr:0xabc".into(),
                },
            )))
            .await
            .unwrap();
        assert!(verdict.revoked);
        assert_eq!(verdict.did_verified, Signal::Passed);
        assert!(!verdict.verified());
    }

    #[tokio::test]
    async fn test_dns_binding_record_check() {
        let h = harness();
        on_ledger(&h, "cafe01");
        h.dns.publish(
            "example.com",
            vec![expected_txt_record(51, "cafe01")],
        );

        let verdict = h
            .aggregator
            .verify(VerificationRequest::for_payload(payload_with(
                IdentityProof::DnsTxt {
                    location: "example.com".into(),
                },
            )))
            .await
            .unwrap();
        assert_eq!(verdict.dns_verified, Signal::Passed);
        assert!(verdict.verified());

        let verdict = h
            .aggregator
            .verify(VerificationRequest::for_payload(payload_with(
                IdentityProof::DnsTxt {
                    location: "other.example".into(),
                },
            )))
            .await
            .unwrap();
        assert_eq!(verdict.dns_verified, Signal::Failed);
        assert!(!verdict.verified());
    }

    #[tokio::test]
    async fn test_resolution_failure_degrades_with_diagnostic() {
        let h = harness();
        on_ledger(&h, "cafe01");
        h.did.fail_resolution(true);

        let verdict = h
            .aggregator
            .verify(VerificationRequest::for_payload(payload_with(
                IdentityProof::Did {
                    did: "did:ethr:0xabc".into(),
                },
            )))
            .await
            .unwrap();
        assert_eq!(verdict.did_verified, Signal::Failed);
        assert!(!verdict.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_ledger_outage_degrades_on_ledger() {
        let h = harness();
        h.ledger.fail_query(true);

        let verdict = h
            .aggregator
            .verify(VerificationRequest::for_hash("cafe01"))
            .await
            .unwrap();
        assert!(!verdict.on_ledger);
        assert!(verdict
            .diagnostics
            .iter()
            .any(|d| d.contains("ledger status unavailable")));
    }

    #[tokio::test]
    async fn test_audit_written_and_failure_swallowed() {
        let h = harness();
        on_ledger(&h, "cafe01");

        h.aggregator
            .verify(VerificationRequest::for_hash("cafe01").by("user-7"))
            .await
            .unwrap();
        let entries = h.audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].requester, "user-7");
        assert!(entries[0].successful);

        h.audit.fail_writes(true);
        let verdict = h
            .aggregator
            .verify(VerificationRequest::for_hash("cafe01"))
            .await;
        assert!(verdict.is_ok());
    }

    #[tokio::test]
    async fn test_verdict_updates_cached_record() {
        let h = harness();
        on_ledger(&h, "cafe01");
        let mut record = DocumentRecord::new_draft("cafe01".into(), DocumentType::Verifiable, 1);
        record.status = DocumentStatus::PendingVerification;
        let id = record.id;
        h.state.store().insert(record).await.unwrap();

        let verdict = h
            .aggregator
            .verify(VerificationRequest::for_hash("cafe01"))
            .await
            .unwrap();
        assert!(verdict.in_cache);

        let stored = h.state.require(&id).await.unwrap();
        assert_eq!(stored.status, DocumentStatus::Verified);
        assert_eq!(stored.verification_details.on_ledger, Signal::Passed);
        assert_eq!(
            stored.verification_details.last_verified,
            Some(1_700_000_000)
        );
    }
}
