//! The reconciler loop and its per-event application logic.

use std::sync::Arc;

use shared_bus::{LedgerEvent, Subscription};
use shared_types::{hash::normalize_hash, DocumentRecord, DocumentStatus, RegistryError};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use vl_01_ledger_client::TimeSource;
use vl_03_document_state::{DocumentStateMachine, DocumentStore};
use vl_telemetry::EVENTS_RECONCILED;

/// What applying one event did to the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The event advanced the cached record.
    Applied,
    /// The projection already reflected (or superseded) the event.
    AlreadyApplied,
    /// No cached record matches the event; logged and dropped.
    UnknownDocument,
}

impl ReconcileOutcome {
    fn metric_label(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::AlreadyApplied => "already_applied",
            Self::UnknownDocument => "unknown_document",
        }
    }
}

/// Applies ledger events to the cached document projection.
pub struct EventReconciler<S: DocumentStore> {
    state: Arc<DocumentStateMachine<S>>,
    clock: Arc<dyn TimeSource>,
}

impl<S: DocumentStore> EventReconciler<S> {
    pub fn new(state: Arc<DocumentStateMachine<S>>, clock: Arc<dyn TimeSource>) -> Self {
        Self { state, clock }
    }

    /// Consume `subscription` until the bus closes or shutdown flips.
    pub async fn run(&self, mut subscription: Subscription, mut shutdown: watch::Receiver<bool>) {
        info!("event reconciler started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("event reconciler shutting down");
                    break;
                }
                event = subscription.recv() => {
                    let Some(event) = event else {
                        info!("event bus closed, reconciler stopping");
                        break;
                    };
                    if let Err(err) = self.apply(&event).await {
                        warn!(%err, topic = ?event.topic(), "event reconciliation failed");
                    }
                }
            }
        }
    }

    /// Fold one event into the projection. Safe to call twice with the
    /// same event.
    pub async fn apply(&self, event: &LedgerEvent) -> Result<ReconcileOutcome, RegistryError> {
        let outcome = match event {
            LedgerEvent::DocumentCreated {
                ledger_id,
                document_hash,
                tx_hash,
                block_number,
            } => {
                // Creation predates the ledger id on the record, so the
                // match is by content hash.
                match self
                    .state
                    .store()
                    .find_by_hash(&normalize_hash(document_hash))
                    .await?
                {
                    None => ReconcileOutcome::UnknownDocument,
                    Some(record) if record.transaction_hash.is_some() => {
                        ReconcileOutcome::AlreadyApplied
                    }
                    Some(record) if record.status == DocumentStatus::Draft => {
                        self.state
                            .apply_creation_confirmed(
                                &record.id,
                                ledger_id.clone(),
                                tx_hash.clone(),
                                *block_number,
                                self.clock.now(),
                            )
                            .await?;
                        ReconcileOutcome::Applied
                    }
                    Some(record) => self.superseded(&record, event),
                }
            }

            LedgerEvent::DocumentVerified {
                ledger_id,
                tx_hash,
                block_number,
            } => match self.find_by_ledger_id(ledger_id).await? {
                None => ReconcileOutcome::UnknownDocument,
                Some(record)
                    if record.status == DocumentStatus::Verified
                        || record.verification_tx_hash.as_deref() == Some(tx_hash.as_str()) =>
                {
                    ReconcileOutcome::AlreadyApplied
                }
                Some(record) if record.status == DocumentStatus::PendingVerification => {
                    self.state
                        .apply_verification_confirmed(
                            &record.id,
                            tx_hash.clone(),
                            *block_number,
                            self.clock.now(),
                        )
                        .await?;
                    ReconcileOutcome::Applied
                }
                Some(record) => self.superseded(&record, event),
            },

            LedgerEvent::DocumentTransferred {
                ledger_id,
                new_holder,
                ..
            } => match self.find_by_ledger_id(ledger_id).await? {
                None => ReconcileOutcome::UnknownDocument,
                Some(record)
                    if record.status == DocumentStatus::Transferred
                        && record.endorsement_chain.last() == Some(new_holder) =>
                {
                    ReconcileOutcome::AlreadyApplied
                }
                Some(record) if record.status == DocumentStatus::PendingTransfer => {
                    self.state
                        .apply_transfer_confirmed(&record.id, new_holder.clone(), self.clock.now())
                        .await?;
                    ReconcileOutcome::Applied
                }
                Some(record) => self.superseded(&record, event),
            },

            LedgerEvent::DocumentRevoked { ledger_id, .. } => {
                match self.find_by_ledger_id(ledger_id).await? {
                    None => ReconcileOutcome::UnknownDocument,
                    Some(record) if record.status == DocumentStatus::Revoked => {
                        ReconcileOutcome::AlreadyApplied
                    }
                    Some(record) => {
                        self.state
                            .apply_revocation(&record.id, self.clock.now())
                            .await?;
                        ReconcileOutcome::Applied
                    }
                }
            }
        };

        if outcome == ReconcileOutcome::UnknownDocument {
            debug!(topic = ?event.topic(), "event matches no cached document, dropping");
        }
        EVENTS_RECONCILED
            .with_label_values(&[outcome.metric_label()])
            .inc();
        Ok(outcome)
    }

    async fn find_by_ledger_id(
        &self,
        ledger_id: &str,
    ) -> Result<Option<DocumentRecord>, RegistryError> {
        self.state.store().find_by_ledger_id(ledger_id).await
    }

    /// The record is in a state the event cannot legally advance; the
    /// projection has moved past it.
    fn superseded(&self, record: &DocumentRecord, event: &LedgerEvent) -> ReconcileOutcome {
        debug!(
            document_id = %record.id,
            status = ?record.status,
            topic = ?event.topic(),
            "event superseded by current status"
        );
        ReconcileOutcome::AlreadyApplied
    }
}
