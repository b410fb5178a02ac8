//! # Ledger Events
//!
//! Defines the document lifecycle events emitted by the registry contract
//! and redistributed on the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::{BlockNumber, LedgerAddress, LedgerId, TxHash};

/// All ledger events that can be published to the bus.
///
/// Each variant mirrors one registry contract event. `DocumentCreated` is
/// keyed by document hash because the cached record predates the ledger id;
/// every later event carries the ledger-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// The registry accepted a new document.
    DocumentCreated {
        /// Ledger-assigned document identifier.
        ledger_id: LedgerId,
        /// Content fingerprint the contract was called with.
        document_hash: String,
        /// Transaction that confirmed the creation.
        tx_hash: TxHash,
        /// Block the transaction landed in.
        block_number: BlockNumber,
    },

    /// The registry recorded an on-ledger verification.
    DocumentVerified {
        /// Ledger-assigned document identifier.
        ledger_id: LedgerId,
        /// Transaction that confirmed the verification.
        tx_hash: TxHash,
        /// Block the transaction landed in.
        block_number: BlockNumber,
    },

    /// Ownership was endorsed to a new holder.
    DocumentTransferred {
        /// Ledger-assigned document identifier.
        ledger_id: LedgerId,
        /// The endorsed holder.
        new_holder: LedgerAddress,
        /// Transaction that confirmed the transfer.
        tx_hash: TxHash,
        /// Block the transaction landed in.
        block_number: BlockNumber,
    },

    /// The document was revoked. Overrides every other transition.
    DocumentRevoked {
        /// Ledger-assigned document identifier.
        ledger_id: LedgerId,
        /// Transaction that confirmed the revocation.
        tx_hash: TxHash,
        /// Block the transaction landed in.
        block_number: BlockNumber,
    },
}

impl LedgerEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::DocumentCreated { .. } => EventTopic::Creation,
            Self::DocumentVerified { .. } => EventTopic::Verification,
            Self::DocumentTransferred { .. } => EventTopic::Transfer,
            Self::DocumentRevoked { .. } => EventTopic::Revocation,
        }
    }

    /// The ledger-assigned document id this event refers to.
    #[must_use]
    pub fn ledger_id(&self) -> &LedgerId {
        match self {
            Self::DocumentCreated { ledger_id, .. }
            | Self::DocumentVerified { ledger_id, .. }
            | Self::DocumentTransferred { ledger_id, .. }
            | Self::DocumentRevoked { ledger_id, .. } => ledger_id,
        }
    }

    /// The transaction hash that confirmed this event.
    #[must_use]
    pub fn tx_hash(&self) -> &TxHash {
        match self {
            Self::DocumentCreated { tx_hash, .. }
            | Self::DocumentVerified { tx_hash, .. }
            | Self::DocumentTransferred { tx_hash, .. }
            | Self::DocumentRevoked { tx_hash, .. } => tx_hash,
        }
    }

    /// The block this event's transaction landed in.
    #[must_use]
    pub fn block_number(&self) -> BlockNumber {
        match self {
            Self::DocumentCreated { block_number, .. }
            | Self::DocumentVerified { block_number, .. }
            | Self::DocumentTransferred { block_number, .. }
            | Self::DocumentRevoked { block_number, .. } => *block_number,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Document creation confirmations.
    Creation,
    /// On-ledger verification confirmations.
    Verification,
    /// Ownership transfer confirmations.
    Transfer,
    /// Revocations.
    Revocation,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
