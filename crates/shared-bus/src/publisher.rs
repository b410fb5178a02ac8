//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{EventFilter, LedgerEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the event.
    async fn publish(&self, event: LedgerEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer
/// semantics. Suitable for single-process operation; a distributed
/// deployment would put a broker-backed implementation behind the same
/// trait.
pub struct InMemoryEventBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<LedgerEvent>,

    /// Active subscription count by topic.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to events matching a filter.
    ///
    /// Returns a `Subscription` handle that can be used to receive events.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let topic_key = format!("{:?}", filter.topics);

        {
            if let Ok(mut subs) = self.subscriptions.write() {
                *subs.entry(topic_key.clone()).or_insert(0) += 1;
            }
        }

        debug!(topics = ?filter.topics, "New subscription created");

        Subscription::new(receiver, filter, self.subscriptions.clone(), topic_key)
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: LedgerEvent) -> usize {
        let topic = event.topic();

        // Counter increments even when nobody listens; the event was
        // still attempted.
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(?topic, receivers, "Event published");
                receivers
            }
            Err(_) => {
                warn!(?topic, "Event published with no active subscribers");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventTopic;

    fn created(ledger_id: &str) -> LedgerEvent {
        LedgerEvent::DocumentCreated {
            ledger_id: ledger_id.into(),
            document_hash: "abc123".into(),
            tx_hash: "0xt1".into(),
            block_number: 100,
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = InMemoryEventBus::new();
        let delivered = bus.publish(created("1")).await;
        assert_eq!(delivered, 0);
        assert_eq!(bus.events_published(), 1);
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());

        bus.publish(created("1")).await;

        let event = sub.recv().await.unwrap();
        assert_eq!(event.ledger_id(), "1");
    }

    #[tokio::test]
    async fn test_filtered_subscriber_skips_other_topics() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Revocation]));

        bus.publish(created("1")).await;
        bus.publish(LedgerEvent::DocumentRevoked {
            ledger_id: "1".into(),
            tx_hash: "0xt9".into(),
            block_number: 101,
        })
        .await;

        let event = sub.recv().await.unwrap();
        assert_eq!(event.topic(), EventTopic::Revocation);
    }

    #[tokio::test]
    async fn test_subscriber_count() {
        let bus = InMemoryEventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        let _a = bus.subscribe(EventFilter::all());
        let _b = bus.subscribe(EventFilter::all());
        assert_eq!(bus.subscriber_count(), 2);
    }
}
