//! # Shared Bus - Ledger Event Distribution
//!
//! Carries ledger events between subsystems. Two producers feed the bus:
//! the job workers (publishing confirmations they observed in submission
//! receipts) and the ledger adapter's subscription feed. The event
//! reconciler is the primary consumer.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Job Workers  │                    │  Reconciler  │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Delivery is best-effort broadcast: a lagged subscriber drops old events
//! rather than blocking publishers. The reconciler tolerates this because
//! the ledger, not the bus, is the source of truth.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, LedgerEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
