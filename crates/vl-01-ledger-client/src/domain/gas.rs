//! # Gas Price Cache
//!
//! Process-wide cache of the ledger's gas price with a refresh interval,
//! a headroom multiplier, and a floor fallback when the ledger cannot be
//! queried. The headroom keeps submissions from underbidding a price that
//! moved between refresh and submission.

use crate::ports::outbound::{LedgerProvider, TimeSource};
use shared_types::Timestamp;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default refresh interval: 10 minutes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Default floor price when the ledger cannot be queried: 10 gwei.
pub const DEFAULT_FLOOR_PRICE: u128 = 10_000_000_000;

/// Headroom applied to the fetched price: 1.1x, in integer permille.
const HEADROOM_PERMILLE: u128 = 1_100;

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    price: u128,
    fetched_at: Timestamp,
}

/// Cached ledger gas price with exclusive-access refresh.
pub struct GasPriceCache<L> {
    ledger: Arc<L>,
    clock: Arc<dyn TimeSource>,
    refresh_interval: Duration,
    floor: u128,
    cached: Mutex<Option<CachedPrice>>,
}

impl<L: LedgerProvider> GasPriceCache<L> {
    /// Create a cache with default interval and floor.
    #[must_use]
    pub fn new(ledger: Arc<L>, clock: Arc<dyn TimeSource>) -> Self {
        Self::with_config(ledger, clock, DEFAULT_REFRESH_INTERVAL, DEFAULT_FLOOR_PRICE)
    }

    /// Create a cache with custom interval and floor.
    #[must_use]
    pub fn with_config(
        ledger: Arc<L>,
        clock: Arc<dyn TimeSource>,
        refresh_interval: Duration,
        floor: u128,
    ) -> Self {
        Self {
            ledger,
            clock,
            refresh_interval,
            floor,
            cached: Mutex::new(None),
        }
    }

    /// Current gas price with headroom applied.
    ///
    /// Refreshes from the ledger when the cached value is stale. A refresh
    /// failure degrades to the floor price rather than failing the caller;
    /// a submission with a floor price may confirm slowly, but a submission
    /// without any price cannot be built at all.
    pub async fn current(&self) -> u128 {
        let mut guard = self.cached.lock().await;
        let now = self.clock.now();

        if let Some(cached) = *guard {
            if now.saturating_sub(cached.fetched_at) < self.refresh_interval.as_secs() {
                return cached.price;
            }
        }

        match self.ledger.gas_price().await {
            Ok(raw) => {
                let price = raw.saturating_mul(HEADROOM_PERMILLE) / 1_000;
                *guard = Some(CachedPrice {
                    price,
                    fetched_at: now,
                });
                debug!(raw, price, "Gas price refreshed");
                price
            }
            Err(e) => {
                warn!(error = %e, floor = self.floor, "Gas price refresh failed, using floor");
                // Do not cache the floor: retry the ledger on the next call.
                self.floor
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockLedger;
    use crate::ports::outbound::MockClock;

    #[tokio::test]
    async fn test_headroom_applied() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_gas_price(100);
        let clock = Arc::new(MockClock::new(1_000));
        let cache = GasPriceCache::new(ledger, clock);

        assert_eq!(cache.current().await, 110);
    }

    #[tokio::test]
    async fn test_cached_until_interval_elapses() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_gas_price(100);
        let clock = Arc::new(MockClock::new(1_000));
        let cache = GasPriceCache::new(ledger.clone(), clock.clone());

        assert_eq!(cache.current().await, 110);
        ledger.set_gas_price(500);

        // Within the interval the cached value holds.
        clock.advance(599);
        assert_eq!(cache.current().await, 110);

        // Past the interval the new price is fetched.
        clock.advance(2);
        assert_eq!(cache.current().await, 550);
    }

    #[tokio::test]
    async fn test_floor_on_refresh_failure() {
        let ledger = Arc::new(MockLedger::new());
        ledger.fail_gas_price(true);
        let clock = Arc::new(MockClock::new(1_000));
        let cache =
            GasPriceCache::with_config(ledger.clone(), clock, Duration::from_secs(600), 42);

        assert_eq!(cache.current().await, 42);

        // Floor is not cached: recovery is picked up immediately.
        ledger.fail_gas_price(false);
        ledger.set_gas_price(100);
        assert_eq!(cache.current().await, 110);
    }
}
