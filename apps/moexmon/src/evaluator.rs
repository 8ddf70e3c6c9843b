//! Periodic watchlist evaluation.

use crate::metrics::Metrics;
use moexmon_bus::AlertPublisher;
use moexmon_core::{AlertMessage, WatchlistItem};
use moexmon_moex::PriceSource;
use moexmon_store::WatchStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Subject every fired alert is published on.
pub const ALERT_SUBJECT: &str = "alerts.MOEX";

/// Periodic worker: list active items, probe prices, latch matches, publish
/// alerts. One scan is in flight at a time.
pub struct Evaluator<S, P, B> {
    store: S,
    source: P,
    bus: B,
    metrics: Arc<Metrics>,
    interval: Duration,
}

impl<S, P, B> Evaluator<S, P, B>
where
    S: WatchStore,
    P: PriceSource,
    B: AlertPublisher,
{
    pub fn new(store: S, source: P, bus: B, metrics: Arc<Metrics>, interval: Duration) -> Self {
        Self {
            store,
            source,
            bus,
            metrics,
            interval,
        }
    }

    /// Run until the shutdown token fires. Ticks arriving while a scan is
    /// still running are coalesced; at most one is ever pending.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "starting watchlist monitoring"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The interval yields once immediately; consume it so the first
        // scan lands one full period after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("watchlist monitoring stopped");
                    return;
                }
                _ = ticker.tick() => self.scan(&shutdown).await,
            }
        }
    }

    async fn scan(&self, shutdown: &CancellationToken) {
        let items = match self.store.list_active_watch().await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "failed to retrieve watchlist");
                self.metrics.db_failures.inc();
                return;
            }
        };
        debug!(count = items.len(), "watchlist retrieved");

        for item in &items {
            if shutdown.is_cancelled() {
                return;
            }
            self.check_item(item, shutdown).await;
        }
    }

    async fn check_item(&self, item: &WatchlistItem, shutdown: &CancellationToken) {
        // Only the fetch is raced against shutdown: dropping it aborts the
        // in-flight request, while a match that already latched still gets
        // its alert published.
        let fetched = tokio::select! {
            _ = shutdown.cancelled() => return,
            fetched = self.source.fetch_price(&item.ticker, &item.asset_class) => fetched,
        };

        let price = match fetched {
            Ok(price) => price,
            Err(e) if e.is_semantic() => {
                warn!(ticker = %item.ticker, error = %e, "skipping watchlist item");
                return;
            }
            Err(e) => {
                warn!(ticker = %item.ticker, error = %e, "failed to fetch price");
                self.metrics.net_failures.inc();
                return;
            }
        };

        if !item.matches(price) {
            return;
        }

        info!(
            ticker = %item.ticker,
            price,
            target = item.target_price,
            condition = %item.condition,
            "watch condition met"
        );

        // Latch first so the next tick does not re-fire. A failed latch
        // still publishes: a duplicate alert costs less than a lost one.
        if let Err(e) = self.store.set_inactive(&item.ticker).await {
            error!(ticker = %item.ticker, error = %e, "failed to deactivate watchlist item");
            self.metrics.db_failures.inc();
        }

        let payload = match AlertMessage::for_item(item).to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                error!(ticker = %item.ticker, error = %e, "failed to encode alert");
                self.metrics.alert_failures.inc();
                return;
            }
        };

        match self.bus.publish(ALERT_SUBJECT, payload).await {
            Ok(()) => {
                debug!(ticker = %item.ticker, "alert published");
                self.metrics.alerts_published.inc();
            }
            Err(e) => {
                error!(ticker = %item.ticker, error = %e, "failed to publish alert");
                self.metrics.alert_failures.inc();
            }
        }
    }
}
