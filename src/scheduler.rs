//! Periodic refresh of every tracked location.
//!
//! Cycles are serialized: the loop awaits the full fan-out before taking the
//! next tick, and missed ticks are delayed rather than bursted. A late fetch
//! therefore never crosses a cycle boundary, which (together with the store's
//! commit-time tracked check) closes the stale-write race between cycles.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::models::Reading;
use crate::provider::WeatherProvider;
use crate::store::SnapshotStore;

pub struct RefreshScheduler {
    store: Arc<SnapshotStore>,
    provider: Arc<dyn WeatherProvider>,
    period: Duration,
}

impl RefreshScheduler {
    pub fn new(
        store: Arc<SnapshotStore>,
        provider: Arc<dyn WeatherProvider>,
        period: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            period,
        }
    }

    /// Run refresh cycles until the shutdown signal flips. An in-flight
    /// fan-out is dropped on shutdown; readings already committed stay.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {
                    info!("refresh scheduler shutting down");
                    return;
                }
            }

            tokio::select! {
                () = run_cycle(&self.store, self.provider.as_ref()) => {}
                _ = shutdown.changed() => {
                    info!("refresh scheduler shutting down, dropping in-flight cycle");
                    return;
                }
            }
        }
    }
}

/// One fan-out-and-commit cycle over the currently tracked locations.
///
/// Fetches run concurrently and resolve independently: a failure for one
/// location becomes an all-null reading for it and never disturbs the others.
/// Results for locations untracked since the cycle started are discarded.
pub async fn run_cycle(store: &SnapshotStore, provider: &dyn WeatherProvider) {
    let tracked = store.tracked().await;
    if tracked.is_empty() {
        return;
    }

    let fetches = tracked.iter().map(|location| async move {
        let result = provider.fetch(location).await;
        (location.as_str(), result)
    });
    let results = join_all(fetches).await;

    let mut refreshed = 0usize;
    let mut failed = 0usize;
    for (location, result) in results {
        let reading = match result {
            Ok(reading) => {
                refreshed += 1;
                reading
            }
            Err(e) => {
                failed += 1;
                warn!(%location, error = %e, "fetch failed, committing empty reading");
                Reading::EMPTY
            }
        };

        if !store.commit_reading(location, reading).await {
            debug!(%location, "discarding result for untracked location");
        }
    }

    info!(
        refreshed,
        failed,
        total = tracked.len(),
        "refresh cycle complete"
    );
}
