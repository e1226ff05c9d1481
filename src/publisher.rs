//! Periodic snapshot broadcast to stream subscribers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::models::Reading;
use crate::store::SnapshotStore;

/// One emitted snapshot: every tracked location with its latest known
/// reading, stamped with the emission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEvent {
    pub generated_at: DateTime<Utc>,
    pub locations: BTreeMap<String, Reading>,
}

// Buffer a handful of events: a subscriber that falls behind skips
// intermediate snapshots and resumes with the latest one. No replay.
const CHANNEL_CAPACITY: usize = 16;

/// Emits the full snapshot on a fixed period over a broadcast channel.
///
/// Cloning shares the underlying channel, so any clone can hand out
/// subscriptions while one instance drives the emission loop.
#[derive(Clone)]
pub struct SnapshotPublisher {
    store: Arc<SnapshotStore>,
    period: Duration,
    tx: broadcast::Sender<SnapshotEvent>,
}

impl SnapshotPublisher {
    #[must_use]
    pub fn new(store: Arc<SnapshotStore>, period: Duration) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { store, period, tx }
    }

    /// Register a new subscriber. It starts receiving with the next tick;
    /// dropping the receiver is the unsubscribe.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SnapshotEvent> {
        self.tx.subscribe()
    }

    /// Emit snapshots until the shutdown signal flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let event = SnapshotEvent {
                        generated_at: Utc::now(),
                        locations: self.store.snapshot().await,
                    };
                    let subscribers = self.tx.receiver_count();
                    // A send error just means nobody is listening right now.
                    let _ = self.tx.send(event);
                    debug!(subscribers, "published snapshot");
                }
                _ = shutdown.changed() => {
                    info!("snapshot publisher shutting down");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(temp: i32) -> Reading {
        Reading {
            temperature_c: Some(temp),
            ..Reading::EMPTY
        }
    }

    #[tokio::test]
    async fn subscribers_receive_consecutive_snapshots() {
        let store = Arc::new(SnapshotStore::new());
        store.add_tracked("london", reading(18)).await;
        store.add_tracked("oslo", Reading::EMPTY).await;

        let publisher = SnapshotPublisher::new(store.clone(), Duration::from_millis(10));
        let mut rx = publisher.subscribe();

        let (tx, shutdown) = watch::channel(false);
        let handle = tokio::spawn(publisher.clone().run(shutdown));

        let first = rx.recv().await.expect("first event");
        let second = rx.recv().await.expect("second event");

        for event in [&first, &second] {
            assert_eq!(event.locations.len(), 2);
            assert!(event.locations.contains_key("london"));
            assert!(event.locations.contains_key("oslo"));
        }
        assert!(second.generated_at >= first.generated_at);

        tx.send(true).expect("send shutdown");
        handle.await.expect("publisher task should exit cleanly");
    }

    #[tokio::test]
    async fn events_reflect_store_changes_between_ticks() {
        let store = Arc::new(SnapshotStore::new());
        store.add_tracked("cairo", Reading::EMPTY).await;

        let publisher = SnapshotPublisher::new(store.clone(), Duration::from_millis(10));
        let mut rx = publisher.subscribe();

        let (tx, shutdown) = watch::channel(false);
        let handle = tokio::spawn(publisher.clone().run(shutdown));

        let first = rx.recv().await.expect("first event");
        assert_eq!(first.locations["cairo"], Reading::EMPTY);

        store.commit_reading("cairo", reading(35)).await;

        // The change shows up once the store copy postdates the commit.
        let updated = loop {
            let event = rx.recv().await.expect("event");
            if event.locations["cairo"].has_data() {
                break event;
            }
        };
        assert_eq!(updated.locations["cairo"].temperature_c, Some(35));

        tx.send(true).expect("send shutdown");
        handle.await.expect("publisher task should exit cleanly");
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_harmless() {
        let store = Arc::new(SnapshotStore::new());
        let publisher = SnapshotPublisher::new(store, Duration::from_millis(5));

        let (tx, shutdown) = watch::channel(false);
        let handle = tokio::spawn(publisher.run(shutdown));

        tokio::time::sleep(Duration::from_millis(25)).await;
        tx.send(true).expect("send shutdown");
        handle.await.expect("publisher task should exit cleanly");
    }
}
