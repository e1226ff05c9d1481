//! Integration tests wiring the store, registry, scheduler, and publisher
//! together the way the binary does, with in-process provider fakes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore, watch};

use skywatch::error::{FetchError, RegistryError};
use skywatch::favorites::{FavoritesRepo, FjallFavorites};
use skywatch::models::Reading;
use skywatch::provider::WeatherProvider;
use skywatch::publisher::SnapshotPublisher;
use skywatch::registry::LocationRegistry;
use skywatch::scheduler::{RefreshScheduler, run_cycle};
use skywatch::store::SnapshotStore;

fn reading(temp: i32) -> Reading {
    Reading {
        temperature_c: Some(temp),
        ..Reading::EMPTY
    }
}

/// Provider with a fixed map of known locations.
struct FixedProvider {
    known: HashMap<String, Reading>,
}

impl FixedProvider {
    fn new(known: &[(&str, i32)]) -> Self {
        Self {
            known: known
                .iter()
                .map(|(name, temp)| ((*name).to_string(), reading(*temp)))
                .collect(),
        }
    }
}

#[async_trait]
impl WeatherProvider for FixedProvider {
    async fn fetch(&self, location: &str) -> Result<Reading, FetchError> {
        self.known
            .get(location)
            .cloned()
            .ok_or(FetchError::NotFound)
    }
}

/// Provider whose fetches block until released, for racing a removal
/// against an in-flight refresh cycle.
struct GatedProvider {
    entered: Notify,
    release: Semaphore,
}

impl GatedProvider {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl WeatherProvider for GatedProvider {
    async fn fetch(&self, _location: &str) -> Result<Reading, FetchError> {
        self.entered.notify_one();
        let _permit = self
            .release
            .acquire()
            .await
            .map_err(|_| FetchError::NotFound)?;
        Ok(reading(20))
    }
}

/// Favorites repo backed by nothing, for tests that do not exercise
/// persistence.
struct NullRepo;

#[async_trait]
impl FavoritesRepo for NullRepo {
    async fn load(&self) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn save(&self, _favorites: &[String]) -> anyhow::Result<()> {
        Ok(())
    }
}

fn scratch_path(tag: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    std::env::temp_dir().join(format!("skywatch-it-{tag}-{}-{nanos}", std::process::id()))
}

/// A location removed while its fetch is still in flight must not
/// reappear in the snapshot when the fetch lands.
#[tokio::test]
async fn removal_during_inflight_cycle_is_not_resurrected() {
    let store = Arc::new(SnapshotStore::new());
    let provider = Arc::new(GatedProvider::new());

    store.add_tracked("ghost", Reading::EMPTY).await;

    let cycle = {
        let store = store.clone();
        let provider = provider.clone();
        tokio::spawn(async move { run_cycle(store.as_ref(), provider.as_ref()).await })
    };

    // Wait for the fetch to start, untrack underneath it, then let it land.
    provider.entered.notified().await;
    store.remove_tracked("ghost").await;
    provider.release.add_permits(1);

    cycle.await.expect("cycle task should exit cleanly");

    assert!(store.reading("ghost").await.is_none());
    assert!(store.snapshot().await.is_empty());
}

/// End-to-end pipeline: registry adds flow through refresh cycles into
/// published snapshot events, and shutdown stops both loops.
#[tokio::test]
async fn pipeline_publishes_refreshed_snapshots() {
    let store = Arc::new(SnapshotStore::new());
    let provider: Arc<dyn WeatherProvider> =
        Arc::new(FixedProvider::new(&[("london", 18), ("oslo", 4)]));
    let registry = LocationRegistry::new(store.clone(), provider.clone(), Arc::new(NullRepo));

    registry.add_tracked("london").await.expect("add london");
    registry.add_tracked("oslo").await.expect("add oslo");
    assert_eq!(
        registry.add_tracked("atlantis").await.unwrap_err(),
        RegistryError::LocationNotFound
    );

    let scheduler =
        RefreshScheduler::new(store.clone(), provider, Duration::from_millis(10));
    let publisher = SnapshotPublisher::new(store, Duration::from_millis(10));
    let mut events = publisher.subscribe();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx.clone()));
    let publisher_handle = tokio::spawn(publisher.run(shutdown_rx));

    // Validation fetches already populated both readings, so the first
    // event carries data; later events keep carrying both keys.
    let event = events.recv().await.expect("snapshot event");
    assert_eq!(event.locations.len(), 2);
    assert_eq!(event.locations["london"].temperature_c, Some(18));
    assert_eq!(event.locations["oslo"].temperature_c, Some(4));

    shutdown_tx.send(true).expect("send shutdown");
    scheduler_handle.await.expect("scheduler exits");
    publisher_handle.await.expect("publisher exits");
}

/// Favorites written through the registry come back after a full
/// reopen, tracked but unvalidated.
#[tokio::test]
async fn favorites_survive_process_restart() {
    let path = scratch_path("restart");
    let provider: Arc<dyn WeatherProvider> = Arc::new(FixedProvider::new(&[("paris", 21)]));

    {
        let store = Arc::new(SnapshotStore::new());
        let repo = Arc::new(FjallFavorites::open(&path).expect("open"));
        let registry = LocationRegistry::new(store, provider.clone(), repo);
        registry.add_tracked("paris").await.expect("add");
        registry.add_favorite("paris").await.expect("favorite");
    }

    let store = Arc::new(SnapshotStore::new());
    let repo = Arc::new(FjallFavorites::open(&path).expect("reopen"));
    let registry = LocationRegistry::new(store.clone(), provider, repo);
    registry.load_persisted().await;

    assert_eq!(registry.list_favorites().await, vec!["paris".to_string()]);
    assert!(store.is_tracked("paris").await);
    assert_eq!(store.reading("paris").await, Some(Reading::EMPTY));

    let _ = std::fs::remove_dir_all(&path);
}
