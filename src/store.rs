//! In-memory snapshot store: the only shared mutable state in the service.
//!
//! Tracked set, favorite set and the per-location readings all live behind a
//! single lock, so every operation is atomic with respect to every other
//! caller. The compound operations enforce the set invariants (favorites stay
//! tracked, snapshot keys mirror the tracked set) in one critical section.

use std::collections::{BTreeMap, HashMap, HashSet};

use tokio::sync::RwLock;

use crate::models::Reading;

/// Outcome of [`SnapshotStore::remove_tracked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The location was tracked and has been dropped, reading included
    Removed,
    /// The location is a favorite and may not be removed directly
    Protected,
    NotTracked,
}

/// Outcome of [`SnapshotStore::add_favorite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteOutcome {
    /// Favorited; `newly_tracked` reports whether this also started tracking
    Added { newly_tracked: bool },
    AlreadyFavorite,
}

#[derive(Debug, Default)]
struct Inner {
    tracked: HashSet<String>,
    favorites: HashSet<String>,
    readings: HashMap<String, Reading>,
}

/// Shared snapshot state, handed around as `Arc<SnapshotStore>`.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: RwLock<Inner>,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reading(&self, location: &str) -> Option<Reading> {
        self.inner.read().await.readings.get(location).cloned()
    }

    /// A consistent copy of the full snapshot. Its key set always equals the
    /// tracked set at the moment the lock was taken.
    pub async fn snapshot(&self) -> BTreeMap<String, Reading> {
        self.inner
            .read()
            .await
            .readings
            .iter()
            .map(|(location, reading)| (location.clone(), reading.clone()))
            .collect()
    }

    pub async fn tracked(&self) -> Vec<String> {
        self.inner.read().await.tracked.iter().cloned().collect()
    }

    pub async fn is_tracked(&self, location: &str) -> bool {
        self.inner.read().await.tracked.contains(location)
    }

    pub async fn favorites(&self) -> Vec<String> {
        self.inner.read().await.favorites.iter().cloned().collect()
    }

    pub async fn is_favorite(&self, location: &str) -> bool {
        self.inner.read().await.favorites.contains(location)
    }

    /// Commit a refresh result. Returns false without writing when the
    /// location has been untracked since the fetch started, so a removed
    /// location cannot be resurrected by a late result.
    pub async fn commit_reading(&self, location: &str, reading: Reading) -> bool {
        let mut inner = self.inner.write().await;
        if !inner.tracked.contains(location) {
            return false;
        }
        inner.readings.insert(location.to_owned(), reading);
        true
    }

    /// Start tracking a location with its initial reading. Returns false if
    /// it was already tracked (nothing is overwritten).
    pub async fn add_tracked(&self, location: &str, initial: Reading) -> bool {
        let mut inner = self.inner.write().await;
        if !inner.tracked.insert(location.to_owned()) {
            return false;
        }
        inner.readings.insert(location.to_owned(), initial);
        true
    }

    /// Stop tracking a location unless a favorite protects it.
    pub async fn remove_tracked(&self, location: &str) -> RemoveOutcome {
        let mut inner = self.inner.write().await;
        if !inner.tracked.contains(location) {
            return RemoveOutcome::NotTracked;
        }
        if inner.favorites.contains(location) {
            return RemoveOutcome::Protected;
        }
        inner.tracked.remove(location);
        inner.readings.remove(location);
        RemoveOutcome::Removed
    }

    /// Mark a location as favorite, tracking it (with an empty reading,
    /// pending its first fetch) if it was not tracked yet.
    pub async fn add_favorite(&self, location: &str) -> FavoriteOutcome {
        let mut inner = self.inner.write().await;
        if !inner.favorites.insert(location.to_owned()) {
            return FavoriteOutcome::AlreadyFavorite;
        }
        let newly_tracked = inner.tracked.insert(location.to_owned());
        if newly_tracked {
            inner.readings.insert(location.to_owned(), Reading::EMPTY);
        }
        FavoriteOutcome::Added { newly_tracked }
    }

    /// Revoke favorite status. The location leaves the tracked set and the
    /// snapshot together with it. Returns false if it was not a favorite.
    pub async fn remove_favorite(&self, location: &str) -> bool {
        let mut inner = self.inner.write().await;
        if !inner.favorites.remove(location) {
            return false;
        }
        inner.tracked.remove(location);
        inner.readings.remove(location);
        true
    }
}
