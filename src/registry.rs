//! Validated mutation API over the snapshot store.
//!
//! The registry is the only component that adds or removes locations. It
//! layers provider validation and favorites persistence on top of the store's
//! atomic operations; the HTTP surface is a thin shell around these methods.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::RegistryError;
use crate::favorites::FavoritesRepo;
use crate::models::Reading;
use crate::provider::WeatherProvider;
use crate::store::{FavoriteOutcome, RemoveOutcome, SnapshotStore};

pub struct LocationRegistry {
    store: Arc<SnapshotStore>,
    provider: Arc<dyn WeatherProvider>,
    favorites: Arc<dyn FavoritesRepo>,
}

impl LocationRegistry {
    pub fn new(
        store: Arc<SnapshotStore>,
        provider: Arc<dyn WeatherProvider>,
        favorites: Arc<dyn FavoritesRepo>,
    ) -> Self {
        Self {
            store,
            provider,
            favorites,
        }
    }

    /// Seed persisted favorites into the tracked set. Called once at startup,
    /// before the first refresh cycle; loaded favorites are trusted and get
    /// no validation fetch. A failed load is downgraded to an empty set.
    pub async fn load_persisted(&self) {
        let loaded = match self.favorites.load().await {
            Ok(list) => list,
            Err(e) => {
                warn!("failed to load persisted favorites, starting empty: {e:#}");
                Vec::new()
            }
        };

        for location in loaded {
            if let FavoriteOutcome::Added { .. } = self.store.add_favorite(&location).await {
                info!(%location, "restored persisted favorite");
            }
        }
    }

    /// Start tracking a location. The location must prove itself with one
    /// validation fetch: a failed fetch, or one that yields no data at all,
    /// rejects the add without touching any state.
    pub async fn add_tracked(&self, location: &str) -> Result<Reading, RegistryError> {
        if self.store.is_tracked(location).await {
            return Err(RegistryError::AlreadyTracked);
        }

        let reading = match self.provider.fetch(location).await {
            Ok(reading) if reading.has_data() => reading,
            Ok(_) => return Err(RegistryError::LocationNotFound),
            Err(e) => {
                warn!(%location, error = %e, "validation fetch failed");
                return Err(RegistryError::LocationNotFound);
            }
        };

        if !self.store.add_tracked(location, reading.clone()).await {
            // Lost a race with a concurrent add while the fetch was in flight.
            return Err(RegistryError::AlreadyTracked);
        }

        info!(%location, "tracking new location");
        Ok(reading)
    }

    pub async fn remove_tracked(&self, location: &str) -> Result<(), RegistryError> {
        match self.store.remove_tracked(location).await {
            RemoveOutcome::Removed => {
                info!(%location, "stopped tracking location");
                Ok(())
            }
            RemoveOutcome::Protected => Err(RegistryError::ProtectedByFavorite),
            RemoveOutcome::NotTracked => Err(RegistryError::NotTracked),
        }
    }

    /// Favorite a location, tracking it with an empty reading if it is new.
    /// No validation fetch here: the next refresh cycle fills the reading in.
    pub async fn add_favorite(&self, location: &str) -> Result<(), RegistryError> {
        match self.store.add_favorite(location).await {
            FavoriteOutcome::AlreadyFavorite => Err(RegistryError::AlreadyFavorite),
            FavoriteOutcome::Added { newly_tracked } => {
                if newly_tracked {
                    info!(%location, "tracking new favorite");
                } else {
                    info!(%location, "favorited tracked location");
                }
                self.persist_favorites().await;
                Ok(())
            }
        }
    }

    /// Revoke favorite status. The location is untracked along with it; the
    /// protection existed only for the favorite that is now gone.
    pub async fn remove_favorite(&self, location: &str) -> Result<(), RegistryError> {
        if !self.store.remove_favorite(location).await {
            return Err(RegistryError::NotAFavorite);
        }
        info!(%location, "removed favorite");
        self.persist_favorites().await;
        Ok(())
    }

    pub async fn list_tracked(&self) -> Vec<String> {
        let mut tracked = self.store.tracked().await;
        tracked.sort();
        tracked
    }

    pub async fn list_favorites(&self) -> Vec<String> {
        let mut favorites = self.store.favorites().await;
        favorites.sort();
        favorites
    }

    async fn persist_favorites(&self) {
        let favorites = self.store.favorites().await;
        if let Err(e) = self.favorites.save(&favorites).await {
            // In-memory state stays authoritative for the running process.
            warn!("failed to persist favorites: {e:#}");
        }
    }
}
