//! Durable storage for the favorite-location set.
//!
//! Favorites are the only state that survives a restart. The production
//! implementation keeps the postcard-encoded list under a single key in an
//! embedded fjall keyspace; disk work happens on the blocking pool.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use fjall::Keyspace;
use tokio::task;
use tracing::debug;

const FAVORITES_KEY: &str = "favorites";

/// Persistence boundary for the favorite set.
///
/// Failures are recoverable by contract: a failed `load` yields an empty set
/// upstream, a failed `save` is logged and the in-memory set stays
/// authoritative for the running process.
#[async_trait]
pub trait FavoritesRepo: Send + Sync {
    async fn load(&self) -> Result<Vec<String>>;
    async fn save(&self, favorites: &[String]) -> Result<()>;
}

pub struct FjallFavorites {
    store: Keyspace,
}

impl FjallFavorites {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let store = db.keyspace("favorites", fjall::KeyspaceCreateOptions::default)?;
        Ok(Self { store })
    }
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn put_in_store(store: Keyspace, key: Vec<u8>, bytes: Vec<u8>) -> Result<()> {
    store.insert(key, bytes)?;
    Ok(())
}

#[async_trait]
impl FavoritesRepo for FjallFavorites {
    async fn load(&self) -> Result<Vec<String>> {
        let store = self.store.clone();
        let key = FAVORITES_KEY.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key)).await??;

        match maybe_bytes {
            Some(bytes) => {
                let favorites: Vec<String> = postcard::from_bytes(&bytes)?;
                debug!(count = favorites.len(), "loaded persisted favorites");
                Ok(favorites)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, favorites: &[String]) -> Result<()> {
        let store = self.store.clone();
        let key = FAVORITES_KEY.as_bytes().to_vec();
        let bytes = postcard::to_stdvec(&favorites.to_vec())?;

        // The insert outcome is the save outcome: a storage error must reach
        // the caller so it gets logged instead of reported as success.
        task::spawn_blocking(move || put_in_store(store, key, bytes)).await?
    }
}
