use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use skywatch::api::AppState;
use skywatch::config::AppConfig;
use skywatch::favorites::{FavoritesRepo, FjallFavorites};
use skywatch::provider::{WeatherProvider, WttrProvider};
use skywatch::publisher::SnapshotPublisher;
use skywatch::registry::LocationRegistry;
use skywatch::scheduler::RefreshScheduler;
use skywatch::store::SnapshotStore;
use skywatch::web;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skywatch=info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(
        port = config.port,
        refresh_secs = config.refresh_interval_secs,
        publish_secs = config.publish_interval_secs,
        "starting skywatch"
    );

    let store = Arc::new(SnapshotStore::new());
    let provider: Arc<dyn WeatherProvider> = Arc::new(WttrProvider::new(
        &config.provider_base_url,
        config.provider_timeout(),
    )?);
    let favorites: Arc<dyn FavoritesRepo> = Arc::new(
        FjallFavorites::open(&config.data_dir).context("failed to open favorites store")?,
    );

    let registry = Arc::new(LocationRegistry::new(
        store.clone(),
        provider.clone(),
        favorites,
    ));
    registry.load_persisted().await;

    let publisher = SnapshotPublisher::new(store.clone(), config.publish_interval());
    let scheduler = RefreshScheduler::new(store, provider, config.refresh_interval());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx.clone()));
    let publisher_handle = tokio::spawn(publisher.clone().run(shutdown_rx.clone()));

    let state = AppState {
        registry,
        publisher,
    };
    let mut server_handle = tokio::spawn(web::run(config.port, state, shutdown_rx));

    let mut server_exited = false;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
        }
        result = &mut server_handle => {
            server_exited = true;
            match result {
                Ok(Ok(())) => info!("web server exited"),
                Ok(Err(e)) => error!("web server failed: {e:#}"),
                Err(e) => error!("web server task panicked: {e}"),
            }
        }
    }

    // Flipping the signal stops the loops; in-flight refresh work is dropped.
    let _ = shutdown_tx.send(true);

    let _ = scheduler_handle.await;
    let _ = publisher_handle.await;
    if !server_exited {
        let _ = server_handle.await;
    }

    info!("skywatch stopped");
    Ok(())
}
