use anyhow::Result;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{self, AppState};

/// Bind and serve the HTTP surface until the shutdown signal flips.
pub async fn run(port: u16, state: AppState, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state).layer(cors);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server running at http://localhost:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await?;

    Ok(())
}
