//! HTTP control surface and the outbound snapshot stream.
//!
//! This layer owns no weather state. Every control request is one call into
//! the location registry, and `/sse` is a plain adapter over the publisher's
//! broadcast channel.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::Stream;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::warn;

use crate::error::RegistryError;
use crate::publisher::{SnapshotEvent, SnapshotPublisher};
use crate::registry::LocationRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<LocationRegistry>,
    pub publisher: SnapshotPublisher,
}

type Rejection = (StatusCode, Json<Value>);
type ApiResult<T> = Result<T, Rejection>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/sse", get(stream_snapshots))
        .route("/api/locations", get(list_locations))
        .route(
            "/api/locations/{location}",
            axum::routing::put(add_location).delete(remove_location),
        )
        .route("/api/favorites", get(list_favorites))
        .route(
            "/api/favorites/{location}",
            axum::routing::put(add_favorite).delete(remove_favorite),
        )
        .with_state(state)
}

async fn home() -> Json<Value> {
    Json(json!({ "message": "skywatch backend running" }))
}

async fn list_locations(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "locations": state.registry.list_tracked().await }))
}

async fn add_location(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let reading = state
        .registry
        .add_tracked(&location)
        .await
        .map_err(reject)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "location": location, "reading": reading })),
    ))
}

async fn remove_location(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .registry
        .remove_tracked(&location)
        .await
        .map_err(reject)?;
    Ok(Json(json!({ "removed": location })))
}

async fn list_favorites(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "favorites": state.registry.list_favorites().await }))
}

async fn add_favorite(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    state
        .registry
        .add_favorite(&location)
        .await
        .map_err(reject)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "favorite": location })),
    ))
}

async fn remove_favorite(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .registry
        .remove_favorite(&location)
        .await
        .map_err(reject)?;
    Ok(Json(json!({ "removed": location })))
}

/// Server-sent snapshot stream: one event per publisher tick, full snapshot
/// each time. Disconnecting drops the receiver, which is the unsubscribe.
async fn stream_snapshots(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.publisher.subscribe();
    Sse::new(snapshot_stream(rx)).keep_alive(KeepAlive::default())
}

fn snapshot_stream(
    rx: broadcast::Receiver<SnapshotEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) => match Event::default().json_data(&snapshot) {
                    Ok(event) => return Some((Ok(event), rx)),
                    Err(e) => {
                        warn!("failed to serialize snapshot event: {e}");
                        continue;
                    }
                },
                // A lagged subscriber skips straight to the newest snapshot.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}

fn reject(error: RegistryError) -> Rejection {
    (
        status_for(&error),
        Json(json!({ "error": error.to_string() })),
    )
}

fn status_for(error: &RegistryError) -> StatusCode {
    match error {
        RegistryError::AlreadyTracked
        | RegistryError::ProtectedByFavorite
        | RegistryError::AlreadyFavorite => StatusCode::CONFLICT,
        RegistryError::LocationNotFound
        | RegistryError::NotAFavorite
        | RegistryError::NotTracked => StatusCode::NOT_FOUND,
    }
}
