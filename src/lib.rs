//! Skywatch - live weather snapshot service
//!
//! This library provides the core functionality: a registry of tracked
//! locations, a periodic refresh scheduler, a snapshot publisher, and the
//! HTTP control surface with a server-sent event stream.

pub mod api;
pub mod config;
pub mod error;
pub mod favorites;
pub mod models;
pub mod provider;
pub mod publisher;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod web;

// Re-export core types for public API
pub use config::AppConfig;
pub use error::{FetchError, RegistryError};
pub use favorites::{FavoritesRepo, FjallFavorites};
pub use models::Reading;
pub use provider::{WeatherProvider, WttrProvider};
pub use publisher::{SnapshotEvent, SnapshotPublisher};
pub use registry::LocationRegistry;
pub use scheduler::RefreshScheduler;
pub use store::SnapshotStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
