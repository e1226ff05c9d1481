//! Weather provider boundary.
//!
//! Everything upstream of the store goes through [`WeatherProvider`], so the
//! scheduler and registry never care which service actually answers. The only
//! production implementation talks to wttr.in.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::Reading;

pub mod wttr;

pub use wttr::WttrProvider;

/// A source of current weather conditions for a named location.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch the current reading for `location`.
    ///
    /// Implementations must map "unknown location" to [`FetchError::NotFound`]
    /// and unparseable payloads to [`FetchError::Malformed`]; transport
    /// failures (timeouts included) surface as [`FetchError::Network`].
    async fn fetch(&self, location: &str) -> Result<Reading, FetchError>;
}
