//! Error types for the skywatch service.

use thiserror::Error;

/// Failure modes of a single provider fetch.
///
/// The refresh scheduler treats every kind the same way (the location keeps
/// its snapshot entry with an all-null reading); only `add_tracked` validation
/// cares that the fetch failed at all.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider does not know the location
    #[error("location not found")]
    NotFound,

    /// Transport-level failure, including timeouts
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with something we could not interpret
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Rejection reasons surfaced by the location registry.
///
/// None of these is fatal; the HTTP layer maps each to a status code and the
/// display text becomes the response message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("location is already tracked")]
    AlreadyTracked,

    /// The validation fetch yielded no data, so the location was not added
    #[error("location not found")]
    LocationNotFound,

    #[error("location is protected by a favorite")]
    ProtectedByFavorite,

    #[error("location is already a favorite")]
    AlreadyFavorite,

    #[error("location is not a favorite")]
    NotAFavorite,

    #[error("location is not tracked")]
    NotTracked,
}
