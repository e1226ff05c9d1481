//! Core domain types shared across the service.

use serde::{Deserialize, Serialize};

/// The weather fields fetched for one location at one point in time.
///
/// Every field is optional: `None` means "not yet fetched" or "last fetch
/// failed". Serialization keeps all keys present with JSON `null` values so
/// stream consumers always see the full shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reading {
    /// Temperature in Celsius
    pub temperature_c: Option<i32>,
    /// Relative humidity percentage (0-100)
    pub humidity_percent: Option<i32>,
    /// Human-readable description of weather conditions
    pub description: Option<String>,
    /// Wind speed in km/h
    pub wind_speed_kmh: Option<i32>,
    /// Atmospheric pressure in hPa
    pub pressure_hpa: Option<i32>,
    /// Visibility in kilometers
    pub visibility_km: Option<i32>,
}

impl Reading {
    /// The all-null reading committed while a location waits for its first
    /// fetch, or after a fetch for it failed.
    pub const EMPTY: Reading = Reading {
        temperature_c: None,
        humidity_percent: None,
        description: None,
        wind_speed_kmh: None,
        pressure_hpa: None,
        visibility_km: None,
    };

    /// Whether at least one field carries data.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.temperature_c.is_some()
            || self.humidity_percent.is_some()
            || self.description.is_some()
            || self.wind_speed_kmh.is_some()
            || self.pressure_hpa.is_some()
            || self.visibility_km.is_some()
    }
}
