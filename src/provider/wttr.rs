//! wttr.in adapter.
//!
//! wttr.in serves current conditions as JSON under `/{location}?format=j1`.
//! All numeric fields arrive as strings; a field that fails to parse becomes
//! `None` rather than failing the whole reading.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::WeatherProvider;
use crate::error::FetchError;
use crate::models::Reading;

pub struct WttrProvider {
    client: Client,
    base_url: String,
}

impl WttrProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skywatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for WttrProvider {
    async fn fetch(&self, location: &str) -> Result<Reading, FetchError> {
        let url = format!(
            "{}/{}?format=j1",
            self.base_url,
            urlencoding::encode(location)
        );
        debug!(%location, "fetching current conditions");

        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound),
            status if !status.is_success() => {
                return Err(FetchError::Malformed(format!(
                    "unexpected status {status}"
                )));
            }
            _ => {}
        }

        let body: WttrResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                FetchError::Malformed(e.to_string())
            } else {
                FetchError::Network(e)
            }
        })?;

        let current = body
            .current_condition
            .first()
            .ok_or_else(|| FetchError::Malformed("empty current_condition".to_string()))?;

        Ok(current.to_reading())
    }
}

/// Current conditions payload from wttr.in (`format=j1`), reduced to the
/// fields we publish.
#[derive(Debug, Deserialize)]
struct WttrResponse {
    #[serde(default)]
    current_condition: Vec<CurrentCondition>,
}

#[derive(Debug, Deserialize)]
struct CurrentCondition {
    #[serde(rename = "temp_C")]
    temp_c: Option<String>,
    humidity: Option<String>,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<ValueField>,
    #[serde(rename = "windspeedKmph")]
    windspeed_kmph: Option<String>,
    pressure: Option<String>,
    visibility: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValueField {
    value: String,
}

impl CurrentCondition {
    fn to_reading(&self) -> Reading {
        Reading {
            temperature_c: parse_int(self.temp_c.as_deref()),
            humidity_percent: parse_int(self.humidity.as_deref()),
            description: self
                .weather_desc
                .first()
                .map(|d| d.value.trim().to_string())
                .filter(|d| !d.is_empty()),
            wind_speed_kmh: parse_int(self.windspeed_kmph.as_deref()),
            pressure_hpa: parse_int(self.pressure.as_deref()),
            visibility_km: parse_int(self.visibility.as_deref()),
        }
    }
}

fn parse_int(raw: Option<&str>) -> Option<i32> {
    raw.and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE_J1: &str = r#"{
        "current_condition": [{
            "temp_C": "14",
            "humidity": "77",
            "weatherDesc": [{"value": "Partly cloudy"}],
            "windspeedKmph": "19",
            "pressure": "1012",
            "visibility": "10",
            "FeelsLikeC": "12"
        }]
    }"#;

    #[test]
    fn sample_payload_maps_to_reading() {
        let body: WttrResponse = serde_json::from_str(SAMPLE_J1).expect("parse");
        let reading = body.current_condition[0].to_reading();

        assert_eq!(reading.temperature_c, Some(14));
        assert_eq!(reading.humidity_percent, Some(77));
        assert_eq!(reading.description.as_deref(), Some("Partly cloudy"));
        assert_eq!(reading.wind_speed_kmh, Some(19));
        assert_eq!(reading.pressure_hpa, Some(1012));
        assert_eq!(reading.visibility_km, Some(10));
    }

    #[test]
    fn missing_and_unparseable_fields_become_null() {
        let body: WttrResponse = serde_json::from_str(
            r#"{"current_condition": [{"temp_C": "n/a", "humidity": "60"}]}"#,
        )
        .expect("parse");
        let reading = body.current_condition[0].to_reading();

        assert_eq!(reading.temperature_c, None);
        assert_eq!(reading.humidity_percent, Some(60));
        assert_eq!(reading.description, None);
        assert!(reading.has_data());
    }

    #[test]
    fn empty_current_condition_is_detectable() {
        let body: WttrResponse =
            serde_json::from_str(r#"{"current_condition": []}"#).expect("parse");
        assert!(body.current_condition.is_empty());
    }

    #[rstest]
    #[case(Some("21"), Some(21))]
    #[case(Some(" -3 "), Some(-3))]
    #[case(Some(""), None)]
    #[case(Some("abc"), None)]
    #[case(None, None)]
    fn integer_parsing(#[case] raw: Option<&str>, #[case] expected: Option<i32>) {
        assert_eq!(parse_int(raw), expected);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider =
            WttrProvider::new("https://wttr.in/", Duration::from_secs(5)).expect("client");
        assert_eq!(provider.base_url, "https://wttr.in");
    }
}
