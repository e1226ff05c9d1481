//! Runtime configuration for the skywatch service.
//!
//! Defaults match the reference deployment; every field can be overridden
//! through a `SKYWATCH_`-prefixed environment variable.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port the HTTP server binds on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds between refresh cycles
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Seconds between snapshot emissions to subscribers
    #[serde(default = "default_publish_interval")]
    pub publish_interval_secs: u64,
    /// Base URL of the weather provider
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,
    /// Per-request timeout against the provider, in seconds
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,
    /// Directory holding the favorites database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_port() -> u16 {
    8000
}

fn default_refresh_interval() -> u64 {
    2
}

fn default_publish_interval() -> u64 {
    5
}

fn default_provider_base_url() -> String {
    "https://wttr.in".to_string()
}

fn default_provider_timeout() -> u64 {
    10
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            refresh_interval_secs: default_refresh_interval(),
            publish_interval_secs: default_publish_interval(),
            provider_base_url: default_provider_base_url(),
            provider_timeout_secs: default_provider_timeout(),
            data_dir: default_data_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, validated and ready to use.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = read_env("SKYWATCH_PORT")? {
            config.port = port;
        }
        if let Some(secs) = read_env("SKYWATCH_REFRESH_INTERVAL_SECS")? {
            config.refresh_interval_secs = secs;
        }
        if let Some(secs) = read_env("SKYWATCH_PUBLISH_INTERVAL_SECS")? {
            config.publish_interval_secs = secs;
        }
        if let Some(url) = read_env("SKYWATCH_PROVIDER_BASE_URL")? {
            config.provider_base_url = url;
        }
        if let Some(secs) = read_env("SKYWATCH_PROVIDER_TIMEOUT_SECS")? {
            config.provider_timeout_secs = secs;
        }
        if let Some(dir) = read_env::<PathBuf>("SKYWATCH_DATA_DIR")? {
            config.data_dir = dir;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate all settings before anything is spawned.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("port must be non-zero");
        }
        if self.refresh_interval_secs == 0 || self.refresh_interval_secs > 3600 {
            bail!(
                "refresh interval must be between 1 and 3600 seconds, got {}",
                self.refresh_interval_secs
            );
        }
        if self.publish_interval_secs == 0 || self.publish_interval_secs > 3600 {
            bail!(
                "publish interval must be between 1 and 3600 seconds, got {}",
                self.publish_interval_secs
            );
        }
        if self.provider_timeout_secs == 0 || self.provider_timeout_secs > 300 {
            bail!(
                "provider timeout must be between 1 and 300 seconds, got {}",
                self.provider_timeout_secs
            );
        }
        if !self.provider_base_url.starts_with("http://")
            && !self.provider_base_url.starts_with("https://")
        {
            bail!("provider base URL must be an HTTP or HTTPS URL");
        }
        Ok(())
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    #[must_use]
    pub fn publish_interval(&self) -> Duration {
        Duration::from_secs(self.publish_interval_secs)
    }

    #[must_use]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

fn read_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => {
            let parsed = raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {key}: '{raw}'"))?;
            Ok(Some(parsed))
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {key}")),
    }
}
