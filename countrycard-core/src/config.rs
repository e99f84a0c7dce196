use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use url::Url;

use crate::route::Environment;

pub const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v3.1/name";
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const DEFAULT_POSITION_TIMEOUT_SECS: u64 = 10;

/// Weather credential and proxy settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherConfig {
    /// OpenWeather API key. Its absence is a normal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Explicit proxy endpoint, used when no key is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<Url>,
}

/// Where the app is served from; decides local vs deployed.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
}

/// Upstream base URLs. Unset fields fall back to the public services.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Endpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countries: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocode: Option<Url>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    /// IP based position lookup, e.g. `http://ip-api.com/json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_lookup_url: Option<Url>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            ip_lookup_url: None,
            timeout_secs: DEFAULT_POSITION_TIMEOUT_SECS,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_POSITION_TIMEOUT_SECS
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [weather]
/// api_key = "..."
/// [site]
/// url = "https://countries.example.org"
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub geolocation: GeolocationConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "countrycard", "countrycard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// The weather credential, if one is set and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.weather
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Set or clear the credential. Blank input clears it.
    pub fn set_credential(&mut self, api_key: Option<String>) {
        self.weather.api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
    }

    pub fn environment(&self) -> Environment {
        Environment::detect(self.site.url.as_ref())
    }

    pub fn countries_url(&self) -> Result<Url> {
        endpoint_or_default(self.endpoints.countries.as_ref(), DEFAULT_COUNTRIES_URL)
    }

    pub fn weather_url(&self) -> Result<Url> {
        endpoint_or_default(self.endpoints.weather.as_ref(), DEFAULT_WEATHER_URL)
    }

    pub fn geocode_url(&self) -> Result<Url> {
        endpoint_or_default(self.endpoints.geocode.as_ref(), DEFAULT_GEOCODE_URL)
    }

    pub fn position_timeout(&self) -> Duration {
        Duration::from_secs(self.geolocation.timeout_secs)
    }
}

fn endpoint_or_default(configured: Option<&Url>, default: &str) -> Result<Url> {
    match configured {
        Some(url) => Ok(url.clone()),
        None => Url::parse(default).with_context(|| format!("Invalid default endpoint: {default}")),
    }
}
