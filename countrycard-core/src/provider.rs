use crate::{
    Config,
    error::LookupError,
    model::{CountryRecord, Position, WeatherRecord},
    provider::{
        ipapi::IpPositionSource, nominatim::NominatimGeocoder, openweather::OpenWeatherClient,
        restcountries::RestCountriesClient,
    },
    route::WeatherRouting,
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, sync::Arc};

pub mod ipapi;
pub mod nominatim;
pub mod openweather;
pub mod restcountries;

pub const USER_AGENT: &str = concat!("countrycard/", env!("CARGO_PKG_VERSION"));

/// Resolves a country name to its first plausible match.
#[async_trait]
pub trait CountryApi: Send + Sync + Debug {
    async fn country_by_name(&self, name: &str) -> Result<CountryRecord, LookupError>;
}

/// Current weather for a city.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn weather_for_city(&self, city: &str) -> Result<WeatherRecord, LookupError>;
}

/// Turns coordinates into a country name.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    async fn country_at(&self, position: Position) -> Result<String, LookupError>;
}

/// Shared HTTP client for every upstream. No request timeout is set; only
/// the position request is bounded, and that happens in the geolocation layer.
pub fn http_client() -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// The set of upstream clients built from one configuration.
#[derive(Debug, Clone)]
pub struct Providers {
    pub countries: Arc<dyn CountryApi>,
    pub weather: Arc<dyn WeatherApi>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub ip_position: Option<IpPositionSource>,
}

impl Providers {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = http_client()?;

        let countries = RestCountriesClient::new(http.clone(), config.countries_url()?);
        let weather = OpenWeatherClient::new(
            http.clone(),
            config.weather_url()?,
            WeatherRouting::from_config(config),
        );
        let geocoder = NominatimGeocoder::new(http.clone(), config.geocode_url()?);
        let ip_position = config
            .geolocation
            .ip_lookup_url
            .clone()
            .map(|url| IpPositionSource::new(http, url));

        Ok(Self {
            countries: Arc::new(countries),
            weather: Arc::new(weather),
            geocoder: Arc::new(geocoder),
            ip_position,
        })
    }
}
