//! Core library for the `countrycard` CLI.
//!
//! This crate defines:
//! - Configuration & credential handling
//! - Upstream clients (REST Countries, OpenWeather, Nominatim, IP position)
//! - Weather route selection (direct vs proxied)
//! - The country lookup and the geolocation flow built on top of it
//! - Shared domain models and text rendering
//!
//! It is used by `countrycard-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod display;
pub mod error;
pub mod geolocation;
pub mod lookup;
pub mod model;
pub mod provider;
pub mod render;
pub mod route;

pub use config::Config;
pub use display::{DisplaySlot, Screen, Stage};
pub use error::LookupError;
pub use geolocation::{GeolocationResolver, PositionError, PositionSource};
pub use lookup::CountryLookup;
pub use model::{CountryRecord, DisplayRecord, Position, SearchOutcome, WeatherRecord};
pub use provider::{CountryApi, Providers, ReverseGeocoder, WeatherApi};
pub use route::{Environment, RouteDecision, WeatherRouting, resolve_weather_route};
