use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::{
    display::{DisplaySlot, Stage},
    error::LookupError,
    model::{DisplayRecord, SearchOutcome},
    provider::{CountryApi, Providers, WeatherApi},
};

/// Country name in, country card out.
///
/// The weather call needs the capital, so it only starts once the country
/// call has finished. Any failure along the way fails the whole search;
/// a country without weather is only shown when it has no capital at all.
#[derive(Debug, Clone)]
pub struct CountryLookup {
    countries: Arc<dyn CountryApi>,
    weather: Arc<dyn WeatherApi>,
    display: Option<DisplaySlot>,
}

impl CountryLookup {
    pub fn new(countries: Arc<dyn CountryApi>, weather: Arc<dyn WeatherApi>) -> Self {
        Self {
            countries,
            weather,
            display: None,
        }
    }

    pub fn from_providers(providers: &Providers) -> Self {
        Self::new(providers.countries.clone(), providers.weather.clone())
    }

    /// Report loading stages and final outcomes into `display`.
    pub fn with_display(mut self, display: DisplaySlot) -> Self {
        self.display = Some(display);
        self
    }

    pub fn display(&self) -> Option<&DisplaySlot> {
        self.display.as_ref()
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let outcome = match self.resolve(query).await {
            Ok(record) => {
                info!(country = %record.country.common_name, weather = record.weather.is_some(), "search finished");
                SearchOutcome::Success(record)
            }
            Err(err) => {
                warn!(kind = err.kind(), "search failed: {err}");
                SearchOutcome::failure(err.to_string())
            }
        };

        if let Some(display) = &self.display {
            display.publish(outcome.clone());
        }

        outcome
    }

    /// The lookup itself, without touching the display's final state.
    pub async fn resolve(&self, query: &str) -> Result<DisplayRecord, LookupError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LookupError::empty_query());
        }

        if let Some(display) = &self.display {
            display.begin(Stage::ResolvingCountry);
        }
        let country = self.countries.country_by_name(query).await?;

        let Some(capital) = country.capital().map(str::to_owned) else {
            debug!(country = %country.common_name, "no capital, skipping weather");
            return Ok(DisplayRecord {
                country,
                weather: None,
            });
        };

        if let Some(display) = &self.display {
            display.stage(Stage::ResolvingWeather);
        }
        let weather = self.weather.weather_for_city(&capital).await?;

        Ok(DisplayRecord {
            country,
            weather: Some(weather),
        })
    }
}
