use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// Country facts taken from the first match of a name lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub common_name: String,
    pub capital_cities: Vec<String>,
    pub population: Option<u64>,
    pub flag_image_url: Option<String>,
}

impl CountryRecord {
    /// The city the weather lookup runs for.
    pub fn capital(&self) -> Option<&str> {
        self.capital_cities.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub temperature_celsius: Option<f64>,
    pub condition_label: String,
    pub icon_code: Option<String>,
}

impl WeatherRecord {
    /// Temperature rounded half-up to a whole degree (2.5 -> 3, -2.5 -> -2).
    pub fn rounded_temperature(&self) -> Option<i64> {
        self.temperature_celsius
            .filter(|t| t.is_finite())
            .map(|t| (t + 0.5).floor() as i64)
    }

    pub fn icon_url(&self) -> Option<String> {
        self.icon_code
            .as_deref()
            .map(|code| format!("https://openweathermap.org/img/wn/{code}@2x.png"))
    }
}

/// Everything a completed search hands to rendering.
///
/// `weather` is only present when the country has a capital and the
/// weather call for it succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub country: CountryRecord,
    pub weather: Option<WeatherRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    Success(DisplayRecord),
    Failure { message: String },
}

impl SearchOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        SearchOutcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Success(_))
    }

    pub fn record(&self) -> Option<&DisplayRecord> {
        match self {
            SearchOutcome::Success(record) => Some(record),
            SearchOutcome::Failure { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            SearchOutcome::Success(_) => None,
            SearchOutcome::Failure { message } => Some(message),
        }
    }
}

impl From<Result<DisplayRecord, LookupError>> for SearchOutcome {
    fn from(result: Result<DisplayRecord, LookupError>) -> Self {
        match result {
            Ok(record) => SearchOutcome::Success(record),
            Err(err) => SearchOutcome::failure(err.to_string()),
        }
    }
}

/// A point reported by a position capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}
