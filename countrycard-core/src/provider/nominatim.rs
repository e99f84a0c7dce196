use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::{error::LookupError, model::Position};

use super::ReverseGeocoder;

const NO_COUNTRY: &str = "Could not determine country from coordinates.";

/// OpenStreetMap Nominatim reverse geocoding.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: Client,
    base_url: Url,
}

impl NominatimGeocoder {
    pub fn new(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn reverse_url(&self, position: Position) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &position.latitude.to_string())
            .append_pair("lon", &position.longitude.to_string());
        url
    }
}

#[derive(Debug, Default, Deserialize)]
struct NmAddress {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NmReverseResponse {
    #[serde(default)]
    address: NmAddress,
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn country_at(&self, position: Position) -> Result<String, LookupError> {
        let res = self
            .http
            .get(self.reverse_url(position))
            .send()
            .await
            .map_err(|e| {
                LookupError::GeocodeFailure(format!("{NO_COUNTRY} ({})", e.without_url()))
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(LookupError::GeocodeFailure(format!(
                "{NO_COUNTRY} (status {})",
                status.as_u16()
            )));
        }

        let parsed: NmReverseResponse = res
            .json()
            .await
            .map_err(|e| {
                LookupError::GeocodeFailure(format!("{NO_COUNTRY} ({})", e.without_url()))
            })?;

        let country = parsed
            .address
            .country
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LookupError::GeocodeFailure(NO_COUNTRY.to_string()))?;

        debug!(%country, "coordinates resolved");
        Ok(country)
    }
}
