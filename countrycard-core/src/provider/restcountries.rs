use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{error::LookupError, model::CountryRecord};

use super::CountryApi;

/// REST Countries v3.1 name search.
#[derive(Debug, Clone)]
pub struct RestCountriesClient {
    http: Client,
    base_url: Url,
}

impl RestCountriesClient {
    pub fn new(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// `{base}/{name}?fullText=false`, with the name percent-encoded as one segment.
    fn search_url(&self, name: &str) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::NotFound("Country lookup failed: invalid base URL".into()))?
            .pop_if_empty()
            .push(name);
        url.query_pairs_mut().append_pair("fullText", "false");
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct RcName {
    common: String,
}

#[derive(Debug, Default, Deserialize)]
struct RcFlags {
    svg: Option<String>,
    png: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RcCountry {
    name: RcName,
    #[serde(default)]
    capital: Vec<String>,
    population: Option<u64>,
    #[serde(default)]
    flags: RcFlags,
}

impl From<RcCountry> for CountryRecord {
    fn from(c: RcCountry) -> Self {
        let flag_image_url = c
            .flags
            .svg
            .filter(|s| !s.is_empty())
            .or(c.flags.png.filter(|s| !s.is_empty()));

        CountryRecord {
            common_name: c.name.common,
            capital_cities: c.capital,
            population: c.population,
            flag_image_url,
        }
    }
}

#[async_trait]
impl CountryApi for RestCountriesClient {
    #[instrument(skip(self))]
    async fn country_by_name(&self, name: &str) -> Result<CountryRecord, LookupError> {
        let url = self.search_url(name)?;

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| {
                LookupError::NotFound(format!("Country lookup failed: {}", e.without_url()))
            })?;

        let status = res.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "country lookup rejected");
            return Err(LookupError::country_status(status.as_u16()));
        }

        let matches: Vec<RcCountry> = res
            .json()
            .await
            .map_err(|e| {
                LookupError::NotFound(format!("Country lookup failed: {}", e.without_url()))
            })?;

        debug!(matches = matches.len(), "country lookup returned");

        // Several countries can match a partial name; the first one is used.
        matches
            .into_iter()
            .next()
            .map(CountryRecord::from)
            .ok_or_else(|| LookupError::NotFound("Country not found (no matches)".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> RestCountriesClient {
        RestCountriesClient::new(Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn search_url_encodes_name() {
        let url = client("https://restcountries.com/v3.1/name")
            .search_url("Côte d'Ivoire")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://restcountries.com/v3.1/name/C%C3%B4te%20d'Ivoire?fullText=false"
        );
    }

    #[test]
    fn search_url_tolerates_trailing_slash() {
        let url = client("https://restcountries.com/v3.1/name/")
            .search_url("France")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://restcountries.com/v3.1/name/France?fullText=false"
        );
    }

    #[test]
    fn flag_prefers_svg_then_png() {
        let json = r#"{"name":{"common":"France"},"capital":["Paris"],"population":67000000,
                       "flags":{"png":"https://flags/fr.png","svg":"https://flags/fr.svg"}}"#;
        let record: CountryRecord = serde_json::from_str::<RcCountry>(json).unwrap().into();
        assert_eq!(record.flag_image_url.as_deref(), Some("https://flags/fr.svg"));

        let json = r#"{"name":{"common":"Nowhere"},"flags":{"png":"https://flags/x.png"}}"#;
        let record: CountryRecord = serde_json::from_str::<RcCountry>(json).unwrap().into();
        assert_eq!(record.flag_image_url.as_deref(), Some("https://flags/x.png"));
        assert!(record.capital_cities.is_empty());
        assert_eq!(record.population, None);
    }
}
