use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    error::{LookupError, truncate_body},
    model::WeatherRecord,
    route::{RouteDecision, WeatherRouting},
};

use super::WeatherApi;

/// Current weather from OpenWeather, either directly or through the proxy.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: Url,
    routing: WeatherRouting,
}

impl OpenWeatherClient {
    pub fn new(http: Client, base_url: Url, routing: WeatherRouting) -> Self {
        Self {
            http,
            base_url,
            routing,
        }
    }

    fn request_url(&self, route: &RouteDecision, city: &str) -> Result<Url, LookupError> {
        match route {
            RouteDecision::Direct(credential) => Url::parse_with_params(
                self.base_url.as_str(),
                &[
                    ("q", city),
                    ("units", "metric"),
                    ("appid", credential.expose()),
                ],
            )
            .map_err(|e| LookupError::WeatherUnavailable(format!("Weather fetch failed: {e}"))),
            RouteDecision::Proxied(endpoint) => {
                let mut url = endpoint.clone();
                url.query_pairs_mut().append_pair("city", city);
                Ok(url)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    main: Option<String>,
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OwMain {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    weather: Vec<OwCondition>,
    #[serde(default)]
    main: OwMain,
}

impl From<OwCurrentResponse> for WeatherRecord {
    fn from(parsed: OwCurrentResponse) -> Self {
        let first = parsed.weather.into_iter().next();

        let (condition_label, icon_code) = match first {
            Some(w) => {
                let label = w
                    .main
                    .filter(|s| !s.is_empty())
                    .or(w.description)
                    .unwrap_or_default();
                (label, w.icon.filter(|s| !s.is_empty()))
            }
            None => (String::new(), None),
        };

        WeatherRecord {
            temperature_celsius: parsed.main.temp,
            condition_label,
            icon_code,
        }
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn weather_for_city(&self, city: &str) -> Result<WeatherRecord, LookupError> {
        let route = self.routing.resolve()?;
        let proxied = matches!(route, RouteDecision::Proxied(_));
        debug!(proxied, "weather route resolved");

        let url = self.request_url(&route, city)?;

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| {
                LookupError::WeatherUnavailable(format!("Weather fetch failed: {}", e.without_url()))
            })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| {
                LookupError::WeatherUnavailable(format!("Weather fetch failed: {}", e.without_url()))
            })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), proxied, "weather request rejected");
            return Err(LookupError::WeatherUnavailable(format!(
                "Weather fetch failed: {} {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            LookupError::WeatherUnavailable(format!("Weather fetch failed: malformed response: {e}"))
        })?;

        Ok(parsed.into())
    }
}
