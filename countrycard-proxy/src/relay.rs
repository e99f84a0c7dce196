use reqwest::Client;
use serde_json::{Value, json};
use tracing::{instrument, warn};
use url::Url;

pub const MISSING_KEY: &str = "Missing OpenWeather API key on server.";
pub const MISSING_CITY: &str = "Missing city query parameter.";

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// What the proxy answers with, before it becomes an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl RelayReply {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: TEXT,
            body: body.to_string(),
        }
    }

    fn error_json(message: String) -> Self {
        Self {
            status: 500,
            content_type: JSON,
            body: json!({ "message": message }).to_string(),
        }
    }
}

/// Forward one weather request upstream with the server-held key.
///
/// The upstream status and JSON body are passed through unchanged.
#[instrument(skip(http, api_key))]
pub async fn relay(
    http: &Client,
    upstream: &Url,
    api_key: Option<&str>,
    city: Option<&str>,
) -> RelayReply {
    let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
        warn!("no API key configured on the server");
        return RelayReply::text(500, MISSING_KEY);
    };
    let Some(city) = city.map(str::trim).filter(|c| !c.is_empty()) else {
        return RelayReply::text(400, MISSING_CITY);
    };

    let url = match Url::parse_with_params(
        upstream.as_str(),
        &[("q", city), ("units", "metric"), ("appid", key)],
    ) {
        Ok(url) => url,
        Err(e) => return RelayReply::error_json(e.to_string()),
    };

    let res = match http.get(url).send().await {
        Ok(res) => res,
        Err(e) => {
            warn!("upstream request failed: {e}");
            return RelayReply::error_json(e.without_url().to_string());
        }
    };

    let status = res.status().as_u16();
    match res.json::<Value>().await {
        Ok(body) => RelayReply {
            status,
            content_type: JSON,
            body: body.to_string(),
        },
        Err(e) => RelayReply::error_json(e.without_url().to_string()),
    }
}
