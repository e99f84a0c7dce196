use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::{
    geolocation::{PositionError, PositionSource},
    model::Position,
};

/// Approximate position from the caller's public IP (ip-api.com response shape).
#[derive(Debug, Clone)]
pub struct IpPositionSource {
    http: Client,
    url: Url,
}

impl IpPositionSource {
    pub fn new(http: Client, url: Url) -> Self {
        Self { http, url }
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLookupResponse {
    fn into_position(self) -> Result<Position, PositionError> {
        if self.status.as_deref().is_some_and(|s| s != "success") {
            return Err(PositionError::new(
                self.message
                    .unwrap_or_else(|| "Position lookup failed".to_string()),
            ));
        }

        match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => Ok(Position {
                latitude,
                longitude,
            }),
            _ => Err(PositionError::new("Position unavailable")),
        }
    }
}

#[async_trait]
impl PositionSource for IpPositionSource {
    #[instrument(skip(self))]
    async fn current_position(&self) -> Result<Position, PositionError> {
        let res = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| PositionError::new(e.without_url().to_string()))?;

        if !res.status().is_success() {
            return Err(PositionError::new(format!(
                "Position lookup failed with status {}",
                res.status().as_u16()
            )));
        }

        let parsed: IpLookupResponse = res
            .json()
            .await
            .map_err(|e| PositionError::new(e.without_url().to_string()))?;

        parsed.into_position()
    }
}
