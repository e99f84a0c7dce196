use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use url::Url;

use crate::relay::{RelayReply, relay};

pub const FUNCTION_PATH: &str = "/.netlify/functions/getWeather";

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub bind_addr: String,
    pub upstream: Url,
    /// Name of the environment variable holding the key; read on every request.
    pub key_env: String,
}

struct ProxyState {
    http: Client,
    upstream: Url,
    key_env: String,
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    city: Option<String>,
}

impl IntoResponse for RelayReply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

pub fn router(config: &ProxyConfig, http: Client) -> Router {
    let state = Arc::new(ProxyState {
        http,
        upstream: config.upstream.clone(),
        key_env: config.key_env.clone(),
    });

    Router::new()
        .route(FUNCTION_PATH, get(weather_handler))
        .route("/weather", get(weather_handler))
        .with_state(state)
}

pub async fn serve(config: ProxyConfig) -> anyhow::Result<()> {
    let http = Client::builder()
        .user_agent(concat!("countrycard-proxy/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let app = router(&config, http);

    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    info!(addr = %config.bind_addr, upstream = %config.upstream, "weather proxy listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn weather_handler(
    State(state): State<Arc<ProxyState>>,
    Query(params): Query<WeatherQuery>,
) -> RelayReply {
    let api_key = std::env::var(&state.key_env).ok();
    relay(
        &state.http,
        &state.upstream,
        api_key.as_deref(),
        params.city.as_deref(),
    )
    .await
}
