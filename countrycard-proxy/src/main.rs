//! Weather proxy for deployments that must not ship the OpenWeather key to clients.
//!
//! Serves `GET /.netlify/functions/getWeather?city=...` and forwards it upstream
//! with the key taken from the environment at request time.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;

mod relay;
mod server;

#[derive(Debug, Parser)]
#[command(name = "countrycard-proxy", version, about = "OpenWeather proxy")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "PROXY_BIND", default_value = "127.0.0.1:8888")]
    bind: String,

    /// Upstream current-weather endpoint.
    #[arg(long, default_value = "https://api.openweathermap.org/data/2.5/weather")]
    upstream: Url,

    /// Environment variable that holds the API key.
    #[arg(long, default_value = "OPENWEATHER_API_KEY")]
    key_env: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    server::serve(server::ProxyConfig {
        bind_addr: args.bind,
        upstream: args.upstream,
        key_env: args.key_env,
    })
    .await
}
