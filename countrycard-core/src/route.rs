//! Picks how a weather request reaches OpenWeather: straight from the client
//! with a local credential, or through the proxy that holds it server-side.

use std::fmt;
use url::Url;

use crate::{config::Config, error::LookupError};

/// Path of the proxy function relative to the deployed site.
pub const DEFAULT_PROXY_PATH: &str = "/.netlify/functions/getWeather";

/// Deployment topology the app runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// No site URL, or a site served from the local machine.
    Local,
    /// Served from a public site that also hosts the proxy function.
    Deployed(Url),
}

impl Environment {
    pub fn detect(site_url: Option<&Url>) -> Self {
        match site_url {
            Some(url) if !is_local_host(url) => Environment::Deployed(url.clone()),
            _ => Environment::Local,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Environment::Local)
    }
}

fn is_local_host(url: &Url) -> bool {
    matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"))
}

/// API key that stays out of logs and debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, only for putting on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Direct(Credential),
    Proxied(Url),
}

/// Decide the route for one weather request.
///
/// A credential always wins. Without one, an explicit proxy URL is used, then
/// the proxy path on the deployed site. A local run with neither is a
/// configuration error, raised before any request goes out.
pub fn resolve_weather_route(
    credential: Option<&str>,
    proxy_url: Option<&Url>,
    environment: &Environment,
) -> Result<RouteDecision, LookupError> {
    if let Some(key) = credential.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(RouteDecision::Direct(Credential::new(key)));
    }

    if let Some(proxy) = proxy_url {
        return Ok(RouteDecision::Proxied(proxy.clone()));
    }

    match environment {
        Environment::Deployed(site) => site
            .join(DEFAULT_PROXY_PATH)
            .map(RouteDecision::Proxied)
            .map_err(|e| LookupError::Configuration(format!("Invalid site URL for proxy: {e}"))),
        Environment::Local => Err(LookupError::missing_credential()),
    }
}

/// Route inputs captured from configuration; resolved again on every request.
#[derive(Clone)]
pub struct WeatherRouting {
    credential: Option<String>,
    proxy_url: Option<Url>,
    environment: Environment,
}

impl WeatherRouting {
    pub fn new(credential: Option<String>, proxy_url: Option<Url>, environment: Environment) -> Self {
        Self {
            credential,
            proxy_url,
            environment,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.credential().map(str::to_owned),
            config.weather.proxy_url.clone(),
            config.environment(),
        )
    }

    pub fn resolve(&self) -> Result<RouteDecision, LookupError> {
        resolve_weather_route(
            self.credential.as_deref(),
            self.proxy_url.as_ref(),
            &self.environment,
        )
    }
}

impl fmt::Debug for WeatherRouting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherRouting")
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .field("proxy_url", &self.proxy_url)
            .field("environment", &self.environment)
            .finish()
    }
}
