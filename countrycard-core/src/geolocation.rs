//! "Use my location": position, then reverse geocode, then a normal search.
//!
//! Each step runs once; a failure at any step ends the attempt.

use async_trait::async_trait;
use std::{fmt, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{sync::oneshot, time::timeout};
use tracing::{debug, instrument, warn};

use crate::{
    config::DEFAULT_POSITION_TIMEOUT_SECS,
    display::Stage,
    error::LookupError,
    lookup::CountryLookup,
    model::{Position, SearchOutcome},
    provider::ReverseGeocoder,
};

/// Why a position could not be obtained. The text is shown to the user as is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct PositionError(String);

impl PositionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

#[async_trait]
pub trait PositionSource: Send + Sync + fmt::Debug {
    async fn current_position(&self) -> Result<Position, PositionError>;
}

/// Coordinates known up front, e.g. passed on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Position);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Position, PositionError> {
        Ok(self.0)
    }
}

/// Single-use answer handed to a callback-style position capability.
///
/// Consuming `resolve`/`reject` means the request completes at most once;
/// dropping the reply without answering counts as a denial.
#[derive(Debug)]
pub struct PositionReply {
    tx: oneshot::Sender<Result<Position, PositionError>>,
}

impl PositionReply {
    pub fn resolve(self, position: Position) {
        let _ = self.tx.send(Ok(position));
    }

    pub fn reject(self, reason: impl Into<String>) {
        let _ = self.tx.send(Err(PositionError::new(reason)));
    }
}

/// Adapts a capability that reports through a callback into a `PositionSource`.
pub struct CallbackPosition<F> {
    request: F,
}

impl<F> CallbackPosition<F>
where
    F: Fn(PositionReply) + Send + Sync,
{
    pub fn new(request: F) -> Self {
        Self { request }
    }
}

impl<F> fmt::Debug for CallbackPosition<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallbackPosition")
    }
}

#[async_trait]
impl<F> PositionSource for CallbackPosition<F>
where
    F: Fn(PositionReply) + Send + Sync,
{
    async fn current_position(&self) -> Result<Position, PositionError> {
        let (tx, rx) = oneshot::channel();
        (self.request)(PositionReply { tx });

        rx.await
            .unwrap_or_else(|_| Err(PositionError::new("Position request was abandoned")))
    }
}

#[derive(Debug, Clone)]
pub struct GeolocationResolver {
    source: Option<Arc<dyn PositionSource>>,
    geocoder: Arc<dyn ReverseGeocoder>,
    lookup: CountryLookup,
    timeout: Duration,
}

impl GeolocationResolver {
    /// `source` is `None` when no position capability exists at all.
    pub fn new(
        source: Option<Arc<dyn PositionSource>>,
        geocoder: Arc<dyn ReverseGeocoder>,
        lookup: CountryLookup,
    ) -> Self {
        Self {
            source,
            geocoder,
            lookup,
            timeout: Duration::from_secs(DEFAULT_POSITION_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Locate the user and search for their country.
    ///
    /// Once a country name is known the search outcome is returned unchanged.
    #[instrument(skip(self))]
    pub async fn locate(&self) -> SearchOutcome {
        match self.resolve_country().await {
            Ok(country) => self.lookup.search(&country).await,
            Err(err) => {
                warn!(kind = err.kind(), "locate failed: {err}");
                let outcome = SearchOutcome::failure(err.to_string());
                if let Some(display) = self.lookup.display() {
                    display.publish(outcome.clone());
                }
                outcome
            }
        }
    }

    /// Position -> country name, without running the search.
    pub async fn resolve_country(&self) -> Result<String, LookupError> {
        let source = self.source.as_ref().ok_or_else(|| {
            LookupError::UnsupportedCapability("no position source is available".into())
        })?;

        if let Some(display) = self.lookup.display() {
            display.begin(Stage::Locating);
        }

        let position = match timeout(self.timeout, source.current_position()).await {
            Ok(Ok(position)) => position,
            Ok(Err(err)) => return Err(LookupError::LocationDenied(err.reason().to_string())),
            Err(_) => return Err(LookupError::LocationDenied("Timeout expired".into())),
        };
        debug!(?position, "position acquired");

        if let Some(display) = self.lookup.display() {
            display.stage(Stage::ReverseGeocoding);
        }
        self.geocoder.country_at(position).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::tests::{FakeCountries, FakeWeather, clear_paris, france};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeGeocoder {
        country: Option<String>,
        calls: Mutex<Vec<Position>>,
    }

    #[async_trait]
    impl ReverseGeocoder for FakeGeocoder {
        async fn country_at(&self, position: Position) -> Result<String, LookupError> {
            self.calls.lock().unwrap().push(position);
            self.country.clone().ok_or_else(|| {
                LookupError::GeocodeFailure("Could not determine country from coordinates.".into())
            })
        }
    }

    #[derive(Debug)]
    struct NeverAnswers;

    #[async_trait]
    impl PositionSource for NeverAnswers {
        async fn current_position(&self) -> Result<Position, PositionError> {
            std::future::pending().await
        }
    }

    const PARIS: Position = Position {
        latitude: 48.8566,
        longitude: 2.3522,
    };

    fn lookup(countries: &Arc<FakeCountries>) -> CountryLookup {
        CountryLookup::new(
            countries.clone(),
            Arc::new(FakeWeather {
                result: Some(Ok(clear_paris())),
                ..Default::default()
            }),
        )
    }

    fn france_countries() -> Arc<FakeCountries> {
        Arc::new(FakeCountries {
            result: Some(Ok(france())),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn located_country_is_searched() {
        let countries = france_countries();
        let geocoder = Arc::new(FakeGeocoder {
            country: Some("France".into()),
            ..Default::default()
        });
        let resolver = GeolocationResolver::new(
            Some(Arc::new(FixedPosition(PARIS))),
            geocoder.clone(),
            lookup(&countries),
        );

        let outcome = resolver.locate().await;

        assert!(outcome.is_success());
        assert_eq!(*geocoder.calls.lock().unwrap(), vec![PARIS]);
        assert_eq!(*countries.queries.lock().unwrap(), vec!["France"]);
    }

    #[tokio::test]
    async fn missing_capability_is_unsupported() {
        let countries = france_countries();
        let resolver =
            GeolocationResolver::new(None, Arc::new(FakeGeocoder::default()), lookup(&countries));

        let err = resolver.resolve_country().await.unwrap_err();
        assert_eq!(err.kind(), "unsupported_capability");
        assert!(countries.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn denial_reason_is_kept_and_no_search_runs() {
        let countries = france_countries();
        let geocoder = Arc::new(FakeGeocoder::default());
        let source = CallbackPosition::new(|reply: PositionReply| {
            reply.reject("User denied Geolocation");
        });
        let resolver =
            GeolocationResolver::new(Some(Arc::new(source)), geocoder.clone(), lookup(&countries));

        let outcome = resolver.locate().await;

        assert_eq!(
            outcome.message(),
            Some("Geolocation permission denied or unavailable: User denied Geolocation")
        );
        assert!(geocoder.calls.lock().unwrap().is_empty());
        assert!(countries.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn callback_resolution_reaches_geocoder() {
        let countries = france_countries();
        let geocoder = Arc::new(FakeGeocoder {
            country: Some("France".into()),
            ..Default::default()
        });
        let source = CallbackPosition::new(|reply: PositionReply| reply.resolve(PARIS));
        let resolver =
            GeolocationResolver::new(Some(Arc::new(source)), geocoder.clone(), lookup(&countries));

        assert_eq!(resolver.resolve_country().await.unwrap(), "France");
    }

    #[tokio::test]
    async fn dropped_reply_counts_as_denial() {
        let countries = france_countries();
        let source = CallbackPosition::new(|reply: PositionReply| drop(reply));
        let resolver = GeolocationResolver::new(
            Some(Arc::new(source)),
            Arc::new(FakeGeocoder::default()),
            lookup(&countries),
        );

        let err = resolver.resolve_country().await.unwrap_err();
        assert_eq!(err.kind(), "location_denied");
    }

    #[tokio::test(start_paused = true)]
    async fn position_request_times_out() {
        let countries = france_countries();
        let resolver = GeolocationResolver::new(
            Some(Arc::new(NeverAnswers)),
            Arc::new(FakeGeocoder::default()),
            lookup(&countries),
        );

        let err = resolver.resolve_country().await.unwrap_err();
        assert_eq!(
            err,
            LookupError::LocationDenied("Timeout expired".into())
        );
    }

    #[tokio::test]
    async fn geocode_without_country_fails() {
        let countries = france_countries();
        let resolver = GeolocationResolver::new(
            Some(Arc::new(FixedPosition(PARIS))),
            Arc::new(FakeGeocoder::default()),
            lookup(&countries),
        );

        let outcome = resolver.locate().await;
        assert_eq!(
            outcome.message(),
            Some("Could not determine country from coordinates.")
        );
        assert!(countries.queries.lock().unwrap().is_empty());
    }
}
