use thiserror::Error;

/// Every failure a lookup can end in.
///
/// The `Display` output of each variant is the text shown to the user, so
/// variants carry already-humanised messages rather than source errors.
/// Transport failures are folded into the kind of the call that produced them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    WeatherUnavailable(String),

    #[error("Geolocation not supported: {0}")]
    UnsupportedCapability(String),

    #[error("Geolocation permission denied or unavailable: {0}")]
    LocationDenied(String),

    #[error("{0}")]
    GeocodeFailure(String),

    #[error("{0}")]
    Configuration(String),
}

impl LookupError {
    pub fn empty_query() -> Self {
        LookupError::Validation("Please enter a country name.".to_string())
    }

    pub fn country_status(status: u16) -> Self {
        LookupError::NotFound(format!("Country not found (status {status})"))
    }

    pub fn missing_credential() -> Self {
        LookupError::Configuration(
            "OpenWeather API key not found. Add one with `countrycard configure` for local development."
                .to_string(),
        )
    }

    /// Short machine-friendly name of the failure kind, used in logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::Validation(_) => "validation",
            LookupError::NotFound(_) => "not_found",
            LookupError::WeatherUnavailable(_) => "weather_unavailable",
            LookupError::UnsupportedCapability(_) => "unsupported_capability",
            LookupError::LocationDenied(_) => "location_denied",
            LookupError::GeocodeFailure(_) => "geocode_failure",
            LookupError::Configuration(_) => "configuration",
        }
    }
}

/// Cut long upstream bodies before they end up in a message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_status_message_matches_card_text() {
        let err = LookupError::country_status(404);
        assert_eq!(err.to_string(), "Country not found (status 404)");
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn location_denied_keeps_reason_verbatim() {
        let err = LookupError::LocationDenied("User denied Geolocation".into());
        assert_eq!(
            err.to_string(),
            "Geolocation permission denied or unavailable: User denied Geolocation"
        );
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let cut = truncate_body(&body);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= 203);

        assert_eq!(truncate_body("short"), "short");
    }
}
