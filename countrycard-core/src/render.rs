//! Plain-text rendering of a country card for the terminal.

use std::fmt::Write;

use crate::{
    display::{Content, Screen},
    model::{DisplayRecord, SearchOutcome, WeatherRecord},
};

const MISSING: &str = "—";

pub fn render_outcome(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Success(record) => render_card(record),
        SearchOutcome::Failure { message } => format!("Error: {message}\n"),
    }
}

pub fn render_screen(screen: &Screen) -> String {
    let mut out = String::new();
    if let Some(stage) = screen.loading {
        let _ = writeln!(out, "{}", stage.label());
    }
    if let Content::Outcome(outcome) = &screen.content {
        out.push_str(&render_outcome(outcome));
    }
    out
}

pub fn render_card(record: &DisplayRecord) -> String {
    let country = &record.country;
    let mut out = String::new();

    let capital = country.capital().unwrap_or(MISSING);
    let population = country
        .population
        .filter(|&p| p > 0)
        .map(group_thousands)
        .unwrap_or_else(|| MISSING.to_string());

    let _ = writeln!(out, "{}", country.common_name);
    let _ = writeln!(out, "Capital: {capital} · Population: {population}");
    if let Some(flag) = &country.flag_image_url {
        let _ = writeln!(out, "Flag: {flag}");
    }

    match &record.weather {
        Some(weather) => out.push_str(&render_weather(weather)),
        None => out.push_str("Weather not available\n"),
    }

    out
}

fn render_weather(weather: &WeatherRecord) -> String {
    let temp = weather
        .rounded_temperature()
        .map(|t| t.to_string())
        .unwrap_or_else(|| MISSING.to_string());

    let mut line = format!("{temp}°C");
    if !weather.condition_label.is_empty() {
        line.push(' ');
        line.push_str(&weather.condition_label);
    }
    if let Some(icon) = weather.icon_url() {
        let _ = write!(line, " ({icon})");
    }
    line.push('\n');
    line
}

/// 67000000 -> "67,000,000"
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        display::Stage,
        model::{CountryRecord, WeatherRecord},
    };

    fn france() -> DisplayRecord {
        DisplayRecord {
            country: CountryRecord {
                common_name: "France".into(),
                capital_cities: vec!["Paris".into()],
                population: Some(67_000_000),
                flag_image_url: Some("https://flagcdn.com/fr.svg".into()),
            },
            weather: Some(WeatherRecord {
                temperature_celsius: Some(18.4),
                condition_label: "Clear".into(),
                icon_code: Some("01d".into()),
            }),
        }
    }

    #[test]
    fn card_for_france() {
        let card = render_card(&france());
        assert_eq!(
            card,
            "France\n\
             Capital: Paris · Population: 67,000,000\n\
             Flag: https://flagcdn.com/fr.svg\n\
             18°C Clear (https://openweathermap.org/img/wn/01d@2x.png)\n"
        );
    }

    #[test]
    fn card_without_weather() {
        let record = DisplayRecord {
            country: CountryRecord {
                common_name: "Antarctica".into(),
                capital_cities: vec![],
                population: Some(0),
                flag_image_url: None,
            },
            weather: None,
        };
        let card = render_card(&record);
        assert!(card.contains("Capital: — · Population: —"));
        assert!(card.ends_with("Weather not available\n"));
        assert!(!card.contains("Flag:"));
    }

    #[test]
    fn unknown_temperature_shows_dash() {
        let mut record = france();
        record.weather = Some(WeatherRecord {
            temperature_celsius: None,
            condition_label: String::new(),
            icon_code: None,
        });
        assert!(render_card(&record).ends_with("—°C\n"));
    }

    #[test]
    fn failure_is_prefixed() {
        let out = render_outcome(&SearchOutcome::failure("Country not found (status 404)"));
        assert_eq!(out, "Error: Country not found (status 404)\n");
    }

    #[test]
    fn screen_shows_loading_label() {
        let screen = Screen {
            loading: Some(Stage::ResolvingWeather),
            content: Content::Empty,
        };
        assert_eq!(render_screen(&screen), "Fetching weather for capital…\n");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(7), "7");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(123456), "123,456");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }
}
