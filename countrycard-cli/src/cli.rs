use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use countrycard_core::{
    Config, CountryLookup, DisplaySlot, GeolocationResolver, Position, PositionSource, Providers,
    SearchOutcome,
    geolocation::FixedPosition,
    render::{render_outcome, render_screen},
};
use inquire::{Confirm, Password, Text};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use url::Url;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "countrycard", version, about = "Country facts and capital weather")]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Values that take precedence over the config file for one run.
#[derive(Debug, Args)]
pub struct Overrides {
    /// OpenWeather API key; selects the direct route.
    #[arg(long, global = true, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Weather proxy endpoint used when no API key is set.
    #[arg(long, global = true)]
    pub proxy_url: Option<Url>,

    /// URL the app is served from; localhost means local development.
    #[arg(long, global = true)]
    pub site_url: Option<Url>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key, proxy URL and site URL.
    Configure,

    /// Look up a country by name.
    Search {
        /// Country name, partial names allowed.
        country: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Look up the country you are in.
    Locate {
        /// Latitude; without it the configured IP lookup is used.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Prompt for country names until `:quit`; `:locate` uses your position.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Search { country, json } => {
                let app = App::new(&self.overrides)?;
                let outcome = app.lookup.search(&country).await;
                print_outcome(&outcome, json)
            }
            Command::Locate { lat, lon, json } => {
                let app = App::new(&self.overrides)?;
                let fixed = lat.zip(lon).map(|(latitude, longitude)| Position {
                    latitude,
                    longitude,
                });
                let outcome = app.geolocation(fixed).locate().await;
                print_outcome(&outcome, json)
            }
            Command::Interactive => App::new(&self.overrides)?.interactive().await,
        }
    }
}

fn print_outcome(outcome: &SearchOutcome, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(outcome).context("Failed to serialize result")?;
        println!("{out}");
    } else {
        print!("{}", render_outcome(outcome));
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, overrides: &Overrides) {
    if let Some(key) = &overrides.api_key {
        config.set_credential(Some(key.clone()));
    }
    if let Some(proxy) = &overrides.proxy_url {
        config.weather.proxy_url = Some(proxy.clone());
    }
    if let Some(site) = &overrides.site_url {
        config.site.url = Some(site.clone());
    }
}

struct App {
    config: Config,
    providers: Providers,
    display: DisplaySlot,
    lookup: CountryLookup,
}

impl App {
    fn new(overrides: &Overrides) -> Result<Self> {
        let mut config = Config::load()?;
        apply_overrides(&mut config, overrides);
        debug!(environment = ?config.environment(), "configuration loaded");

        let providers = Providers::from_config(&config)?;
        let display = DisplaySlot::new();
        let lookup = CountryLookup::from_providers(&providers).with_display(display.clone());

        Ok(Self {
            config,
            providers,
            display,
            lookup,
        })
    }

    /// Explicit coordinates win over the IP lookup; with neither there is no capability.
    fn geolocation(&self, fixed: Option<Position>) -> GeolocationResolver {
        let source: Option<Arc<dyn PositionSource>> = match fixed {
            Some(position) => Some(Arc::new(FixedPosition(position))),
            None => self
                .providers
                .ip_position
                .clone()
                .map(|s| Arc::new(s) as Arc<dyn PositionSource>),
        };

        GeolocationResolver::new(source, self.providers.geocoder.clone(), self.lookup.clone())
            .with_timeout(self.config.position_timeout())
    }

    /// Each line starts its own lookup so the prompt never waits on the network.
    /// Nothing is cancelled: whichever lookup settles last stays on screen.
    async fn interactive(self) -> Result<()> {
        let mut screens = self.display.subscribe();
        let renderer = tokio::spawn(async move {
            while screens.changed().await.is_ok() {
                let screen = screens.borrow_and_update().clone();
                print!("{}", render_screen(&screen));
            }
        });

        println!("Type a country name, `:locate` to use your position, `:quit` to exit.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read from stdin")?
        {
            match line.trim() {
                ":quit" | ":q" => break,
                ":locate" => {
                    let resolver = self.geolocation(None);
                    tokio::spawn(async move {
                        resolver.locate().await;
                    });
                }
                query => {
                    let lookup = self.lookup.clone();
                    let query = query.to_string();
                    tokio::spawn(async move {
                        lookup.search(&query).await;
                    });
                }
            }
        }

        renderer.abort();
        Ok(())
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("OpenWeather API key (blank to rely on the proxy):")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if key.trim().is_empty() && config.credential().is_some() {
        let keep = Confirm::new("Keep the API key already configured?")
            .with_default(true)
            .prompt()
            .context("Failed to read answer")?;
        if !keep {
            config.set_credential(None);
        }
    } else {
        config.set_credential(Some(key));
    }

    config.weather.proxy_url = prompt_url(
        "Weather proxy URL (optional):",
        config.weather.proxy_url.as_ref(),
    )?;
    config.site.url = prompt_url(
        "Site URL, empty or localhost for local development (optional):",
        config.site.url.as_ref(),
    )?;

    config.save()?;
    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

fn prompt_url(message: &str, current: Option<&Url>) -> Result<Option<Url>> {
    let initial = current.map(Url::as_str).unwrap_or_default();
    let answer = Text::new(message)
        .with_initial_value(initial)
        .prompt()
        .context("Failed to read URL")?;

    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(None);
    }

    Url::parse(answer)
        .map(Some)
        .with_context(|| format!("Invalid URL: {answer}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_file_values() {
        let mut config =
            Config::from_toml("[weather]\napi_key = \"FILE_KEY\"\n").expect("valid toml");
        let overrides = Overrides {
            api_key: Some("FLAG_KEY".into()),
            proxy_url: None,
            site_url: Some(Url::parse("https://countries.example.org").unwrap()),
        };

        apply_overrides(&mut config, &overrides);

        assert_eq!(config.credential(), Some("FLAG_KEY"));
        assert!(!config.environment().is_local());
    }

    #[test]
    fn locate_requires_both_coordinates() {
        let err = Cli::try_parse_from(["countrycard", "locate", "--lat", "48.8"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli =
            Cli::try_parse_from(["countrycard", "locate", "--lat", "-33.86", "--lon", "151.2"])
                .unwrap();
        match cli.command {
            Command::Locate { lat, lon, .. } => {
                assert_eq!(lat, Some(-33.86));
                assert_eq!(lon, Some(151.2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn search_parses_json_flag() {
        let cli = Cli::try_parse_from(["countrycard", "search", "France", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Search { ref country, json: true } if country == "France"
        ));
    }
}
