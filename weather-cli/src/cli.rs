use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use weather_core::{CitySearchProvider, Config, Route, load_detail, load_weather};

use crate::{browse, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Look up cities and their current weather")]
pub struct Cli {
    /// Log requests and discarded responses to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// List cities from the dataset, page by page.
    List {
        /// Number of cities to show; defaults to the configured page size.
        #[arg(long)]
        limit: Option<u32>,

        /// Offset of the first city.
        #[arg(long, default_value_t = 0)]
        start: u32,
    },

    /// Find cities whose name starts with a prefix.
    Search {
        /// Start of the city name, e.g. `Par`.
        prefix: String,
    },

    /// Show a city and its current weather.
    Show {
        /// City name, as listed by `search`.
        city: String,
    },

    /// Open a path such as `/home?q=Paris`, `/weather/Paris` or `/home/Paris`.
    Open {
        /// Route path; quote it when it contains `?`.
        path: String,
    },

    /// Search interactively with autocomplete, then pick a city.
    Browse {
        /// Initial search text.
        #[arg(long)]
        query: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure => configure(&mut config)?,
            Command::List { limit, start } => {
                let limit = limit.unwrap_or(config.search_settings().page_size);
                let cities = config.city_provider().list_cities(limit, start).await?;
                println!("{}", render::city_table(&cities));
            }
            Command::Search { prefix } => {
                let cities = config.city_provider().find_cities_by_prefix(prefix.trim()).await?;
                println!("{}", render::city_table(&cities));
            }
            Command::Show { city } => show(&config, &city).await?,
            Command::Open { path } => {
                let route = Route::parse(&path).ok_or_else(|| {
                    anyhow!("Unknown path '{path}'. Try /home?q=<city> or /weather/<city>.")
                })?;
                match route {
                    Route::Detail { city } => show(&config, &city).await?,
                    Route::Weather { city } => conditions(&config, &city).await?,
                    Route::Browse { query } => browse::run(&config, query.as_deref()).await?,
                }
            }
            Command::Browse { query } => browse::run(&config, query.as_deref()).await?,
        }

        Ok(())
    }
}

fn configure(config: &mut Config) -> anyhow::Result<()> {
    println!("Get a free key at https://openweathermap.org/api");

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_validator(inquire::required!("The API key cannot be empty"))
        .prompt()
        .context("Configuration aborted")?;

    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!(
        "{} Saved to {}",
        "✓".green().bold(),
        Config::config_file_path()?.display()
    );
    Ok(())
}

pub async fn show(config: &Config, city: &str) -> anyhow::Result<()> {
    let weather = config.weather_provider()?;
    let cities = config.city_provider();

    let detail = load_detail(&cities, &weather, city).await;
    println!("{}", Route::detail(city).to_string().dimmed());
    print!("{}", render::detail(&detail));
    Ok(())
}

/// Weather for a bare name, skipping the dataset lookup.
async fn conditions(config: &Config, city: &str) -> anyhow::Result<()> {
    let weather = config.weather_provider()?;

    let snapshot = load_weather(&weather, city).await;
    println!("{}", Route::weather(city).to_string().dimmed());
    print!("{}", render::conditions(city, snapshot.as_ref()));
    Ok(())
}
