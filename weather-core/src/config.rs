use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    provider::{
        OpenDataSoftProvider, OpenWeatherProvider, opendatasoft::DEFAULT_DATASET_URL,
        openweather::DEFAULT_OPENWEATHER_URL,
    },
    search::{DEFAULT_DEBOUNCE, DEFAULT_PAGE_SIZE, SearchSettings},
};

/// OpenWeather credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    /// Overrides the public endpoint, e.g. for a proxy.
    pub base_url: Option<String>,
}

/// City dataset endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatasetConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub page_size: u32,
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
///
/// [search]
/// page_size = 10
/// debounce_ms = 300
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherConfig,
    pub dataset: DatasetConfig,
    pub search: SearchConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.weather.api_key = Some(api_key);
    }

    /// Returns the OpenWeather API key, if present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.weather.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            page_size: self.search.page_size.max(1),
            debounce: Duration::from_millis(self.search.debounce_ms),
        }
    }

    pub fn city_provider(&self) -> OpenDataSoftProvider {
        OpenDataSoftProvider::new_with_base_url(
            self.dataset.base_url.as_deref().unwrap_or(DEFAULT_DATASET_URL),
        )
    }

    pub fn weather_provider(&self) -> Result<OpenWeatherProvider> {
        let api_key = self.api_key().ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `weather configure` and enter your API key."
            )
        })?;

        Ok(OpenWeatherProvider::new_with_base_url(
            api_key.to_owned(),
            self.weather.base_url.as_deref().unwrap_or(DEFAULT_OPENWEATHER_URL),
        ))
    }
}
