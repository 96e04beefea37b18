use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{error::UpstreamError, model::WeatherSnapshot};

use super::{WeatherProvider, fetch_json};

pub const DEFAULT_OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5";

const SERVICE: &str = "OpenWeather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::new_with_base_url(api_key, DEFAULT_OPENWEATHER_URL)
    }

    pub fn new_with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }
}

// Every field is optional so a partial payload is rejected here with a
// readable reason instead of failing deep inside serde.
#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<u8>,
    pressure: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: Option<String>,
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: Option<String>,
    dt: Option<i64>,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    sys: Option<OwSys>,
}

fn missing(field: &str) -> UpstreamError {
    UpstreamError::malformed(SERVICE, format!("missing {field}"))
}

impl TryFrom<OwCurrentResponse> for WeatherSnapshot {
    type Error = UpstreamError;

    fn try_from(raw: OwCurrentResponse) -> Result<Self, Self::Error> {
        let main = raw.main.ok_or_else(|| missing("main"))?;
        let condition = raw.weather.into_iter().next().ok_or_else(|| missing("weather[0]"))?;

        Ok(WeatherSnapshot {
            location_name: raw.name.filter(|n| !n.is_empty()),
            country_code: raw.sys.and_then(|s| s.country),
            temperature_k: main.temp.ok_or_else(|| missing("main.temp"))?,
            feels_like_k: main.feels_like.ok_or_else(|| missing("main.feels_like"))?,
            humidity_pct: main.humidity.ok_or_else(|| missing("main.humidity"))?,
            pressure_hpa: main.pressure,
            wind_speed_mps: raw
                .wind
                .and_then(|w| w.speed)
                .ok_or_else(|| missing("wind.speed"))?,
            condition: condition.main.unwrap_or_else(|| "Unknown".to_string()),
            description: condition.description.unwrap_or_default(),
            icon: condition.icon.unwrap_or_default(),
            observed_at: raw.dt.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(&self, city: &str) -> Result<WeatherSnapshot, UpstreamError> {
        tracing::debug!(city, "fetching current weather");

        let request = self
            .http
            .get(format!("{}/weather", self.base_url))
            .query(&[("q", city), ("appid", self.api_key.as_str())]);

        let parsed: OwCurrentResponse = fetch_json(SERVICE, request).await?;
        WeatherSnapshot::try_from(parsed)
    }
}
