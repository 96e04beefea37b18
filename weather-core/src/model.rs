use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Offset between Kelvin and Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One record of the geonames city dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub geoname_id: String,
    pub name: String,
    pub ascii_name: Option<String>,
    pub country_name: Option<String>,
    pub country_code: Option<String>,
    pub population: Option<u64>,
    pub coordinates: Option<Coordinates>,
    pub timezone: Option<String>,
}

impl City {
    /// ASCII spelling, only when it differs from the display name.
    pub fn alternate_name(&self) -> Option<&str> {
        self.ascii_name
            .as_deref()
            .filter(|ascii| !ascii.is_empty() && *ascii != self.name)
    }

    /// Population with thousands grouping, or an empty string when unknown.
    pub fn population_display(&self) -> String {
        self.population.map(group_thousands).unwrap_or_default()
    }

    /// Label used in the suggestion dropdown, e.g. `Paris (France)`.
    pub fn suggestion_label(&self) -> String {
        match self.country_name.as_deref().filter(|c| !c.is_empty()) {
            Some(country) => format!("{} ({country})", self.name),
            None => self.name.clone(),
        }
    }
}

/// Current conditions for a city. Temperatures stay in Kelvin as delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: Option<String>,
    pub country_code: Option<String>,
    pub temperature_k: f64,
    pub feels_like_k: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: Option<u32>,
    pub wind_speed_mps: f64,
    pub condition: String,
    pub description: String,
    pub icon: String,
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherSnapshot {
    pub fn temperature_c(&self) -> i64 {
        kelvin_to_celsius(self.temperature_k)
    }

    pub fn feels_like_c(&self) -> i64 {
        kelvin_to_celsius(self.feels_like_k)
    }

    /// Place as reported by the weather service, e.g. `Delhi, IN`.
    pub fn place_label(&self) -> Option<String> {
        let name = self.location_name.as_deref().filter(|n| !n.is_empty())?;
        match self.country_code.as_deref().filter(|c| !c.is_empty()) {
            Some(country) => Some(format!("{name}, {country}")),
            None => Some(name.to_string()),
        }
    }

    pub fn icon_url(&self) -> String {
        format!("http://openweathermap.org/img/wn/{}@2x.png", self.icon)
    }
}

/// Kelvin to whole degrees Celsius, halves rounded towards positive infinity.
pub fn kelvin_to_celsius(kelvin: f64) -> i64 {
    (kelvin - KELVIN_OFFSET + 0.5).floor() as i64
}

/// Formats an integer with `,` between groups of three digits.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
