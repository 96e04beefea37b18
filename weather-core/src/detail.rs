use crate::{
    City, WeatherSnapshot,
    provider::{CitySearchProvider, WeatherProvider},
};

/// What the detail screen shows for a city path token.
#[derive(Debug, Clone, PartialEq)]
pub enum CityDetail {
    /// No record matched the token.
    NotFound { token: String },
    /// The city resolved; `weather` is `None` when conditions could not be fetched.
    Found {
        city: City,
        weather: Option<WeatherSnapshot>,
    },
}

/// Resolves `token` to a city, then fetches its weather.
///
/// The first matching record wins. The weather request only starts once the
/// city has resolved, and is skipped entirely when nothing matches. Upstream
/// failures are logged and degrade the result instead of being returned.
pub async fn load_detail(
    cities: &dyn CitySearchProvider,
    weather: &dyn WeatherProvider,
    token: &str,
) -> CityDetail {
    let city = match cities.find_cities_by_prefix(token).await {
        Ok(found) => found.into_iter().next(),
        Err(e) => {
            tracing::warn!(error = %e, token, "city lookup failed");
            None
        }
    };

    let Some(city) = city else {
        return CityDetail::NotFound {
            token: token.to_string(),
        };
    };

    let weather = load_weather(weather, &city.name).await;
    CityDetail::Found { city, weather }
}

/// Current conditions for a bare city name, with no dataset lookup first.
///
/// `None` when the upstream fails; the failure is logged.
pub async fn load_weather(weather: &dyn WeatherProvider, city: &str) -> Option<WeatherSnapshot> {
    match weather.current_weather(city).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!(error = %e, city, "weather lookup failed");
            None
        }
    }
}
