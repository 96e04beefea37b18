use crate::{City, UpstreamError, WeatherSnapshot};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod opendatasoft;
pub mod openweather;

pub use opendatasoft::OpenDataSoftProvider;
pub use openweather::OpenWeatherProvider;

/// Source of city records.
///
/// Each call is a single request: no retries, no caching, no timeout.
#[async_trait]
pub trait CitySearchProvider: Send + Sync + Debug {
    /// Up to `limit` cities starting at offset `start`, in upstream order.
    async fn list_cities(&self, limit: u32, start: u32) -> Result<Vec<City>, UpstreamError>;

    /// Cities whose name matches `prefix*`. Matching rules belong to the upstream.
    async fn find_cities_by_prefix(&self, prefix: &str) -> Result<Vec<City>, UpstreamError>;
}

/// Source of current weather conditions.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Conditions for whatever the upstream considers the best match for `city`.
    async fn current_weather(&self, city: &str) -> Result<WeatherSnapshot, UpstreamError>;
}

/// Sends `request` and decodes a JSON body, folding every failure into [`UpstreamError`].
pub(crate) async fn fetch_json<T>(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, UpstreamError>
where
    T: serde::de::DeserializeOwned,
{
    let res = request
        .send()
        .await
        .map_err(|source| UpstreamError::Transport { service, source })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| UpstreamError::Transport { service, source })?;

    if !status.is_success() {
        return Err(UpstreamError::Status {
            service,
            status,
            body: crate::error::truncate_body(&body),
        });
    }

    serde_json::from_str(&body)
        .map_err(|e| UpstreamError::malformed(service, format!("invalid JSON: {e}")))
}
