use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::UpstreamError,
    model::{City, Coordinates},
};

use super::{CitySearchProvider, fetch_json};

pub const DEFAULT_DATASET_URL: &str = "https://public.opendatasoft.com/api/explore/v2.1/catalog/datasets/geonames-all-cities-with-a-population-1000";

const SERVICE: &str = "OpenDataSoft";

/// Geonames city dataset served by the OpenDataSoft explore API.
#[derive(Debug, Clone)]
pub struct OpenDataSoftProvider {
    base_url: String,
    http: Client,
}

impl Default for OpenDataSoftProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenDataSoftProvider {
    pub fn new() -> Self {
        Self::new_with_base_url(DEFAULT_DATASET_URL)
    }

    pub fn new_with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn records_url(&self) -> String {
        format!("{}/records", self.base_url)
    }

    async fn fetch_records(&self, query: &[(&str, String)]) -> Result<Vec<City>, UpstreamError> {
        let request = self.http.get(self.records_url()).query(query);
        let parsed: OdsRecords = fetch_json(SERVICE, request).await?;

        tracing::debug!(
            total = parsed.total_count,
            returned = parsed.results.len(),
            "dataset records fetched"
        );

        parsed.results.into_iter().map(City::try_from).collect()
    }
}

/// Filter expression matching names that start with `prefix`.
fn prefix_filter(prefix: &str) -> String {
    format!("name like \"{prefix}*\"")
}

#[derive(Debug, Deserialize)]
struct OdsRecords {
    total_count: Option<u64>,
    #[serde(default)]
    results: Vec<OdsRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OdsId {
    Text(String),
    Number(u64),
}

#[derive(Debug, Deserialize)]
struct OdsCoordinates {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OdsRecord {
    geoname_id: Option<OdsId>,
    name: Option<String>,
    ascii_name: Option<String>,
    cou_name_en: Option<String>,
    country_code: Option<String>,
    population: Option<u64>,
    coordinates: Option<OdsCoordinates>,
    timezone: Option<String>,
}

impl TryFrom<OdsRecord> for City {
    type Error = UpstreamError;

    fn try_from(raw: OdsRecord) -> Result<Self, Self::Error> {
        let geoname_id = match raw.geoname_id {
            Some(OdsId::Text(id)) => id,
            Some(OdsId::Number(id)) => id.to_string(),
            None => return Err(UpstreamError::malformed(SERVICE, "record without geoname_id")),
        };

        let name = raw.name.filter(|n| !n.is_empty()).ok_or_else(|| {
            UpstreamError::malformed(SERVICE, format!("record {geoname_id} has no name"))
        })?;

        Ok(City {
            geoname_id,
            name,
            ascii_name: raw.ascii_name,
            country_name: raw.cou_name_en,
            country_code: raw.country_code,
            population: raw.population,
            coordinates: raw.coordinates.map(|c| Coordinates {
                lat: c.lat,
                lon: c.lon,
            }),
            timezone: raw.timezone,
        })
    }
}

#[async_trait]
impl CitySearchProvider for OpenDataSoftProvider {
    async fn list_cities(&self, limit: u32, start: u32) -> Result<Vec<City>, UpstreamError> {
        tracing::debug!(limit, start, "listing cities");
        self.fetch_records(&[("limit", limit.to_string()), ("start", start.to_string())])
            .await
    }

    async fn find_cities_by_prefix(&self, prefix: &str) -> Result<Vec<City>, UpstreamError> {
        tracing::debug!(prefix, "searching cities by prefix");
        self.fetch_records(&[("where", prefix_filter(prefix))]).await
    }
}
