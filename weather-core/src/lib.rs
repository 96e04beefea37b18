//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Clients for the city dataset and the weather API
//! - The browse/search state machine with debounced suggestions
//! - Detail resolution (city record, then current weather)
//! - Navigable routes and on-disk configuration
//!
//! It is used by `weather-cli`, but holds no terminal code and can back any front end.

pub mod config;
pub mod debounce;
pub mod detail;
pub mod error;
pub mod model;
pub mod provider;
pub mod route;
pub mod search;

pub use config::Config;
pub use detail::{CityDetail, load_detail, load_weather};
pub use error::UpstreamError;
pub use model::{City, Coordinates, WeatherSnapshot};
pub use provider::{CitySearchProvider, WeatherProvider};
pub use route::Route;
pub use search::{SearchController, SearchSettings, SearchState, SearchUpdate};
