//! Navigable paths of the application.
//!
//! `/home` and `/home?q=<query>` show the browse/search view, `/weather/<city>`
//! shows the detail view for a city name, and `/home/<city>` shows the current
//! weather for a name without looking it up in the dataset.

use std::fmt;

const BROWSE_PATH: &str = "/home";
const WEATHER_PREFIX: &str = "/home/";
const DETAIL_PREFIX: &str = "/weather/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Browse { query: Option<String> },
    Detail { city: String },
    Weather { city: String },
}

impl Route {
    pub fn home() -> Self {
        Route::Browse { query: None }
    }

    /// Browse route for `query`; blank queries map to the plain home path.
    pub fn browse(query: &str) -> Self {
        let trimmed = query.trim();
        Route::Browse {
            query: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }

    pub fn detail(city: impl Into<String>) -> Self {
        Route::Detail { city: city.into() }
    }

    pub fn weather(city: impl Into<String>) -> Self {
        Route::Weather { city: city.into() }
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::Browse { query: None } => BROWSE_PATH.to_string(),
            Route::Browse { query: Some(q) } => {
                format!("{BROWSE_PATH}?q={}", urlencoding::encode(q))
            }
            Route::Detail { city } => format!("{DETAIL_PREFIX}{}", urlencoding::encode(city)),
            Route::Weather { city } => format!("{WEATHER_PREFIX}{}", urlencoding::encode(city)),
        }
    }

    /// Parses a path produced by [`Route::to_path`]. `/` is accepted as home.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let (path, query) = match input.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (input, None),
        };
        let path = path.trim_end_matches('/');

        if path.is_empty() || path == BROWSE_PATH {
            let q = query.and_then(|qs| {
                qs.split('&')
                    .filter_map(|pair| pair.split_once('='))
                    .find(|(key, _)| *key == "q")
                    .and_then(|(_, value)| decode(&value.replace('+', " ")))
            });
            return Some(Route::browse(q.as_deref().unwrap_or("")));
        }

        if let Some(token) = path.strip_prefix(WEATHER_PREFIX) {
            return city_token(token).map(Route::weather);
        }
        let token = path.strip_prefix(DETAIL_PREFIX)?;
        city_token(token).map(Route::detail)
    }
}

/// A single non-empty path segment, percent-decoded.
fn city_token(token: &str) -> Option<String> {
    if token.is_empty() || token.contains('/') {
        return None;
    }
    decode(token)
}

fn decode(raw: &str) -> Option<String> {
    urlencoding::decode(raw).ok().map(|s| s.into_owned())
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}
