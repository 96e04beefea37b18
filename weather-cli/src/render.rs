//! Plain-text rendering of cities and weather for the terminal.

use colored::Colorize;
use weather_core::{City, CityDetail, Route, WeatherSnapshot};

const HEADERS: [&str; 5] = ["City Name", "Country", "Population", "Coordinates", "Timezone"];

fn name_cell(city: &City) -> String {
    match city.alternate_name() {
        Some(ascii) => format!("{} ({ascii})", city.name),
        None => city.name.clone(),
    }
}

fn country_cell(city: &City) -> String {
    match (city.country_name.as_deref(), city.country_code.as_deref()) {
        (Some(name), Some(code)) => format!("{name} ({code})"),
        (Some(name), None) => name.to_string(),
        (None, Some(code)) => code.to_string(),
        (None, None) => String::new(),
    }
}

fn coordinates_cell(city: &City) -> String {
    city.coordinates
        .map(|c| format!("Lat: {}, Lon: {}", c.lat, c.lon))
        .unwrap_or_default()
}

fn row(city: &City) -> [String; 5] {
    [
        name_cell(city),
        country_cell(city),
        city.population_display(),
        coordinates_cell(city),
        city.timezone.clone().unwrap_or_default(),
    ]
}

/// One line per city, columns padded to the widest cell.
pub fn city_rows(cities: &[City]) -> Vec<String> {
    let rows: Vec<[String; 5]> = cities.iter().map(row).collect();
    let widths = column_widths(&rows);
    rows.iter().map(|cells| join_padded(cells, &widths)).collect()
}

pub fn city_table(cities: &[City]) -> String {
    if cities.is_empty() {
        return "No cities found.".to_string();
    }

    let rows: Vec<[String; 5]> = cities.iter().map(row).collect();
    let widths = column_widths(&rows);

    let header = HEADERS.map(str::to_string);
    let mut out = join_padded(&header, &widths).bold().to_string();
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));

    for cells in &rows {
        out.push('\n');
        out.push_str(&join_padded(cells, &widths));
    }

    out
}

fn column_widths(rows: &[[String; 5]]) -> [usize; 5] {
    let mut widths = HEADERS.map(|h| h.chars().count());
    for cells in rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths
}

fn join_padded(cells: &[String; 5], widths: &[usize; 5]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

fn field(label: &str, value: impl std::fmt::Display) -> String {
    format!("  {:<14}{value}\n", format!("{label}:"))
}

fn weather_lines(weather: &WeatherSnapshot) -> String {
    let mut out = String::new();
    if let Some(place) = weather.place_label() {
        out.push_str(&field("Reported for", place));
    }
    out.push_str(&field("Temperature", format!("{}°C", weather.temperature_c())));
    out.push_str(&field("Feels like", format!("{}°C", weather.feels_like_c())));
    out.push_str(&field("Weather", &weather.condition));
    out.push_str(&field("Description", &weather.description));
    out.push_str(&field("Humidity", format!("{}%", weather.humidity_pct)));
    out.push_str(&field("Wind Speed", format!("{} m/s", weather.wind_speed_mps)));
    if let Some(pressure) = weather.pressure_hpa {
        out.push_str(&field("Pressure", format!("{pressure} hPa")));
    }
    if let Some(at) = weather.observed_at {
        out.push_str(&field("Observed", at.format("%Y-%m-%d %H:%M UTC")));
    }
    if !weather.icon.is_empty() {
        out.push_str(&field("Icon", weather.icon_url()));
    }
    out
}

/// The detail screen: either the city card or the "not found" notice.
pub fn detail(detail: &CityDetail) -> String {
    let home = Route::home();

    let (city, weather) = match detail {
        CityDetail::NotFound { .. } => {
            return format!("{}\nReturn to Home: {home}\n", "City not found".bold());
        }
        CityDetail::Found { city, weather } => (city, weather),
    };

    let mut out = format!("← Back to Cities: {home}\n\n{}\n\n", city.name.bold());

    out.push_str(&format!("{}\n", "Location Details".underline()));
    out.push_str(&field("Country", city.country_name.as_deref().unwrap_or_default()));
    out.push_str(&field("Country Code", city.country_code.as_deref().unwrap_or_default()));
    out.push_str(&field("Population", city.population_display()));
    out.push_str(&field("Timezone", city.timezone.as_deref().unwrap_or_default()));

    out.push_str(&format!("\n{}\n", "Coordinates".underline()));
    let (lat, lon) = city
        .coordinates
        .map(|c| (c.lat.to_string(), c.lon.to_string()))
        .unwrap_or_default();
    out.push_str(&field("Latitude", lat));
    out.push_str(&field("Longitude", lon));

    out.push_str(&format!("\n{}\n", "Weather Information".underline()));
    match weather {
        Some(weather) => out.push_str(&weather_lines(weather)),
        None => out.push_str(&format!("  {}\n", "Weather data not available".dimmed())),
    }

    out
}

/// Current conditions for a bare city name, headed by the place the weather
/// service resolved it to.
pub fn conditions(city: &str, weather: Option<&WeatherSnapshot>) -> String {
    let mut out = format!("{}

", format!("Weather in {city}").dimmed());

    let Some(weather) = weather else {
        out.push_str(&format!("{}
", city.bold()));
        out.push_str(&format!("  {}
", "Weather data not available".dimmed()));
        return out;
    };

    let header = weather.place_label().unwrap_or_else(|| city.to_string());
    out.push_str(&format!("{}
", header.bold()));
    out.push_str(&weather_lines(weather));
    out
}
