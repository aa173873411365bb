//! Open-Meteo forecast documents.
//!
//! Only the fields the agent reads are modelled. Every field is optional
//! because the API emits `null` for readings a station does not report.

use serde::Deserialize;

/// Hourly variables requested on every forecast call.
pub const HOURLY_VARIABLES: &str = "temperature_2m,relativehumidity_2m,precipitation,windspeed_10m";

/// Response body of `GET /v1/forecast`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Forecast {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub current_weather: Option<CurrentWeather>,
    #[serde(default)]
    pub hourly: Option<HourlySeries>,
}

/// The `current_weather` block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub windspeed: Option<f64>,
    #[serde(default)]
    pub winddirection: Option<f64>,
    #[serde(default)]
    pub weathercode: Option<i32>,
    #[serde(default)]
    pub time: Option<String>,
}

/// The `hourly` block: parallel arrays indexed by hour.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub relativehumidity_2m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub precipitation: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub windspeed_10m: Option<Vec<Option<f64>>>,
}
