//! Storage record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A garden with coordinates, the target of a weather sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Garden {
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Garden {
    /// Create a garden with a fresh id.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// One weather reading for one garden. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub id: Uuid,
    pub garden_id: Uuid,
    /// Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Millimetres.
    pub precipitation: f64,
    /// km/h.
    pub wind_speed: f64,
    pub condition: String,
    pub recorded_at: DateTime<Utc>,
}
