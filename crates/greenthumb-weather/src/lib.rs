//! Weather for the GreenThumb agent.
//!
//! [`OpenMeteoClient`] fetches forecasts, [`observation_from_forecast`] turns
//! one into a stored reading, and [`WeatherSync`] runs the per-garden sweep
//! as a scheduled [`Job`](greenthumb_scheduler::Job).

mod client;
mod error;
mod observation;
mod sync;
mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, OpenMeteoClient, WeatherFetcher};
pub use error::{ObservationError, SyncError, WeatherError};
pub use observation::{DEFAULT_CONDITION, observation_from_forecast};
pub use sync::{SweepReport, WEATHER_JOB_NAME, WeatherSync};
pub use types::{CurrentWeather, Forecast, HourlySeries};
