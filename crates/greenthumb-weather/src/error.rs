//! Error types for weather fetching and syncing.

use thiserror::Error;

use greenthumb_store::StoreError;

/// Errors from the weather API client.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Base URL could not be parsed.
    #[error("invalid weather API URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Request failed in transport (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("weather API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not a forecast document.
    #[error("failed to decode forecast: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A forecast that cannot be turned into an observation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObservationError {
    /// The `current_weather` block is absent.
    #[error("forecast has no current conditions")]
    MissingCurrent,

    /// An hourly series is present but has no usable first value.
    #[error("hourly series {series} has no first value")]
    EmptySeries { series: &'static str },
}

/// Errors that abort a whole sweep.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Could not load the list of gardens to sweep.
    #[error("failed to load weather targets: {0}")]
    LoadTargets(#[source] StoreError),
}
