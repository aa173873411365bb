//! Garden and weather storage for the GreenThumb agent.
//!
//! The agent reads garden coordinates and appends weather observations.
//! [`PgStore`] talks to the application's PostgreSQL database;
//! [`MemoryStore`] keeps everything in process for dry runs and tests.

mod error;
mod memory;
mod postgres;
mod types;

use async_trait::async_trait;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use types::{Garden, WeatherObservation};

/// Storage operations the agent needs.
#[async_trait]
pub trait GardenStore: Send + Sync {
    /// Gardens that have both a latitude and a longitude.
    async fn list_weather_targets(&self) -> Result<Vec<Garden>, StoreError>;

    /// Append one observation. Observations are never updated.
    async fn insert_observation(&self, observation: &WeatherObservation) -> Result<(), StoreError>;

    /// Cheap round trip to check the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
