//! The weather sync job.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use greenthumb_scheduler::{Clock, Job, JobResult, SystemClock};
use greenthumb_store::{Garden, GardenStore, StoreError};

use crate::{ObservationError, SyncError, WeatherError, WeatherFetcher, observation_from_forecast};

/// Job name, also the lock name suffix.
pub const WEATHER_JOB_NAME: &str = "weather_check";

/// Counts from one completed sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Gardens loaded for this sweep.
    pub targets: usize,
    /// Observations written.
    pub stored: usize,
    /// Gardens that produced no observation.
    pub skipped: usize,
}

/// Why one garden produced no observation.
#[derive(Debug, Error)]
enum GardenError {
    #[error(transparent)]
    Fetch(WeatherError),
    #[error(transparent)]
    Malformed(ObservationError),
    #[error(transparent)]
    Persist(StoreError),
}

/// Fetches current weather for every garden and records one observation each.
pub struct WeatherSync {
    store: Arc<dyn GardenStore>,
    fetcher: Arc<dyn WeatherFetcher>,
    clock: Arc<dyn Clock>,
}

impl WeatherSync {
    pub fn new(store: Arc<dyn GardenStore>, fetcher: Arc<dyn WeatherFetcher>) -> Self {
        Self {
            store,
            fetcher,
            clock: Arc::new(SystemClock),
        }
    }

    /// Stamp observations with `clock` instead of the system time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one sweep over all gardens with coordinates.
    ///
    /// Only a failure to load the garden list fails the sweep. Each garden
    /// is handled on its own: a fetch error, an unusable forecast or a
    /// failed insert is logged and the sweep moves on.
    #[tracing::instrument(name = "weather_sweep", skip_all)]
    pub async fn sweep(&self) -> Result<SweepReport, SyncError> {
        let targets = self
            .store
            .list_weather_targets()
            .await
            .map_err(SyncError::LoadTargets)?;

        info!(count = targets.len(), "checking weather for gardens");

        let mut report = SweepReport {
            targets: targets.len(),
            ..SweepReport::default()
        };

        for garden in &targets {
            match self.sync_garden(garden).await {
                Ok(()) => report.stored += 1,
                Err(e) => {
                    report.skipped += 1;
                    match &e {
                        GardenError::Fetch(_) | GardenError::Malformed(_) => warn!(
                            garden_id = %garden.id,
                            garden = %garden.name,
                            error = %e,
                            "skipping garden, no usable weather data"
                        ),
                        GardenError::Persist(_) => error!(
                            garden_id = %garden.id,
                            garden = %garden.name,
                            error = %e,
                            "failed to store weather observation"
                        ),
                    }
                }
            }
        }

        info!(
            targets = report.targets,
            stored = report.stored,
            skipped = report.skipped,
            "weather sweep finished"
        );
        Ok(report)
    }

    async fn sync_garden(&self, garden: &Garden) -> Result<(), GardenError> {
        let forecast = self
            .fetcher
            .fetch(garden.latitude, garden.longitude)
            .await
            .map_err(GardenError::Fetch)?;

        let observation = observation_from_forecast(garden, &forecast, self.clock.now())
            .map_err(GardenError::Malformed)?;

        self.store
            .insert_observation(&observation)
            .await
            .map_err(GardenError::Persist)?;

        debug!(
            garden_id = %garden.id,
            temperature = observation.temperature,
            humidity = observation.humidity,
            "stored weather observation"
        );
        Ok(())
    }
}

#[async_trait]
impl Job for WeatherSync {
    fn name(&self) -> &str {
        WEATHER_JOB_NAME
    }

    async fn run(&self) -> JobResult {
        self.sweep().await?;
        Ok(())
    }
}
