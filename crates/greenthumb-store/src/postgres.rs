//! PostgreSQL-backed store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Garden, GardenStore, StoreError, WeatherObservation};

const LIST_TARGETS_SQL: &str = "\
    SELECT id, name, latitude, longitude \
    FROM gardens \
    WHERE latitude IS NOT NULL AND longitude IS NOT NULL \
    ORDER BY created_at";

const INSERT_OBSERVATION_SQL: &str = "\
    INSERT INTO weather (\
        id, garden_id, temperature, humidity, precipitation, \
        wind_speed, condition, recorded_at, created_at\
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())";

/// How long to wait for a pooled connection before giving up.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Store over the application's PostgreSQL database.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a connection pool and verify the database answers.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.ping().await?;
        info!(max_connections, "connected to database");
        Ok(store)
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GardenStore for PgStore {
    async fn list_weather_targets(&self) -> Result<Vec<Garden>, StoreError> {
        let rows: Vec<(Uuid, String, f64, f64)> = sqlx::query_as(LIST_TARGETS_SQL)
            .fetch_all(&self.pool)
            .await?;
        debug!(count = rows.len(), "loaded weather targets");

        Ok(rows
            .into_iter()
            .map(|(id, name, latitude, longitude)| Garden {
                id,
                name,
                latitude,
                longitude,
            })
            .collect())
    }

    async fn insert_observation(&self, observation: &WeatherObservation) -> Result<(), StoreError> {
        // `recorded_at` is a timestamp without time zone holding UTC.
        sqlx::query(INSERT_OBSERVATION_SQL)
            .bind(observation.id)
            .bind(observation.garden_id)
            .bind(observation.temperature)
            .bind(observation.humidity)
            .bind(observation.precipitation)
            .bind(observation.wind_speed)
            .bind(&observation.condition)
            .bind(observation.recorded_at.naive_utc())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
