//! In-memory store for dry runs and tests.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{Garden, GardenStore, StoreError, WeatherObservation};

#[derive(Default)]
struct State {
    gardens: Vec<Garden>,
    observations: Vec<WeatherObservation>,
    fail_listing: bool,
    fail_inserts_for: HashSet<Uuid>,
}

/// Store kept entirely in process memory.
///
/// Clones share state. Failures can be injected per operation so callers
/// can exercise their error paths without a database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `gardens`, in order.
    pub fn with_gardens(gardens: Vec<Garden>) -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                gardens,
                ..State::default()
            })),
        }
    }

    pub async fn add_garden(&self, garden: Garden) {
        self.state.write().await.gardens.push(garden);
    }

    /// Snapshot of every stored observation, in insertion order.
    pub async fn observations(&self) -> Vec<WeatherObservation> {
        self.state.read().await.observations.clone()
    }

    /// Make `list_weather_targets` fail until cleared.
    pub async fn set_fail_listing(&self, fail: bool) {
        self.state.write().await.fail_listing = fail;
    }

    /// Make inserts for one garden fail.
    pub async fn fail_inserts_for(&self, garden_id: Uuid) {
        self.state.write().await.fail_inserts_for.insert(garden_id);
    }
}

#[async_trait]
impl GardenStore for MemoryStore {
    async fn list_weather_targets(&self) -> Result<Vec<Garden>, StoreError> {
        let state = self.state.read().await;
        if state.fail_listing {
            return Err(StoreError::Unavailable("garden listing disabled".into()));
        }
        Ok(state.gardens.clone())
    }

    async fn insert_observation(&self, observation: &WeatherObservation) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.fail_inserts_for.contains(&observation.garden_id) {
            return Err(StoreError::Unavailable(format!(
                "insert rejected for garden {}",
                observation.garden_id
            )));
        }
        state.observations.push(observation.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
