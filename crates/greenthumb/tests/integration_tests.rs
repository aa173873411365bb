//! Integration tests for the GreenThumb agent.
//!
//! These wire the real runner, lock, store and Open-Meteo client together,
//! with the weather API served by wiremock and the in-memory store and lock.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use greenthumb_lock::{MemoryLockProvider, job_lock_key};
use greenthumb_scheduler::{JobRunner, RunOutcome, Scheduler, Trigger};
use greenthumb_store::{Garden, MemoryStore};
use greenthumb_weather::{OpenMeteoClient, WEATHER_JOB_NAME, WeatherSync};

const TTL: Duration = Duration::from_secs(300);

fn forecast_body(temperature: f64) -> serde_json::Value {
    json!({
        "latitude": 0.0,
        "longitude": 0.0,
        "current_weather": {
            "temperature": temperature,
            "windspeed": 8.3,
            "winddirection": 200,
            "weathercode": 1,
            "time": "2026-10-19T09:00"
        },
        "hourly": {
            "time": ["2026-10-19T00:00", "2026-10-19T01:00"],
            "temperature_2m": [temperature, temperature],
            "relativehumidity_2m": [72, 75],
            "precipitation": [0.4, 0.0],
            "windspeed_10m": [8.0, 8.5]
        }
    })
}

fn malformed_body() -> serde_json::Value {
    json!({
        "latitude": 0.0,
        "longitude": 0.0,
        "hourly": { "relativehumidity_2m": [50], "precipitation": [0.0] }
    })
}

async fn mount_forecast(server: &MockServer, garden: &Garden, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", garden.latitude.to_string()))
        .and(query_param("longitude", garden.longitude.to_string()))
        .respond_with(response)
        .mount(server)
        .await;
}

fn three_gardens() -> Vec<Garden> {
    vec![
        Garden::new("Riverside Allotment", 51.5, -0.12),
        Garden::new("Rooftop Beds", 48.85, 2.35),
        Garden::new("Community Orchard", 40.4, -3.7),
    ]
}

fn weather_sync(server: &MockServer, store: &MemoryStore) -> WeatherSync {
    let client = OpenMeteoClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    WeatherSync::new(Arc::new(store.clone()), Arc::new(client))
}

mod sweep {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn malformed_location_is_skipped_and_others_stored() {
        let server = MockServer::start().await;
        let gardens = three_gardens();
        mount_forecast(&server, &gardens[0], ResponseTemplate::new(200).set_body_json(forecast_body(12.5))).await;
        mount_forecast(&server, &gardens[1], ResponseTemplate::new(200).set_body_json(malformed_body())).await;
        mount_forecast(&server, &gardens[2], ResponseTemplate::new(200).set_body_json(forecast_body(21.0))).await;

        let store = MemoryStore::with_gardens(gardens.clone());
        let report = weather_sync(&server, &store).sweep().await.unwrap();

        assert_eq!(report.targets, 3);
        assert_eq!(report.stored, 2);
        assert_eq!(report.skipped, 1);

        let observations = store.observations().await;
        let ids: Vec<_> = observations.iter().map(|o| o.garden_id).collect();
        assert_eq!(ids, vec![gardens[0].id, gardens[2].id]);
        assert_eq!(observations[0].temperature, 12.5);
        assert_eq!(observations[0].humidity, 72.0);
        assert_eq!(observations[0].precipitation, 0.4);
        assert_eq!(observations[0].wind_speed, 8.3);
        assert_eq!(observations[1].temperature, 21.0);
    }

    #[tokio::test]
    async fn api_error_for_one_location_does_not_stop_sweep() {
        let server = MockServer::start().await;
        let gardens = three_gardens();
        mount_forecast(&server, &gardens[0], ResponseTemplate::new(500)).await;
        mount_forecast(&server, &gardens[1], ResponseTemplate::new(200).set_body_json(forecast_body(9.0))).await;
        mount_forecast(&server, &gardens[2], ResponseTemplate::new(200).set_body_string("not json")).await;

        let store = MemoryStore::with_gardens(gardens.clone());
        let report = weather_sync(&server, &store).sweep().await.unwrap();

        assert_eq!(report.stored, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(store.observations().await[0].garden_id, gardens[1].id);
    }
}

mod guarded_run {
    use super::*;

    #[tokio::test]
    async fn load_failure_makes_no_requests_and_releases_lock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(10.0)))
            .expect(0)
            .mount(&server)
            .await;

        let store = MemoryStore::with_gardens(three_gardens());
        store.set_fail_listing(true).await;
        let job = weather_sync(&server, &store);
        let locks = MemoryLockProvider::new();
        let runner = JobRunner::new(Arc::new(locks.clone()));

        assert_eq!(runner.run_job(&job, TTL).await, RunOutcome::Failed);
        assert!(!locks.is_held(&job_lock_key(WEATHER_JOB_NAME)));
        assert!(store.observations().await.is_empty());

        server.verify().await;
    }

    #[tokio::test]
    async fn second_replica_skips_while_sweep_in_progress() {
        let server = MockServer::start().await;
        let garden = Garden::new("Slow Garden", 10.5, 20.5);
        mount_forecast(
            &server,
            &garden,
            ResponseTemplate::new(200)
                .set_body_json(forecast_body(15.0))
                .set_delay(Duration::from_millis(400)),
        )
        .await;

        let store = MemoryStore::with_gardens(vec![garden]);
        let job = weather_sync(&server, &store);

        // Two replicas sharing one lock store.
        let locks = MemoryLockProvider::new();
        let replica_a = JobRunner::new(Arc::new(locks.clone()));
        let replica_b = JobRunner::new(Arc::new(locks.clone()));

        let (a, b) = tokio::join!(replica_a.run_job(&job, TTL), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            replica_b.run_job(&job, TTL).await
        });

        assert_eq!(a, RunOutcome::Completed);
        assert_eq!(b, RunOutcome::Skipped);
        assert_eq!(store.observations().await.len(), 1);
        assert!(!locks.is_held(&job_lock_key(WEATHER_JOB_NAME)));

        // Once the first run is done, the next one goes ahead.
        assert_eq!(replica_b.run_job(&job, TTL).await, RunOutcome::Completed);
        assert_eq!(store.observations().await.len(), 2);
    }
}

mod scheduled {
    use super::*;

    #[tokio::test]
    async fn interval_sweeps_until_shutdown() {
        let server = MockServer::start().await;
        let garden = Garden::new("Backyard", 33.3, 44.4);
        mount_forecast(&server, &garden, ResponseTemplate::new(200).set_body_json(forecast_body(18.0))).await;

        let store = MemoryStore::with_gardens(vec![garden]);
        let runner = Arc::new(JobRunner::new(Arc::new(MemoryLockProvider::new())));
        let mut scheduler = Scheduler::new(runner);
        scheduler
            .register(
                Arc::new(weather_sync(&server, &store)),
                Trigger::every(Duration::from_millis(150)),
                TTL,
            )
            .unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let handle = tokio::spawn(scheduler.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(500)).await;
        shutdown_tx.send(true).unwrap();
        let stats = handle.await.unwrap();

        assert!(stats.fired >= 2, "expected at least two firings, got {:?}", stats);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.completed + stats.skipped, stats.fired);
        assert_eq!(store.observations().await.len() as u64, stats.completed);
    }
}
