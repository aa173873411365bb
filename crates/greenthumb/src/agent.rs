//! The agent process: wiring, startup checks and the command bodies.

use std::sync::Arc;

use miette::{Result, miette};
use tracing::{info, warn};

use greenthumb_lock::{LockProvider, MemoryLockProvider, RedisLockProvider};
use greenthumb_scheduler::{JobRunner, RunOutcome, Scheduler, SchedulerError, Trigger};
use greenthumb_store::{GardenStore, PgStore};
use greenthumb_weather::{OpenMeteoClient, WeatherFetcher, WeatherSync};

use crate::config::AgentConfig;
use crate::seed::SeedSyncJob;
use crate::shutdown::install_shutdown_handler;

/// Collaborators every command needs.
pub struct Services {
    pub store: Arc<dyn GardenStore>,
    pub locks: Arc<dyn LockProvider>,
}

/// Connect to storage and the lock store, checking each answers.
///
/// Either being unreachable is fatal: nothing gets scheduled.
pub async fn connect(config: &AgentConfig) -> Result<Services> {
    let store = PgStore::connect(&config.database_url, config.database_max_connections)
        .await
        .map_err(|e| miette!("database connection check failed: {}", e))?;
    info!("database connection verified");

    let locks: Arc<dyn LockProvider> = match &config.redis {
        Some(redis) => {
            let password = Some(redis.password.as_str()).filter(|p| !p.is_empty());
            let provider = RedisLockProvider::connect(&redis.host, redis.port, password)
                .await
                .map_err(|e| miette!("redis connection check failed: {}", e))?;
            info!(host = %redis.host, port = redis.port, "redis connection verified");
            Arc::new(provider)
        }
        None => {
            warn!("using in-process lock store, jobs are not coordinated across replicas");
            Arc::new(MemoryLockProvider::new())
        }
    };

    Ok(Services {
        store: Arc::new(store),
        locks,
    })
}

fn weather_sync(config: &AgentConfig, store: Arc<dyn GardenStore>) -> Result<WeatherSync> {
    let fetcher: Arc<dyn WeatherFetcher> = Arc::new(
        OpenMeteoClient::new(&config.weather_api_url, config.weather_timeout)
            .map_err(|e| miette!("{}", e))?,
    );
    Ok(WeatherSync::new(store, fetcher))
}

/// Register the agent's jobs on a fresh scheduler.
pub fn build_scheduler(
    config: &AgentConfig,
    services: &Services,
    weather: WeatherSync,
) -> Result<Scheduler, SchedulerError> {
    let runner = Arc::new(JobRunner::new(Arc::clone(&services.locks)));
    let mut scheduler = Scheduler::new(runner);

    scheduler.register(
        Arc::new(weather),
        Trigger::every(config.check_interval),
        config.weather_lock_ttl,
    )?;
    scheduler.register(
        Arc::new(SeedSyncJob),
        Trigger::daily_at(config.seed_sync_hour, config.seed_sync_minute)?,
        config.seed_lock_ttl,
    )?;

    Ok(scheduler)
}

/// `run`: schedule jobs until a termination signal, then drain.
pub async fn run(config: AgentConfig) -> Result<()> {
    info!(
        check_interval_secs = config.check_interval.as_secs(),
        seed_sync_hour = config.seed_sync_hour,
        seed_sync_minute = config.seed_sync_minute,
        "starting agent"
    );

    let services = connect(&config).await?;
    let weather = weather_sync(&config, Arc::clone(&services.store))?;
    let scheduler =
        build_scheduler(&config, &services, weather).map_err(|e| miette!("{}", e))?;

    let shutdown_rx = install_shutdown_handler()
        .map_err(|e| miette!("failed to install signal handlers: {}", e))?;

    let stats = scheduler.run(shutdown_rx).await;

    info!(
        fired = stats.fired,
        completed = stats.completed,
        skipped = stats.skipped,
        failed = stats.failed,
        "agent stopped"
    );
    Ok(())
}

/// `sweep`: one guarded weather sweep, now.
pub async fn sweep(config: AgentConfig) -> Result<()> {
    let services = connect(&config).await?;
    let weather = weather_sync(&config, Arc::clone(&services.store))?;
    let runner = JobRunner::new(Arc::clone(&services.locks));

    match runner.run_job(&weather, config.weather_lock_ttl).await {
        RunOutcome::Completed => Ok(()),
        RunOutcome::Skipped => {
            info!("weather sweep already running on another replica");
            Ok(())
        }
        RunOutcome::Failed => Err(miette!("weather sweep failed, see log for details")),
    }
}

/// `check`: verify storage and the lock store are reachable.
pub async fn check(config: AgentConfig) -> Result<()> {
    connect(&config).await?;
    info!("all connectivity checks passed");
    Ok(())
}
