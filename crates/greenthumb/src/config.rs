//! Agent configuration.
//!
//! Settings arrive as flags or environment variables through [`AgentArgs`]
//! and are checked once into an [`AgentConfig`] that the rest of the process
//! borrows.

use std::fmt;
use std::time::Duration;

use clap::{Args, ValueEnum};
use thiserror::Error;

use greenthumb_scheduler::MAX_INTERVAL;

/// Where job locks live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LockBackend {
    /// Shared Redis, for any number of replicas.
    Redis,
    /// Process-local, for a single replica in development.
    Memory,
}

/// Raw settings as parsed from the command line and environment.
#[derive(Debug, Clone, Args)]
pub struct AgentArgs {
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Maximum pooled database connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value = "5")]
    pub database_max_connections: u32,

    /// Lock store backend
    #[arg(long, env = "GREENTHUMB_LOCK_BACKEND", value_enum, default_value = "redis")]
    pub lock_backend: LockBackend,

    /// Redis host
    #[arg(long, env = "REDIS_HOST")]
    pub redis_host: Option<String>,

    /// Redis port
    #[arg(long, env = "REDIS_PORT", default_value = "6379")]
    pub redis_port: u16,

    /// Redis password
    #[arg(long, env = "REDIS_PASSWORD", hide_env_values = true)]
    pub redis_password: Option<String>,

    /// Weather sweep interval in minutes
    #[arg(long, env = "AGENT_CHECK_INTERVAL", default_value = "15")]
    pub check_interval: u64,

    /// Hour of the daily seed sync (UTC)
    #[arg(long, env = "SEED_SYNC_HOUR", default_value = "3")]
    pub seed_sync_hour: u32,

    /// Minute of the daily seed sync
    #[arg(long, env = "SEED_SYNC_MINUTE", default_value = "0")]
    pub seed_sync_minute: u32,

    /// Weather sweep lock TTL in seconds
    #[arg(long, env = "WEATHER_LOCK_TTL", default_value = "300")]
    pub weather_lock_ttl: u64,

    /// Seed sync lock TTL in seconds
    #[arg(long, env = "SEED_LOCK_TTL", default_value = "600")]
    pub seed_lock_ttl: u64,

    /// Weather API base URL
    #[arg(long, env = "WEATHER_API_URL", default_value = greenthumb_weather::DEFAULT_BASE_URL)]
    pub weather_api_url: String,

    /// Per-request weather API timeout in seconds
    #[arg(long, env = "WEATHER_TIMEOUT", default_value = "30")]
    pub weather_timeout: u64,
}

/// Rejected configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be at least {min}, got {value}")]
    TooSmall {
        name: &'static str,
        min: u64,
        value: u64,
    },

    #[error("{name} must be below {max}, got {value}")]
    TooLarge {
        name: &'static str,
        max: u64,
        value: u64,
    },

    #[error(
        "weather lock TTL ({ttl}s) must exceed the weather request timeout ({timeout}s)"
    )]
    TtlBelowTimeout { ttl: u64, timeout: u64 },

    #[error("{0} is required for the redis lock backend")]
    MissingRedis(&'static str),
}

/// Redis connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated agent configuration.
#[derive(Clone)]
pub struct AgentConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    /// `None` selects the in-process lock store.
    pub redis: Option<RedisConfig>,
    pub check_interval: Duration,
    pub seed_sync_hour: u32,
    pub seed_sync_minute: u32,
    pub weather_lock_ttl: Duration,
    pub seed_lock_ttl: Duration,
    pub weather_api_url: String,
    pub weather_timeout: Duration,
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("database_url", &"<redacted>")
            .field("database_max_connections", &self.database_max_connections)
            .field("redis", &self.redis)
            .field("check_interval", &self.check_interval)
            .field("seed_sync_hour", &self.seed_sync_hour)
            .field("seed_sync_minute", &self.seed_sync_minute)
            .field("weather_lock_ttl", &self.weather_lock_ttl)
            .field("seed_lock_ttl", &self.seed_lock_ttl)
            .field("weather_api_url", &self.weather_api_url)
            .field("weather_timeout", &self.weather_timeout)
            .finish()
    }
}

impl TryFrom<AgentArgs> for AgentConfig {
    type Error = ConfigError;

    fn try_from(args: AgentArgs) -> Result<Self, Self::Error> {
        at_least("check interval (minutes)", args.check_interval, 1)?;
        at_most(
            "check interval (minutes)",
            args.check_interval,
            MAX_INTERVAL.as_secs() / 60,
        )?;
        at_least("database max connections", u64::from(args.database_max_connections), 1)?;
        below("seed sync hour", u64::from(args.seed_sync_hour), 24)?;
        below("seed sync minute", u64::from(args.seed_sync_minute), 60)?;
        at_least("weather lock TTL (seconds)", args.weather_lock_ttl, 1)?;
        at_least("seed lock TTL (seconds)", args.seed_lock_ttl, 1)?;
        at_least("weather timeout (seconds)", args.weather_timeout, 1)?;

        if args.weather_lock_ttl <= args.weather_timeout {
            return Err(ConfigError::TtlBelowTimeout {
                ttl: args.weather_lock_ttl,
                timeout: args.weather_timeout,
            });
        }

        let redis = match args.lock_backend {
            LockBackend::Memory => None,
            LockBackend::Redis => Some(RedisConfig {
                host: args
                    .redis_host
                    .filter(|h| !h.is_empty())
                    .ok_or(ConfigError::MissingRedis("REDIS_HOST"))?,
                port: args.redis_port,
                password: args
                    .redis_password
                    .ok_or(ConfigError::MissingRedis("REDIS_PASSWORD"))?,
            }),
        };

        Ok(Self {
            database_url: args.database_url,
            database_max_connections: args.database_max_connections,
            redis,
            check_interval: Duration::from_secs(args.check_interval.saturating_mul(60)),
            seed_sync_hour: args.seed_sync_hour,
            seed_sync_minute: args.seed_sync_minute,
            weather_lock_ttl: Duration::from_secs(args.weather_lock_ttl),
            seed_lock_ttl: Duration::from_secs(args.seed_lock_ttl),
            weather_api_url: args.weather_api_url,
            weather_timeout: Duration::from_secs(args.weather_timeout),
        })
    }
}

fn at_least(name: &'static str, value: u64, min: u64) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::TooSmall { name, min, value });
    }
    Ok(())
}

fn at_most(name: &'static str, value: u64, max: u64) -> Result<(), ConfigError> {
    if value > max {
        return Err(ConfigError::TooLarge {
            name,
            max: max + 1,
            value,
        });
    }
    Ok(())
}

fn below(name: &'static str, value: u64, max: u64) -> Result<(), ConfigError> {
    if value >= max {
        return Err(ConfigError::TooLarge { name, max, value });
    }
    Ok(())
}
