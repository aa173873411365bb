//! Daily seed database sync.

use async_trait::async_trait;
use tracing::info;

use greenthumb_scheduler::{Job, JobResult};

pub const SEED_JOB_NAME: &str = "seed_database";

/// Refreshes the seed catalogue. The upstream catalogue feed is not wired
/// in yet, so a run only records that it happened.
#[derive(Debug, Default)]
pub struct SeedSyncJob;

#[async_trait]
impl Job for SeedSyncJob {
    fn name(&self) -> &str {
        SEED_JOB_NAME
    }

    async fn run(&self) -> JobResult {
        info!("starting seed database sync");
        info!("seed database sync completed");
        Ok(())
    }
}
