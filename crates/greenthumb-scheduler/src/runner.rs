//! Lock-guarded job execution.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

use greenthumb_lock::{Acquire, LockProvider, job_lock_key};

use crate::{Job, JobResult};

/// What happened to one guarded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The body ran and returned `Ok`.
    Completed,
    /// Another holder had the lock; the body did not run.
    Skipped,
    /// The body returned an error or panicked, or the lock store was unreachable.
    Failed,
}

/// Runs job bodies under their distributed lock.
///
/// Nothing a body does escapes `run_guarded`: errors and panics are logged and
/// folded into [`RunOutcome::Failed`].
#[derive(Clone)]
pub struct JobRunner {
    locks: Arc<dyn LockProvider>,
}

impl JobRunner {
    /// Create a runner backed by the given lock store.
    pub fn new(locks: Arc<dyn LockProvider>) -> Self {
        Self { locks }
    }

    /// Run a registered job under its lock.
    pub async fn run_job(&self, job: &dyn Job, ttl: Duration) -> RunOutcome {
        self.run_guarded(job.name(), ttl, job.run()).await
    }

    /// Run `body` while holding the lock for `job_name`.
    ///
    /// If the lock is busy the body is dropped unpolled and the lock is not
    /// released. Once the lock is held, it is released exactly once before
    /// this returns, whatever the body does.
    #[tracing::instrument(name = "run_guarded", skip_all, fields(job = %job_name))]
    pub async fn run_guarded<F>(&self, job_name: &str, ttl: Duration, body: F) -> RunOutcome
    where
        F: Future<Output = JobResult>,
    {
        let key = job_lock_key(job_name);

        let token = match self.locks.acquire(&key, ttl).await {
            Ok(Acquire::Acquired(token)) => token,
            Ok(Acquire::Busy) => {
                info!("job already running, skipping");
                return RunOutcome::Skipped;
            }
            Err(e) => {
                error!(error = %e, lock = %key, "failed to acquire job lock, not running");
                return RunOutcome::Failed;
            }
        };

        info!(ttl_secs = ttl.as_secs(), "starting job");
        let started = Instant::now();

        let outcome = match AssertUnwindSafe(body).catch_unwind().await {
            Ok(Ok(())) => {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "job completed"
                );
                RunOutcome::Completed
            }
            Ok(Err(e)) => {
                error!(
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "job failed"
                );
                RunOutcome::Failed
            }
            Err(payload) => {
                error!(
                    panic = %panic_message(payload.as_ref()),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "job panicked"
                );
                RunOutcome::Failed
            }
        };

        match self.locks.release(&key, &token).await {
            Ok(true) => debug!("released job lock"),
            Ok(false) => warn!(
                ttl_secs = ttl.as_secs(),
                "job lock was no longer held at release; runtime exceeded TTL"
            ),
            Err(e) => warn!(error = %e, "failed to release job lock, it will expire after TTL"),
        }

        outcome
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
