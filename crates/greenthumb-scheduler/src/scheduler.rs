//! Job scheduler implementation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::{Clock, Job, JobRunner, RunOutcome, SchedulerError, SystemClock, Trigger};

/// Longest the loop sleeps when nothing is scheduled, so shutdown stays responsive.
const MAX_IDLE_SLEEP_SECS: u64 = 60;

/// A job bound to its trigger and lock TTL.
struct Registration {
    job: Arc<dyn Job>,
    trigger: Trigger,
    lock_ttl: Duration,
}

/// Counters collected over one scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Trigger firings dispatched to the runner.
    pub fired: u64,
    /// Runs whose body completed.
    pub completed: u64,
    /// Runs skipped because the lock was held elsewhere.
    pub skipped: u64,
    /// Runs that failed (body error, panic, or lock store error).
    pub failed: u64,
}

impl SchedulerStats {
    fn record(&mut self, result: Result<(String, RunOutcome), JoinError>) {
        match result {
            Ok((job, outcome)) => {
                debug!(job = %job, outcome = ?outcome, "job run finished");
                match outcome {
                    RunOutcome::Completed => self.completed += 1,
                    RunOutcome::Skipped => self.skipped += 1,
                    RunOutcome::Failed => self.failed += 1,
                }
            }
            Err(e) => {
                error!(error = %e, "job task aborted");
                self.failed += 1;
            }
        }
    }
}

/// The job scheduler.
///
/// Registrations are fixed before [`Scheduler::run`] starts. Each firing is
/// dispatched to its own task, so a slow job never delays another trigger;
/// overlap of the same job is prevented by the runner's lock, not here.
pub struct Scheduler {
    runner: Arc<JobRunner>,
    clock: Arc<dyn Clock>,
    registrations: Vec<Registration>,
}

impl Scheduler {
    /// Create a scheduler that runs jobs through `runner`.
    pub fn new(runner: Arc<JobRunner>) -> Self {
        Self {
            runner,
            clock: Arc::new(SystemClock),
            registrations: Vec::new(),
        }
    }

    /// Replace the wall clock used to evaluate triggers.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a job.
    ///
    /// `lock_ttl` should comfortably exceed the job's longest expected run.
    pub fn register(
        &mut self,
        job: Arc<dyn Job>,
        trigger: Trigger,
        lock_ttl: Duration,
    ) -> Result<(), SchedulerError> {
        if self.registrations.iter().any(|r| r.job.name() == job.name()) {
            return Err(SchedulerError::JobExists(job.name().to_string()));
        }
        if lock_ttl.as_millis() == 0 {
            return Err(SchedulerError::InvalidConfig(format!(
                "lock TTL for job {} must be at least one millisecond",
                job.name()
            )));
        }
        trigger.validate(self.clock.now())?;

        info!(job = job.name(), trigger = %trigger, lock_ttl_secs = lock_ttl.as_secs(), "registered job");
        self.registrations.push(Registration {
            job,
            trigger,
            lock_ttl,
        });
        Ok(())
    }

    /// Names of the registered jobs, in registration order.
    pub fn job_names(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.job.name()).collect()
    }

    /// Run the scheduler loop until `shutdown_rx` turns true.
    ///
    /// On shutdown no further firings start, and every run already in flight
    /// is awaited before this returns.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> SchedulerStats {
        let start = self.clock.now();
        info!(jobs = self.registrations.len(), "scheduler starting");

        let mut next_fire: Vec<Option<DateTime<Utc>>> = self
            .registrations
            .iter()
            .map(|r| r.trigger.first_fire(start))
            .collect();
        for (registration, next) in self.registrations.iter().zip(&next_fire) {
            debug!(job = registration.job.name(), next_fire = ?next, "first fire scheduled");
        }

        let mut in_flight: JoinSet<(String, RunOutcome)> = JoinSet::new();
        let mut stats = SchedulerStats::default();

        loop {
            if *shutdown_rx.borrow() {
                info!("scheduler shutting down");
                break;
            }

            while let Some(result) = in_flight.try_join_next() {
                stats.record(result);
            }

            let now = self.clock.now();
            for (registration, next) in self.registrations.iter().zip(next_fire.iter_mut()) {
                if let Some(due) = *next
                    && due <= now
                {
                    self.dispatch(registration, due, &mut in_flight);
                    stats.fired += 1;
                    *next = registration.trigger.next_after(due, now);
                    debug!(job = registration.job.name(), next_fire = ?next, "rescheduled job");
                }
            }

            let sleep_duration = next_fire
                .iter()
                .flatten()
                .min()
                .map(|earliest| (*earliest - now).to_std().unwrap_or(Duration::ZERO))
                .unwrap_or(Duration::from_secs(MAX_IDLE_SLEEP_SECS));

            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        info!("shutdown channel closed, scheduler shutting down");
                        break;
                    }
                }

                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    stats.record(result);
                }

                _ = sleep(sleep_duration) => {}
            }
        }

        if !in_flight.is_empty() {
            info!(
                in_flight = in_flight.len(),
                "waiting for running jobs to finish"
            );
        }
        while let Some(result) = in_flight.join_next().await {
            stats.record(result);
        }

        info!(
            fired = stats.fired,
            completed = stats.completed,
            skipped = stats.skipped,
            failed = stats.failed,
            "scheduler shut down gracefully"
        );
        stats
    }

    fn dispatch(
        &self,
        registration: &Registration,
        due: DateTime<Utc>,
        in_flight: &mut JoinSet<(String, RunOutcome)>,
    ) {
        let job = Arc::clone(&registration.job);
        let runner = Arc::clone(&self.runner);
        let ttl = registration.lock_ttl;

        info!(job = job.name(), scheduled_for = %due, "trigger fired");
        in_flight.spawn(async move {
            let outcome = runner.run_job(job.as_ref(), ttl).await;
            (job.name().to_string(), outcome)
        });
    }
}
