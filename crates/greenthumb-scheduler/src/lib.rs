//! Lock-guarded job scheduler for the GreenThumb agent.
//!
//! This crate provides:
//! - A [`Job`] trait for named units of work
//! - A [`JobRunner`] that runs each body under its distributed lock, skipping
//!   when another replica holds it and containing every failure
//! - Interval and cron [`Trigger`]s
//! - A [`Scheduler`] loop with graceful, drain-on-shutdown semantics

mod clock;
mod error;
mod job;
mod runner;
mod scheduler;
mod trigger;

pub use clock::{Clock, SystemClock};
pub use error::SchedulerError;
pub use job::{Job, JobResult};
pub use runner::{JobRunner, RunOutcome};
pub use scheduler::{Scheduler, SchedulerStats};
pub use trigger::{CronSchedule, MAX_INTERVAL, Trigger};
