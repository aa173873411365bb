//! Wall-clock source for trigger evaluation.

use chrono::{DateTime, Utc};

/// Provides the current time to the scheduler.
///
/// Injected so tests can drive cron and interval triggers without waiting on
/// the real clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
