//! Trigger types: when a registered job fires.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::SchedulerError;

/// Longest accepted interval trigger, one leap year.
pub const MAX_INTERVAL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// A parsed cron expression, evaluated in UTC.
///
/// Uses the seven-field form `sec min hour day-of-month month day-of-week [year]`.
#[derive(Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: Arc<cron::Schedule>,
}

impl CronSchedule {
    /// Parse a cron expression.
    pub fn parse(expression: &str) -> Result<Self, SchedulerError> {
        let schedule =
            cron::Schedule::from_str(expression).map_err(|e| SchedulerError::InvalidCron {
                expression: expression.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            expression: expression.to_string(),
            schedule: Arc::new(schedule),
        })
    }

    /// The source expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First matching instant strictly after `t`.
    pub fn next_after(&self, t: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&t).next()
    }
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronSchedule").field(&self.expression).finish()
    }
}

/// When a job fires.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Every `every`, starting one period after the scheduler starts.
    Interval { every: Duration },
    /// At wall-clock instants matching a calendar pattern.
    Cron(CronSchedule),
}

impl Trigger {
    /// Fixed-interval trigger.
    pub fn every(every: Duration) -> Self {
        Trigger::Interval { every }
    }

    /// Fixed-interval trigger in whole minutes.
    pub fn every_minutes(minutes: u64) -> Self {
        Trigger::every(Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// Cron trigger from an expression.
    pub fn cron(expression: &str) -> Result<Self, SchedulerError> {
        CronSchedule::parse(expression).map(Trigger::Cron)
    }

    /// Once a day at `hour:minute` UTC.
    pub fn daily_at(hour: u32, minute: u32) -> Result<Self, SchedulerError> {
        if hour > 23 || minute > 59 {
            return Err(SchedulerError::InvalidConfig(format!(
                "daily time {:02}:{:02} is not a valid time of day",
                hour, minute
            )));
        }
        Trigger::cron(&format!("0 {} {} * * *", minute, hour))
    }

    /// Reject triggers that could never fire sensibly, as of `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), SchedulerError> {
        match self {
            Trigger::Interval { every } => {
                if every.as_millis() == 0 {
                    return Err(SchedulerError::InvalidConfig(format!(
                        "interval {:?} must be at least one millisecond",
                        every
                    )));
                }
                if *every > MAX_INTERVAL {
                    return Err(SchedulerError::InvalidConfig(format!(
                        "interval {:?} exceeds the maximum of {:?}",
                        every, MAX_INTERVAL
                    )));
                }
                Ok(())
            }
            Trigger::Cron(schedule) => {
                if schedule.next_after(now).is_none() {
                    return Err(SchedulerError::InvalidConfig(format!(
                        "cron expression {:?} never fires again",
                        schedule.expression()
                    )));
                }
                Ok(())
            }
        }
    }

    /// First fire time for a scheduler that started at `start`.
    ///
    /// `None` when the trigger never fires, or fires past the representable
    /// range of `DateTime`.
    pub fn first_fire(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Trigger::Interval { every } => start.checked_add_signed(period(*every)),
            Trigger::Cron(schedule) => schedule.next_after(start),
        }
    }

    /// Next fire time after the one scheduled for `previous`, as seen at `now`.
    ///
    /// The result is always later than `now`: ticks that fell in the past
    /// (a long stall, a suspended host) are skipped, never replayed.
    pub fn next_after(&self, previous: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Trigger::Interval { every } => {
                let step = period(*every);
                let candidate = previous.checked_add_signed(step)?;
                if candidate > now {
                    return Some(candidate);
                }
                let step_ms = step.num_milliseconds().max(1);
                let behind_ms = (now - previous).num_milliseconds();
                let skip_ms = (behind_ms / step_ms + 1).checked_mul(step_ms)?;
                previous.checked_add_signed(TimeDelta::try_milliseconds(skip_ms)?)
            }
            Trigger::Cron(schedule) => schedule.next_after(previous.max(now)),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Interval { every } => write!(f, "every {}s", every.as_secs()),
            Trigger::Cron(schedule) => write!(f, "cron '{}'", schedule.expression()),
        }
    }
}

/// Interval as whole milliseconds, the resolution triggers run at.
fn period(every: Duration) -> TimeDelta {
    let millis = i64::try_from(every.as_millis()).unwrap_or(i64::MAX / 2);
    TimeDelta::milliseconds(millis.max(1))
}
