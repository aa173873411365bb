//! Error types for the scheduler.

use thiserror::Error;

/// Errors that can occur while building a schedule.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Job already registered.
    #[error("job already registered: {0}")]
    JobExists(String),

    /// Cron expression could not be parsed.
    #[error("invalid cron expression {expression:?}: {reason}")]
    InvalidCron { expression: String, reason: String },

    /// Invalid job or trigger configuration.
    #[error("invalid job configuration: {0}")]
    InvalidConfig(String),
}
