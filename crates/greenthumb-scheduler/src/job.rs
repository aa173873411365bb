//! The unit of scheduled work.

use async_trait::async_trait;

/// Outcome of a job body. Errors are boxed so any job can report any failure.
pub type JobResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A named body of work run under the job's distributed lock.
#[async_trait]
pub trait Job: Send + Sync {
    /// Stable job name, also used to derive the lock key.
    fn name(&self) -> &str;

    /// Run the job once.
    async fn run(&self) -> JobResult;
}
