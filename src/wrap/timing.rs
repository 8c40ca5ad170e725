//! Wall-clock timing of test operations.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// How long one run of an operation took.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingReport {
    pub operation: String,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub succeeded: bool,
}

impl TimingReport {
    fn finish(
        operation: &str,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        succeeded: bool,
    ) -> Self {
        tracing::info!(
            operation,
            elapsed_ms = elapsed.as_millis() as u64,
            succeeded,
            "Finished {} in {:.2} seconds",
            operation,
            elapsed.as_secs_f64()
        );
        Self {
            operation: operation.to_string(),
            started_at,
            elapsed,
            succeeded,
        }
    }
}

/// Time an async operation and return its result with a [`TimingReport`].
///
/// Uses tokio's clock, so paused test runtimes report virtual time.
pub async fn timed_report<T, E, Fut>(name: &str, future: Fut) -> (Result<T, E>, TimingReport)
where
    Fut: Future<Output = Result<T, E>>,
{
    tracing::info!("Starting {name}...");
    let started_at = Utc::now();
    let start = tokio::time::Instant::now();
    let result = future.await;
    let report = TimingReport::finish(name, started_at, start.elapsed(), result.is_ok());
    (result, report)
}

/// Time an async operation, logging the elapsed time.
pub async fn timed<T, E, Fut>(name: &str, future: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    timed_report(name, future).await.0
}

/// Blocking counterpart of [`timed_report`].
pub fn timed_report_blocking<T, E, F>(name: &str, operation: F) -> (Result<T, E>, TimingReport)
where
    F: FnOnce() -> Result<T, E>,
{
    tracing::info!("Starting {name}...");
    let started_at = Utc::now();
    let start = std::time::Instant::now();
    let result = operation();
    let report = TimingReport::finish(name, started_at, start.elapsed(), result.is_ok());
    (result, report)
}

/// Blocking counterpart of [`timed`].
pub fn timed_blocking<T, E, F>(name: &str, operation: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
{
    timed_report_blocking(name, operation).0
}
