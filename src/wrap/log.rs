//! Start/pass/fail logging around a test operation.

use std::fmt;
use std::future::Future;

use tracing::Instrument;
use uuid::Uuid;

fn run_span(name: &str) -> tracing::Span {
    tracing::info_span!("test", name, run_id = %Uuid::new_v4())
}

fn log_outcome<T, E: fmt::Display>(name: &str, result: &Result<T, E>) {
    match result {
        Ok(_) => tracing::info!("Test passed: {name}"),
        Err(e) => tracing::error!(error = %e, "Test failed: {name}, Error: {e}"),
    }
}

/// Log the start and outcome of an async operation.
pub async fn logged<T, E, Fut>(name: &str, future: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    async {
        tracing::info!("Starting test: {name}");
        let result = future.await;
        log_outcome(name, &result);
        result
    }
    .instrument(run_span(name))
    .await
}

/// Blocking counterpart of [`logged`].
pub fn logged_blocking<T, E, F>(name: &str, operation: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: fmt::Display,
{
    let _entered = run_span(name).entered();
    tracing::info!("Starting test: {name}");
    let result = operation();
    log_outcome(name, &result);
    result
}
