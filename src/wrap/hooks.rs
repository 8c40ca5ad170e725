//! Before/after hooks around a test operation.

use std::future::Future;

/// Called around a wrapped operation.
pub trait Hooks {
    fn before(&self, name: &str);

    /// Only called when the operation succeeded.
    fn after(&self, name: &str);
}

/// Hooks that log entry and exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHooks;

impl Hooks for LoggingHooks {
    fn before(&self, name: &str) {
        tracing::info!("Before calling {name}");
    }

    fn after(&self, name: &str) {
        tracing::info!("After calling {name}");
    }
}

pub async fn around<H, T, E, Fut>(name: &str, hooks: &H, future: Fut) -> Result<T, E>
where
    H: Hooks + ?Sized,
    Fut: Future<Output = Result<T, E>>,
{
    hooks.before(name);
    let value = future.await?;
    hooks.after(name);
    Ok(value)
}

pub fn around_blocking<H, T, E, F>(name: &str, hooks: &H, operation: F) -> Result<T, E>
where
    H: Hooks + ?Sized,
    F: FnOnce() -> Result<T, E>,
{
    hooks.before(name);
    let value = operation()?;
    hooks.after(name);
    Ok(value)
}
