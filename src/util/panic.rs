//! Turn panicking test bodies into retryable failures.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::{DecorError, Result};

/// Run a closure, converting a panic into [`DecorError::Panicked`].
pub fn catch_panic<T, F>(name: &str, operation: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match std::panic::catch_unwind(AssertUnwindSafe(operation)) {
        Ok(result) => result,
        Err(payload) => Err(panicked(name, payload)),
    }
}

/// Async counterpart of [`catch_panic`].
pub async fn catch_panic_async<T, Fut>(name: &str, future: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(panicked(name, payload)),
    }
}

fn panicked(name: &str, payload: Box<dyn Any + Send>) -> DecorError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };

    DecorError::Panicked {
        operation: name.to_string(),
        message,
    }
}
