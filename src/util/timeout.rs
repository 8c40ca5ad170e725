//! Deadline enforcement.
//!
//! Three execution models, each with a different cleanup guarantee:
//!
//! - [`TimeoutPolicy::execute`] drops the future at its current await point
//!   when the deadline passes, so its destructors run before the caller sees
//!   the timeout.
//! - [`TimeoutPolicy::execute_cancellable`] runs the operation as a spawned
//!   task, cancels its [`CancellationToken`] on expiry and detaches it. The
//!   task keeps running until it observes the token.
//! - [`TimeoutPolicy::execute_blocking`] runs a closure on its own thread and
//!   abandons the thread on expiry. Threads cannot be preempted, so the
//!   closure runs to completion in the background and its result is dropped.
//!
//! Every invocation owns its timer, so nothing stays armed after it returns.

use std::future::Future;
use std::sync::mpsc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{DecorError, Result, TaskCancelled, TimedOut};

/// Timeout policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    deadline: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(10),
        }
    }
}

impl TimeoutPolicy {
    pub fn new(deadline: Duration) -> Result<Self> {
        if deadline.is_zero() {
            return Err(DecorError::configuration("timeout deadline must be positive"));
        }
        Ok(Self { deadline })
    }

    pub fn from_secs(secs: u64) -> Result<Self> {
        Self::new(Duration::from_secs(secs))
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Wrap a future with the deadline.
    pub async fn execute<T, E, Fut>(&self, name: &str, future: Fut) -> std::result::Result<T, E>
    where
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<TimedOut>,
    {
        match tokio::time::timeout(self.deadline, future).await {
            Ok(result) => result,
            Err(_) => Err(self.expired(name).into()),
        }
    }

    /// Spawn the operation and cancel its token when the deadline passes.
    ///
    /// Returns as soon as the deadline expires, whether or not the task
    /// honours the cancellation. A panic inside the task is resumed here. A
    /// task dropped by runtime shutdown yields [`TaskCancelled`], not a timeout.
    pub async fn execute_cancellable<T, E, F, Fut>(
        &self,
        name: &str,
        operation: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<TimedOut> + From<TaskCancelled> + Send + 'static,
    {
        let token = CancellationToken::new();
        let mut handle = tokio::spawn(operation(token.child_token()));

        match tokio::time::timeout(self.deadline, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => match join_error.try_into_panic() {
                Ok(payload) => std::panic::resume_unwind(payload),
                Err(join_error) => {
                    tracing::warn!(
                        operation = name,
                        error = %join_error,
                        "Task dropped by the runtime before completing"
                    );
                    Err(TaskCancelled {
                        operation: name.to_string(),
                    }
                    .into())
                }
            },
            Err(_) => {
                token.cancel();
                Err(self.expired(name).into())
            }
        }
    }

    /// Run a blocking closure on a worker thread with the deadline.
    ///
    /// On expiry the worker is abandoned and its eventual result discarded.
    pub fn execute_blocking<T, E, F>(&self, name: &str, operation: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<TimedOut> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let worker = std::thread::spawn(move || {
            // The receiver is gone once the caller has timed out.
            let _ = tx.send(operation());
        });

        match rx.recv_timeout(self.deadline) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(self.expired(name).into()),
            Err(mpsc::RecvTimeoutError::Disconnected) => match worker.join() {
                Err(payload) => std::panic::resume_unwind(payload),
                Ok(()) => Err(self.expired(name).into()),
            },
        }
    }

    fn expired(&self, name: &str) -> TimedOut {
        tracing::error!(
            operation = name,
            deadline_ms = self.deadline.as_millis() as u64,
            "Operation timed out"
        );
        TimedOut {
            operation: name.to_string(),
            deadline: self.deadline,
        }
    }
}
