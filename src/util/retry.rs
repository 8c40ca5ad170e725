//! Retry with fixed or exponential backoff.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bon::bon;

use crate::error::{Classify, DecorError, FailureKind, Result};

/// Callback receiving one [`AttemptRecord`] per attempt.
pub type AttemptObserver = Arc<dyn Fn(&AttemptRecord) + Send + Sync>;

/// Which failure kinds are retried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RetryOn {
    /// Retry every failure.
    #[default]
    Any,
    /// Retry only failures of these kinds; anything else is returned at once.
    Kinds(Vec<FailureKind>),
}

impl RetryOn {
    pub fn only(kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        Self::Kinds(kinds.into_iter().collect())
    }

    pub fn matches(&self, kind: FailureKind) -> bool {
        match self {
            Self::Any => true,
            Self::Kinds(kinds) => kinds.contains(&kind),
        }
    }
}

/// Outcome of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed { kind: FailureKind, detail: String },
}

/// What happened on one attempt of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 1-based attempt index.
    pub attempt: u32,
    pub max_attempts: u32,
    pub outcome: AttemptOutcome,
    /// Delay before the next attempt; `None` when no further attempt follows.
    pub next_delay: Option<Duration>,
}

/// Retry policy configuration.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_factor: f64,
    max_delay: Option<Duration>,
    retry_on: RetryOn,
    observer: Option<AttemptObserver>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("max_delay", &self.max_delay)
            .field("retry_on", &self.retry_on)
            .field("observer", &self.observer.as_ref().map(|_| ".."))
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_factor: 1.0,
            max_delay: None,
            retry_on: RetryOn::Any,
            observer: None,
        }
    }
}

#[bon]
impl RetryPolicy {
    /// Validated constructor behind `RetryPolicy::builder()`.
    #[builder]
    pub fn new(
        #[builder(default = 3)] max_attempts: u32,
        #[builder(default = Duration::from_secs(1))] initial_delay: Duration,
        #[builder(default = 1.0)] backoff_factor: f64,
        max_delay: Option<Duration>,
        #[builder(default)] retry_on: RetryOn,
    ) -> Result<Self> {
        if max_attempts == 0 {
            return Err(DecorError::configuration("max_attempts must be at least 1"));
        }
        if !backoff_factor.is_finite() || backoff_factor < 1.0 {
            return Err(DecorError::configuration(format!(
                "backoff_factor must be a finite number >= 1 (got {backoff_factor})"
            )));
        }

        Ok(Self {
            max_attempts,
            initial_delay,
            backoff_factor,
            max_delay,
            retry_on,
            observer: None,
        })
    }
}

impl RetryPolicy {
    /// Same delay between every attempt.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Result<Self> {
        Self::builder()
            .max_attempts(max_attempts)
            .initial_delay(delay)
            .build()
    }

    /// Delay multiplied by `backoff_factor` after each failed attempt.
    pub fn exponential(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_factor: f64,
    ) -> Result<Self> {
        Self::builder()
            .max_attempts(max_attempts)
            .initial_delay(initial_delay)
            .backoff_factor(backoff_factor)
            .build()
    }

    pub fn retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    pub fn with_observer(
        mut self,
        observer: impl Fn(&AttemptRecord) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    pub fn retry_filter(&self) -> &RetryOn {
        &self.retry_on
    }

    /// Delays slept between attempts, in order. Yields `max_attempts - 1` items.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.capped(self.initial_delay)), move |delay| {
            Some(self.advance(*delay))
        })
        .take(self.max_attempts.saturating_sub(1) as usize)
    }

    /// Execute an async operation with retry.
    ///
    /// The last failure is returned unchanged once attempts run out, and a
    /// failure that `retry_on` does not match is returned immediately.
    pub async fn execute<T, E, F, Fut>(
        &self,
        name: &str,
        mut operation: F,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let mut attempts = Attempts::new(self, name);

        loop {
            attempts.begin();
            match operation().await {
                Ok(value) => {
                    attempts.succeeded();
                    return Ok(value);
                }
                Err(e) => match attempts.failed(&e) {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => return Err(e),
                },
            }
        }
    }

    /// Blocking counterpart of [`RetryPolicy::execute`]; sleeps the calling thread.
    pub fn execute_blocking<T, E, F>(
        &self,
        name: &str,
        mut operation: F,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> std::result::Result<T, E>,
        E: Classify + fmt::Display,
    {
        let mut attempts = Attempts::new(self, name);

        loop {
            attempts.begin();
            match operation() {
                Ok(value) => {
                    attempts.succeeded();
                    return Ok(value);
                }
                Err(e) => match attempts.failed(&e) {
                    Some(delay) if delay.is_zero() => {}
                    Some(delay) => std::thread::sleep(delay),
                    None => return Err(e),
                },
            }
        }
    }

    fn advance(&self, delay: Duration) -> Duration {
        self.capped(scale(delay, self.backoff_factor))
    }

    fn capped(&self, delay: Duration) -> Duration {
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }

    fn notify(&self, record: &AttemptRecord) {
        if let Some(observer) = &self.observer {
            observer(record);
        }
    }
}

/// Integral factors scale exactly; fractional ones go through `f64`.
fn scale(delay: Duration, factor: f64) -> Duration {
    if factor.fract() == 0.0 && factor <= f64::from(u32::MAX) {
        delay.saturating_mul(factor as u32)
    } else {
        Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }
}

/// Per-invocation attempt bookkeeping shared by the async and blocking loops.
struct Attempts<'a> {
    policy: &'a RetryPolicy,
    name: &'a str,
    attempt: u32,
    delay: Duration,
}

impl<'a> Attempts<'a> {
    fn new(policy: &'a RetryPolicy, name: &'a str) -> Self {
        Self {
            policy,
            name,
            attempt: 1,
            delay: policy.capped(policy.initial_delay),
        }
    }

    fn begin(&self) {
        tracing::info!(
            operation = self.name,
            attempt = self.attempt,
            max_attempts = self.policy.max_attempts,
            "Attempt {} of {}",
            self.attempt,
            self.name
        );
    }

    fn succeeded(&self) {
        self.policy.notify(&AttemptRecord {
            attempt: self.attempt,
            max_attempts: self.policy.max_attempts,
            outcome: AttemptOutcome::Succeeded,
            next_delay: None,
        });
    }

    /// Returns the delay to sleep before retrying, or `None` when the failure is final.
    fn failed<E: Classify + fmt::Display>(&mut self, error: &E) -> Option<Duration> {
        let kind = error.failure_kind();
        let exhausted = self.attempt >= self.policy.max_attempts;
        let retryable = self.policy.retry_on.matches(kind);
        let next_delay = (retryable && !exhausted).then_some(self.delay);

        self.policy.notify(&AttemptRecord {
            attempt: self.attempt,
            max_attempts: self.policy.max_attempts,
            outcome: AttemptOutcome::Failed {
                kind,
                detail: error.to_string(),
            },
            next_delay,
        });

        match next_delay {
            Some(delay) => {
                tracing::warn!(
                    operation = self.name,
                    attempt = self.attempt,
                    max_attempts = self.policy.max_attempts,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after error"
                );
                self.attempt += 1;
                self.delay = self.policy.advance(self.delay);
                Some(delay)
            }
            None if !retryable => {
                tracing::warn!(
                    operation = self.name,
                    attempt = self.attempt,
                    kind = %kind,
                    error = %error,
                    "Failure is not retryable"
                );
                None
            }
            None => {
                tracing::error!(
                    operation = self.name,
                    attempts = self.attempt,
                    error = %error,
                    "Retries exhausted"
                );
                None
            }
        }
    }
}
