//! Convenience re-exports for common use.

pub use crate::config::DecorConfig;
pub use crate::error::{Classify, DecorError, FailureKind, Result, TaskCancelled, TimedOut};
pub use crate::util::cache::ResultCache;
pub use crate::util::panic::{catch_panic, catch_panic_async};
pub use crate::util::retry::{AttemptOutcome, AttemptRecord, RetryOn, RetryPolicy};
pub use crate::util::timeout::TimeoutPolicy;
pub use crate::wrap::{
    around, around_blocking, logged, logged_blocking, parameterize, parameterize_blocking, timed,
    timed_blocking, timed_report, timed_report_blocking, Hooks, LoggingHooks, Priority, TestMeta,
    TimingReport,
};
