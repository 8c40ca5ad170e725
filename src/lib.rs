//! testdecor: wrappers for test operations
//!
//! Adds retry, timeout, logging, timing, tagging, hooks, memoization and
//! parameter sweeps around a test body without touching the body itself.
//! Wrappers compose by nesting, innermost first.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use testdecor::prelude::*;
//!
//! # async fn example() -> testdecor::error::Result<()> {
//! let retry = RetryPolicy::exponential(3, Duration::from_millis(100), 2.0)?;
//! let timeout = TimeoutPolicy::from_secs(5)?;
//!
//! let status = retry
//!     .execute("test_flaky_api", || {
//!         timeout.execute("test_flaky_api", async { Ok::<_, DecorError>(200) })
//!     })
//!     .await?;
//! assert_eq!(status, 200);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod prelude;
pub mod util;
pub mod wrap;
