//! Lightweight wrappers layered around test operations.
//!
//! Each wrapper returns the operation's result unchanged; they only add
//! logging, timing, tagging, hooks or parameter sweeps around it.

pub mod hooks;
pub mod log;
pub mod mark;
pub mod params;
pub mod timing;

pub use hooks::{around, around_blocking, Hooks, LoggingHooks};
pub use log::{logged, logged_blocking};
pub use mark::{Priority, TestMeta};
pub use params::{parameterize, parameterize_blocking};
pub use timing::{timed, timed_blocking, timed_report, timed_report_blocking, TimingReport};
