//! Utility modules: retry, timeout, cache, panic capture.

pub mod cache;
pub mod panic;
pub mod retry;
pub mod timeout;
