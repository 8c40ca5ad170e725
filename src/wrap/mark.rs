//! Priority and category metadata for tests.

use std::future::Future;

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Test priority, ordered from least to most important.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

/// Metadata attached to a test.
///
/// ```
/// use testdecor::wrap::{Priority, TestMeta};
///
/// let meta = TestMeta::builder()
///     .name("test_login_functionality")
///     .priority(Priority::High)
///     .category("login")
///     .build();
/// assert!(meta.at_least(Priority::Medium));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct TestMeta {
    #[builder(into)]
    pub name: String,
    #[builder(default)]
    pub priority: Priority,
    #[builder(into, default = "general".to_string())]
    pub category: String,
}

impl TestMeta {
    /// Metadata with default priority and category.
    pub fn named(name: impl Into<String>) -> Self {
        Self::builder().name(name).build()
    }

    pub fn at_least(&self, priority: Priority) -> bool {
        self.priority >= priority
    }

    fn announce(&self) {
        tracing::info!(
            test = %self.name,
            priority = %self.priority,
            category = %self.category,
            "Running {} with priority: {}, category: {}",
            self.name,
            self.priority,
            self.category
        );
    }

    /// Log the metadata, then run the async operation.
    pub async fn run<T, E, Fut>(&self, future: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        self.announce();
        future.await
    }

    /// Blocking counterpart of [`TestMeta::run`].
    pub fn run_blocking<T, E, F>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.announce();
        operation()
    }
}
