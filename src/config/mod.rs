//! Configuration system (layered: defaults < TOML file < environment).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DecorError, FailureKind, Result};
use crate::util::cache::ResultCache;
use crate::util::retry::{RetryOn, RetryPolicy};
use crate::util::timeout::TimeoutPolicy;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TESTDECOR_CONFIG";

const CONFIG_FILE_NAME: &str = "testdecor.toml";

/// Global default config (lazy-initialized by discovery).
static DEFAULT_CONFIG: OnceLock<DecorConfig> = OnceLock::new();

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorConfig {
    pub retry: RetryConfig,
    pub timeout: TimeoutConfig,
    pub cache: CacheConfig,
}

/// `[retry]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: Option<u64>,
    /// Failure kinds to retry; empty retries everything.
    pub retry_on: Vec<FailureKind>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            backoff_factor: 1.0,
            max_delay_ms: None,
            retry_on: Vec::new(),
        }
    }
}

/// `[timeout]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub deadline_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { deadline_secs: 10 }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 128,
            ttl_secs: None,
        }
    }
}

impl DecorConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve the config file, load it if present, then apply the environment.
    ///
    /// Lookup order: `$TESTDECOR_CONFIG`, then `testdecor.toml` in the
    /// platform config directory. A missing default file is not an error.
    pub fn discover() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let base = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => match default_config_path().filter(|path| path.is_file()) {
                Some(path) => Self::load(&path)?,
                None => Self::default(),
            },
        };

        base.with_env_overrides()
    }

    /// Get (or create) the global default config.
    pub fn global() -> &'static DecorConfig {
        DEFAULT_CONFIG.get_or_init(|| {
            Self::discover().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default testdecor config");
                Self::default()
            })
        })
    }

    /// Apply `TESTDECOR_*` environment variables on top of this config.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(v) = env_value("TESTDECOR_RETRY_MAX_ATTEMPTS")? {
            self.retry.max_attempts = v;
        }
        if let Some(v) = env_value("TESTDECOR_RETRY_DELAY_MS")? {
            self.retry.initial_delay_ms = v;
        }
        if let Some(v) = env_value("TESTDECOR_RETRY_BACKOFF")? {
            self.retry.backoff_factor = v;
        }
        if let Some(v) = env_value("TESTDECOR_TIMEOUT_SECS")? {
            self.timeout.deadline_secs = v;
        }
        if let Some(v) = env_value("TESTDECOR_CACHE_CAPACITY")? {
            self.cache.capacity = v;
        }
        Ok(self)
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        let retry_on = if self.retry.retry_on.is_empty() {
            RetryOn::Any
        } else {
            RetryOn::only(self.retry.retry_on.iter().copied())
        };

        RetryPolicy::builder()
            .max_attempts(self.retry.max_attempts)
            .initial_delay(Duration::from_millis(self.retry.initial_delay_ms))
            .backoff_factor(self.retry.backoff_factor)
            .maybe_max_delay(self.retry.max_delay_ms.map(Duration::from_millis))
            .retry_on(retry_on)
            .build()
    }

    pub fn timeout_policy(&self) -> Result<TimeoutPolicy> {
        TimeoutPolicy::from_secs(self.timeout.deadline_secs)
    }

    pub fn cache<K, V>(&self) -> Result<ResultCache<K, V>>
    where
        K: Eq + std::hash::Hash + Clone + std::fmt::Debug,
        V: Clone,
    {
        let cache = ResultCache::new(self.cache.capacity)?;
        Ok(match self.cache.ttl_secs {
            Some(secs) => cache.with_ttl(Duration::from_secs(secs)),
            None => cache,
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "testdecor")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn env_value<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| DecorError::configuration(format!("invalid value for {key}: {raw:?}"))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(raw)) => Err(DecorError::configuration(format!(
            "{key} is not valid unicode: {raw:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_yields_defaults() {
        let config = DecorConfig::from_toml_str("").unwrap();
        assert_eq!(config, DecorConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = DecorConfig::from_toml_str(
            r#"
            [retry]
            max_attempts = 5
            retry_on = ["connection", "timeout"]
            "#,
        )
        .unwrap();

        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay_ms, 1000);
        assert_eq!(
            config.retry.retry_on,
            vec![FailureKind::Connection, FailureKind::Timeout]
        );
        assert_eq!(config.timeout, TimeoutConfig::default());
    }

    #[test]
    fn unknown_failure_kind_is_a_parse_error() {
        let err = DecorConfig::from_toml_str("[retry]\nretry_on = [\"gremlins\"]").unwrap_err();
        assert!(matches!(err, DecorError::ConfigParse(_)));
    }

    #[test]
    fn invalid_sections_fail_when_building_policies() {
        let mut config = DecorConfig::default();
        config.retry.max_attempts = 0;
        config.timeout.deadline_secs = 0;
        config.cache.capacity = 0;

        assert!(config.retry_policy().is_err());
        assert!(config.timeout_policy().is_err());
        assert!(config.cache::<String, String>().is_err());
    }

    #[test]
    fn retry_section_builds_filtered_policy() {
        let config = DecorConfig::from_toml_str(
            r#"
            [retry]
            max_attempts = 4
            initial_delay_ms = 100
            backoff_factor = 2.0
            max_delay_ms = 300
            retry_on = ["connection"]
            "#,
        )
        .unwrap();

        let policy = config.retry_policy().unwrap();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.retry_filter(), &RetryOn::only([FailureKind::Connection]));
        assert_eq!(
            policy.delays().collect::<Vec<_>>(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(300),
            ]
        );
    }
}
