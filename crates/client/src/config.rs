use std::time::Duration;

use campus_core::pagination::DEFAULT_PAGE_SIZE;

use crate::cache::CacheConfig;
use crate::retry::RetryPolicy;

/// Invalid value in the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid number, got '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Versioned API base URL.
    pub api_url: String,
    /// Bearer token of the current session, if any.
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    /// Automatic retries for reads. Writes are never retried.
    pub read_retries: u32,
    /// Delay before the first read retry.
    pub retry_delay: Duration,
    pub page_size: u32,
    /// Maximum number of cached query keys.
    pub cache_capacity: usize,
    /// Age after which a cached entry is treated as stale.
    pub cache_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api/v1".into(),
            api_token: None,
            request_timeout: Duration::from_secs(30),
            read_retries: 2,
            retry_delay: Duration::from_millis(250),
            page_size: DEFAULT_PAGE_SIZE,
            cache_capacity: 256,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                        |
    /// |-------------------------------|--------------------------------|
    /// | `CAMPUS_API_URL`              | `http://localhost:5000/api/v1` |
    /// | `CAMPUS_API_TOKEN`            | unset                          |
    /// | `CAMPUS_REQUEST_TIMEOUT_SECS` | `30`                           |
    /// | `CAMPUS_READ_RETRIES`         | `2`                            |
    /// | `CAMPUS_RETRY_DELAY_MS`       | `250`                          |
    /// | `CAMPUS_PAGE_SIZE`            | `10`                           |
    /// | `CAMPUS_CACHE_CAPACITY`       | `256`                          |
    /// | `CAMPUS_CACHE_TTL_SECS`       | `300`                          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let number = |var: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid { var, value }),
            }
        };

        let api_url = lookup("CAMPUS_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_url);
        let api_token = lookup("CAMPUS_API_TOKEN").filter(|t| !t.trim().is_empty());

        let read_retries = number("CAMPUS_READ_RETRIES", u64::from(defaults.read_retries))?;
        let page_size = number("CAMPUS_PAGE_SIZE", u64::from(defaults.page_size))?;
        let cache_capacity = number("CAMPUS_CACHE_CAPACITY", defaults.cache_capacity as u64)?;

        Ok(Self {
            api_url,
            api_token,
            request_timeout: Duration::from_secs(number(
                "CAMPUS_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            read_retries: u32::try_from(read_retries).unwrap_or(u32::MAX),
            retry_delay: Duration::from_millis(number(
                "CAMPUS_RETRY_DELAY_MS",
                defaults.retry_delay.as_millis() as u64,
            )?),
            page_size: u32::try_from(page_size).unwrap_or(u32::MAX),
            cache_capacity: usize::try_from(cache_capacity).unwrap_or(usize::MAX),
            cache_ttl: Duration::from_secs(number(
                "CAMPUS_CACHE_TTL_SECS",
                defaults.cache_ttl.as_secs(),
            )?),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.read_retries,
            initial_delay: self.retry_delay,
            ..RetryPolicy::default()
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            capacity: self.cache_capacity,
            ttl: self.cache_ttl,
        }
    }
}
