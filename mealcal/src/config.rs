use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::error::{MealError, Result};

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn required_env(var: &str) -> Result<String> {
    match env::var(var) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(MealError::Config(format!(
            "{var} is not set. Add it to the environment or a .env file."
        ))),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub preferences: PreferencesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Connection settings for the remote meal store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub access_key: Option<String>,
    pub request_timeout_secs: u64,
    /// Create missing tables at start-up.
    pub provision_schema: bool,
}

impl StoreConfig {
    pub fn is_remote(&self) -> bool {
        is_remote_url(&self.url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Local in-memory store, used by tests and `--ephemeral` runs.
    pub fn in_memory() -> Self {
        Self {
            url: ":memory:".to_string(),
            access_key: None,
            request_timeout_secs: 10,
            provision_schema: true,
        }
    }
}

/// Query cache and retry policy.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// How long a cached result is served without contacting the store.
    pub stale_secs: u64,
    /// Unused entries are evicted after this long, fresh or not.
    pub retention_secs: u64,
    pub capacity: usize,
    pub read_retries: u32,
    pub write_retries: u32,
    /// First retry delay; doubles per attempt up to 30 seconds.
    pub retry_base_ms: u64,
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_secs: 300,
            retention_secs: 1800,
            capacity: 256,
            read_retries: 3,
            write_retries: 1,
            retry_base_ms: 1000,
            sweep_interval_secs: 60,
        }
    }
}

impl CacheConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }

    pub fn retention_time(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn retry_base(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }
}

/// Local key-value persistence for client preferences such as the theme.
#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesConfig {
    pub path: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: "file:mealcal-prefs.db".to_string(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// The store URL is mandatory, and remote URLs also need an access key.
    /// Both are fatal at start-up rather than recoverable later.
    pub fn from_env() -> Result<Self> {
        let url = required_env("MEALCAL_STORE_URL")?;
        let access_key = if is_remote_url(&url) {
            Some(required_env("MEALCAL_STORE_KEY")?)
        } else {
            env::var("MEALCAL_STORE_KEY").ok().filter(|k| !k.is_empty())
        };

        Ok(Self::with_store(StoreConfig {
            url,
            access_key,
            request_timeout_secs: parse_env_or("STORE_REQUEST_TIMEOUT_SECS", 10),
            provision_schema: parse_env_or("STORE_PROVISION_SCHEMA", true),
        }))
    }

    /// Environment configuration around a throwaway in-memory store. Needs
    /// no store URL.
    pub fn ephemeral() -> Self {
        Self::with_store(StoreConfig::in_memory())
    }

    fn with_store(store: StoreConfig) -> Self {
        let cache_defaults = CacheConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("MEALCAL_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: parse_env_or("MEALCAL_PORT", 3000),
            },
            store,
            cache: CacheConfig {
                stale_secs: parse_env_or("CACHE_STALE_SECS", cache_defaults.stale_secs),
                retention_secs: parse_env_or("CACHE_RETENTION_SECS", cache_defaults.retention_secs),
                capacity: parse_env_or("CACHE_CAPACITY", cache_defaults.capacity).max(1),
                read_retries: parse_env_or("CACHE_READ_RETRIES", cache_defaults.read_retries),
                write_retries: parse_env_or("CACHE_WRITE_RETRIES", cache_defaults.write_retries),
                retry_base_ms: parse_env_or("CACHE_RETRY_BASE_MS", cache_defaults.retry_base_ms),
                sweep_interval_secs: parse_env_or(
                    "CACHE_SWEEP_INTERVAL_SECS",
                    cache_defaults.sweep_interval_secs,
                ),
            },
            preferences: PreferencesConfig {
                path: env::var("MEALCAL_PREFS_PATH")
                    .unwrap_or_else(|_| PreferencesConfig::default().path),
            },
        }
    }
}

pub fn is_remote_url(url: &str) -> bool {
    url.starts_with("libsql://") || url.starts_with("https://") || url.starts_with("http://")
}

/// Output format of the log subscriber, read from `MEALCAL_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env::var("MEALCAL_LOG_FORMAT") {
            Ok(val) if val.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}
