//! Connection settings

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::backend::RedisStore;
use crate::cache::Cache;
use crate::error::Result;
use crate::memo::DEFAULT_TTL;

/// Settings for building a [`Cache`] over Redis
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis connection URL
    pub redis_url: String,

    /// Memoized fetch TTL in seconds
    pub fetch_ttl_secs: u64,

    /// Flush the database when connecting
    pub flush_on_connect: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379/".to_string(),
            fetch_ttl_secs: DEFAULT_TTL.as_secs(),
            flush_on_connect: true,
        }
    }
}

impl CacheConfig {
    /// Memoized fetch TTL
    pub fn fetch_ttl(&self) -> Duration {
        Duration::from_secs(self.fetch_ttl_secs)
    }

    /// Connect to Redis and build a cache over it
    pub fn connect(&self) -> Result<Cache> {
        let store = Arc::new(RedisStore::connect(&self.redis_url)?);
        if self.flush_on_connect {
            Cache::new(store)
        } else {
            Ok(Cache::attach(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379/");
        assert_eq!(config.fetch_ttl(), Duration::from_secs(10));
        assert!(config.flush_on_connect);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"redis_url": "redis://cache:6380/1", "flush_on_connect": false}"#)
                .unwrap();

        assert_eq!(config.redis_url, "redis://cache:6380/1");
        assert_eq!(config.fetch_ttl_secs, 10);
        assert!(!config.flush_on_connect);
    }
}
