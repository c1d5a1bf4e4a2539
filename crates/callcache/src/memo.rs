//! Memoized fetch with per-identifier access counting
//!
//! Keys per identifier `id`:
//! - `count:id`: access counter, bumped on every call, never expires
//! - `cache:id`: last fetched content, written with `SETEX`
//!
//! Steps are not transactional. Two callers missing at the same time both
//! fetch and both write the cache; the last write wins.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::backend::KvStore;
use crate::error::{Error, Result};
use crate::stats::FetchStats;
use crate::tracker::read_counter;
use crate::value::as_text;

/// Lifetime of a cached fetch result
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

/// Operation that fetches content by identifier (usually a URL)
pub trait Fetch {
    /// Failure type of the fetch
    type Error;

    /// Fetch the content for `id`
    fn fetch(&self, id: &str) -> std::result::Result<String, Self::Error>;
}

impl<F, E> Fetch for F
where
    F: Fn(&str) -> std::result::Result<String, E>,
{
    type Error = E;

    fn fetch(&self, id: &str) -> std::result::Result<String, E> {
        self(id)
    }
}

fn cache_key(id: &str) -> String {
    format!("cache:{}", id)
}

fn count_key(id: &str) -> String {
    format!("count:{}", id)
}

/// [`Fetch`] wrapper serving results from the store for a fixed TTL
pub struct MemoizedFetch<F> {
    store: Arc<dyn KvStore>,
    inner: F,
    ttl: Duration,
    stats: FetchStats,
}

impl<F: Fetch> MemoizedFetch<F> {
    /// Wrap `inner` with the default TTL
    pub fn new(store: Arc<dyn KvStore>, inner: F) -> Self {
        Self {
            store,
            inner,
            ttl: DEFAULT_TTL,
            stats: FetchStats::new(),
        }
    }

    /// Override the cache TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Count the access, then serve `id` from cache or fetch and cache it
    ///
    /// The access counts even if the fetch fails.
    pub fn fetch(&self, id: &str) -> std::result::Result<String, F::Error>
    where
        F::Error: From<Error>,
    {
        self.store.incr(&count_key(id))?;

        let key = cache_key(id);
        if let Some(raw) = self.store.get(&key)? {
            debug!("Cache hit for {}", id);
            self.stats.record_hit();
            return Ok(as_text(&raw)?);
        }

        debug!("Cache miss for {}, fetching", id);
        self.stats.record_miss();
        let content = match self.inner.fetch(id) {
            Ok(content) => content,
            Err(e) => {
                self.stats.record_failure();
                return Err(e);
            }
        };

        self.store.setex(&key, self.ttl, content.as_bytes())?;
        Ok(content)
    }

    /// Number of `fetch` calls ever made for `id`
    pub fn access_count(&self, id: &str) -> Result<i64> {
        read_counter(self.store.as_ref(), &count_key(id))
    }

    /// Cache TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Hit/miss statistics for this wrapper
    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    /// Wrapped fetch
    pub fn inner(&self) -> &F {
        &self.inner
    }
}
