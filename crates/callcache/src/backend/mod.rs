//! Key-value store contract and its backends
//!
//! The core issues exactly these command shapes:
//! `SET`, `GET`, `INCR`, `RPUSH`, `LRANGE`, `SETEX`, `FLUSHDB`.

mod clock;
mod memory;
mod redis_store;

use std::time::Duration;

use crate::error::Result;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// External key-value store used as the persistence substrate
///
/// Each call is atomic on its own. Sequences of calls are not.
/// Failures are returned unchanged; implementations never retry.
pub trait KvStore: Send + Sync {
    /// Write `value` under `key`, replacing any previous value and TTL
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Read the value under `key`; `None` when absent or expired
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Increment the integer counter under `key`, creating it at 0 first
    fn incr(&self, key: &str) -> Result<i64>;

    /// Append `item` to the list under `key`; returns the new length
    fn rpush(&self, key: &str, item: &[u8]) -> Result<usize>;

    /// Items `start..=stop` of the list under `key`
    ///
    /// Negative indexes count from the end (`-1` is the last item).
    /// Missing keys read as an empty list.
    fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<Vec<u8>>>;

    /// Write `value` under `key`, expiring after `ttl`
    fn setex(&self, key: &str, ttl: Duration, value: &[u8]) -> Result<()>;

    /// Remove every key
    fn flush(&self) -> Result<()>;

    /// Release the connection; later calls fail with [`Error::Closed`](crate::Error::Closed)
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Whole seconds for a `SETEX` TTL, rounded up, at least 1
pub(crate) fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_secs_rounding() {
        assert_eq!(ttl_secs(Duration::from_secs(10)), 10);
        assert_eq!(ttl_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_secs(Duration::ZERO), 1);
    }
}
