//! Redis backend over a single synchronous connection

use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;

use super::{ttl_secs, KvStore};
use crate::error::{Error, Result};

/// Live Redis server reached through `redis-rs`
///
/// Commands are serialized through one connection. No reconnection is attempted:
/// a dropped connection surfaces as [`Error::Redis`] on the next call.
pub struct RedisStore {
    conn: Mutex<Option<redis::Connection>>,
}

impl RedisStore {
    /// Connect to the server at `url` (e.g. `redis://127.0.0.1:6379/`)
    pub fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection()?;
        info!("Connected to Redis at {}", url);

        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn query<T: redis::FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T> {
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or(Error::Closed)?;
        Ok(cmd.query(conn)?)
    }
}

impl KvStore for RedisStore {
    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.query(redis::cmd("SET").arg(key).arg(value))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.query(redis::cmd("GET").arg(key))
    }

    fn incr(&self, key: &str) -> Result<i64> {
        self.query(redis::cmd("INCR").arg(key))
    }

    fn rpush(&self, key: &str, item: &[u8]) -> Result<usize> {
        self.query(redis::cmd("RPUSH").arg(key).arg(item))
    }

    fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<Vec<u8>>> {
        self.query(redis::cmd("LRANGE").arg(key).arg(start).arg(stop))
    }

    fn setex(&self, key: &str, ttl: Duration, value: &[u8]) -> Result<()> {
        self.query(redis::cmd("SETEX").arg(key).arg(ttl_secs(ttl)).arg(value))
    }

    fn flush(&self) -> Result<()> {
        self.query(&redis::cmd("FLUSHDB"))
    }

    fn close(&self) -> Result<()> {
        self.conn.lock().take();
        Ok(())
    }
}
