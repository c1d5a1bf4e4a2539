//! In-process backend with Redis command semantics
//!
//! Covers only the commands in [`KvStore`]. Expired entries read as absent and
//! are dropped by the read that finds them, by the next write to the key, or
//! by [`MemoryStore::len`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ahash::RandomState;
use parking_lot::RwLock;

use super::{Clock, KvStore, SystemClock};
use crate::error::{Error, Result};

enum Slot {
    Str(Vec<u8>),
    List(Vec<Vec<u8>>),
}

struct Entry {
    slot: Slot,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Key-value store held in memory
pub struct MemoryStore {
    map: RwLock<HashMap<String, Entry, RandomState>>,
    clock: Arc<dyn Clock>,
    closed: RwLock<bool>,
}

impl MemoryStore {
    /// Create an empty store on the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store reading time from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            map: RwLock::new(HashMap::with_hasher(RandomState::new())),
            clock,
            closed: RwLock::new(false),
        }
    }

    /// Number of live keys; sweeps out expired ones
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let mut map = self.map.write();
        map.retain(|_, e| e.is_live(now));
        map.len()
    }

    /// Check if the store holds no live keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_open(&self) -> Result<()> {
        if *self.closed.read() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    fn drop_expired(&self, key: &str, now: Instant) {
        let mut map = self.map.write();
        live_entry(&mut map, key, now);
    }

    fn put_str(&self, key: &str, value: &[u8], expires_at: Option<Instant>) -> Result<()> {
        self.check_open()?;
        self.map.write().insert(
            key.to_string(),
            Entry {
                slot: Slot::Str(value.to_vec()),
                expires_at,
            },
        );
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Live entry for `key`, dropping it first if it has expired
fn live_entry<'a>(
    map: &'a mut HashMap<String, Entry, RandomState>,
    key: &str,
    now: Instant,
) -> Option<&'a mut Entry> {
    if map.get(key).is_some_and(|e| !e.is_live(now)) {
        map.remove(key);
    }
    map.get_mut(key)
}

/// Resolve Redis-style inclusive, possibly negative, bounds against `len`
fn list_bounds(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

impl KvStore for MemoryStore {
    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.put_str(key, value, None)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        let now = self.clock.now();
        {
            let map = self.map.read();
            match map.get(key) {
                Some(entry) if entry.is_live(now) => {
                    return match &entry.slot {
                        Slot::Str(bytes) => Ok(Some(bytes.clone())),
                        Slot::List(_) => Err(Error::WrongType { key: key.to_string() }),
                    };
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        self.drop_expired(key, now);
        Ok(None)
    }

    fn incr(&self, key: &str) -> Result<i64> {
        self.check_open()?;
        let now = self.clock.now();
        let mut map = self.map.write();

        match live_entry(&mut map, key, now) {
            Some(entry) => {
                let Slot::Str(bytes) = &mut entry.slot else {
                    return Err(Error::WrongType { key: key.to_string() });
                };
                let current: i64 = std::str::from_utf8(bytes)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| Error::NotAnInteger { key: key.to_string() })?;
                let next = current
                    .checked_add(1)
                    .ok_or_else(|| Error::NotAnInteger { key: key.to_string() })?;
                *bytes = next.to_string().into_bytes();
                Ok(next)
            }
            None => {
                map.insert(
                    key.to_string(),
                    Entry {
                        slot: Slot::Str(b"1".to_vec()),
                        expires_at: None,
                    },
                );
                Ok(1)
            }
        }
    }

    fn rpush(&self, key: &str, item: &[u8]) -> Result<usize> {
        self.check_open()?;
        let now = self.clock.now();
        let mut map = self.map.write();

        match live_entry(&mut map, key, now) {
            Some(entry) => match &mut entry.slot {
                Slot::List(items) => {
                    items.push(item.to_vec());
                    Ok(items.len())
                }
                Slot::Str(_) => Err(Error::WrongType { key: key.to_string() }),
            },
            None => {
                map.insert(
                    key.to_string(),
                    Entry {
                        slot: Slot::List(vec![item.to_vec()]),
                        expires_at: None,
                    },
                );
                Ok(1)
            }
        }
    }

    fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<Vec<u8>>> {
        self.check_open()?;
        let now = self.clock.now();
        {
            let map = self.map.read();
            match map.get(key) {
                Some(entry) if entry.is_live(now) => {
                    return match &entry.slot {
                        Slot::List(items) => Ok(list_bounds(items.len(), start, stop)
                            .map(|(lo, hi)| items[lo..=hi].to_vec())
                            .unwrap_or_default()),
                        Slot::Str(_) => Err(Error::WrongType { key: key.to_string() }),
                    };
                }
                Some(_) => {}
                None => return Ok(Vec::new()),
            }
        }

        self.drop_expired(key, now);
        Ok(Vec::new())
    }

    fn setex(&self, key: &str, ttl: Duration, value: &[u8]) -> Result<()> {
        // A TTL past the end of the clock's range never expires.
        let expires_at = self.clock.now().checked_add(ttl);
        self.put_str(key, value, expires_at)
    }

    fn flush(&self) -> Result<()> {
        self.check_open()?;
        self.map.write().clear();
        Ok(())
    }

    fn close(&self) -> Result<()> {
        *self.closed.write() = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ManualClock;

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();

        store.set("k", b"v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_incr() {
        let store = MemoryStore::new();

        assert_eq!(store.incr("n").unwrap(), 1);
        assert_eq!(store.incr("n").unwrap(), 2);
        assert_eq!(store.get("n").unwrap(), Some(b"2".to_vec()));

        store.set("s", b"41").unwrap();
        assert_eq!(store.incr("s").unwrap(), 42);
    }

    #[test]
    fn test_incr_not_integer() {
        let store = MemoryStore::new();
        store.set("s", b"hello").unwrap();

        let result = store.incr("s");
        assert!(matches!(result, Err(Error::NotAnInteger { .. })));
    }

    #[test]
    fn test_lists() {
        let store = MemoryStore::new();

        assert_eq!(store.rpush("l", b"a").unwrap(), 1);
        assert_eq!(store.rpush("l", b"b").unwrap(), 2);
        assert_eq!(store.rpush("l", b"c").unwrap(), 3);

        let all = store.lrange("l", 0, -1).unwrap();
        assert_eq!(all, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(store.lrange("l", 1, 1).unwrap(), vec![b"b".to_vec()]);
        assert_eq!(store.lrange("l", -2, 10).unwrap().len(), 2);
        assert!(store.lrange("l", 2, 1).unwrap().is_empty());
        assert!(store.lrange("missing", 0, -1).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_type() {
        let store = MemoryStore::new();
        store.set("s", b"x").unwrap();
        store.rpush("l", b"x").unwrap();

        assert!(matches!(store.rpush("s", b"y"), Err(Error::WrongType { .. })));
        assert!(matches!(store.get("l"), Err(Error::WrongType { .. })));
        assert!(matches!(store.incr("l"), Err(Error::WrongType { .. })));
        assert!(matches!(store.lrange("s", 0, -1), Err(Error::WrongType { .. })));
    }

    #[test]
    fn test_setex_expiry() {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryStore::with_clock(clock.clone());

        store.setex("page", Duration::from_secs(10), b"<html>").unwrap();
        clock.advance(Duration::from_secs(9));
        assert_eq!(store.get("page").unwrap(), Some(b"<html>".to_vec()));

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.get("page").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_setex_huge_ttl_never_expires() {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryStore::with_clock(clock.clone());

        store.setex("k", Duration::MAX, b"v").unwrap();
        clock.advance(Duration::from_secs(365 * 24 * 3600));
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_expired_entry_removed_on_read() {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryStore::with_clock(clock.clone());

        store.setex("cache:http://x", Duration::from_secs(10), b"<html>").unwrap();
        store.setex("cache:http://y", Duration::from_secs(10), b"<html>").unwrap();
        clock.advance(Duration::from_secs(10));

        assert_eq!(store.get("cache:http://x").unwrap(), None);
        assert!(!store.map.read().contains_key("cache:http://x"));
        assert!(store.map.read().contains_key("cache:http://y"));

        assert!(store.lrange("cache:http://y", 0, -1).unwrap().is_empty());
        assert!(store.map.read().is_empty());
    }

    #[test]
    fn test_len_sweeps_expired() {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryStore::with_clock(clock.clone());

        store.setex("a", Duration::from_secs(1), b"1").unwrap();
        store.set("b", b"2").unwrap();
        clock.advance(Duration::from_secs(2));

        assert_eq!(store.len(), 1);
        assert_eq!(store.map.read().len(), 1);
    }

    #[test]
    fn test_set_clears_ttl() {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryStore::with_clock(clock.clone());

        store.setex("k", Duration::from_secs(1), b"old").unwrap();
        store.set("k", b"new").unwrap();
        clock.advance(Duration::from_secs(5));
        assert_eq!(store.get("k").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_flush() {
        let store = MemoryStore::new();
        store.set("a", b"1").unwrap();
        store.rpush("b", b"2").unwrap();

        store.flush().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_use_after_close() {
        let store = MemoryStore::new();
        store.close().unwrap();

        assert!(matches!(store.set("k", b"v"), Err(Error::Closed)));
        assert!(matches!(store.get("k"), Err(Error::Closed)));
    }

    #[test]
    fn test_list_bounds() {
        assert_eq!(list_bounds(3, 0, -1), Some((0, 2)));
        assert_eq!(list_bounds(3, -10, 1), Some((0, 1)));
        assert_eq!(list_bounds(3, 3, 5), None);
        assert_eq!(list_bounds(0, 0, -1), None);
    }
}
