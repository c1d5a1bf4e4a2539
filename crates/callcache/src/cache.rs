//! Cache: scalar storage under generated keys, with instrumented writes

use std::sync::Arc;

use tracing::debug;

use crate::backend::KvStore;
use crate::error::Result;
use crate::memo::{Fetch, MemoizedFetch};
use crate::replay::{replay, Replay};
use crate::tracker::{read_counter, CallCounter, CallTracker, OperationId};
use crate::value::{as_int, as_text, Key, Value, ValueKind};

/// Identity under which [`Cache::store`] is counted and tracked
pub const STORE_OPERATION: &str = "Cache::store";

/// Handle for storing and retrieving scalar values
///
/// Every `store` call is counted and its argument/result recorded under
/// [`STORE_OPERATION`], so it can be replayed later.
pub struct Cache {
    store: Arc<dyn KvStore>,
    store_count: CallCounter,
    store_calls: CallTracker,
}

impl Cache {
    /// Create a cache on a clean slate
    ///
    /// Flushes every key in `store` first.
    ///
    /// # Arguments
    /// * `store` - Shared key-value store handle
    ///
    /// # Returns
    /// * `Result<Cache>` - Cache handle over an empty store
    pub fn new(store: Arc<dyn KvStore>) -> Result<Self> {
        store.flush()?;
        Ok(Self::attach(store))
    }

    /// Create a cache over existing data, without flushing
    pub fn attach(store: Arc<dyn KvStore>) -> Self {
        let id = OperationId::new(STORE_OPERATION);
        Self {
            store_count: CallCounter::new(Arc::clone(&store), id.clone()),
            store_calls: CallTracker::new(Arc::clone(&store), id),
            store,
        }
    }

    /// Store a value under a fresh key
    ///
    /// # Arguments
    /// * `value` - Text, bytes, integer or float
    ///
    /// # Returns
    /// * `Result<Key>` - Newly generated key the value lives under
    pub fn store(&self, value: impl Into<Value>) -> Result<Key> {
        let value = value.into();
        self.store_count
            .call(|| self.store_calls.call((value,), |(value,)| self.write(value)))
    }

    fn write(&self, value: Value) -> Result<Key> {
        let key = Key::generate();
        self.store.set(key.as_str(), &value.to_bytes())?;
        debug!("Stored {:?} value under {}", value.kind(), key);
        Ok(key)
    }

    /// Raw bytes under `key`, `None` if absent
    pub fn retrieve(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        self.store.get(key.as_str())
    }

    /// Bytes under `key` passed through `converter`, `None` if absent
    ///
    /// Converter errors propagate unchanged.
    pub fn retrieve_with<T, F>(&self, key: &Key, converter: F) -> Result<Option<T>>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        self.retrieve(key)?.map(|raw| converter(&raw)).transpose()
    }

    /// Value under `key` decoded as UTF-8 text
    pub fn retrieve_text(&self, key: &Key) -> Result<Option<String>> {
        self.retrieve_with(key, as_text)
    }

    /// Value under `key` parsed as an integer
    pub fn retrieve_int(&self, key: &Key) -> Result<Option<i64>> {
        self.retrieve_with(key, as_int)
    }

    /// Value under `key` decoded as the given variant
    pub fn retrieve_value(&self, key: &Key, kind: ValueKind) -> Result<Option<Value>> {
        self.retrieve_with(key, |raw| Value::decode(kind, raw))
    }

    /// Times the operation `id` has been counted
    pub fn call_count(&self, id: &str) -> Result<i64> {
        read_counter(self.store.as_ref(), id)
    }

    /// Recorded call history of operation `id`
    pub fn replay(&self, id: &str) -> Result<Replay> {
        replay(self.store.as_ref(), &OperationId::new(id))
    }

    /// Memoize `fetch` over this cache's store
    pub fn memoize<F: Fetch>(&self, fetch: F) -> MemoizedFetch<F> {
        MemoizedFetch::new(Arc::clone(&self.store), fetch)
    }

    /// Shared store handle
    pub fn store_handle(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Close the underlying store connection
    pub fn close(self) -> Result<()> {
        self.store.close()
    }
}
