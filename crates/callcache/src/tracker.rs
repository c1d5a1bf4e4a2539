//! Call counting and call history for instrumented operations
//!
//! Store layout per operation identity `id`:
//! - `id`: call counter (`INCR`)
//! - `id:inputs`: rendered arguments, one entry per call (`RPUSH`)
//! - `id:outputs`: rendered results, one entry per successful call (`RPUSH`)
//!
//! Inputs are appended before the operation runs, outputs after it returns.
//! A call that fails leaves an input entry with no matching output.
//! The two logs stay index-aligned only while calls do not overlap; nothing
//! here serializes concurrent callers.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::backend::KvStore;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::value::as_int;

/// Stable name of an instrumented operation, e.g. `Cache::store`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationId(String);

impl OperationId {
    /// Create an identity from its name
    pub fn new(name: impl Into<String>) -> Self {
        OperationId(name.into())
    }

    /// Identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the call counter
    pub fn counter_key(&self) -> &str {
        &self.0
    }

    /// Key of the inputs log
    pub fn inputs_key(&self) -> String {
        format!("{}:inputs", self.0)
    }

    /// Key of the outputs log
    pub fn outputs_key(&self) -> String {
        format!("{}:outputs", self.0)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationId {
    fn from(s: &str) -> Self {
        OperationId::new(s)
    }
}

impl From<String> for OperationId {
    fn from(s: String) -> Self {
        OperationId(s)
    }
}

/// Counts invocations of one operation
#[derive(Clone)]
pub struct CallCounter {
    store: Arc<dyn KvStore>,
    id: OperationId,
}

impl CallCounter {
    /// Counter for `id` in `store`
    pub fn new(store: Arc<dyn KvStore>, id: OperationId) -> Self {
        Self { store, id }
    }

    /// Record one invocation; returns the new count
    pub fn bump(&self) -> Result<i64> {
        self.store.incr(self.id.counter_key())
    }

    /// Count the call, then run `op`
    pub fn call<R, E, F>(&self, op: F) -> std::result::Result<R, E>
    where
        F: FnOnce() -> std::result::Result<R, E>,
        E: From<Error>,
    {
        self.bump()?;
        op()
    }

    /// Number of recorded invocations (0 if never called)
    pub fn count(&self) -> Result<i64> {
        read_counter(self.store.as_ref(), self.id.counter_key())
    }
}

/// Read a counter written with `INCR`, treating a missing key as 0
pub(crate) fn read_counter(store: &dyn KvStore, key: &str) -> Result<i64> {
    match store.get(key)? {
        Some(raw) => as_int(&raw),
        None => Ok(0),
    }
}

/// Records arguments and results of one operation
#[derive(Clone)]
pub struct CallTracker {
    store: Arc<dyn KvStore>,
    id: OperationId,
}

impl CallTracker {
    /// Tracker for `id` in `store`
    pub fn new(store: Arc<dyn KvStore>, id: OperationId) -> Self {
        Self { store, id }
    }

    /// Identity this tracker writes under
    pub fn identity(&self) -> &OperationId {
        &self.id
    }

    /// Log `args`, run `op(args)`, log its result and hand it back unchanged
    ///
    /// Errors from `op` propagate untouched and leave no output entry.
    pub fn call<A, R, E, F>(&self, args: A, op: F) -> std::result::Result<R, E>
    where
        A: Record,
        R: Record,
        E: From<Error>,
        F: FnOnce(A) -> std::result::Result<R, E>,
    {
        let input = args.record();
        self.store.rpush(&self.id.inputs_key(), input.as_bytes())?;

        let result = match op(args) {
            Ok(result) => result,
            Err(e) => {
                warn!("{} failed; input {} has no recorded output", self.id, input);
                return Err(e);
            }
        };

        self.store
            .rpush(&self.id.outputs_key(), result.record().as_bytes())?;
        Ok(result)
    }

    /// Recorded inputs, oldest first
    pub fn inputs(&self) -> Result<Vec<String>> {
        read_log(self.store.as_ref(), &self.id.inputs_key())
    }

    /// Recorded outputs, oldest first
    pub fn outputs(&self) -> Result<Vec<String>> {
        read_log(self.store.as_ref(), &self.id.outputs_key())
    }
}

/// Full log under `key` as text
pub(crate) fn read_log(store: &dyn KvStore, key: &str) -> Result<Vec<String>> {
    Ok(store
        .lrange(key, 0, -1)?
        .into_iter()
        .map(|raw| String::from_utf8_lossy(&raw).into_owned())
        .collect())
}

/// Operation wrapped with call history and, optionally, a call counter
///
/// `call` has the same shape as the wrapped operation.
pub struct Tracked<F> {
    tracker: CallTracker,
    counter: Option<CallCounter>,
    op: F,
}

impl<F> Tracked<F> {
    /// Wrap `op` under identity `id`
    pub fn new(store: Arc<dyn KvStore>, id: impl Into<OperationId>, op: F) -> Self {
        Self {
            tracker: CallTracker::new(store, id.into()),
            counter: None,
            op,
        }
    }

    /// Also count calls under the same identity
    pub fn with_counter(mut self) -> Self {
        self.counter = Some(CallCounter::new(
            Arc::clone(&self.tracker.store),
            self.tracker.id.clone(),
        ));
        self
    }

    /// Identity of the wrapped operation
    pub fn identity(&self) -> &OperationId {
        self.tracker.identity()
    }

    /// Call history recorder
    pub fn tracker(&self) -> &CallTracker {
        &self.tracker
    }

    /// Invoke the wrapped operation
    pub fn call<A, R, E>(&self, args: A) -> std::result::Result<R, E>
    where
        F: Fn(A) -> std::result::Result<R, E>,
        A: Record,
        R: Record,
        E: From<Error>,
    {
        if let Some(counter) = &self.counter {
            counter.bump()?;
        }
        self.tracker.call(args, &self.op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use crate::replay::replay;

    fn store() -> Arc<dyn KvStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_counter() {
        let store = store();
        let counter = CallCounter::new(Arc::clone(&store), "Cache::store".into());

        assert_eq!(counter.count().unwrap(), 0);
        for _ in 0..3 {
            counter.call(|| Ok::<_, Error>(())).unwrap();
        }
        assert_eq!(counter.count().unwrap(), 3);
    }

    #[test]
    fn test_tracked_logs_in_order() {
        let store = store();
        let add = Tracked::new(Arc::clone(&store), "math::add", |(a, b): (i64, i64)| {
            Ok::<_, Error>(a + b)
        });

        assert_eq!(add.call((1, 2)).unwrap(), 3);
        assert_eq!(add.call((3, 4)).unwrap(), 7);

        assert_eq!(add.tracker().inputs().unwrap(), vec!["(1, 2)", "(3, 4)"]);
        assert_eq!(add.tracker().outputs().unwrap(), vec!["3", "7"]);
    }

    #[test]
    fn test_n_calls_n_entries() {
        let store = store();
        let double = Tracked::new(Arc::clone(&store), "math::double", |(x,): (u32,)| {
            Ok::<_, Error>(x * 2)
        })
        .with_counter();

        for i in 0..25 {
            double.call((i,)).unwrap();
        }

        assert_eq!(double.tracker().inputs().unwrap().len(), 25);
        assert_eq!(double.tracker().outputs().unwrap().len(), 25);
        let counter = CallCounter::new(Arc::clone(&store), "math::double".into());
        assert_eq!(counter.count().unwrap(), 25);
        assert_eq!(replay(store.as_ref(), double.identity()).unwrap().len(), 25);
    }

    #[test]
    fn test_failed_call_leaves_orphan_input() {
        let store = store();
        let parse = Tracked::new(Arc::clone(&store), "parse", |(s,): (&str,)| {
            s.parse::<i64>()
                .map_err(|_| Error::Conversion(s.to_string()))
        });

        assert_eq!(parse.call(("12",)).unwrap(), 12);
        assert!(matches!(parse.call(("x",)), Err(Error::Conversion(_))));

        assert_eq!(parse.tracker().inputs().unwrap(), vec!["(\"12\",)", "(\"x\",)"]);
        assert_eq!(parse.tracker().outputs().unwrap(), vec!["12"]);
    }

    #[test]
    fn test_store_failure_propagates() {
        let mem = Arc::new(MemoryStore::new());
        mem.set("broken:inputs", b"not a list").unwrap();
        let store: Arc<dyn KvStore> = mem;

        let tracker = CallTracker::new(store, "broken".into());
        let mut ran = false;
        let result = tracker.call((), |()| {
            ran = true;
            Ok::<_, Error>(1)
        });

        assert!(matches!(result, Err(Error::WrongType { .. })));
        assert!(!ran);
    }

    #[test]
    fn test_operation_keys() {
        let id = OperationId::new("Cache::store");
        assert_eq!(id.counter_key(), "Cache::store");
        assert_eq!(id.inputs_key(), "Cache::store:inputs");
        assert_eq!(id.outputs_key(), "Cache::store:outputs");
    }
}
