//! # callcache
//!
//! Call tracking and memoization over a Redis-style key-value store.
//!
//! ## Architecture
//! - **Backend**: `KvStore` trait; `RedisStore` for a live server, `MemoryStore` in-process
//! - **Cache**: store scalar values under fresh UUID keys, read them back typed
//! - **Tracker**: call counters plus ordered inputs/outputs logs per operation
//! - **Replay**: render a tracked operation's history in call order
//! - **Memo**: TTL-bounded memoization of a fetch, with per-identifier access counts
//!
//! The store handle is shared through `Arc<dyn KvStore>`. Nothing here is
//! transactional across commands: each backend call is atomic on its own.

#![warn(missing_docs)]

mod backend;
mod cache;
mod config;
mod error;
mod memo;
mod record;
mod replay;
mod stats;
mod tracker;
mod value;

pub use backend::{Clock, KvStore, ManualClock, MemoryStore, RedisStore, SystemClock};
pub use cache::{Cache, STORE_OPERATION};
pub use config::CacheConfig;
pub use error::{Error, Result};
pub use memo::{Fetch, MemoizedFetch, DEFAULT_TTL};
pub use record::{render_args, Record};
pub use replay::{replay, Replay};
pub use stats::FetchStats;
pub use tracker::{CallCounter, CallTracker, OperationId, Tracked};
pub use value::{as_bytes, as_float, as_int, as_text, Key, Value, ValueKind};
