//! # Record Pool
//!
//! Reusable record shells for request/response workloads that decode, mutate
//! and re-encode records in a loop.
//!
//! ## Usage
//!
//! ```ignore
//! let pool = RecordPool::new(PoolConfig::default());
//!
//! let mut record = pool.acquire_bound(&schema, request_bytes);
//! record.set("quantity", 3)?;
//! let response = record.to_bytes()?;
//! pool.release(record);
//!
//! assert_eq!(pool.live_object_count(), 0);
//! ```
//!
//! ## Design
//!
//! What the pool keeps is the record's overlay allocation; the schema and the
//! bound buffer are attached on acquire and dropped on release. Idle shells
//! live in 16 lock shards picked round-robin, the same layout the scratch and
//! buffer pools use, so concurrent workers rarely meet on one mutex.
//!
//! Every record handed out carries a lease (the pool's id). `release` takes the
//! record by value, so a released record cannot be touched again, and walks
//! its pending overlay so that nested records acquired from this pool and
//! moved into the parent are reclaimed with it. A leased child that was later
//! overwritten (by another `set`, or `set_null`) stays parked on the parent
//! until that release.
//!
//! ## Leak Detection
//!
//! `live_object_count` is incremented on acquire and decremented on release of
//! a leased record. After a balanced sequence of acquires and releases it is
//! zero; a record dropped without release keeps it above zero.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::config::{
    DEFAULT_BUILDER_CAPACITY, DEFAULT_MAX_IDLE_PER_SHARD, DEFAULT_RECORD_POOL_SIZE,
    RECORD_POOL_SHARD_COUNT,
};
use crate::memory::ScratchPools;
use crate::records::{Pending, Record};
use crate::schema::Schema;
use crate::types::{ArrayValue, Value};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    initial_records: usize,
    max_idle_per_shard: usize,
    builder_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_records: DEFAULT_RECORD_POOL_SIZE,
            max_idle_per_shard: DEFAULT_MAX_IDLE_PER_SHARD,
            builder_capacity: DEFAULT_BUILDER_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// Record shells allocated up front.
    pub fn initial_records(mut self, count: usize) -> Self {
        self.initial_records = count;
        self
    }

    /// Idle shells kept per shard; releases beyond this free the shell.
    pub fn max_idle_per_shard(mut self, count: usize) -> Self {
        self.max_idle_per_shard = count.max(1);
        self
    }

    /// Size of the first builder buffer placed in the scratch pool.
    pub fn builder_capacity(mut self, bytes: usize) -> Self {
        self.builder_capacity = bytes;
        self
    }
}

struct RecordPoolInner {
    id: u64,
    shards: [Mutex<Vec<Vec<Pending>>>; RECORD_POOL_SHARD_COUNT],
    next_shard: AtomicUsize,
    live: AtomicUsize,
    created: AtomicUsize,
    max_idle_per_shard: usize,
    scratch: ScratchPools,
}

/// Thread-safe pool of record shells. Clones share the same pool.
#[derive(Clone)]
pub struct RecordPool {
    inner: Arc<RecordPoolInner>,
}

impl RecordPool {
    pub fn new(config: PoolConfig) -> Self {
        let shards: [Mutex<Vec<Vec<Pending>>>; RECORD_POOL_SHARD_COUNT] =
            std::array::from_fn(|_| Mutex::new(Vec::new()));

        let per_shard = config.initial_records / RECORD_POOL_SHARD_COUNT;
        let remainder = config.initial_records % RECORD_POOL_SHARD_COUNT;
        for (i, shard) in shards.iter().enumerate() {
            let count = per_shard + if i < remainder { 1 } else { 0 };
            let mut guard = shard.lock();
            for _ in 0..count {
                guard.push(Vec::new());
            }
        }

        let scratch = ScratchPools::new();
        scratch
            .buffers()
            .seed(Vec::with_capacity(config.builder_capacity));

        Self {
            inner: Arc::new(RecordPoolInner {
                id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
                shards,
                next_shard: AtomicUsize::new(0),
                live: AtomicUsize::new(0),
                created: AtomicUsize::new(config.initial_records),
                max_idle_per_shard: config.max_idle_per_shard,
                scratch,
            }),
        }
    }

    fn next_shard(&self) -> usize {
        self.inner.next_shard.fetch_add(1, Ordering::Relaxed) % RECORD_POOL_SHARD_COUNT
    }

    /// Pops an idle shell from the round-robin shard, falling back to any
    /// other shard that is not contended.
    fn take_shell(&self) -> Option<Vec<Pending>> {
        let start = self.next_shard();
        if let Some(shell) = self.inner.shards[start].lock().pop() {
            return Some(shell);
        }
        (1..RECORD_POOL_SHARD_COUNT).find_map(|step| {
            let idx = (start + step) % RECORD_POOL_SHARD_COUNT;
            self.inner.shards[idx].try_lock().and_then(|mut shard| shard.pop())
        })
    }

    /// A fresh record of `schema`: no pending values, not bound.
    pub fn acquire(&self, schema: &Arc<Schema>) -> Record {
        let pending = match self.take_shell() {
            Some(shell) => shell,
            None => {
                let created = self.inner.created.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(pool = self.inner.id, created, "record pool miss, allocating shell");
                Vec::new()
            }
        };
        self.inner.live.fetch_add(1, Ordering::Relaxed);

        let mut record = Record::new(Arc::clone(schema));
        record.pending = pending;
        record.scratch = Some(self.inner.scratch.clone());
        record.lease = Some(self.inner.id);
        record
    }

    /// A pooled record bound to `data`, decoded lazily like `Record::from_bytes`.
    pub fn acquire_bound(&self, schema: &Arc<Schema>, data: impl Into<Bytes>) -> Record {
        let mut record = self.acquire(schema);
        let bound = Record::from_bytes(Arc::clone(schema), data);
        record.bound = bound.bound;
        record
    }

    /// Returns `record` and every nested record leased from this pool that was
    /// moved into it.
    pub fn release(&self, record: Record) {
        if record.lease != Some(self.inner.id) {
            warn!(
                pool = self.inner.id,
                lease = ?record.lease,
                "released a record this pool did not hand out"
            );
        }
        self.reclaim(record);
    }

    fn reclaim(&self, mut record: Record) {
        for entry in record.pending.drain(..) {
            if let Pending::Value(value) = entry {
                self.reclaim_value(value);
            }
        }
        for value in std::mem::take(&mut record.displaced) {
            self.reclaim_value(value);
        }

        if record.lease != Some(self.inner.id) {
            return;
        }
        self.inner.live.fetch_sub(1, Ordering::Relaxed);

        let shell = std::mem::take(&mut record.pending);
        let shard_idx = self.next_shard();
        let mut shard = self.inner.shards[shard_idx].lock();
        if shard.len() < self.inner.max_idle_per_shard {
            shard.push(shell);
        } else {
            trace!(pool = self.inner.id, shard = shard_idx, "shard full, dropping shell");
        }
    }

    fn reclaim_value(&self, value: Value) {
        match value {
            Value::Record(child) => self.reclaim(*child),
            Value::Array(ArrayValue::Record(children)) => {
                for child in children {
                    self.reclaim(child);
                }
            }
            _ => {}
        }
    }

    /// Leased records not yet released.
    pub fn live_object_count(&self) -> usize {
        self.inner.live.load(Ordering::Relaxed)
    }

    /// Idle shells across all shards.
    pub fn available(&self) -> usize {
        self.inner.shards.iter().map(|s| s.lock().len()).sum()
    }

    /// Shells ever allocated, including the initial ones.
    pub fn created_count(&self) -> usize {
        self.inner.created.load(Ordering::Relaxed)
    }

    pub fn scratch(&self) -> &ScratchPools {
        &self.inner.scratch
    }
}

impl Default for RecordPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl std::fmt::Debug for RecordPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordPool")
            .field("id", &self.inner.id)
            .field("live", &self.live_object_count())
            .field("available", &self.available())
            .finish()
    }
}
