//! # Scratch Container Pools
//!
//! Encoding a record needs short-lived containers: the per-table list of
//! field references, the per-array list of element references, and the byte
//! buffer the builder writes into. `ScratchPool` keeps idle containers in a
//! free list so steady-state encodes allocate nothing.
//!
//! ## Usage
//!
//! ```ignore
//! let pool: ScratchPool<Vec<u32>> = ScratchPool::new("element_refs");
//!
//! let mut refs = pool.acquire();   // idle container, or a new one
//! refs.push(42);
//! drop(refs);                      // cleared and returned to the free list
//! ```
//!
//! ## Capacity Policy
//!
//! Containers keep their allocation when returned and are never shrunk. The
//! pool records the largest capacity ever returned (`high_water`) and creates
//! new containers at that capacity, so after warm-up every container is big
//! enough for the largest request seen.
//!
//! ## Concurrency
//!
//! Each `acquire` hands out a distinct container; concurrent encodes never
//! share one. `Scratch` uses `ManuallyDrop` so the container is always present
//! until `Drop` moves it back into the pool.

use parking_lot::Mutex;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

/// A container that can be cleared and reused.
pub trait Reusable: Send {
    fn with_capacity(capacity: usize) -> Self;

    fn reset(&mut self);

    fn capacity(&self) -> usize;
}

impl<T: Send> Reusable for Vec<T> {
    fn with_capacity(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn capacity(&self) -> usize {
        Vec::capacity(self)
    }
}

pub struct ScratchPool<T: Reusable> {
    name: &'static str,
    free: Mutex<Vec<T>>,
    high_water: AtomicUsize,
}

impl<T: Reusable> ScratchPool<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            free: Mutex::new(Vec::new()),
            high_water: AtomicUsize::new(0),
        }
    }

    pub fn acquire(&self) -> Scratch<'_, T> {
        let item = self.free.lock().pop();
        let item = item.unwrap_or_else(|| T::with_capacity(self.high_water()));

        Scratch {
            item: ManuallyDrop::new(item),
            pool: self,
        }
    }

    /// Adds an idle container, e.g. to pre-size the pool.
    pub fn seed(&self, item: T) {
        self.give_back(item);
    }

    fn give_back(&self, mut item: T) {
        item.reset();
        let capacity = item.capacity();
        let previous = self.high_water.fetch_max(capacity, Ordering::Relaxed);
        if capacity > previous {
            trace!(pool = self.name, capacity, "scratch high-water mark raised");
        }
        self.free.lock().push(item);
    }

    /// Largest container capacity ever returned to this pool.
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::Relaxed)
    }

    /// Number of idle containers.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

impl<T: Reusable> std::fmt::Debug for ScratchPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchPool")
            .field("name", &self.name)
            .field("idle", &self.idle())
            .field("high_water", &self.high_water())
            .finish()
    }
}

/// A pooled container that returns to its pool when dropped.
pub struct Scratch<'p, T: Reusable> {
    item: ManuallyDrop<T>,
    pool: &'p ScratchPool<T>,
}

impl<T: Reusable> Deref for Scratch<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T: Reusable> DerefMut for Scratch<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.item
    }
}

impl<T: Reusable> Drop for Scratch<'_, T> {
    fn drop(&mut self) {
        // SAFETY: `item` is taken exactly once, here, and never touched again.
        let item = unsafe { ManuallyDrop::take(&mut self.item) };
        self.pool.give_back(item);
    }
}

/// High-water capacities of the three scratch pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScratchHighWater {
    pub field_refs: usize,
    pub element_refs: usize,
    pub buffers: usize,
}

struct ScratchPoolsInner {
    field_refs: ScratchPool<Vec<Option<u32>>>,
    element_refs: ScratchPool<Vec<u32>>,
    buffers: ScratchPool<Vec<u8>>,
}

/// The scratch pools used by one encoder family, shared by handle.
///
/// Records acquired from a `RecordPool` carry that pool's `ScratchPools`;
/// standalone records encode through a transient set.
#[derive(Clone)]
pub struct ScratchPools {
    inner: Arc<ScratchPoolsInner>,
}

impl ScratchPools {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScratchPoolsInner {
                field_refs: ScratchPool::new("field_refs"),
                element_refs: ScratchPool::new("element_refs"),
                buffers: ScratchPool::new("buffers"),
            }),
        }
    }

    pub fn field_refs(&self) -> &ScratchPool<Vec<Option<u32>>> {
        &self.inner.field_refs
    }

    pub fn element_refs(&self) -> &ScratchPool<Vec<u32>> {
        &self.inner.element_refs
    }

    pub fn buffers(&self) -> &ScratchPool<Vec<u8>> {
        &self.inner.buffers
    }

    pub fn high_water(&self) -> ScratchHighWater {
        ScratchHighWater {
            field_refs: self.inner.field_refs.high_water(),
            element_refs: self.inner.element_refs.high_water(),
            buffers: self.inner.buffers.high_water(),
        }
    }
}

impl Default for ScratchPools {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScratchPools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchPools")
            .field("high_water", &self.high_water())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returned_container_is_cleared_and_reused() {
        let pool: ScratchPool<Vec<u32>> = ScratchPool::new("test");
        {
            let mut refs = pool.acquire();
            refs.extend(0..100);
        }
        assert_eq!(pool.idle(), 1);

        let refs = pool.acquire();
        assert!(refs.is_empty());
        assert!(refs.capacity() >= 100);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn high_water_never_shrinks() {
        let pool: ScratchPool<Vec<u8>> = ScratchPool::new("test");
        {
            let mut big = pool.acquire();
            big.resize(4096, 0);
        }
        let after_big = pool.high_water();
        assert!(after_big >= 4096);

        {
            let mut small = pool.acquire();
            small.push(1);
        }
        assert_eq!(pool.high_water(), after_big);
    }

    #[test]
    fn concurrent_acquires_get_distinct_containers() {
        let pool: ScratchPool<Vec<u32>> = ScratchPool::new("test");
        let mut a = pool.acquire();
        let mut b = pool.acquire();
        a.push(1);
        b.push(2);
        assert_ne!(a.as_ptr(), b.as_ptr());
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn fresh_containers_start_at_high_water() {
        let pool: ScratchPool<Vec<u32>> = ScratchPool::new("test");
        pool.seed(Vec::with_capacity(512));
        let _held = pool.acquire();
        let fresh = pool.acquire();
        assert!(fresh.capacity() >= 512);
    }

    #[test]
    fn pools_share_through_clones() {
        let pools = ScratchPools::new();
        let clone = pools.clone();
        drop(clone.element_refs().acquire());
        assert_eq!(pools.element_refs().idle(), 1);
        assert_eq!(ScratchPools::new().element_refs().idle(), 0);
    }
}
