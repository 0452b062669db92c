//! # Object Pooling
//!
//! This module provides the pools that let encode/decode loops run without
//! per-iteration heap allocation once warmed up.
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------+
//! |                      RecordPool                        |
//! |                                                        |
//! |  shards[16]: Mutex<Vec<shell>>    live / created       |
//! |  +------+ +------+ +------+       counters             |
//! |  |shell | |shell | | ...  |                            |
//! |  +------+ +------+ +------+                            |
//! |                                                        |
//! |  ScratchPools (shared with every record it hands out)  |
//! |  +-------------+ +---------------+ +---------------+   |
//! |  | field_refs  | | element_refs  | | buffers       |   |
//! |  | Vec<Option> | | Vec<u32>      | | Vec<u8>       |   |
//! |  +-------------+ +---------------+ +---------------+   |
//! +--------------------------------------------------------+
//! ```
//!
//! Pools are explicit objects owned by the caller; there is no process-wide
//! pool. A record that never came from a pool encodes through a transient
//! `ScratchPools` and behaves identically, it just allocates.
//!
//! ## Module Structure
//!
//! - `record_pool`: `RecordPool` and its `PoolConfig`
//! - `scratch`: `ScratchPool`, the `Scratch` guard, and `ScratchPools`

mod record_pool;
mod scratch;

pub use record_pool::{PoolConfig, RecordPool};
pub use scratch::{Reusable, Scratch, ScratchHighWater, ScratchPool, ScratchPools};
