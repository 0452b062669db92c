//! # flexrec Configuration Constants
//!
//! This module centralizes all configuration constants, grouping interdependent
//! values together and documenting their relationships. Constants that depend
//! on each other are co-located to prevent mismatch bugs.
//!
//! ## Dependency Graph
//!
//! ```text
//! SIZE_VOFFSET (2 bytes)
//!       │
//!       ├─> VTABLE_METADATA_FIELDS (vtable size + table size, both voffsets)
//!       │
//!       └─> MAX_FIELDS_PER_TABLE (derived: every vtable byte count must fit a u16)
//!
//! SIZE_UOFFSET (4 bytes)
//!       │
//!       ├─> SIZE_SOFFSET (table -> vtable back-reference, same width)
//!       │
//!       └─> root offset, vector length prefix, out-of-line references
//!
//! RECORD_POOL_SHARD_COUNT (16)
//!       │
//!       └─> DEFAULT_MAX_IDLE_PER_SHARD (idle shells retained per shard)
//! ```
//!
//! ## Critical Invariants
//!
//! These invariants are enforced by compile-time assertions:
//!
//! 1. `SIZE_SOFFSET == SIZE_UOFFSET` (the table header is one uoffset wide)
//! 2. `(MAX_FIELDS_PER_TABLE + VTABLE_METADATA_FIELDS) * SIZE_VOFFSET <= u16::MAX`
//! 3. `DEFAULT_BUILDER_CAPACITY` is a power of two (builder growth doubles)
//!
//! ## Wire Compatibility
//!
//! The `SIZE_*` and `VTABLE_*` constants are part of the binary format. Changing
//! them breaks every buffer ever written. Pool constants are tuning knobs only.

// ============================================================================
// WIRE FORMAT CONSTANTS
// These define the offset-table layout and must never change
// ============================================================================

/// Width of an unsigned offset (root offset, vector length, child reference).
pub const SIZE_UOFFSET: usize = 4;

/// Width of the signed offset at the start of every table pointing at its vtable.
pub const SIZE_SOFFSET: usize = 4;

/// Width of one vtable entry.
pub const SIZE_VOFFSET: usize = 2;

/// Number of leading vtable entries that are metadata rather than field slots:
/// the vtable byte size followed by the table byte size.
pub const VTABLE_METADATA_FIELDS: usize = 2;

/// Largest field count a single table can address.
pub const MAX_FIELDS_PER_TABLE: usize =
    (u16::MAX as usize / SIZE_VOFFSET) - VTABLE_METADATA_FIELDS;

/// Largest object (table body) size addressable by a `u16` vtable entry.
pub const MAX_TABLE_SIZE: usize = u16::MAX as usize;

/// Largest alignment the builder ever requests (8-byte scalars).
pub const MAX_SCALAR_ALIGN: usize = 8;

const _: () = assert!(
    SIZE_SOFFSET == SIZE_UOFFSET,
    "table soffset must be as wide as a uoffset"
);

const _: () = assert!(
    (MAX_FIELDS_PER_TABLE + VTABLE_METADATA_FIELDS) * SIZE_VOFFSET <= u16::MAX as usize,
    "vtable byte size must fit a u16"
);

// ============================================================================
// BUILDER CONFIGURATION
// ============================================================================

/// Initial size of a freshly allocated builder buffer. Builders double on
/// overflow, so this only matters for the first encode through a new buffer.
pub const DEFAULT_BUILDER_CAPACITY: usize = 256;

const _: () = assert!(
    DEFAULT_BUILDER_CAPACITY.is_power_of_two(),
    "builder capacity must be a power of two"
);

/// Largest buffer the builder produces. Offsets are `u32` but FlatBuffers-style
/// readers treat them as signed in places, so stay within `i32`.
pub const MAX_BUFFER_SIZE: usize = i32::MAX as usize;

const _: () = assert!(
    DEFAULT_BUILDER_CAPACITY <= MAX_BUFFER_SIZE,
    "initial builder capacity exceeds the buffer limit"
);

// ============================================================================
// POOL CONFIGURATION
// ============================================================================

/// Number of shards for the record pool free lists.
/// Acquire/release requests are distributed round-robin to reduce contention.
pub const RECORD_POOL_SHARD_COUNT: usize = 16;

/// Idle record shells retained per shard before further releases are dropped.
pub const DEFAULT_MAX_IDLE_PER_SHARD: usize = 64;

/// Record shells pre-allocated by `RecordPool::new`.
pub const DEFAULT_RECORD_POOL_SIZE: usize = 0;

const _: () = assert!(
    DEFAULT_MAX_IDLE_PER_SHARD > 0,
    "a shard that retains nothing turns the pool into a plain allocator"
);

// ============================================================================
// TEXT INPUT
// ============================================================================

/// Deepest array/object nesting accepted by the JSON parser. Schema
/// definitions and `apply_json` documents both parse untrusted text.
pub const MAX_JSON_DEPTH: usize = 128;

const _: () = assert!(MAX_JSON_DEPTH >= 2, "a nested record needs two levels");
