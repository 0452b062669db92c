//! # Dynamic Records over an Offset-Table Encoding
//!
//! This module provides `Record`, the schema-driven record engine, and the
//! read views it hands out. A record combines two layers:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ pending overlay (per slot)   │  Untouched | Null | Value
//! ├──────────────────────────────┤
//! │ bound view (optional)        │  shared bytes + root reference position
//! └──────────────────────────────┘
//! ```
//!
//! Reads consult the overlay first and fall back to decoding the slot from
//! the bound bytes. Writes only touch the overlay. `to_bytes` merges both into
//! a new buffer and leaves the record unchanged.
//!
//! ## Encoded Record Layout
//!
//! ```text
//! +-----------+--------+----------------------+------------------------+
//! | root u32  | vtable | table                | out-of-line payloads   |
//! | uoffset   | u16 .. | soffset + inline     | strings, vectors,      |
//! |           |        | scalars / references | nested tables          |
//! +-----------+--------+----------------------+------------------------+
//! ```
//!
//! Field `i` of the schema is vtable slot `i`. A writer with fewer fields
//! produces a shorter vtable; a reader with fewer fields never looks at the
//! extra slots. Either way both sides agree on every common field.
//!
//! ## Field States
//!
//! | State | Meaning |
//! |-------|---------|
//! | `HasValue` | assigned, or present in the bound bytes |
//! | `ExplicitNull` | assigned null in the overlay |
//! | `Unset` | never assigned and absent from the bound bytes (or unknown) |
//!
//! Once encoded, an explicit null is an absent slot, so it decodes as `Unset`.
//!
//! ## Module Structure
//!
//! - `record`: `Record` get/set/append and nested access
//! - `array`: `ArrayView` over encoded or pending arrays
//! - `encode`: table builder traversal behind `Record::to_bytes`
//! - `json`: JSON projection (`to_json` / `apply_json`)
//! - `error`: `FieldAccessError`, `ArrayError`

mod array;
mod encode;
mod error;
mod json;
mod record;

#[cfg(test)]
mod tests;

pub use array::ArrayView;
pub use error::{ArrayError, FieldAccessError};
pub(crate) use record::Pending;
pub use record::Record;
