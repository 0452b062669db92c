//! # Record Schemas
//!
//! A schema declares, for one record type, the ordered list of fields a record
//! may carry. The order is part of the wire contract: field `i` is looked up
//! through slot `i` of every encoded table, whatever schema wrote it.
//!
//! ## Evolution Rules
//!
//! | Change | Compatible | Why |
//! |--------|------------|-----|
//! | Append a field | yes | old data has no slot for it, reads as unset |
//! | Stop reading a trailing field | yes | readers ignore slots they do not know |
//! | Reorder / remove / retype a field | no | slots would be renumbered |
//!
//! The API enforces the first two: fields can only be appended, never removed.
//!
//! ## Sharing
//!
//! A schema is built once, then frozen behind an `Arc` (`into_shared`) and
//! shared read-only by every record of that type. Nested record fields hold the
//! `Arc` of their nested schema, which must exist before the parent field is
//! declared, so schemas always form a tree.
//!
//! ## Module Structure
//!
//! - `schema`: `Schema` with name index and append-only field list
//! - `field`: `Field` definition (name, slot, kind, nesting, repetition)
//! - `definition`: declarative text source parsing and rendering
//! - `error`: `SchemaError`

mod definition;
mod error;
mod field;
#[allow(clippy::module_inception)]
mod schema;

pub use error::SchemaError;
pub use field::Field;
pub use schema::Schema;
