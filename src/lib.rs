//! # flexrec - Dynamic Schema-Driven Binary Records
//!
//! flexrec reads and writes records in the FlatBuffers binary layout without
//! generated code. A record's shape is a [`Schema`] built at runtime (or parsed
//! from a declarative definition), and every field is accessed by name:
//!
//! - **Lazy decoding**: binding bytes costs nothing; each read decodes one slot
//! - **Overlay writes**: assignments live beside the bound bytes until encode
//! - **Wire compatibility**: buffers are readable by standard FlatBuffers code
//!   whose schema declares the same fields in the same order
//! - **Pooling**: decode/mutate/encode loops can run allocation-free once warm
//!
//! ## Quick Start
//!
//! ```ignore
//! use flexrec::{Record, Schema};
//!
//! let schema = Schema::from_definition(r#"{
//!     "name": "string",
//!     "price": "float32",
//!     "quantity": "int32"
//! }"#)?;
//!
//! let mut record = Record::new(schema.clone());
//! record.set("name", "Cola")?;
//! record.set("price", 0.123f32)?;
//! record.set("quantity", 42)?;
//! let bytes = record.to_bytes()?;
//!
//! let mut bound = Record::from_bytes(schema, bytes);
//! bound.set("quantity", 3)?;
//! let updated = bound.to_bytes()?;   // name and price copied through
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Record / ArrayView / JSON         │  records
//! ├─────────────────────────────────────┤
//! │   Schema, Field, definitions        │  schema
//! ├───────────────────┬─────────────────┤
//! │  Builder          │  TableView      │  encoding
//! │  (back-to-front)  │  (bounds-checked│
//! │                   │   slot lookup)  │
//! ├───────────────────┴─────────────────┤
//! │   RecordPool, ScratchPools          │  memory
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns `eyre::Result`. Conditions a caller may
//! want to react to are typed and can be recovered with `downcast_ref`:
//!
//! | Type | Raised when |
//! |------|-------------|
//! | [`FieldAccessError`] | unknown field on write, or value of the wrong kind |
//! | [`ArrayError`] | array index out of range |
//! | [`BufferError`] | bound bytes are truncated or point outside the buffer |
//! | [`SchemaError`] | duplicate field, unknown type, invalid nesting |
//!
//! ## Module Overview
//!
//! - [`config`]: wire constants and pool defaults
//! - [`encoding`]: scalar codec, table builder, table reader
//! - [`memory`]: record pool and scratch pools
//! - [`parsing`]: JSON tokenizer and writer used by definitions and projection
//! - [`records`]: the record engine
//! - [`schema`]: schemas and fields
//! - [`types`]: field kinds and runtime values

pub mod config;
pub mod encoding;
pub mod memory;
pub mod parsing;
pub mod records;
pub mod schema;
pub mod types;

pub use encoding::BufferError;
pub use memory::{PoolConfig, RecordPool};
pub use records::{ArrayError, ArrayView, FieldAccessError, Record};
pub use schema::{Field, Schema, SchemaError};
pub use types::{ArrayValue, FieldKind, FieldState, Value};
