//! # Encoding Module
//!
//! This module provides the byte-level codec for flexrec records:
//!
//! - **Scalar codec**: little-endian fixed-width values (`Scalar`)
//! - **Builder**: back-to-front writer of the offset-table format (`Builder`)
//! - **Reader**: bounds-checked table, vector and string access (`TableView`)
//!
//! Records never touch bytes directly; they go through these three pieces.
//! The format is the FlatBuffers table layout, so buffers produced here can be
//! read by any FlatBuffers reader given a matching schema.

mod builder;
mod error;
mod scalar;
pub mod table;

pub use builder::Builder;
pub use error::BufferError;
pub use scalar::Scalar;
pub use table::{TableView, VectorSpan};
