//! # Field Kinds and Runtime Values
//!
//! This module defines the closed type vocabulary of flexrec:
//!
//! - [`FieldKind`]: what a schema field declares (`int32`, `string`, ...)
//! - [`Value`] / [`ArrayValue`]: what a record field holds at runtime
//! - [`FieldState`]: whether a read found a value, an explicit null, or nothing
//!
//! `Value` is a tagged union checked against the declared `FieldKind` when a
//! field is assigned, so the pending overlay of a record can only ever hold
//! values the schema accepts.

mod kind;
mod value;

pub use kind::FieldKind;
pub use value::{ArrayValue, FieldState, Value};
