//! # Runtime Value Representation
//!
//! This module provides `Value`, the dynamically-typed value carried by a
//! record's pending overlay and returned by untyped reads, plus `FieldState`,
//! the three-way presence flag that travels alongside every read.
//!
//! ## Value Variants
//!
//! | Variant | Rust Type | Field Declaration |
//! |---------|-----------|-------------------|
//! | Null | - | any field (explicit null marker) |
//! | Int32 | i32 | `int32` |
//! | Int64 | i64 | `int64` |
//! | Float32 | f32 | `float32` |
//! | Float64 | f64 | `float64` |
//! | Bool | bool | `bool` |
//! | Byte | u8 | `byte` |
//! | String | String | `string` |
//! | Bytes | Vec<u8> | `[]byte` |
//! | Record | Box<Record> | nested mapping |
//! | Array | ArrayValue | `[]T` for every other T |
//!
//! Arrays are homogeneous by construction: `ArrayValue` holds one typed vector
//! per element kind, so a mixed array cannot be expressed.
//!
//! ## Field State
//!
//! ```text
//! Unset         never assigned, not bound, or slot absent in bound bytes
//! ExplicitNull  assigned the null marker in the pending overlay
//! HasValue      assigned a value, or decoded from a present slot
//! ```

use eyre::{bail, Result};

use crate::records::Record;
use crate::types::FieldKind;

/// Presence of a field's effective value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldState {
    HasValue,
    ExplicitNull,
    Unset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    Byte(u8),
    String(String),
    Bytes(Vec<u8>),
    Record(Box<Record>),
    Array(ArrayValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Declared-type spelling of this value, used in type mismatch reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::String(_) => "string",
            Value::Bytes(_) => "[]byte",
            Value::Record(_) => "record",
            Value::Array(array) => array.type_name(),
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }
}

/// Homogeneous element sequence for a repeated field.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
    String(Vec<String>),
    Record(Vec<Record>),
}

impl ArrayValue {
    /// Empty array for `kind`. Repeated bytes are blobs, not arrays, so
    /// `Byte` has no `ArrayValue` form.
    pub fn empty(kind: FieldKind) -> Option<Self> {
        match kind {
            FieldKind::Int32 => Some(ArrayValue::Int32(Vec::new())),
            FieldKind::Int64 => Some(ArrayValue::Int64(Vec::new())),
            FieldKind::Float32 => Some(ArrayValue::Float32(Vec::new())),
            FieldKind::Float64 => Some(ArrayValue::Float64(Vec::new())),
            FieldKind::Bool => Some(ArrayValue::Bool(Vec::new())),
            FieldKind::String => Some(ArrayValue::String(Vec::new())),
            FieldKind::Record => Some(ArrayValue::Record(Vec::new())),
            FieldKind::Byte => None,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            ArrayValue::Int32(_) => FieldKind::Int32,
            ArrayValue::Int64(_) => FieldKind::Int64,
            ArrayValue::Float32(_) => FieldKind::Float32,
            ArrayValue::Float64(_) => FieldKind::Float64,
            ArrayValue::Bool(_) => FieldKind::Bool,
            ArrayValue::String(_) => FieldKind::String,
            ArrayValue::Record(_) => FieldKind::Record,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ArrayValue::Int32(_) => "[]int32",
            ArrayValue::Int64(_) => "[]int64",
            ArrayValue::Float32(_) => "[]float32",
            ArrayValue::Float64(_) => "[]float64",
            ArrayValue::Bool(_) => "[]bool",
            ArrayValue::String(_) => "[]string",
            ArrayValue::Record(_) => "[]record",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayValue::Int32(v) => v.len(),
            ArrayValue::Int64(v) => v.len(),
            ArrayValue::Float32(v) => v.len(),
            ArrayValue::Float64(v) => v.len(),
            ArrayValue::Bool(v) => v.len(),
            ArrayValue::String(v) => v.len(),
            ArrayValue::Record(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `other` after the existing elements, preserving logical order.
    pub fn extend(&mut self, other: ArrayValue) -> Result<()> {
        match (self, other) {
            (ArrayValue::Int32(a), ArrayValue::Int32(b)) => a.extend(b),
            (ArrayValue::Int64(a), ArrayValue::Int64(b)) => a.extend(b),
            (ArrayValue::Float32(a), ArrayValue::Float32(b)) => a.extend(b),
            (ArrayValue::Float64(a), ArrayValue::Float64(b)) => a.extend(b),
            (ArrayValue::Bool(a), ArrayValue::Bool(b)) => a.extend(b),
            (ArrayValue::String(a), ArrayValue::String(b)) => a.extend(b),
            (ArrayValue::Record(a), ArrayValue::Record(b)) => a.extend(b),
            (a, b) => bail!(
                "cannot append {} elements to {}",
                b.type_name(),
                a.type_name()
            ),
        }
        Ok(())
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_from! {
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    bool => Bool,
    u8 => Byte,
    String => String,
    Vec<u8> => Bytes,
    ArrayValue => Array,
}

macro_rules! array_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for ArrayValue {
                fn from(values: Vec<$ty>) -> Self {
                    ArrayValue::$variant(values)
                }
            }

            impl From<Vec<$ty>> for Value {
                fn from(values: Vec<$ty>) -> Self {
                    Value::Array(ArrayValue::$variant(values))
                }
            }
        )*
    };
}

array_from! {
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    bool => Bool,
    String => String,
    Record => Record,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<Vec<&str>> for Value {
    fn from(values: Vec<&str>) -> Self {
        Value::Array(ArrayValue::String(
            values.into_iter().map(str::to_string).collect(),
        ))
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(Box::new(record))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_matching_variant() {
        assert_eq!(Value::from(42i32), Value::Int32(42));
        assert_eq!(Value::from("cola"), Value::String("cola".into()));
        assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
        assert_eq!(
            Value::from(vec![1i64, 2]),
            Value::Array(ArrayValue::Int64(vec![1, 2]))
        );
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn type_names_render_repetition() {
        assert_eq!(Value::from(vec!["a", "b"]).type_name(), "[]string");
        assert_eq!(Value::from(vec![1u8]).type_name(), "[]byte");
        assert_eq!(Value::Null.type_name(), "null");
    }

    #[test]
    fn extend_preserves_logical_order() {
        let mut array = ArrayValue::Int32(vec![1]);
        array.extend(ArrayValue::Int32(vec![2, 3])).unwrap();
        assert_eq!(array, ArrayValue::Int32(vec![1, 2, 3]));
    }

    #[test]
    fn extend_rejects_mixed_kinds() {
        let mut array = ArrayValue::Int32(vec![1]);
        let err = array.extend(ArrayValue::Bool(vec![true])).unwrap_err();
        assert!(err.to_string().contains("[]bool"));
    }

    #[test]
    fn byte_kind_has_no_array_form() {
        assert!(ArrayValue::empty(FieldKind::Byte).is_none());
        assert_eq!(
            ArrayValue::empty(FieldKind::String).unwrap().kind(),
            FieldKind::String
        );
    }
}
