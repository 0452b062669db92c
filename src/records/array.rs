//! # Array Views with O(1) Element Access
//!
//! This module provides `ArrayView`, a read-only, bounds-checked sequence over
//! one array field. The view either points into encoded bytes or at the
//! pending value of the owning record; callers cannot tell the difference.
//!
//! ## Encoded Layouts
//!
//! ```text
//! fixed-width ([]int32, []float64, []bool, ...), stored last element first:
//!
//!   ┌─────┬─────────┬─────────┬─────┬─────────┐
//!   │ len │ e[n-1]  │ e[n-2]  │ ... │  e[0]   │
//!   └─────┴─────────┴─────────┴─────┴─────────┘
//!         ^base
//!   element i at base + (len - i - 1) * width
//!
//! strings / nested records, a reversed vector of uoffsets:
//!
//!   element i reference at base + (len - i - 1) * 4, payload = ref + u32
//!
//! []byte, a blob in natural order:
//!
//!   element i at base + i
//! ```
//!
//! Nothing is materialized up front: `len` reads the prefix once when the
//! view is created, and each element access computes one address.
//!
//! ## Errors
//!
//! | Condition | Error |
//! |-----------|-------|
//! | `index >= len` | `ArrayError::IndexOutOfRange` |
//! | typed getter for another element kind | `FieldAccessError::TypeMismatch` |
//! | element bytes outside the buffer | `BufferError` |

use std::borrow::Cow;
use std::sync::Arc;

use bytes::Bytes;
use eyre::{bail, eyre, Result};

use crate::config::SIZE_UOFFSET;
use crate::encoding::table::{follow_uoffset, read_at, slice_at, string_at};
use crate::encoding::{Scalar, VectorSpan};
use crate::memory::ScratchPools;
use crate::records::{ArrayError, FieldAccessError, Record};
use crate::schema::{Field, Schema};
use crate::types::{ArrayValue, FieldKind, Value};

#[derive(Debug, Clone, Copy)]
enum Source<'a> {
    Encoded { data: &'a Bytes, span: VectorSpan },
    Pending(&'a Value),
}

#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'a> {
    field: &'a Field,
    scratch: Option<&'a ScratchPools>,
    source: Source<'a>,
}

#[inline]
fn reversed_pos(span: VectorSpan, index: usize, width: usize) -> usize {
    span.base + (span.len - index - 1) * width
}

macro_rules! fixed_elements {
    ($($method:ident => $ty:ty, $kind:ident;)*) => {
        $(
            pub fn $method(&self, index: usize) -> Result<$ty> {
                self.expect_kind(FieldKind::$kind)?;
                self.check_index(index)?;
                match self.source {
                    Source::Encoded { data, span } => {
                        read_at::<$ty>(data, reversed_pos(span, index, <$ty as Scalar>::WIDTH))
                    }
                    Source::Pending(Value::Array(ArrayValue::$kind(values))) => Ok(values[index]),
                    Source::Pending(other) => Err(self.pending_mismatch(other)),
                }
            }
        )*
    };
}

impl<'a> ArrayView<'a> {
    pub(crate) fn encoded(
        field: &'a Field,
        data: &'a Bytes,
        span: VectorSpan,
        scratch: Option<&'a ScratchPools>,
    ) -> Self {
        Self {
            field,
            scratch,
            source: Source::Encoded { data, span },
        }
    }

    pub(crate) fn pending(
        field: &'a Field,
        value: &'a Value,
        scratch: Option<&'a ScratchPools>,
    ) -> Self {
        Self {
            field,
            scratch,
            source: Source::Pending(value),
        }
    }

    pub fn len(&self) -> usize {
        match self.source {
            Source::Encoded { span, .. } => span.len,
            Source::Pending(Value::Array(array)) => array.len(),
            Source::Pending(Value::Bytes(bytes)) => bytes.len(),
            Source::Pending(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element kind.
    pub fn kind(&self) -> FieldKind {
        self.field.kind()
    }

    /// Schema of the elements of a nested record array.
    pub fn nested_schema(&self) -> Option<&'a Arc<Schema>> {
        self.field.nested_schema()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let len = self.len();
        if index >= len {
            bail!(ArrayError::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    fn expect_kind(&self, kind: FieldKind) -> Result<()> {
        if self.field.kind() != kind {
            bail!(FieldAccessError::TypeMismatch {
                field: self.field.name().to_string(),
                expected: self.field.type_name(),
                found: format!("[]{}", kind),
            });
        }
        Ok(())
    }

    fn pending_mismatch(&self, other: &Value) -> eyre::Report {
        eyre!(FieldAccessError::TypeMismatch {
            field: self.field.name().to_string(),
            expected: self.field.type_name(),
            found: other.type_name().to_string(),
        })
    }

    fixed_elements! {
        get_int32 => i32, Int32;
        get_int64 => i64, Int64;
        get_float32 => f32, Float32;
        get_float64 => f64, Float64;
        get_bool => bool, Bool;
    }

    pub fn get_byte(&self, index: usize) -> Result<u8> {
        self.expect_kind(FieldKind::Byte)?;
        self.check_index(index)?;
        match self.source {
            Source::Encoded { data, span } => read_at::<u8>(data, span.base + index),
            Source::Pending(Value::Bytes(bytes)) => Ok(bytes[index]),
            Source::Pending(other) => Err(self.pending_mismatch(other)),
        }
    }

    pub fn get_str(&self, index: usize) -> Result<&'a str> {
        self.expect_kind(FieldKind::String)?;
        self.check_index(index)?;
        match self.source {
            Source::Encoded { data, span } => {
                let target = follow_uoffset(data, reversed_pos(span, index, SIZE_UOFFSET))?;
                string_at(data, target)
            }
            Source::Pending(Value::Array(ArrayValue::String(values))) => Ok(values[index].as_str()),
            Source::Pending(other) => Err(self.pending_mismatch(other)),
        }
    }

    /// Nested record at `index`: borrowed when pending, bound to the parent's
    /// bytes when encoded.
    pub fn record_at(&self, index: usize) -> Result<Cow<'a, Record>> {
        self.expect_kind(FieldKind::Record)?;
        self.check_index(index)?;
        match self.source {
            Source::Encoded { data, span } => {
                let Some(schema) = self.field.nested_schema() else {
                    bail!("record array '{}' has no nested schema", self.field.name());
                };
                Ok(Cow::Owned(Record::bound_at(
                    schema,
                    data.clone(),
                    reversed_pos(span, index, SIZE_UOFFSET),
                    self.scratch.cloned(),
                )))
            }
            Source::Pending(Value::Array(ArrayValue::Record(records))) => {
                Ok(Cow::Borrowed(&records[index]))
            }
            Source::Pending(other) => Err(self.pending_mismatch(other)),
        }
    }

    /// Element `index` as an untyped value.
    pub fn element_at(&self, index: usize) -> Result<Value> {
        match self.field.kind() {
            FieldKind::Int32 => self.get_int32(index).map(Value::Int32),
            FieldKind::Int64 => self.get_int64(index).map(Value::Int64),
            FieldKind::Float32 => self.get_float32(index).map(Value::Float32),
            FieldKind::Float64 => self.get_float64(index).map(Value::Float64),
            FieldKind::Bool => self.get_bool(index).map(Value::Bool),
            FieldKind::Byte => self.get_byte(index).map(Value::Byte),
            FieldKind::String => self.get_str(index).map(|s| Value::String(s.to_string())),
            FieldKind::Record => self
                .record_at(index)
                .map(|record| Value::Record(Box::new(record.into_owned()))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Value>> + 'a {
        let view = *self;
        (0..view.len()).map(move |index| view.element_at(index))
    }

    /// Materializes the whole array: `Value::Bytes` for blobs, `Value::Array`
    /// otherwise.
    pub fn to_value(&self) -> Result<Value> {
        let (data, span) = match self.source {
            Source::Pending(value) => return Ok(value.clone()),
            Source::Encoded { data, span } => (data, span),
        };

        let len = span.len;
        let array = match self.field.kind() {
            FieldKind::Byte => return Ok(Value::Bytes(slice_at(data, span.base, len)?.to_vec())),
            FieldKind::Int32 => {
                ArrayValue::Int32((0..len).map(|i| self.get_int32(i)).collect::<Result<_>>()?)
            }
            FieldKind::Int64 => {
                ArrayValue::Int64((0..len).map(|i| self.get_int64(i)).collect::<Result<_>>()?)
            }
            FieldKind::Float32 => ArrayValue::Float32(
                (0..len)
                    .map(|i| self.get_float32(i))
                    .collect::<Result<_>>()?,
            ),
            FieldKind::Float64 => ArrayValue::Float64(
                (0..len)
                    .map(|i| self.get_float64(i))
                    .collect::<Result<_>>()?,
            ),
            FieldKind::Bool => {
                ArrayValue::Bool((0..len).map(|i| self.get_bool(i)).collect::<Result<_>>()?)
            }
            FieldKind::String => ArrayValue::String(
                (0..len)
                    .map(|i| self.get_str(i).map(str::to_string))
                    .collect::<Result<_>>()?,
            ),
            FieldKind::Record => ArrayValue::Record(
                (0..len)
                    .map(|i| self.record_at(i).map(Cow::into_owned))
                    .collect::<Result<_>>()?,
            ),
        };
        Ok(Value::Array(array))
    }
}
