//! # Record Engine
//!
//! This module provides `Record`, a logical instance of a schema made of an
//! optional bound view over encoded bytes plus a pending overlay of assigned
//! values.
//!
//! ## Effective Value Resolution
//!
//! ```text
//! get(field):
//!   pending overlay holds Null        -> (Null,  ExplicitNull)
//!   pending overlay holds a value     -> (value, HasValue)
//!   bound and slot present            -> (decoded value, HasValue)
//!   otherwise                         -> (Null,  Unset)
//! ```
//!
//! An unknown field name reads as `Unset`; that is what lets a reader built
//! on one schema version look at data written by another. Writing an unknown
//! field is an error.
//!
//! ## Laziness
//!
//! Binding bytes costs nothing: `from_bytes` stores the buffer handle and the
//! position of the root reference. Each read opens the table and decodes only
//! the slot it needs, so corruption is reported by the read that hits it.
//!
//! ## Nested Records
//!
//! A bound nested record is itself a `Record` bound to the parent's buffer at
//! the position of the reference slot. `Bytes` makes that a reference-count
//! bump rather than a copy.

use std::borrow::Cow;
use std::sync::Arc;

use bytes::Bytes;
use eyre::{bail, eyre, Result};

use crate::config::SIZE_UOFFSET;
use crate::encoding::table::{bytes_at, string_at, vector_at};
use crate::encoding::{Scalar, TableView};
use crate::memory::ScratchPools;
use crate::records::{encode, ArrayView, FieldAccessError};
use crate::schema::{Field, Schema};
use crate::types::{ArrayValue, FieldKind, FieldState, Value};

/// Per-slot overlay entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum Pending {
    #[default]
    Untouched,
    Null,
    Value(Value),
}

#[derive(Debug, Clone)]
pub(crate) struct BoundView {
    pub(crate) data: Bytes,
    pub(crate) ref_pos: usize,
}

pub struct Record {
    pub(crate) schema: Arc<Schema>,
    pub(crate) bound: Option<BoundView>,
    pub(crate) pending: Vec<Pending>,
    pub(crate) scratch: Option<ScratchPools>,
    pub(crate) lease: Option<u64>,
    /// Overwritten overlay values that still hold pool-leased records; the
    /// pool reclaims them together with this record.
    pub(crate) displaced: Vec<Value>,
}

macro_rules! scalar_getters {
    ($($method:ident => $ty:ty, $kind:ident;)*) => {
        $(
            pub fn $method(&self, name: &str) -> Result<Option<$ty>> {
                self.typed_scalar(name, FieldKind::$kind, |value| match value {
                    Value::$kind(v) => Some(*v),
                    _ => None,
                })
            }
        )*
    };
}

impl Record {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            bound: None,
            pending: Vec::new(),
            scratch: None,
            lease: None,
            displaced: Vec::new(),
        }
    }

    /// Binds encoded bytes without validating them.
    pub fn from_bytes(schema: Arc<Schema>, data: impl Into<Bytes>) -> Self {
        let mut record = Self::new(schema);
        record.bound = Some(BoundView {
            data: data.into(),
            ref_pos: 0,
        });
        record
    }

    pub(crate) fn bound_at(
        schema: &Arc<Schema>,
        data: Bytes,
        ref_pos: usize,
        scratch: Option<ScratchPools>,
    ) -> Self {
        Self {
            schema: Arc::clone(schema),
            bound: Some(BoundView { data, ref_pos }),
            pending: Vec::new(),
            scratch,
            lease: None,
            displaced: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Whether any field has been assigned since creation or binding.
    pub fn has_pending(&self) -> bool {
        self.pending.iter().any(|p| *p != Pending::Untouched)
    }

    fn table(&self) -> Result<Option<TableView<'_>>> {
        match &self.bound {
            Some(bound) => TableView::at_ref(&bound.data, bound.ref_pos).map(Some),
            None => Ok(None),
        }
    }

    fn overlay(&self, index: usize) -> Option<&Pending> {
        match self.pending.get(index) {
            None | Some(Pending::Untouched) => None,
            entry => entry,
        }
    }

    fn put(&mut self, index: usize, entry: Pending) {
        if self.pending.len() <= index {
            self.pending.resize_with(self.schema.len(), Pending::default);
        }
        if let Pending::Value(old) = std::mem::replace(&mut self.pending[index], entry) {
            if holds_lease(&old) {
                self.displaced.push(old);
            }
        }
    }

    /// Whether this record or anything moved into it came from a pool.
    pub(crate) fn holds_lease(&self) -> bool {
        self.lease.is_some()
            || !self.displaced.is_empty()
            || self.pending.iter().any(|entry| match entry {
                Pending::Value(value) => holds_lease(value),
                _ => false,
            })
    }

    pub fn state(&self, name: &str) -> Result<FieldState> {
        match self.schema.field(name) {
            Some(field) => self.state_of(field),
            None => Ok(FieldState::Unset),
        }
    }

    fn state_of(&self, field: &Field) -> Result<FieldState> {
        match self.overlay(field.index()) {
            Some(Pending::Null) => return Ok(FieldState::ExplicitNull),
            Some(_) => return Ok(FieldState::HasValue),
            None => {}
        }
        if let Some(table) = self.table()? {
            if table.field_pos(field.index())?.is_some() {
                return Ok(FieldState::HasValue);
            }
        }
        Ok(FieldState::Unset)
    }

    /// Effective value and presence of `name`.
    pub fn get(&self, name: &str) -> Result<(Value, FieldState)> {
        let Some(field) = self.schema.field(name) else {
            return Ok((Value::Null, FieldState::Unset));
        };

        match self.overlay(field.index()) {
            Some(Pending::Null) => return Ok((Value::Null, FieldState::ExplicitNull)),
            Some(Pending::Value(value)) => return Ok((value.clone(), FieldState::HasValue)),
            _ => {}
        }

        match self.decode(field)? {
            Some(value) => Ok((value, FieldState::HasValue)),
            None => Ok((Value::Null, FieldState::Unset)),
        }
    }

    fn decode(&self, field: &Field) -> Result<Option<Value>> {
        let Some(bound) = &self.bound else {
            return Ok(None);
        };
        let table = TableView::at_ref(&bound.data, bound.ref_pos)?;
        let slot = field.index();

        if field.is_array() {
            return match self.encoded_array(field, bound, &table)? {
                Some(view) => view.to_value().map(Some),
                None => Ok(None),
            };
        }

        let value = match field.kind() {
            FieldKind::Int32 => table.read_scalar::<i32>(slot)?.map(Value::Int32),
            FieldKind::Int64 => table.read_scalar::<i64>(slot)?.map(Value::Int64),
            FieldKind::Float32 => table.read_scalar::<f32>(slot)?.map(Value::Float32),
            FieldKind::Float64 => table.read_scalar::<f64>(slot)?.map(Value::Float64),
            FieldKind::Bool => table.read_scalar::<bool>(slot)?.map(Value::Bool),
            FieldKind::Byte => table.read_scalar::<u8>(slot)?.map(Value::Byte),
            FieldKind::String => match table.indirect(slot)? {
                Some(pos) => Some(Value::String(string_at(&bound.data, pos)?.to_string())),
                None => None,
            },
            FieldKind::Record => match (table.field_pos(slot)?, field.nested_schema()) {
                (Some(ref_pos), Some(schema)) => Some(Value::Record(Box::new(Record::bound_at(
                    schema,
                    bound.data.clone(),
                    ref_pos,
                    self.scratch.clone(),
                )))),
                _ => None,
            },
        };
        Ok(value)
    }

    fn encoded_array<'a>(
        &'a self,
        field: &'a Field,
        bound: &'a BoundView,
        table: &TableView<'_>,
    ) -> Result<Option<ArrayView<'a>>> {
        let Some(pos) = table.indirect(field.index())? else {
            return Ok(None);
        };
        let width = field.kind().fixed_size().unwrap_or(SIZE_UOFFSET);
        let span = vector_at(&bound.data, pos, width)?;
        Ok(Some(ArrayView::encoded(
            field,
            &bound.data,
            span,
            self.scratch.as_ref(),
        )))
    }

    fn typed_scalar<S: Scalar>(
        &self,
        name: &str,
        kind: FieldKind,
        pick: fn(&Value) -> Option<S>,
    ) -> Result<Option<S>> {
        let Some(field) = self.schema.field(name) else {
            return Ok(None);
        };
        expect_kind(field, kind, false)?;

        match self.overlay(field.index()) {
            Some(Pending::Value(value)) => Ok(pick(value)),
            Some(_) => Ok(None),
            None => match self.table()? {
                Some(table) => table.read_scalar::<S>(field.index()),
                None => Ok(None),
            },
        }
    }

    scalar_getters! {
        get_int32 => i32, Int32;
        get_int64 => i64, Int64;
        get_float32 => f32, Float32;
        get_float64 => f64, Float64;
        get_bool => bool, Bool;
        get_byte => u8, Byte;
    }

    /// Zero-copy string read. `None` for unset, null, or unknown fields.
    pub fn get_str(&self, name: &str) -> Result<Option<&str>> {
        let Some(field) = self.schema.field(name) else {
            return Ok(None);
        };
        expect_kind(field, FieldKind::String, false)?;

        match self.overlay(field.index()) {
            Some(Pending::Value(Value::String(s))) => Ok(Some(s.as_str())),
            Some(_) => Ok(None),
            None => {
                let Some(bound) = &self.bound else {
                    return Ok(None);
                };
                let table = TableView::at_ref(&bound.data, bound.ref_pos)?;
                match table.indirect(field.index())? {
                    Some(pos) => string_at(&bound.data, pos).map(Some),
                    None => Ok(None),
                }
            }
        }
    }

    /// Zero-copy read of a `[]byte` blob.
    pub fn get_bytes(&self, name: &str) -> Result<Option<&[u8]>> {
        let Some(field) = self.schema.field(name) else {
            return Ok(None);
        };
        expect_kind(field, FieldKind::Byte, true)?;

        match self.overlay(field.index()) {
            Some(Pending::Value(Value::Bytes(b))) => Ok(Some(b.as_slice())),
            Some(_) => Ok(None),
            None => {
                let Some(bound) = &self.bound else {
                    return Ok(None);
                };
                let table = TableView::at_ref(&bound.data, bound.ref_pos)?;
                match table.indirect(field.index())? {
                    Some(pos) => bytes_at(&bound.data, pos).map(Some),
                    None => Ok(None),
                }
            }
        }
    }

    /// Read view over an array field, without materializing it.
    pub fn array(&self, name: &str) -> Result<Option<ArrayView<'_>>> {
        let Some(field) = self.schema.field(name) else {
            return Ok(None);
        };
        if !field.is_array() {
            bail!(mismatch(field, "array".to_string()));
        }

        match self.overlay(field.index()) {
            Some(Pending::Value(value)) => Ok(Some(ArrayView::pending(
                field,
                value,
                self.scratch.as_ref(),
            ))),
            Some(_) => Ok(None),
            None => {
                let Some(bound) = &self.bound else {
                    return Ok(None);
                };
                let table = TableView::at_ref(&bound.data, bound.ref_pos)?;
                self.encoded_array(field, bound, &table)
            }
        }
    }

    /// The nested record stored in `name`, borrowed from the overlay or bound
    /// to this record's bytes.
    pub fn nested(&self, name: &str) -> Result<Option<Cow<'_, Record>>> {
        let Some(field) = self.schema.field(name) else {
            return Ok(None);
        };
        expect_kind(field, FieldKind::Record, false)?;

        match self.overlay(field.index()) {
            Some(Pending::Value(Value::Record(child))) => Ok(Some(Cow::Borrowed(child.as_ref()))),
            Some(_) => Ok(None),
            None => {
                let (Some(bound), Some(schema)) = (&self.bound, field.nested_schema()) else {
                    return Ok(None);
                };
                let table = TableView::at_ref(&bound.data, bound.ref_pos)?;
                Ok(table.field_pos(field.index())?.map(|ref_pos| {
                    Cow::Owned(Record::bound_at(
                        schema,
                        bound.data.clone(),
                        ref_pos,
                        self.scratch.clone(),
                    ))
                }))
            }
        }
    }

    /// Element `index` of a nested record array.
    pub fn nested_at(&self, name: &str, index: usize) -> Result<Option<Cow<'_, Record>>> {
        match self.array(name)? {
            Some(view) => view.record_at(index).map(Some),
            None => Ok(None),
        }
    }

    /// A fresh, empty record of the nested schema declared by `name`.
    pub fn new_nested(&self, name: &str) -> Result<Record> {
        let field = field_or_unknown(&self.schema, name)?;
        let Some(schema) = field.nested_schema() else {
            bail!(mismatch(field, "record".to_string()));
        };
        Ok(Record {
            schema: Arc::clone(schema),
            bound: None,
            pending: Vec::new(),
            scratch: self.scratch.clone(),
            lease: None,
            displaced: Vec::new(),
        })
    }

    /// Assigns `value` to `name`. `Value::Null` (or `None`) marks the field
    /// explicitly null.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let field = field_or_unknown(&self.schema, name)?;
        let index = field.index();

        let entry = if value.is_null() {
            Pending::Null
        } else {
            check_assignable(field, &value)?;
            Pending::Value(value)
        };
        self.put(index, entry);
        Ok(())
    }

    pub fn set_null(&mut self, name: &str) -> Result<()> {
        let index = field_or_unknown(&self.schema, name)?.index();
        self.put(index, Pending::Null);
        Ok(())
    }

    /// Appends `elements` to an array field: reads the current array (pending
    /// or bound), concatenates, and stores the result as a normal assignment.
    pub fn append(&mut self, name: &str, elements: impl Into<Value>) -> Result<()> {
        let extra = elements.into();
        let schema = Arc::clone(&self.schema);
        let field = field_or_unknown(&schema, name)?;
        if !field.is_array() {
            bail!(mismatch(field, format!("{} elements", extra.type_name())));
        }
        if extra.is_null() {
            return Ok(());
        }
        check_assignable(field, &extra)?;

        let index = field.index();
        let existing = if matches!(self.pending.get(index), Some(Pending::Value(_))) {
            match std::mem::take(&mut self.pending[index]) {
                Pending::Value(value) => Some(value),
                _ => None,
            }
        } else if matches!(self.pending.get(index), Some(Pending::Null)) {
            None
        } else {
            self.decode(field)?
        };

        let combined = match existing {
            Some(current) => concat(current, extra)?,
            None => extra,
        };
        self.put(index, Pending::Value(combined));
        Ok(())
    }

    /// Encodes the effective values into a new buffer. Non-destructive and
    /// repeatable.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match &self.scratch {
            Some(scratch) => encode::encode(self, scratch),
            None => encode::encode(self, &ScratchPools::new()),
        }
    }
}

fn field_or_unknown<'s>(schema: &'s Schema, name: &str) -> Result<&'s Field> {
    schema.field(name).ok_or_else(|| {
        eyre!(FieldAccessError::UnknownField {
            field: name.to_string(),
        })
    })
}

fn mismatch(field: &Field, found: String) -> FieldAccessError {
    FieldAccessError::TypeMismatch {
        field: field.name().to_string(),
        expected: field.type_name(),
        found,
    }
}

fn expect_kind(field: &Field, kind: FieldKind, is_array: bool) -> Result<()> {
    if field.kind() != kind || field.is_array() != is_array {
        let requested = if is_array {
            format!("[]{}", kind)
        } else {
            kind.tag().to_string()
        };
        bail!(mismatch(field, requested));
    }
    Ok(())
}

fn check_assignable(field: &Field, value: &Value) -> Result<()> {
    let nested_ok = |child: &Record| {
        field
            .nested_schema()
            .is_some_and(|schema| Schema::is_compatible(schema, child.schema()))
    };

    let ok = match (value, field.kind(), field.is_array()) {
        (Value::Int32(_), FieldKind::Int32, false)
        | (Value::Int64(_), FieldKind::Int64, false)
        | (Value::Float32(_), FieldKind::Float32, false)
        | (Value::Float64(_), FieldKind::Float64, false)
        | (Value::Bool(_), FieldKind::Bool, false)
        | (Value::Byte(_), FieldKind::Byte, false)
        | (Value::String(_), FieldKind::String, false)
        | (Value::Bytes(_), FieldKind::Byte, true) => true,
        (Value::Record(child), FieldKind::Record, false) => {
            if !nested_ok(&**child) {
                bail!(mismatch(field, "record of another schema".to_string()));
            }
            true
        }
        (Value::Array(ArrayValue::Record(children)), FieldKind::Record, true) => {
            if !children.iter().all(nested_ok) {
                bail!(mismatch(field, "[]record of another schema".to_string()));
            }
            true
        }
        (Value::Array(array), kind, true) => array.kind() == kind,
        _ => false,
    };

    if !ok {
        bail!(mismatch(field, value.type_name().to_string()));
    }
    Ok(())
}

fn holds_lease(value: &Value) -> bool {
    match value {
        Value::Record(child) => child.holds_lease(),
        Value::Array(ArrayValue::Record(children)) => children.iter().any(Record::holds_lease),
        _ => false,
    }
}

fn concat(current: Value, extra: Value) -> Result<Value> {
    match (current, extra) {
        (Value::Array(mut array), Value::Array(more)) => {
            array.extend(more)?;
            Ok(Value::Array(array))
        }
        (Value::Bytes(mut bytes), Value::Bytes(more)) => {
            bytes.extend_from_slice(&more);
            Ok(Value::Bytes(bytes))
        }
        (current, extra) => bail!(
            "cannot append {} to {}",
            extra.type_name(),
            current.type_name()
        ),
    }
}

impl Clone for Record {
    /// Clones are never pool-owned: releasing one does not touch pool counts.
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            bound: self.bound.clone(),
            pending: self.pending.clone(),
            scratch: self.scratch.clone(),
            lease: None,
            displaced: Vec::new(),
        }
    }
}

impl PartialEq for Record {
    /// Records are equal when every field has the same effective value and
    /// state, regardless of how much of it is bound versus pending.
    fn eq(&self, other: &Self) -> bool {
        if !Schema::is_compatible(&self.schema, &other.schema) {
            return false;
        }
        self.schema
            .fields()
            .iter()
            .all(|field| match (self.get(field.name()), other.get(field.name())) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            })
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("fields", &self.schema.len())
            .field("bound", &self.bound.as_ref().map(|b| b.data.len()))
            .field("pending", &self.pending)
            .field("pooled", &self.lease.is_some())
            .finish()
    }
}
