//! # Record Encoding
//!
//! Turns a record's effective values into a finished buffer. Per table:
//!
//! ```text
//! 1. for each out-of-line field, in slot order, build its payload first
//!    (strings, blobs, arrays, nested tables; children before parents)
//! 2. start the table sized to the writer's field count
//! 3. for each field: stored reference, else pending scalar, else bound
//!    scalar copied verbatim, else leave the slot absent
//! 4. end the table
//! ```
//!
//! Payloads that are untouched on a bound record are copied from the bound
//! bytes: fixed-width arrays as one raw body copy, strings and blobs by value,
//! nested tables by recursing with a record bound at the child reference.
//! Explicit nulls and unset fields both end up as absent slots.

use eyre::{bail, Result};
use tracing::trace;

use crate::config::SIZE_UOFFSET;
use crate::encoding::table::{bytes_at, follow_uoffset, slice_at, string_at, vector_at};
use crate::encoding::{Builder, TableView};
use crate::memory::ScratchPools;
use crate::records::{Pending, Record};
use crate::schema::Field;
use crate::types::{ArrayValue, FieldKind, Value};

pub(crate) fn encode(record: &Record, scratch: &ScratchPools) -> Result<Vec<u8>> {
    let mut buffer = scratch.buffers().acquire();
    let mut encoder = Encoder {
        builder: Builder::new(&mut buffer),
        scratch,
    };

    let root = encoder.encode_record(record)?;
    encoder.builder.finish(root)?;
    let bytes = encoder.builder.finished_data().to_vec();

    trace!(
        fields = record.schema().len(),
        bytes = bytes.len(),
        "encoded record"
    );
    Ok(bytes)
}

struct Encoder<'b, 's> {
    builder: Builder<'b>,
    scratch: &'s ScratchPools,
}

impl Encoder<'_, '_> {
    fn encode_record(&mut self, record: &Record) -> Result<u32> {
        let schema = record.schema();
        let table = match &record.bound {
            Some(bound) => Some(TableView::at_ref(&bound.data, bound.ref_pos)?),
            None => None,
        };

        let scratch = self.scratch;
        let mut refs = scratch.field_refs().acquire();
        refs.resize(schema.len(), None);

        for field in schema.fields() {
            if !field.is_out_of_line() {
                continue;
            }
            refs[field.index()] = match record.pending.get(field.index()) {
                Some(Pending::Null) => None,
                Some(Pending::Value(value)) => Some(self.write_payload(value)?),
                _ => match &table {
                    Some(table) => self.copy_payload(record, table, field)?,
                    None => None,
                },
            };
        }

        self.builder.start_table(schema.len())?;
        for field in schema.fields() {
            let slot = field.index();
            if let Some(target) = refs[slot] {
                self.builder.add_offset(slot, target)?;
                continue;
            }
            if field.is_out_of_line() {
                continue;
            }
            match record.pending.get(slot) {
                Some(Pending::Null) => {}
                Some(Pending::Value(value)) => self.write_scalar(slot, value)?,
                _ => {
                    let (Some(table), Some(width)) = (&table, field.kind().fixed_size()) else {
                        continue;
                    };
                    if let Some(raw) = table.read_raw(slot, width)? {
                        self.builder.add_raw(slot, raw)?;
                    }
                }
            }
        }
        self.builder.end_table()
    }

    fn write_scalar(&mut self, slot: usize, value: &Value) -> Result<()> {
        match value {
            Value::Int32(v) => self.builder.add_scalar(slot, *v),
            Value::Int64(v) => self.builder.add_scalar(slot, *v),
            Value::Float32(v) => self.builder.add_scalar(slot, *v),
            Value::Float64(v) => self.builder.add_scalar(slot, *v),
            Value::Bool(v) => self.builder.add_scalar(slot, *v),
            Value::Byte(v) => self.builder.add_scalar(slot, *v),
            other => bail!("{} cannot be stored inline", other.type_name()),
        }
    }

    fn write_payload(&mut self, value: &Value) -> Result<u32> {
        match value {
            Value::String(s) => self.builder.create_string(s),
            Value::Bytes(b) => self.builder.create_bytes(b),
            Value::Record(child) => self.encode_record(child),
            Value::Array(array) => self.write_array(array),
            other => bail!("{} is not an out-of-line value", other.type_name()),
        }
    }

    fn write_array(&mut self, array: &ArrayValue) -> Result<u32> {
        match array {
            ArrayValue::Int32(v) => self.builder.create_scalar_vector(v),
            ArrayValue::Int64(v) => self.builder.create_scalar_vector(v),
            ArrayValue::Float32(v) => self.builder.create_scalar_vector(v),
            ArrayValue::Float64(v) => self.builder.create_scalar_vector(v),
            ArrayValue::Bool(v) => self.builder.create_scalar_vector(v),
            ArrayValue::String(values) => {
                let scratch = self.scratch;
                let mut elements = scratch.element_refs().acquire();
                for s in values {
                    elements.push(self.builder.create_string(s)?);
                }
                self.builder.create_offset_vector(&elements)
            }
            ArrayValue::Record(records) => {
                let scratch = self.scratch;
                let mut elements = scratch.element_refs().acquire();
                for child in records {
                    elements.push(self.encode_record(child)?);
                }
                self.builder.create_offset_vector(&elements)
            }
        }
    }

    /// Re-emits an untouched out-of-line field from the bound bytes.
    fn copy_payload(
        &mut self,
        record: &Record,
        table: &TableView<'_>,
        field: &Field,
    ) -> Result<Option<u32>> {
        let Some(ref_pos) = table.field_pos(field.index())? else {
            return Ok(None);
        };
        let data = table.data();

        if !field.is_array() {
            return match (field.kind(), field.nested_schema(), &record.bound) {
                (FieldKind::Record, Some(schema), Some(bound)) => {
                    let child = Record::bound_at(schema, bound.data.clone(), ref_pos, None);
                    self.encode_record(&child).map(Some)
                }
                (FieldKind::String, _, _) => {
                    let pos = follow_uoffset(data, ref_pos)?;
                    self.builder.create_string(string_at(data, pos)?).map(Some)
                }
                _ => bail!(
                    "field '{}' of kind {} has no out-of-line payload",
                    field.name(),
                    field.kind()
                ),
            };
        }

        let pos = follow_uoffset(data, ref_pos)?;
        if field.is_blob() {
            return self.builder.create_bytes(bytes_at(data, pos)?).map(Some);
        }

        if let Some(width) = field.kind().fixed_size() {
            let span = vector_at(data, pos, width)?;
            let body = slice_at(data, span.base, span.len * width)?;
            return self
                .builder
                .create_raw_vector(width, span.len, body)
                .map(Some);
        }

        let span = vector_at(data, pos, SIZE_UOFFSET)?;
        let scratch = self.scratch;
        let mut elements = scratch.element_refs().acquire();
        for index in 0..span.len {
            let element_ref = span.base + (span.len - index - 1) * SIZE_UOFFSET;
            let target = match (field.kind(), field.nested_schema(), &record.bound) {
                (FieldKind::String, _, _) => {
                    let payload = follow_uoffset(data, element_ref)?;
                    self.builder.create_string(string_at(data, payload)?)?
                }
                (FieldKind::Record, Some(schema), Some(bound)) => {
                    let child = Record::bound_at(schema, bound.data.clone(), element_ref, None);
                    self.encode_record(&child)?
                }
                _ => bail!(
                    "array field '{}' of kind {} cannot be copied",
                    field.name(),
                    field.kind()
                ),
            };
            elements.push(target);
        }
        self.builder.create_offset_vector(&elements).map(Some)
    }
}
