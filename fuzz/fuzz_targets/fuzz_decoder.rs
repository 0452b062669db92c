//! Fuzz testing for lazy record decoding.
//!
//! Binds arbitrary bytes under a schema assembled from the input and reads
//! every field, array element and nested record. Corrupt input must surface
//! as errors, never as panics or out-of-bounds reads.

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use flexrec::{FieldKind, Record, Schema};

#[derive(Debug, Arbitrary)]
struct DecoderInput {
    fields: Vec<FuzzField>,
    data: Vec<u8>,
}

#[derive(Debug, Arbitrary, Clone, Copy)]
struct FuzzField {
    kind: FuzzKind,
    repeated: bool,
}

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzKind {
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    Byte,
    String,
    Nested,
}

fn leaf_schema() -> Arc<Schema> {
    let mut schema = Schema::new();
    let _ = schema.add_scalar("id", FieldKind::Int64);
    let _ = schema.add_scalar("label", FieldKind::String);
    let _ = schema.add_array("values", FieldKind::Int32);
    schema.into_shared()
}

fn build_schema(fields: &[FuzzField]) -> Option<Arc<Schema>> {
    let leaf = leaf_schema();
    let mut schema = Schema::new();
    for (i, field) in fields.iter().enumerate() {
        let name = format!("f{}", i);
        let kind = match field.kind {
            FuzzKind::Int32 => FieldKind::Int32,
            FuzzKind::Int64 => FieldKind::Int64,
            FuzzKind::Float32 => FieldKind::Float32,
            FuzzKind::Float64 => FieldKind::Float64,
            FuzzKind::Bool => FieldKind::Bool,
            FuzzKind::Byte => FieldKind::Byte,
            FuzzKind::String => FieldKind::String,
            FuzzKind::Nested => {
                let added = if field.repeated {
                    schema.add_nested_array(name, Arc::clone(&leaf))
                } else {
                    schema.add_nested(name, Arc::clone(&leaf))
                };
                added.ok()?;
                continue;
            }
        };
        let added = if field.repeated {
            schema.add_array(name, kind)
        } else {
            schema.add_scalar(name, kind)
        };
        added.ok()?;
    }
    Some(schema.into_shared())
}

fn walk(record: &Record) {
    for field in record.schema().fields() {
        let _ = record.get(field.name());
        let _ = record.state(field.name());
        if let Ok(Some(view)) = record.array(field.name()) {
            for i in 0..view.len().min(64) {
                let _ = view.element_at(i);
                if let Ok(child) = view.record_at(i) {
                    let _ = child.to_json();
                }
            }
            let _ = view.element_at(view.len());
        }
        if let Ok(Some(child)) = record.nested(field.name()) {
            let _ = child.get("label");
        }
    }
}

fuzz_target!(|input: DecoderInput| {
    if input.fields.is_empty() || input.fields.len() > 32 {
        return;
    }
    let Some(schema) = build_schema(&input.fields) else {
        return;
    };

    let record = Record::from_bytes(schema, input.data);
    walk(&record);
    let _ = record.to_bytes();
    let _ = record.to_json();
});
