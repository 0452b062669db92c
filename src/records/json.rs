//! # JSON Projection
//!
//! Renders a record as a JSON object and applies a JSON object onto a record.
//! Both directions go through the public get/set surface, so nothing here
//! knows about the binary layout.
//!
//! ## Rendering Rules
//!
//! | Field | JSON |
//! |-------|------|
//! | `Unset` | key omitted |
//! | `ExplicitNull` | `null` |
//! | `[]byte` | array of numbers |
//! | NaN / infinite float | `null` |
//! | nested record | object, same rules recursively |
//!
//! Keys appear in schema order. Applying a document sets each key in document
//! order; an unknown key is a `FieldAccessError::UnknownField`, and a number
//! outside the declared integer range is an error rather than a truncation.
//! A document is applied whole or not at all: every key is converted before
//! the first one is assigned.

use std::fmt::Write as _;

use eyre::{bail, eyre, Result, WrapErr};

use crate::parsing::json::{parse_json, write_json_float, write_json_string, JsonValue};
use crate::records::{FieldAccessError, Record};
use crate::schema::Field;
use crate::types::{ArrayValue, FieldKind, FieldState, Value};

impl Record {
    /// Renders the effective values as a JSON object.
    pub fn to_json(&self) -> Result<String> {
        let mut out = String::new();
        write_record(self, &mut out)?;
        Ok(out)
    }

    /// Sets every key of the JSON object `text` on this record.
    pub fn apply_json(&mut self, text: &str) -> Result<()> {
        let parsed = parse_json(text).wrap_err("failed to parse record JSON")?;
        let trailing = text[parsed.consumed..].trim();
        if !trailing.is_empty() {
            bail!(
                "unexpected trailing input after JSON object at position {}",
                parsed.consumed
            );
        }

        match parsed.value {
            JsonValue::Object(entries) => apply_object(self, entries),
            other => bail!("record JSON must be an object, got {}", other.type_name()),
        }
    }
}

fn write_record(record: &Record, out: &mut String) -> Result<()> {
    out.push('{');
    let mut first = true;
    for field in record.schema().fields() {
        let (value, state) = record.get(field.name())?;
        if state == FieldState::Unset {
            continue;
        }
        if !first {
            out.push(',');
        }
        first = false;
        write_json_string(field.name(), out);
        out.push(':');
        write_value(&value, out)?;
    }
    out.push('}');
    Ok(())
}

fn write_f32(value: f32, out: &mut String) {
    if value.is_finite() {
        let _ = write!(out, "{}", value);
    } else {
        out.push_str("null");
    }
}

fn write_list<T>(
    items: &[T],
    out: &mut String,
    mut each: impl FnMut(&T, &mut String) -> Result<()>,
) -> Result<()> {
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        each(item, out)?;
    }
    out.push(']');
    Ok(())
}

fn write_value(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Int32(v) => {
            let _ = write!(out, "{}", v);
        }
        Value::Int64(v) => {
            let _ = write!(out, "{}", v);
        }
        Value::Byte(v) => {
            let _ = write!(out, "{}", v);
        }
        Value::Float32(v) => write_f32(*v, out),
        Value::Float64(v) => write_json_float(*v, out),
        Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        Value::String(s) => write_json_string(s, out),
        Value::Bytes(bytes) => write_list(bytes, out, |b, out| {
            let _ = write!(out, "{}", b);
            Ok(())
        })?,
        Value::Record(child) => write_record(child, out)?,
        Value::Array(array) => match array {
            ArrayValue::Int32(v) => write_list(v, out, |x, out| {
                let _ = write!(out, "{}", x);
                Ok(())
            })?,
            ArrayValue::Int64(v) => write_list(v, out, |x, out| {
                let _ = write!(out, "{}", x);
                Ok(())
            })?,
            ArrayValue::Float32(v) => write_list(v, out, |x, out| {
                write_f32(*x, out);
                Ok(())
            })?,
            ArrayValue::Float64(v) => write_list(v, out, |x, out| {
                write_json_float(*x, out);
                Ok(())
            })?,
            ArrayValue::Bool(v) => write_list(v, out, |x, out| {
                out.push_str(if *x { "true" } else { "false" });
                Ok(())
            })?,
            ArrayValue::String(v) => write_list(v, out, |x, out| {
                write_json_string(x, out);
                Ok(())
            })?,
            ArrayValue::Record(v) => write_list(v, out, write_record)?,
        },
    }
    Ok(())
}

/// Converts every entry before assigning any, so a rejected document leaves
/// `record` untouched.
fn apply_object(record: &mut Record, entries: Vec<(String, JsonValue)>) -> Result<()> {
    let mut converted = Vec::with_capacity(entries.len());
    for (key, json) in entries {
        let Some(field) = record.schema().field(&key) else {
            bail!(FieldAccessError::UnknownField { field: key });
        };
        let value = match json {
            JsonValue::Null => Value::Null,
            json => convert(record, field, json)?,
        };
        converted.push((key, value));
    }

    for (key, value) in converted {
        record.set(&key, value)?;
    }
    Ok(())
}

fn json_mismatch(field: &Field, json: &JsonValue) -> eyre::Report {
    eyre!(FieldAccessError::TypeMismatch {
        field: field.name().to_string(),
        expected: field.type_name(),
        found: json.type_name().to_string(),
    })
}

fn out_of_range(field: &Field, n: i64) -> eyre::Report {
    eyre!(
        "value {} out of range for {} field '{}'",
        n,
        field.kind(),
        field.name()
    )
}

fn nested_from_json(record: &Record, field: &Field, json: JsonValue) -> Result<Record> {
    match json {
        JsonValue::Object(entries) => {
            let mut child = record.new_nested(field.name())?;
            apply_object(&mut child, entries)
                .wrap_err_with(|| format!("in nested field '{}'", field.name()))?;
            Ok(child)
        }
        other => Err(json_mismatch(field, &other)),
    }
}

fn convert(record: &Record, field: &Field, json: JsonValue) -> Result<Value> {
    if !field.is_array() {
        return match field.kind() {
            FieldKind::Record => nested_from_json(record, field, json).map(Value::from),
            _ => scalar(field, &json),
        };
    }

    let JsonValue::Array(items) = json else {
        return Err(json_mismatch(field, &json));
    };

    let value = match field.kind() {
        FieldKind::Byte => Value::Bytes(
            items
                .iter()
                .map(|item| match scalar(field, item)? {
                    Value::Byte(b) => Ok(b),
                    _ => Err(json_mismatch(field, item)),
                })
                .collect::<Result<_>>()?,
        ),
        FieldKind::Record => Value::from(
            items
                .into_iter()
                .map(|item| nested_from_json(record, field, item))
                .collect::<Result<Vec<_>>>()?,
        ),
        _ => {
            let elements = items
                .iter()
                .map(|item| scalar(field, item))
                .collect::<Result<Vec<_>>>()?;
            Value::Array(collect_array(field, elements)?)
        }
    };
    Ok(value)
}

fn collect_array(field: &Field, elements: Vec<Value>) -> Result<ArrayValue> {
    macro_rules! gather {
        ($variant:ident) => {
            ArrayValue::$variant(
                elements
                    .into_iter()
                    .map(|v| match v {
                        Value::$variant(x) => Ok(x),
                        other => bail!(
                            "element {} does not match {} field '{}'",
                            other.type_name(),
                            field.type_name(),
                            field.name()
                        ),
                    })
                    .collect::<Result<_>>()?,
            )
        };
    }

    Ok(match field.kind() {
        FieldKind::Int32 => gather!(Int32),
        FieldKind::Int64 => gather!(Int64),
        FieldKind::Float32 => gather!(Float32),
        FieldKind::Float64 => gather!(Float64),
        FieldKind::Bool => gather!(Bool),
        FieldKind::String => gather!(String),
        FieldKind::Byte | FieldKind::Record => {
            bail!("field '{}' is not a scalar array", field.name())
        }
    })
}

/// One JSON scalar converted to the field's element kind.
fn scalar(field: &Field, json: &JsonValue) -> Result<Value> {
    let value = match (field.kind(), json) {
        (FieldKind::Int32, JsonValue::Int(n)) => {
            Value::Int32(i32::try_from(*n).map_err(|_| out_of_range(field, *n))?)
        }
        (FieldKind::Int64, JsonValue::Int(n)) => Value::Int64(*n),
        (FieldKind::Byte, JsonValue::Int(n)) => {
            Value::Byte(u8::try_from(*n).map_err(|_| out_of_range(field, *n))?)
        }
        (FieldKind::Float32, JsonValue::Int(n)) => Value::Float32(*n as f32),
        (FieldKind::Float32, JsonValue::Float(f)) => Value::Float32(*f as f32),
        (FieldKind::Float64, JsonValue::Int(n)) => Value::Float64(*n as f64),
        (FieldKind::Float64, JsonValue::Float(f)) => Value::Float64(*f),
        (FieldKind::Bool, JsonValue::Bool(b)) => Value::Bool(*b),
        (FieldKind::String, JsonValue::String(s)) => Value::String(s.clone()),
        _ => return Err(json_mismatch(field, json)),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use std::sync::Arc;

    fn order_schema() -> Arc<Schema> {
        Schema::from_definition(
            r#"{
                "id": "int64",
                "customer": "string",
                "paid": "bool",
                "total": "float64",
                "note": "string",
                "tags": "[]string",
                "blob": "[]byte",
                "address": { "city": "string", "zip": "int32" },
                "lines": [ { "sku": "string", "qty": "int32" } ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn renders_in_schema_order_and_skips_unset() {
        let schema = order_schema();
        let mut record = Record::new(schema);
        record.set("customer", "ana").unwrap();
        record.set("id", 9i64).unwrap();
        record.set_null("note").unwrap();
        record.set("blob", vec![1u8, 255]).unwrap();

        assert_eq!(
            record.to_json().unwrap(),
            r#"{"id":9,"customer":"ana","note":null,"blob":[1,255]}"#
        );
    }

    #[test]
    fn non_finite_floats_render_as_null() {
        let mut record = Record::new(order_schema());
        record.set("total", f64::INFINITY).unwrap();
        assert_eq!(record.to_json().unwrap(), r#"{"total":null}"#);
    }

    #[test]
    fn applied_document_matches_rendered_document() {
        let text = r#"{"id":1,"customer":"bo","paid":true,"total":12.5,"tags":["a","b"],"blob":[0,7],"address":{"city":"Oslo","zip":150},"lines":[{"sku":"x","qty":2},{"sku":"y","qty":3}]}"#;
        let mut record = Record::new(order_schema());
        record.apply_json(text).unwrap();
        assert_eq!(record.to_json().unwrap(), text);

        let decoded = Record::from_bytes(Arc::clone(record.schema()), record.to_bytes().unwrap());
        assert_eq!(decoded.to_json().unwrap(), text);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut record = Record::new(order_schema());
        let err = record.apply_json(r#"{"nope": 1}"#).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FieldAccessError>(),
            Some(&FieldAccessError::UnknownField {
                field: "nope".into()
            })
        );
    }

    #[test]
    fn wrong_json_type_is_a_type_mismatch() {
        let mut record = Record::new(order_schema());
        let err = record.apply_json(r#"{"paid": "yes"}"#).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FieldAccessError>(),
            Some(FieldAccessError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn out_of_range_integer_is_rejected() {
        let schema = Schema::from_definition(r#"{"small": "int32", "b": "byte"}"#).unwrap();
        let mut record = Record::new(schema);
        assert!(record.apply_json(r#"{"small": 4294967296}"#).is_err());
        assert!(record.apply_json(r#"{"b": 256}"#).is_err());
        record.apply_json(r#"{"small": -5, "b": 255}"#).unwrap();
        assert_eq!(record.get_int32("small").unwrap(), Some(-5));
        assert_eq!(record.get_byte("b").unwrap(), Some(255));
    }

    #[test]
    fn rejected_document_leaves_record_unchanged() {
        let mut record = Record::new(order_schema());
        record.set("customer", "ana").unwrap();

        let err = record
            .apply_json(r#"{"id": 5, "customer": "bo", "paid": "yes"}"#)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FieldAccessError>(),
            Some(FieldAccessError::TypeMismatch { .. })
        ));
        assert_eq!(record.state("id").unwrap(), FieldState::Unset);
        assert_eq!(record.get_str("customer").unwrap(), Some("ana"));

        assert!(record.apply_json(r#"{"id": 5, "nope": 1}"#).is_err());
        assert_eq!(record.state("id").unwrap(), FieldState::Unset);
    }

    #[test]
    fn deeply_nested_document_is_an_error() {
        let mut record = Record::new(order_schema());
        let depth = 200_000;
        let text = format!(r#"{{"tags":{}{}}}"#, "[".repeat(depth), "]".repeat(depth));
        assert!(record.apply_json(&text).is_err());
        assert!(!record.has_pending());
    }

    #[test]
    fn null_in_document_marks_explicit_null() {
        let mut record = Record::new(order_schema());
        record.apply_json(r#"{"customer": null}"#).unwrap();
        assert_eq!(
            record.state("customer").unwrap(),
            FieldState::ExplicitNull
        );
    }
}
