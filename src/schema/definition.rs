//! # Declarative Schema Definitions
//!
//! Builds a [`Schema`] from an ordered mapping of field name to type
//! declaration, written in JSON syntax:
//!
//! ```text
//! {
//!     "name": "string",
//!     "price": "float32",
//!     "tags": "[]string",
//!     "seller": { "id": "int64", "rating": "float64" },
//!     "lines": [ { "sku": "string", "quantity": "int32" } ]
//! }
//! ```
//!
//! | Declaration | Field |
//! |-------------|-------|
//! | `"int32"` (any tag) | scalar of that kind |
//! | `"[]int32"` / `["int32"]` | array of that kind |
//! | `{ ... }` | nested record |
//! | `[ { ... } ]` | array of nested records |
//!
//! Mapping order is slot order. Nested schemas are built before the field
//! that refers to them, so a definition can only describe a tree.

use std::sync::Arc;

use eyre::{bail, eyre, Result, WrapErr};

use crate::parsing::json::{parse_json, write_json_string, JsonValue};
use crate::schema::{Schema, SchemaError};
use crate::types::FieldKind;

const REPEATED_PREFIX: &str = "[]";

impl Schema {
    /// Parses a declarative definition into a shared schema.
    pub fn from_definition(text: &str) -> Result<Arc<Schema>> {
        let parsed = parse_json(text).wrap_err("failed to parse schema definition")?;
        let trailing = text[parsed.consumed..].trim();
        if !trailing.is_empty() {
            bail!(
                "unexpected trailing input after schema definition at position {}",
                parsed.consumed
            );
        }

        match parsed.value {
            JsonValue::Object(entries) => build_schema(&entries),
            other => bail!(
                "schema definition must be a mapping, got {}",
                other.type_name()
            ),
        }
    }

    /// Renders this schema back into definition syntax.
    pub fn to_definition(&self) -> String {
        let mut out = String::new();
        write_definition(self, &mut out);
        out
    }
}

fn build_schema(entries: &[(String, JsonValue)]) -> Result<Arc<Schema>> {
    let mut schema = Schema::new();

    for (name, decl) in entries {
        match decl {
            JsonValue::String(tag) => {
                let (body, is_array) = match tag.strip_prefix(REPEATED_PREFIX) {
                    Some(rest) => (rest, true),
                    None => (tag.as_str(), false),
                };
                let kind = resolve_tag(name, body)?;
                schema.add_field(name.clone(), kind, None, is_array)?;
            }
            JsonValue::Object(inner) => {
                let nested = build_schema(inner)
                    .wrap_err_with(|| format!("in nested field '{}'", name))?;
                schema.add_nested(name.clone(), nested)?;
            }
            JsonValue::Array(items) => match items.as_slice() {
                [JsonValue::Object(inner)] => {
                    let nested = build_schema(inner)
                        .wrap_err_with(|| format!("in nested array field '{}'", name))?;
                    schema.add_nested_array(name.clone(), nested)?;
                }
                [JsonValue::String(tag)] => {
                    let kind = resolve_tag(name, tag)?;
                    schema.add_array(name.clone(), kind)?;
                }
                _ => bail!(SchemaError::UnknownType {
                    name: name.clone(),
                    tag: format!("array declaration with {} entries", items.len()),
                }),
            },
            other => bail!(SchemaError::UnknownType {
                name: name.clone(),
                tag: other.type_name().to_string(),
            }),
        }
    }

    Ok(schema.into_shared())
}

fn resolve_tag(name: &str, tag: &str) -> Result<FieldKind> {
    FieldKind::from_tag(tag.trim()).ok_or_else(|| {
        eyre!(SchemaError::UnknownType {
            name: name.to_string(),
            tag: tag.to_string(),
        })
    })
}

fn write_definition(schema: &Schema, out: &mut String) {
    out.push('{');
    for (i, field) in schema.fields().iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_json_string(field.name(), out);
        out.push(':');
        match field.nested_schema() {
            Some(nested) if field.is_array() => {
                out.push('[');
                write_definition(nested, out);
                out.push(']');
            }
            Some(nested) => write_definition(nested, out),
            None => write_json_string(&field.type_name(), out),
        }
    }
    out.push('}');
}
