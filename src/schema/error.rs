//! # Schema Errors
//!
//! `SchemaError` is raised through `bail!` when a schema is built, either
//! field by field or from a definition, so callers can `downcast_ref` it.

use crate::types::FieldKind;

/// Failure while building a schema, programmatically or from a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    DuplicateField {
        name: String,
    },
    UnknownType {
        name: String,
        tag: String,
    },
    /// A `Record` field without a nested schema, or a nested schema attached
    /// to a scalar kind.
    InvalidNesting {
        name: String,
        kind: FieldKind,
    },
    TooManyFields {
        limit: usize,
    },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::DuplicateField { name } => {
                write!(f, "duplicate field '{}' in schema", name)
            }
            SchemaError::UnknownType { name, tag } => {
                write!(f, "unknown type '{}' for field '{}'", tag, name)
            }
            SchemaError::InvalidNesting { name, kind } => {
                if *kind == FieldKind::Record {
                    write!(f, "record field '{}' has no nested schema", name)
                } else {
                    write!(
                        f,
                        "{} field '{}' cannot carry a nested schema",
                        kind, name
                    )
                }
            }
            SchemaError::TooManyFields { limit } => {
                write!(f, "schema exceeds the limit of {} fields per table", limit)
            }
        }
    }
}

impl std::error::Error for SchemaError {}
