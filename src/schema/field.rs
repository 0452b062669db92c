//! # Field Definitions
//!
//! A `Field` is one entry of a schema: name, wire slot, element kind, and for
//! nested kinds the shared schema of the child record. `is_out_of_line`
//! tells the encoder which fields need a payload built before their table.

use std::sync::Arc;

use crate::schema::Schema;
use crate::types::FieldKind;

/// One declared field. `index` is the wire slot number and never changes once
/// data has been written with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) index: usize,
    pub(crate) kind: FieldKind,
    pub(crate) nested: Option<Arc<Schema>>,
    pub(crate) is_array: bool,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn nested_schema(&self) -> Option<&Arc<Schema>> {
        self.nested.as_ref()
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// A repeated `byte` field, stored as one length-prefixed blob.
    pub fn is_blob(&self) -> bool {
        self.is_array && self.kind == FieldKind::Byte
    }

    /// Whether the field's payload lives outside the table and is referenced
    /// through an offset slot.
    pub fn is_out_of_line(&self) -> bool {
        self.is_array || self.kind.is_variable()
    }

    /// Declared type in definition syntax: `int32`, `[]string`, `record`, ...
    pub fn type_name(&self) -> String {
        if self.is_array {
            format!("[]{}", self.kind.tag())
        } else {
            self.kind.tag().to_string()
        }
    }
}
