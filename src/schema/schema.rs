//! # Schema Definition
//!
//! This module provides the `Schema` struct that declares the ordered field
//! list of one record type. A field's position in the list is its wire slot.
//!
//! ## Schema Internals
//!
//! - `fields`: Field definitions in declaration (slot) order
//! - `by_name`: Name to slot index, for O(1) name resolution on every get/set
//!
//! Schemas are append-only. There is no removal or reordering because either
//! would renumber the slots of data already written.

use std::sync::Arc;

use eyre::{bail, Result};
use hashbrown::HashMap;

use crate::config::MAX_FIELDS_PER_TABLE;
use crate::schema::{Field, SchemaError};
use crate::types::FieldKind;

#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
    by_name: HashMap<String, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field at the next slot index.
    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        kind: FieldKind,
        nested: Option<Arc<Schema>>,
        is_array: bool,
    ) -> Result<&Field> {
        let name = name.into();

        if self.by_name.contains_key(&name) {
            bail!(SchemaError::DuplicateField { name });
        }
        if (kind == FieldKind::Record) != nested.is_some() {
            bail!(SchemaError::InvalidNesting { name, kind });
        }
        if self.fields.len() >= MAX_FIELDS_PER_TABLE {
            bail!(SchemaError::TooManyFields {
                limit: MAX_FIELDS_PER_TABLE
            });
        }

        let index = self.fields.len();
        self.by_name.insert(name.clone(), index);
        self.fields.push(Field {
            name,
            index,
            kind,
            nested,
            is_array,
        });
        Ok(&self.fields[index])
    }

    pub fn add_scalar(&mut self, name: impl Into<String>, kind: FieldKind) -> Result<&Field> {
        self.add_field(name, kind, None, false)
    }

    pub fn add_array(&mut self, name: impl Into<String>, kind: FieldKind) -> Result<&Field> {
        self.add_field(name, kind, None, true)
    }

    pub fn add_nested(&mut self, name: impl Into<String>, schema: Arc<Schema>) -> Result<&Field> {
        self.add_field(name, FieldKind::Record, Some(schema), false)
    }

    pub fn add_nested_array(
        &mut self,
        name: impl Into<String>,
        schema: Arc<Schema>,
    ) -> Result<&Field> {
        self.add_field(name, FieldKind::Record, Some(schema), true)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    pub fn field_at(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Fields in slot order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Freezes the schema for sharing across records and threads.
    pub fn into_shared(self) -> Arc<Schema> {
        Arc::new(self)
    }

    /// Identity first, structure second: two independently built schemas with
    /// identical fields describe the same record type.
    pub(crate) fn is_compatible(this: &Arc<Schema>, other: &Arc<Schema>) -> bool {
        Arc::ptr_eq(this, other) || **this == **other
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Schema {
        let mut schema = Schema::new();
        schema.add_scalar("name", FieldKind::String).unwrap();
        schema.add_scalar("price", FieldKind::Float32).unwrap();
        schema.add_scalar("quantity", FieldKind::Int32).unwrap();
        schema
    }

    #[test]
    fn slots_follow_declaration_order() {
        let schema = product();
        let slots: Vec<_> = schema.fields().iter().map(|f| (f.name(), f.index())).collect();
        assert_eq!(slots, vec![("name", 0), ("price", 1), ("quantity", 2)]);
        assert_eq!(schema.field("quantity").unwrap().index(), 2);
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut schema = product();
        let err = schema.add_scalar("price", FieldKind::Float64).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SchemaError>(),
            Some(&SchemaError::DuplicateField {
                name: "price".into()
            })
        );
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn record_kind_requires_nested_schema() {
        let mut schema = Schema::new();
        let err = schema
            .add_field("item", FieldKind::Record, None, false)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::InvalidNesting { .. })
        ));

        let err = schema
            .add_field("count", FieldKind::Int32, Some(product().into_shared()), false)
            .unwrap_err();
        assert!(err.to_string().contains("cannot carry a nested schema"));
    }

    #[test]
    fn nested_fields_render_type_names() {
        let item = product().into_shared();
        let mut schema = Schema::new();
        schema.add_nested("item", Arc::clone(&item)).unwrap();
        schema.add_nested_array("items", item).unwrap();
        schema.add_array("tags", FieldKind::String).unwrap();
        schema.add_array("blob", FieldKind::Byte).unwrap();

        let names: Vec<_> = schema.fields().iter().map(Field::type_name).collect();
        assert_eq!(names, vec!["record", "[]record", "[]string", "[]byte"]);
        assert!(schema.field("blob").unwrap().is_blob());
        assert!(schema.field("tags").unwrap().is_out_of_line());
    }

    #[test]
    fn independently_built_schemas_are_compatible() {
        let a = product().into_shared();
        let b = product().into_shared();
        assert!(Schema::is_compatible(&a, &b));

        let mut c = product();
        c.add_scalar("id_bill", FieldKind::Int64).unwrap();
        assert!(!Schema::is_compatible(&a, &c.into_shared()));
    }
}
