//! # Field Kind Vocabulary
//!
//! This module provides the canonical `FieldKind` enum, the fixed vocabulary
//! of element types a schema field may declare.
//!
//! ## Kinds
//!
//! | Kind | Rust Type | Width | Storage |
//! |------|-----------|-------|---------|
//! | Int32 | i32 | 4 | inline in table |
//! | Int64 | i64 | 8 | inline in table |
//! | Float32 | f32 | 4 | inline in table |
//! | Float64 | f64 | 8 | inline in table |
//! | Bool | bool | 1 | inline in table |
//! | Byte | u8 | 1 | inline in table |
//! | String | String | - | out-of-line, length-prefixed |
//! | Record | Record | - | out-of-line nested table |
//!
//! Any kind may additionally be repeated (the field's `is_array` flag). A
//! repeated `Byte` field is a byte blob; every other repeated kind is an array.
//!
//! ## Type Tags
//!
//! Declarative schema sources name kinds with lower-case tags. The canonical
//! tags are the ones [`FieldKind::tag`] returns; [`FieldKind::from_tag`] also
//! accepts a few common aliases (`int`, `long`, `float`, `double`, `boolean`,
//! `uint8`).

/// Element kind of a schema field.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int32 = 0,
    Int64 = 1,
    Float32 = 2,
    Float64 = 3,
    Bool = 4,
    Byte = 5,
    String = 6,
    Record = 7,
}

impl FieldKind {
    /// Width in bytes of one inline value, or `None` for out-of-line kinds.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            FieldKind::Int32 | FieldKind::Float32 => Some(4),
            FieldKind::Int64 | FieldKind::Float64 => Some(8),
            FieldKind::Bool | FieldKind::Byte => Some(1),
            FieldKind::String | FieldKind::Record => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        self.fixed_size().is_none()
    }

    pub fn tag(&self) -> &'static str {
        match self {
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::Float32 => "float32",
            FieldKind::Float64 => "float64",
            FieldKind::Bool => "bool",
            FieldKind::Byte => "byte",
            FieldKind::String => "string",
            FieldKind::Record => "record",
        }
    }

    /// Resolves a scalar type tag. `record` is not a valid tag: nested kinds
    /// are declared by nesting a mapping, never by name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "int32" | "int" => Some(FieldKind::Int32),
            "int64" | "long" => Some(FieldKind::Int64),
            "float32" | "float" => Some(FieldKind::Float32),
            "float64" | "double" => Some(FieldKind::Float64),
            "bool" | "boolean" => Some(FieldKind::Bool),
            "byte" | "uint8" => Some(FieldKind::Byte),
            "string" => Some(FieldKind::String),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
