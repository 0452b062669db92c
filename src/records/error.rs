//! # Record Access Errors
//!
//! | Error | Raised by |
//! |-------|-----------|
//! | `FieldAccessError::UnknownField` | `set`, `set_null`, `append`, `apply_json` |
//! | `FieldAccessError::TypeMismatch` | typed getters and setters, array views |
//! | `ArrayError::IndexOutOfRange` | `ArrayView` element access, `nested_at` |

/// A field read or write that does not fit the record's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAccessError {
    UnknownField {
        field: String,
    },
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },
}

impl std::fmt::Display for FieldAccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldAccessError::UnknownField { field } => {
                write!(f, "unknown field '{}'", field)
            }
            FieldAccessError::TypeMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "type mismatch for field '{}': declared {}, got {}",
                field, expected, found
            ),
        }
    }
}

impl std::error::Error for FieldAccessError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayError {
    IndexOutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for ArrayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrayError::IndexOutOfRange { index, len } => {
                write!(f, "array index {} out of range (len={})", index, len)
            }
        }
    }
}

impl std::error::Error for ArrayError {}
