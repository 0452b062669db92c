//! # JSON Text Parsing
//!
//! This module provides the JSON tokenizer, parser, and writer shared by the
//! two text adapters of the crate:
//!
//! - `Schema::from_definition` / `Schema::to_definition`
//! - `Record::to_json` / `Record::apply_json`
//!
//! ## Module Structure
//!
//! - `json`: JSON tokenizer, recursive-descent parser, and writer
//!
//! ## Design Goals
//!
//! 1. **Ordered Objects**: object entries keep document order, duplicates kept
//! 2. **Exact Integers**: integral literals that fit `i64` never pass through `f64`
//! 3. **Zero-Copy Where Possible**: string tokens borrow the input unless escaped
//! 4. **Error Context**: error messages carry the byte position
//!
//! ```ignore
//! use flexrec::parsing::{parse_json, JsonValue};
//!
//! let parsed = parse_json(r#"{"name": "cola"}"#)?;
//! assert!(matches!(parsed.value, JsonValue::Object(_)));
//! ```

pub mod json;

pub use json::{
    parse_json, unescape_string, write_json_float, write_json_string, write_json_value,
    JsonParseResult, JsonToken, JsonTokenizer, JsonValue,
};
