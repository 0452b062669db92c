//! # JSON Parsing and Rendering
//!
//! This module provides the JSON text layer used by two adapters:
//!
//! 1. **Schema definitions**: an ordered mapping of field name to type tag
//! 2. **Record projection**: rendering a decoded record as JSON and applying
//!    a JSON document onto a record
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌───────────────┐
//! │ JSON String │───>│ JsonTokenizer│───>│ JsonValue     │
//! └─────────────┘    └──────────────┘    └───────────────┘
//!                                               │
//!                                               v
//!                                        ┌───────────────┐
//!                                        │ write_json_*  │───> JSON String
//!                                        └───────────────┘
//! ```
//!
//! ## Tokenizer
//!
//! The `JsonTokenizer` performs lazy tokenization, yielding tokens on demand:
//!
//! - `{` / `}` - Object delimiters
//! - `[` / `]` - Array delimiters
//! - `:` - Key-value separator
//! - `,` - Element separator
//! - String, Int, Float, Bool, Null - Value tokens
//!
//! ## Value Types
//!
//! `JsonValue` represents parsed JSON with owned data:
//!
//! - `Null`
//! - `Bool(bool)`
//! - `Int(i64)` - integer literals that fit 64 bits, kept exact
//! - `Float(f64)` - everything else numeric
//! - `String(String)`
//! - `Array(Vec<JsonValue>)`
//! - `Object(Vec<(String, JsonValue)>)` - insertion ordered, duplicates kept
//!
//! Objects keep their entries in document order and do not merge duplicate
//! keys. Schema definitions depend on both: order is slot order, and a
//! duplicated key must surface as a duplicate field rather than vanish.
//!
//! ## Error Handling
//!
//! All errors include position information:
//!
//! ```text
//! "expected ':' after object key, got Some(Comma) at position 42"
//! ```

use eyre::{bail, Result, WrapErr};
use std::borrow::Cow;
use std::fmt::Write as _;

use crate::config::MAX_JSON_DEPTH;

#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<JsonValue>),
    Object(Vec<(String, JsonValue)>),
}

impl JsonValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "boolean",
            JsonValue::Int(_) | JsonValue::Float(_) => "number",
            JsonValue::String(_) => "string",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsonToken<'a> {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Colon,
    Comma,
    String(Cow<'a, str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

#[derive(Debug)]
pub struct JsonParseResult {
    pub value: JsonValue,
    pub consumed: usize,
}

pub struct JsonTokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> JsonTokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() {
            match self.input.as_bytes()[self.pos] {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Option<JsonToken<'a>>> {
        self.skip_whitespace();

        if self.pos >= self.input.len() {
            return Ok(None);
        }

        let c = self.input.as_bytes()[self.pos];

        match c {
            b'{' => {
                self.pos += 1;
                Ok(Some(JsonToken::ObjectStart))
            }
            b'}' => {
                self.pos += 1;
                Ok(Some(JsonToken::ObjectEnd))
            }
            b'[' => {
                self.pos += 1;
                Ok(Some(JsonToken::ArrayStart))
            }
            b']' => {
                self.pos += 1;
                Ok(Some(JsonToken::ArrayEnd))
            }
            b':' => {
                self.pos += 1;
                Ok(Some(JsonToken::Colon))
            }
            b',' => {
                self.pos += 1;
                Ok(Some(JsonToken::Comma))
            }
            b'"' => self.parse_string(),
            b't' => self.parse_keyword("true", JsonToken::Bool(true)),
            b'f' => self.parse_keyword("false", JsonToken::Bool(false)),
            b'n' => self.parse_keyword("null", JsonToken::Null),
            b'-' | b'0'..=b'9' => self.parse_number(),
            _ => bail!(
                "unexpected character '{}' at position {}",
                c as char,
                self.pos
            ),
        }
    }

    fn parse_string(&mut self) -> Result<Option<JsonToken<'a>>> {
        let start = self.pos + 1;
        self.pos += 1;

        let mut has_escapes = false;
        while self.pos < self.input.len() {
            let c = self.input.as_bytes()[self.pos];
            match c {
                b'"' => {
                    let raw = &self.input[start..self.pos];
                    self.pos += 1;

                    return if has_escapes {
                        let unescaped = unescape_string(raw)?;
                        Ok(Some(JsonToken::String(Cow::Owned(unescaped))))
                    } else {
                        Ok(Some(JsonToken::String(Cow::Borrowed(raw))))
                    };
                }
                b'\\' => {
                    has_escapes = true;
                    self.pos += 2;
                }
                _ => self.pos += 1,
            }
        }

        bail!("unterminated string starting at position {}", start - 1)
    }

    fn parse_number(&mut self) -> Result<Option<JsonToken<'a>>> {
        let start = self.pos;
        let mut integral = true;

        if self.input.as_bytes()[self.pos] == b'-' {
            self.pos += 1;
        }

        while self.pos < self.input.len() {
            match self.input.as_bytes()[self.pos] {
                b'0'..=b'9' => self.pos += 1,
                b'.' | b'e' | b'E' | b'+' | b'-' => {
                    integral = false;
                    self.pos += 1;
                }
                _ => break,
            }
        }

        let num_str = &self.input[start..self.pos];
        if integral {
            if let Ok(n) = num_str.parse::<i64>() {
                return Ok(Some(JsonToken::Int(n)));
            }
        }

        let n: f64 = num_str
            .parse()
            .wrap_err_with(|| format!("invalid number '{}' at position {}", num_str, start))?;

        Ok(Some(JsonToken::Float(n)))
    }

    fn parse_keyword(
        &mut self,
        keyword: &'static str,
        token: JsonToken<'a>,
    ) -> Result<Option<JsonToken<'a>>> {
        if self.input[self.pos..].starts_with(keyword) {
            self.pos += keyword.len();
            Ok(Some(token))
        } else {
            bail!("expected '{}' at position {}", keyword, self.pos)
        }
    }
}

pub fn unescape_string(s: &str) -> Result<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('/') => result.push('/'),
                Some('b') => result.push('\x08'),
                Some('f') => result.push('\x0C'),
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    if hex.len() != 4 {
                        bail!("invalid unicode escape: incomplete sequence");
                    }
                    let cp = u32::from_str_radix(&hex, 16)
                        .wrap_err_with(|| format!("invalid unicode escape: \\u{}", hex))?;
                    if let Some(ch) = char::from_u32(cp) {
                        result.push(ch);
                    } else {
                        bail!("invalid unicode codepoint: U+{:04X}", cp);
                    }
                }
                Some(other) => bail!("invalid escape sequence: \\{}", other),
                None => bail!("unexpected end of string after backslash"),
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

pub fn parse_json(input: &str) -> Result<JsonParseResult> {
    let mut tokenizer = JsonTokenizer::new(input);
    let value = parse_value(&mut tokenizer, 0)?;
    Ok(JsonParseResult {
        value,
        consumed: tokenizer.position(),
    })
}

fn parse_value(tokenizer: &mut JsonTokenizer, depth: usize) -> Result<JsonValue> {
    match tokenizer.next_token()? {
        Some(token) => value_from_token(token, tokenizer, depth),
        None => bail!("unexpected end of input"),
    }
}

fn value_from_token(
    token: JsonToken<'_>,
    tokenizer: &mut JsonTokenizer,
    depth: usize,
) -> Result<JsonValue> {
    let opens = matches!(token, JsonToken::ArrayStart | JsonToken::ObjectStart);
    if opens && depth >= MAX_JSON_DEPTH {
        bail!(
            "JSON nesting deeper than {} levels at position {}",
            MAX_JSON_DEPTH,
            tokenizer.position()
        );
    }
    match token {
        JsonToken::Null => Ok(JsonValue::Null),
        JsonToken::Bool(b) => Ok(JsonValue::Bool(b)),
        JsonToken::Int(n) => Ok(JsonValue::Int(n)),
        JsonToken::Float(n) => Ok(JsonValue::Float(n)),
        JsonToken::String(s) => Ok(JsonValue::String(s.into_owned())),
        JsonToken::ArrayStart => parse_array(tokenizer, depth + 1),
        JsonToken::ObjectStart => parse_object(tokenizer, depth + 1),
        other => bail!(
            "unexpected token {:?} at position {}",
            other,
            tokenizer.position()
        ),
    }
}

fn parse_array(tokenizer: &mut JsonTokenizer, depth: usize) -> Result<JsonValue> {
    let mut elements = Vec::new();

    loop {
        match tokenizer.next_token()? {
            Some(JsonToken::ArrayEnd) => return Ok(JsonValue::Array(elements)),
            Some(JsonToken::Comma) => continue,
            Some(token) => elements.push(value_from_token(token, tokenizer, depth)?),
            None => bail!("unexpected end of input in array"),
        }
    }
}

fn parse_object(tokenizer: &mut JsonTokenizer, depth: usize) -> Result<JsonValue> {
    let mut entries = Vec::new();

    loop {
        match tokenizer.next_token()? {
            Some(JsonToken::ObjectEnd) => return Ok(JsonValue::Object(entries)),
            Some(JsonToken::Comma) => continue,
            Some(JsonToken::String(key)) => {
                match tokenizer.next_token()? {
                    Some(JsonToken::Colon) => {}
                    other => bail!(
                        "expected ':' after object key, got {:?} at position {}",
                        other,
                        tokenizer.position()
                    ),
                }

                let value = parse_value(tokenizer, depth)?;
                entries.push((key.into_owned(), value));
            }
            Some(other) => bail!(
                "expected string key or '}}', got {:?} at position {}",
                other,
                tokenizer.position()
            ),
            None => bail!("unexpected end of input in object"),
        }
    }
}

/// Appends `s` as a quoted JSON string literal.
pub fn write_json_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Appends a float, or `null` when it has no JSON representation.
pub fn write_json_float(value: f64, out: &mut String) {
    if value.is_finite() {
        let _ = write!(out, "{}", value);
    } else {
        out.push_str("null");
    }
}

pub fn write_json_value(value: &JsonValue, out: &mut String) {
    match value {
        JsonValue::Null => out.push_str("null"),
        JsonValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        JsonValue::Int(n) => {
            let _ = write!(out, "{}", n);
        }
        JsonValue::Float(n) => write_json_float(*n, out),
        JsonValue::String(s) => write_json_string(s, out),
        JsonValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_value(item, out);
            }
            out.push(']');
        }
        JsonValue::Object(entries) => {
            out.push('{');
            for (i, (key, item)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(key, out);
                out.push(':');
                write_json_value(item, out);
            }
            out.push('}');
        }
    }
}

impl std::fmt::Display for JsonValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        write_json_value(self, &mut out);
        f.write_str(&out)
    }
}
