//! Fuzz testing for record assignment and encoding.
//!
//! Applies an arbitrary sequence of assignments, nulls and appends to a fixed
//! schema, encodes, and checks that the rebound record reads back the same
//! effective values.

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use flexrec::{FieldState, Record, Schema};

const DEFINITION: &str = r#"{
    "small": "int32",
    "big": "int64",
    "ratio": "float64",
    "flag": "bool",
    "label": "string",
    "counts": "[]int32",
    "names": "[]string",
    "blob": "[]byte",
    "child": { "label": "string", "big": "int64" }
}"#;

#[derive(Debug, Arbitrary)]
enum Operation {
    SetSmall(i32),
    SetBig(i64),
    SetRatio(f64),
    SetFlag(bool),
    SetLabel(String),
    SetChildLabel(String),
    AppendCounts(Vec<i32>),
    AppendNames(Vec<String>),
    SetBlob(Vec<u8>),
    Null(u8),
    Reencode,
}

fuzz_target!(|ops: Vec<Operation>| {
    let Ok(schema) = Schema::from_definition(DEFINITION) else {
        return;
    };
    let names: Vec<String> = schema.fields().iter().map(|f| f.name().to_string()).collect();
    let mut record = Record::new(Arc::clone(&schema));

    for op in ops.into_iter().take(64) {
        let result = match op {
            Operation::SetSmall(v) => record.set("small", v),
            Operation::SetBig(v) => record.set("big", v),
            Operation::SetRatio(v) if v.is_finite() => record.set("ratio", v),
            Operation::SetRatio(_) => Ok(()),
            Operation::SetFlag(v) => record.set("flag", v),
            Operation::SetLabel(v) if v.len() <= 1024 => record.set("label", v),
            Operation::SetLabel(_) => Ok(()),
            Operation::SetChildLabel(v) if v.len() <= 1024 => {
                let mut child = match record.new_nested("child") {
                    Ok(child) => child,
                    Err(_) => continue,
                };
                let _ = child.set("label", v);
                record.set("child", child)
            }
            Operation::SetChildLabel(_) => Ok(()),
            Operation::AppendCounts(v) if v.len() <= 256 => record.append("counts", v),
            Operation::AppendCounts(_) => Ok(()),
            Operation::AppendNames(v) if v.len() <= 32 => record.append("names", v),
            Operation::AppendNames(_) => Ok(()),
            Operation::SetBlob(v) if v.len() <= 1024 => record.set("blob", v),
            Operation::SetBlob(_) => Ok(()),
            Operation::Null(idx) => record.set_null(&names[idx as usize % names.len()]),
            Operation::Reencode => match record.to_bytes() {
                Ok(bytes) => {
                    record = Record::from_bytes(Arc::clone(&schema), bytes);
                    Ok(())
                }
                Err(e) => panic!("encoding a valid record failed: {:?}", e),
            },
        };
        assert!(result.is_ok(), "valid operation rejected: {:?}", result);
    }

    let bytes = record.to_bytes().expect("encode");
    let decoded = Record::from_bytes(Arc::clone(&schema), bytes);
    for name in &names {
        let (expected, state) = record.get(name).expect("read pending");
        let (actual, decoded_state) = decoded.get(name).expect("read decoded");
        if state == FieldState::ExplicitNull {
            assert_eq!(decoded_state, FieldState::Unset);
        } else {
            assert_eq!(actual, expected, "field {}", name);
            assert_eq!(decoded_state, state);
        }
    }
});
