//! # Record Encoding Property Tests
//!
//! Generated values are assigned, encoded, rebound and read back. Arbitrary
//! byte strings are bound and read to check that corrupt input only ever
//! produces errors.
//!
//! ## Usage
//!
//! ```sh
//! cargo test --test record_roundtrip
//! ```

use std::sync::Arc;

use flexrec::{FieldState, Record, Schema};
use proptest::prelude::*;

fn schema() -> Arc<Schema> {
    Schema::from_definition(
        r#"{
            "small": "int32",
            "big": "int64",
            "ratio": "float32",
            "precise": "float64",
            "flag": "bool",
            "octet": "byte",
            "label": "string",
            "counts": "[]int32",
            "names": "[]string",
            "payload": "[]byte",
            "child": { "label": "string", "big": "int64" },
            "children": [ { "label": "string", "big": "int64" } ]
        }"#,
    )
    .unwrap()
}

proptest! {
    #[test]
    fn scalars_round_trip(
        small in any::<i32>(),
        big in any::<i64>(),
        ratio in -1.0e6f32..1.0e6f32,
        precise in -1.0e12f64..1.0e12f64,
        flag in any::<bool>(),
        octet in any::<u8>(),
        label in "\\PC{0,32}",
    ) {
        let mut record = Record::new(schema());
        record.set("small", small).unwrap();
        record.set("big", big).unwrap();
        record.set("ratio", ratio).unwrap();
        record.set("precise", precise).unwrap();
        record.set("flag", flag).unwrap();
        record.set("octet", octet).unwrap();
        record.set("label", label.as_str()).unwrap();

        let decoded = Record::from_bytes(schema(), record.to_bytes().unwrap());
        prop_assert_eq!(decoded.get_int32("small").unwrap(), Some(small));
        prop_assert_eq!(decoded.get_int64("big").unwrap(), Some(big));
        prop_assert_eq!(decoded.get_float32("ratio").unwrap(), Some(ratio));
        prop_assert_eq!(decoded.get_float64("precise").unwrap(), Some(precise));
        prop_assert_eq!(decoded.get_bool("flag").unwrap(), Some(flag));
        prop_assert_eq!(decoded.get_byte("octet").unwrap(), Some(octet));
        prop_assert_eq!(decoded.get_str("label").unwrap(), Some(label.as_str()));
        prop_assert_eq!(&decoded, &record);
    }

    #[test]
    fn arrays_keep_logical_order(
        counts in prop::collection::vec(any::<i32>(), 0..64),
        names in prop::collection::vec("[a-z]{0,12}", 0..16),
        payload in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let mut record = Record::new(schema());
        record.set("counts", counts.clone()).unwrap();
        record.set("names", names.clone()).unwrap();
        record.set("payload", payload.clone()).unwrap();

        let decoded = Record::from_bytes(schema(), record.to_bytes().unwrap());
        let view = decoded.array("counts").unwrap().unwrap();
        prop_assert_eq!(view.len(), counts.len());
        for (i, expected) in counts.iter().enumerate() {
            prop_assert_eq!(view.get_int32(i).unwrap(), *expected);
        }
        let view = decoded.array("names").unwrap().unwrap();
        for (i, expected) in names.iter().enumerate() {
            prop_assert_eq!(view.get_str(i).unwrap(), expected.as_str());
        }
        prop_assert_eq!(decoded.get_bytes("payload").unwrap(), Some(payload.as_slice()));
    }

    #[test]
    fn append_matches_concatenation(
        head in prop::collection::vec(any::<i32>(), 0..32),
        tail in prop::collection::vec(any::<i32>(), 0..32),
    ) {
        let mut record = Record::new(schema());
        record.set("counts", head.clone()).unwrap();
        let mut bound = Record::from_bytes(schema(), record.to_bytes().unwrap());
        bound.append("counts", tail.clone()).unwrap();

        let expected: Vec<i32> = head.iter().chain(tail.iter()).copied().collect();
        let reencoded = Record::from_bytes(schema(), bound.to_bytes().unwrap());
        let view = reencoded.array("counts").unwrap().unwrap();
        let actual: Vec<i32> = (0..view.len()).map(|i| view.get_int32(i).unwrap()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn untouched_fields_survive_partial_update(
        label in "[a-z]{1,16}",
        big in any::<i64>(),
        replacement in any::<i32>(),
    ) {
        let schema = schema();
        let mut record = Record::new(Arc::clone(&schema));
        record.set("label", label.as_str()).unwrap();
        let mut child = record.new_nested("child").unwrap();
        child.set("big", big).unwrap();
        record.set("child", child).unwrap();

        let mut bound = Record::from_bytes(Arc::clone(&schema), record.to_bytes().unwrap());
        bound.set("small", replacement).unwrap();
        let reencoded = Record::from_bytes(schema, bound.to_bytes().unwrap());

        prop_assert_eq!(reencoded.get_str("label").unwrap(), Some(label.as_str()));
        prop_assert_eq!(reencoded.get_int32("small").unwrap(), Some(replacement));
        let child = reencoded.nested("child").unwrap().unwrap();
        prop_assert_eq!(child.get_int64("big").unwrap(), Some(big));
        prop_assert_eq!(child.state("label").unwrap(), FieldState::Unset);
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let schema = schema();
        let record = Record::from_bytes(Arc::clone(&schema), bytes);
        for field in schema.fields() {
            let _ = record.get(field.name());
            let _ = record.state(field.name());
        }
        let _ = record.to_bytes();
        let _ = record.to_json();
    }
}
