//! Tests for the records module

use std::sync::Arc;

use super::*;
use crate::encoding::BufferError;
use crate::schema::Schema;
use crate::types::{ArrayValue, FieldKind, FieldState, Value};

fn product_schema() -> Arc<Schema> {
    Schema::from_definition(
        r#"{
            "name": "string",
            "price": "float32",
            "quantity": "int32",
            "in_stock": "bool",
            "sizes": "[]int32",
            "tags": "[]string",
            "thumbnail": "[]byte",
            "seller": { "id": "int64", "rating": "float64" },
            "variants": [ { "sku": "string", "weight": "float64" } ]
        }"#,
    )
    .unwrap()
}

fn encoded(record: &Record) -> Record {
    Record::from_bytes(Arc::clone(record.schema()), record.to_bytes().unwrap())
}

#[test]
fn scalar_fields_survive_encode_decode() {
    let mut record = Record::new(product_schema());
    record.set("name", "Cola").unwrap();
    record.set("price", 0.123f32).unwrap();
    record.set("quantity", 42).unwrap();
    record.set("in_stock", true).unwrap();

    let decoded = encoded(&record);
    assert_eq!(decoded.get_str("name").unwrap(), Some("Cola"));
    assert_eq!(decoded.get_float32("price").unwrap(), Some(0.123f32));
    assert_eq!(decoded.get_int32("quantity").unwrap(), Some(42));
    assert_eq!(decoded.get_bool("in_stock").unwrap(), Some(true));
}

#[test]
fn modified_bound_record_copies_untouched_fields() {
    let mut record = Record::new(product_schema());
    record.set("name", "Cola").unwrap();
    record.set("price", 0.123f32).unwrap();
    record.set("quantity", 42).unwrap();

    let mut bound = encoded(&record);
    bound.set("quantity", 3).unwrap();
    assert_eq!(bound.get_int32("quantity").unwrap(), Some(3));

    let reencoded = encoded(&bound);
    assert_eq!(reencoded.get_str("name").unwrap(), Some("Cola"));
    assert_eq!(reencoded.get_float32("price").unwrap(), Some(0.123f32));
    assert_eq!(reencoded.get_int32("quantity").unwrap(), Some(3));
    assert_eq!(reencoded.state("in_stock").unwrap(), FieldState::Unset);
}

#[test]
fn to_bytes_is_repeatable() {
    let mut record = Record::new(product_schema());
    record.set("name", "Cola").unwrap();
    record.set("sizes", vec![1, 2, 3]).unwrap();

    let first = record.to_bytes().unwrap();
    let second = record.to_bytes().unwrap();
    assert_eq!(first, second);
    assert!(record.has_pending());

    let bound = Record::from_bytes(product_schema(), first.clone());
    assert_eq!(bound.to_bytes().unwrap(), first);
}

#[test]
fn field_states_follow_assignment() {
    let mut record = Record::new(product_schema());
    assert_eq!(record.state("name").unwrap(), FieldState::Unset);

    record.set("name", "Cola").unwrap();
    assert_eq!(record.state("name").unwrap(), FieldState::HasValue);

    record.set_null("name").unwrap();
    assert_eq!(
        record.get("name").unwrap(),
        (Value::Null, FieldState::ExplicitNull)
    );
    assert_eq!(record.get_str("name").unwrap(), None);

    record.set("quantity", None::<i32>).unwrap();
    assert_eq!(record.state("quantity").unwrap(), FieldState::ExplicitNull);
}

#[test]
fn explicit_null_decodes_as_unset() {
    let mut record = Record::new(product_schema());
    record.set("name", "Cola").unwrap();
    let mut bound = encoded(&record);
    assert_eq!(bound.state("name").unwrap(), FieldState::HasValue);

    bound.set_null("name").unwrap();
    let reencoded = encoded(&bound);
    assert_eq!(
        reencoded.get("name").unwrap(),
        (Value::Null, FieldState::Unset)
    );
}

#[test]
fn unknown_field_reads_unset_and_rejects_writes() {
    let mut record = Record::new(product_schema());
    assert_eq!(
        record.get("color").unwrap(),
        (Value::Null, FieldState::Unset)
    );
    assert_eq!(record.get_int32("color").unwrap(), None);

    let err = record.set("color", "red").unwrap_err();
    assert_eq!(
        err.downcast_ref::<FieldAccessError>(),
        Some(&FieldAccessError::UnknownField {
            field: "color".into()
        })
    );
}

#[test]
fn assigning_wrong_kind_is_a_type_mismatch() {
    let mut record = Record::new(product_schema());

    let err = record.set("quantity", "many").unwrap_err();
    match err.downcast_ref::<FieldAccessError>() {
        Some(FieldAccessError::TypeMismatch {
            field,
            expected,
            found,
        }) => {
            assert_eq!(field, "quantity");
            assert_eq!(expected, "int32");
            assert_eq!(found, "string");
        }
        other => panic!("expected type mismatch, got {:?}", other),
    }

    assert!(record.set("quantity", 3i64).is_err());
    assert!(record.get_int64("quantity").is_err());
    assert_eq!(record.state("quantity").unwrap(), FieldState::Unset);
}

#[test]
fn corrupt_bytes_fail_on_first_read() {
    let record = Record::from_bytes(product_schema(), vec![0xff, 0xff, 0xff]);
    assert!(record.is_bound());

    let err = record.get("name").unwrap_err();
    assert!(err.downcast_ref::<BufferError>().is_some());
}

#[test]
fn bogus_root_offset_is_rejected() {
    let record = Record::from_bytes(product_schema(), vec![0x40, 0, 0, 0, 0, 0, 0, 0]);
    let err = record.get_int32("quantity").unwrap_err();
    assert!(err.downcast_ref::<BufferError>().is_some());
}

#[test]
fn append_extends_encoded_array_in_order() {
    let mut record = Record::new(product_schema());
    record.set("sizes", vec![1]).unwrap();

    let mut bound = encoded(&record);
    bound
        .append("sizes", vec![2, 3, 4, 5, 6, 7, 8, 9, 10])
        .unwrap();

    let view = bound.array("sizes").unwrap().unwrap();
    assert_eq!(view.len(), 10);
    for i in 0..10 {
        assert_eq!(view.get_int32(i).unwrap(), i as i32 + 1);
    }

    let reencoded = encoded(&bound);
    let view = reencoded.array("sizes").unwrap().unwrap();
    assert_eq!(view.len(), 10);
    assert_eq!(view.get_int32(0).unwrap(), 1);
    assert_eq!(view.get_int32(9).unwrap(), 10);
}

#[test]
fn append_to_unset_array_starts_empty() {
    let mut record = Record::new(product_schema());
    record.append("tags", vec!["a", "b"]).unwrap();
    record.append("tags", vec!["c"]).unwrap();
    assert_eq!(
        record.get("tags").unwrap().0,
        Value::Array(ArrayValue::String(vec!["a".into(), "b".into(), "c".into()]))
    );
}

#[test]
fn append_rejects_scalars_and_wrong_elements() {
    let mut record = Record::new(product_schema());
    assert!(record.append("quantity", vec![1]).is_err());
    assert!(record.append("sizes", vec![1i64]).is_err());
}

#[test]
fn array_index_is_bounds_checked() {
    let mut record = Record::new(product_schema());
    record.set("sizes", vec![5, 6]).unwrap();
    let decoded = encoded(&record);

    for view in [
        record.array("sizes").unwrap().unwrap(),
        decoded.array("sizes").unwrap().unwrap(),
    ] {
        let err = view.get_int32(2).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ArrayError>(),
            Some(&ArrayError::IndexOutOfRange { index: 2, len: 2 })
        );
    }
}

#[test]
fn array_view_checks_element_kind() {
    let mut record = Record::new(product_schema());
    record.set("sizes", vec![5]).unwrap();
    let view = record.array("sizes").unwrap().unwrap();
    assert_eq!(view.kind(), FieldKind::Int32);
    assert!(view.get_str(0).is_err());
    assert!(record.array("quantity").is_err());
}

#[test]
fn string_arrays_keep_logical_order() {
    let mut record = Record::new(product_schema());
    record.set("tags", vec!["fizzy", "sweet", "cold"]).unwrap();

    let decoded = encoded(&record);
    let view = decoded.array("tags").unwrap().unwrap();
    let tags: Vec<_> = (0..view.len()).map(|i| view.get_str(i).unwrap()).collect();
    assert_eq!(tags, ["fizzy", "sweet", "cold"]);

    let collected = view.iter().collect::<eyre::Result<Vec<_>>>().unwrap();
    assert_eq!(collected[2], Value::String("cold".into()));
}

#[test]
fn byte_blob_is_read_zero_copy() {
    let mut record = Record::new(product_schema());
    record.set("thumbnail", vec![0u8, 1, 2, 254]).unwrap();
    assert_eq!(record.get_bytes("thumbnail").unwrap(), Some(&[0u8, 1, 2, 254][..]));

    let decoded = encoded(&record);
    assert_eq!(decoded.get_bytes("thumbnail").unwrap(), Some(&[0u8, 1, 2, 254][..]));
    let view = decoded.array("thumbnail").unwrap().unwrap();
    assert_eq!(view.get_byte(3).unwrap(), 254);
}

#[test]
fn nested_record_round_trip() {
    let mut record = Record::new(product_schema());
    let mut seller = record.new_nested("seller").unwrap();
    seller.set("id", 77i64).unwrap();
    seller.set("rating", 4.5).unwrap();
    record.set("seller", seller).unwrap();
    record.set("name", "Cola").unwrap();

    let decoded = encoded(&record);
    let seller = decoded.nested("seller").unwrap().unwrap();
    assert_eq!(seller.get_int64("id").unwrap(), Some(77));
    assert_eq!(seller.get_float64("rating").unwrap(), Some(4.5));

    let mut bound = decoded.clone();
    bound.set("name", "Pepsi").unwrap();
    let reencoded = encoded(&bound);
    let seller = reencoded.nested("seller").unwrap().unwrap();
    assert_eq!(seller.get_int64("id").unwrap(), Some(77));
    assert_eq!(reencoded.get_str("name").unwrap(), Some("Pepsi"));
}

#[test]
fn nested_record_schema_must_match() {
    let mut record = Record::new(product_schema());
    let stranger = Record::new(
        Schema::from_definition(r#"{"other": "string"}"#).unwrap(),
    );
    let err = record.set("seller", stranger).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FieldAccessError>(),
        Some(FieldAccessError::TypeMismatch { .. })
    ));
}

#[test]
fn record_arrays_are_indexed_in_order() {
    let mut record = Record::new(product_schema());
    let variants: Vec<Record> = ["S", "M", "L"]
        .iter()
        .enumerate()
        .map(|(i, sku)| {
            let mut variant = record.new_nested("variants").unwrap();
            variant.set("sku", *sku).unwrap();
            variant.set("weight", i as f64 + 0.5).unwrap();
            variant
        })
        .collect();
    record.set("variants", variants).unwrap();

    let decoded = encoded(&record);
    assert_eq!(decoded.array("variants").unwrap().unwrap().len(), 3);
    let medium = decoded.nested_at("variants", 1).unwrap().unwrap();
    assert_eq!(medium.get_str("sku").unwrap(), Some("M"));
    assert_eq!(medium.get_float64("weight").unwrap(), Some(1.5));

    assert!(decoded.nested_at("variants", 3).is_err());
    assert!(decoded.nested_at("seller", 0).is_err());
}

#[test]
fn equality_compares_effective_values() {
    let mut record = Record::new(product_schema());
    record.set("name", "Cola").unwrap();
    record.set("tags", vec!["a"]).unwrap();

    let decoded = encoded(&record);
    assert_eq!(decoded, record);

    let mut changed = decoded.clone();
    changed.set("name", "Pepsi").unwrap();
    assert_ne!(changed, record);
}

#[test]
fn empty_record_encodes_to_empty_table() {
    let record = Record::new(product_schema());
    let decoded = encoded(&record);
    for field in product_schema().fields() {
        assert_eq!(decoded.state(field.name()).unwrap(), FieldState::Unset);
    }
}
