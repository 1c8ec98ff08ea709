//! Deserialization-time size guardrails: length headers are checked before
//! any element or byte decoding.

use std::collections::HashMap;

use fory::{ErrorKind, Fory, ForyObject};

#[test]
fn collection_limit_rejects_before_decoding() {
    let writer = Fory::default();
    let bytes = writer.serialize(&(0..10).collect::<Vec<i32>>()).unwrap();

    let reader = Fory::default().max_collection_size(3);
    let err = reader.deserialize::<Vec<i32>>(&bytes).unwrap_err();
    match err.kind() {
        ErrorKind::ExceedsLimit {
            what,
            limit,
            actual,
        } => {
            assert_eq!(*what, "collection");
            assert_eq!(*limit, 3);
            assert_eq!(*actual, 10);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn zero_means_unlimited() {
    let fory = Fory::default().max_collection_size(0);
    let values: Vec<i32> = (0..10_000).collect();
    let bytes = fory.serialize(&values).unwrap();
    assert_eq!(fory.deserialize::<Vec<i32>>(&bytes).unwrap(), values);
}

#[test]
fn string_limit() {
    let writer = Fory::default();
    let bytes = writer.serialize(&"a".repeat(100)).unwrap();
    let reader = Fory::default().max_string_bytes(16);
    let err = reader.deserialize::<String>(&bytes).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::ExceedsLimit { what: "string", .. }
    ));
}

#[test]
fn map_limit() {
    let writer = Fory::default();
    let map: HashMap<i32, i32> = (0..5).map(|i| (i, i)).collect();
    let bytes = writer.serialize(&map).unwrap();
    let reader = Fory::default().max_map_size(2);
    let err = reader.deserialize::<HashMap<i32, i32>>(&bytes).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::ExceedsLimit { what: "map", .. }
    ));
}

#[test]
fn binary_limit() {
    let writer = Fory::default();
    let bytes = writer.serialize(&vec![0u8; 64]).unwrap();
    let reader = Fory::default().max_binary_size(8);
    let err = reader.deserialize::<Vec<u8>>(&bytes).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::ExceedsLimit { what: "binary", .. }
    ));
}

#[derive(ForyObject, Debug, PartialEq)]
struct Wrapped {
    note: String,
}

#[test]
fn limit_failures_carry_the_struct_frame() {
    let mut writer = Fory::default();
    writer.register::<Wrapped>(100).unwrap();
    let bytes = writer
        .serialize(&Wrapped {
            note: "b".repeat(100),
        })
        .unwrap();

    let mut reader = Fory::default().max_string_bytes(16);
    reader.register::<Wrapped>(100).unwrap();
    let err = reader.deserialize::<Wrapped>(&bytes).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::ExceedsLimit { what: "string", .. }
    ));
    assert!(err.to_string().contains("[struct Wrapped]"));
}

#[test]
fn truncated_input_surfaces_the_deferred_error() {
    let mut fory = Fory::default();
    fory.register::<Wrapped>(100).unwrap();
    let bytes = fory
        .serialize(&Wrapped {
            note: "hello".to_string(),
        })
        .unwrap();
    let err = fory.deserialize::<Wrapped>(&bytes[..bytes.len() - 3]).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::BufferOutOfBounds { .. } | ErrorKind::Deserialization(_)
    ));
}
