//! Schema-evolution behavior: TypeDef sharing, field add/remove, byte-exact
//! skipping, and enum ordinal drift.

use fory::{Fory, ForyObject};

#[derive(ForyObject, Debug, PartialEq)]
struct WriterShape {
    a: i32,
    b: String,
    c: f64,
}

#[derive(ForyObject, Debug, PartialEq)]
struct ReaderShape {
    a: i32,
    c: f64,
}

#[derive(ForyObject, Debug, PartialEq)]
struct GrownShape {
    a: i32,
    b: String,
    c: f64,
    d: Option<String>,
}

#[test]
fn removed_field_is_skipped() {
    let mut writer = Fory::default().compatible(true);
    writer.register::<WriterShape>(100).unwrap();
    let mut reader = Fory::default().compatible(true);
    reader.register::<ReaderShape>(100).unwrap();

    let value = WriterShape {
        a: 7,
        b: "dropped on the floor".to_string(),
        c: 2.75,
    };
    let bytes = writer.serialize(&value).unwrap();
    let back: ReaderShape = reader.deserialize(&bytes).unwrap();
    assert_eq!(back, ReaderShape { a: 7, c: 2.75 });
}

#[test]
fn added_field_gets_its_default() {
    let mut writer = Fory::default().compatible(true);
    writer.register::<ReaderShape>(100).unwrap();
    let mut reader = Fory::default().compatible(true);
    reader.register::<GrownShape>(100).unwrap();

    let bytes = writer.serialize(&ReaderShape { a: 3, c: 1.0 }).unwrap();
    let back: GrownShape = reader.deserialize(&bytes).unwrap();
    assert_eq!(
        back,
        GrownShape {
            a: 3,
            b: String::new(),
            c: 1.0,
            d: None,
        }
    );
}

#[test]
fn identical_shapes_round_trip_compatible() {
    let mut fory = Fory::default().compatible(true);
    fory.register::<WriterShape>(100).unwrap();
    let value = WriterShape {
        a: -1,
        b: "same shape".to_string(),
        c: 0.125,
    };
    let bytes = fory.serialize(&value).unwrap();
    assert_eq!(fory.deserialize::<WriterShape>(&bytes).unwrap(), value);
}

#[derive(ForyObject, Debug, PartialEq, Clone)]
struct Item {
    sku: String,
    qty: i32,
}

#[derive(ForyObject, Debug, PartialEq)]
struct TwoItems {
    first: Item,
    second: Item,
}

fn count_subslices(haystack: &[u8], needle: &[u8]) -> usize {
    if needle.is_empty() || haystack.len() < needle.len() {
        return 0;
    }
    haystack.windows(needle.len()).filter(|w| w == &needle).count()
}

#[test]
fn type_def_is_written_once_per_session() {
    let mut fory = Fory::default().compatible(true);
    fory.register::<Item>(100).unwrap();
    fory.register::<TwoItems>(101).unwrap();
    let value = TwoItems {
        first: Item {
            sku: "a".to_string(),
            qty: 1,
        },
        second: Item {
            sku: "b".to_string(),
            qty: 2,
        },
    };
    let bytes = fory.serialize(&value).unwrap();

    let resolver = fory.type_resolver();
    let item_def = resolver
        .resolve_by_id(100)
        .unwrap()
        .type_def
        .clone()
        .unwrap();
    // The Item descriptor bytes appear exactly once; the second field
    // references it by index instead.
    assert_eq!(count_subslices(&bytes, &item_def.encoded), 1);

    let back: TwoItems = fory.deserialize(&bytes).unwrap();
    assert_eq!(back, value);
}

#[test]
fn second_type_def_occurrence_is_an_index_reference() {
    let mut fory = Fory::default().compatible(true);
    fory.register::<Item>(100).unwrap();
    let value = vec![
        Item {
            sku: "x".to_string(),
            qty: 9,
        },
        Item {
            sku: "y".to_string(),
            qty: 10,
        },
    ];
    let bytes = fory.serialize(&value).unwrap();
    let back: Vec<Item> = fory.deserialize(&bytes).unwrap();
    assert_eq!(back, value);

    let resolver = fory.type_resolver();
    let item_def = resolver
        .resolve_by_id(100)
        .unwrap()
        .type_def
        .clone()
        .unwrap();
    assert_eq!(count_subslices(&bytes, &item_def.encoded), 1);
    // First element: varuint (0 << 1) = 0x00 introduces the descriptor.
    // Second element: varuint (0 << 1) | 1 = 0x01 references it.
    let def_start = bytes
        .windows(item_def.encoded.len())
        .position(|w| w == item_def.encoded.as_slice())
        .unwrap();
    assert_eq!(bytes[def_start - 2], 0x00);
}

#[test]
fn tag_ids_match_renamed_fields() {
    #[derive(ForyObject, Debug, PartialEq)]
    struct Old {
        #[fory(id = 1)]
        total_count: i32,
    }
    #[derive(ForyObject, Debug, PartialEq)]
    struct New {
        #[fory(id = 1)]
        count: i32,
    }
    let mut writer = Fory::default().compatible(true);
    writer.register::<Old>(100).unwrap();
    let mut reader = Fory::default().compatible(true);
    reader.register::<New>(100).unwrap();
    let bytes = writer.serialize(&Old { total_count: 88 }).unwrap();
    let back: New = reader.deserialize(&bytes).unwrap();
    assert_eq!(back, New { count: 88 });
}

#[test]
fn type_changed_field_is_skipped_not_misread() {
    #[derive(ForyObject, Debug, PartialEq)]
    struct Before {
        a: i32,
        b: String,
    }
    #[derive(ForyObject, Debug, PartialEq)]
    struct After {
        a: i32,
        b: Vec<u8>,
    }
    let mut writer = Fory::default().compatible(true);
    writer.register::<Before>(100).unwrap();
    let mut reader = Fory::default().compatible(true);
    reader.register::<After>(100).unwrap();
    let bytes = writer
        .serialize(&Before {
            a: 5,
            b: "text".to_string(),
        })
        .unwrap();
    let back: After = reader.deserialize(&bytes).unwrap();
    assert_eq!(back, After { a: 5, b: Vec::new() });
}

#[test]
fn nested_struct_evolution() {
    #[derive(ForyObject, Debug, PartialEq)]
    struct InnerV1 {
        x: i32,
        gone: String,
    }
    #[derive(ForyObject, Debug, PartialEq)]
    struct OuterV1 {
        inner: InnerV1,
        tail: i32,
    }
    #[derive(ForyObject, Debug, PartialEq)]
    struct InnerV2 {
        x: i32,
    }
    #[derive(ForyObject, Debug, PartialEq)]
    struct OuterV2 {
        inner: InnerV2,
        tail: i32,
    }
    let mut writer = Fory::default().compatible(true);
    writer.register::<InnerV1>(100).unwrap();
    writer.register::<OuterV1>(101).unwrap();
    let mut reader = Fory::default().compatible(true);
    reader.register::<InnerV2>(100).unwrap();
    reader.register::<OuterV2>(101).unwrap();

    let bytes = writer
        .serialize(&OuterV1 {
            inner: InnerV1 {
                x: 11,
                gone: "bye".to_string(),
            },
            tail: 22,
        })
        .unwrap();
    let back: OuterV2 = reader.deserialize(&bytes).unwrap();
    assert_eq!(
        back,
        OuterV2 {
            inner: InnerV2 { x: 11 },
            tail: 22,
        }
    );
}

#[test]
fn whole_unknown_struct_field_is_skipped() {
    #[derive(ForyObject, Debug, PartialEq)]
    struct Extra {
        payload: String,
        weight: f64,
    }
    #[derive(ForyObject, Debug, PartialEq)]
    struct WithExtra {
        a: i32,
        extra: Extra,
    }
    #[derive(ForyObject, Debug, PartialEq)]
    struct WithoutExtra {
        a: i32,
    }
    let mut writer = Fory::default().compatible(true);
    writer.register::<Extra>(100).unwrap();
    writer.register::<WithExtra>(101).unwrap();
    let mut reader = Fory::default().compatible(true);
    // The reader has never heard of Extra.
    reader.register::<WithoutExtra>(101).unwrap();

    let bytes = writer
        .serialize(&WithExtra {
            a: 77,
            extra: Extra {
                payload: "opaque".to_string(),
                weight: 3.5,
            },
        })
        .unwrap();
    let back: WithoutExtra = reader.deserialize(&bytes).unwrap();
    assert_eq!(back, WithoutExtra { a: 77 });
}

#[test]
fn unknown_enum_ordinal_degrades_to_default() {
    #[derive(ForyObject, Debug, PartialEq)]
    enum ThreeStates {
        Idle,
        Busy,
        Stopped,
    }
    #[derive(ForyObject, Debug, PartialEq)]
    enum TwoStates {
        Idle,
        Busy,
    }
    let mut writer = Fory::default();
    writer.register::<ThreeStates>(100).unwrap();
    let mut reader = Fory::default();
    reader.register::<TwoStates>(100).unwrap();
    let bytes = writer.serialize(&ThreeStates::Stopped).unwrap();
    let back: TwoStates = reader.deserialize(&bytes).unwrap();
    assert_eq!(back, TwoStates::Idle);
}
