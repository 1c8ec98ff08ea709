use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use fory::{Fory, ForyObject};

#[derive(ForyObject, Debug, PartialEq)]
struct PrimitiveRecord {
    id: i32,
    ok: bool,
    ratio: f64,
}

#[derive(ForyObject, Debug, PartialEq)]
struct StreamRecord {
    name: String,
    data: Vec<u8>,
}

#[derive(ForyObject, Debug, PartialEq)]
struct Everything {
    flag: bool,
    tiny: i8,
    small: i16,
    count: u32,
    id: i64,
    ratio: f32,
    name: String,
    tags: Vec<String>,
    scores: Vec<i32>,
    blob: Vec<u8>,
    attrs: HashMap<String, String>,
    maybe_note: Option<String>,
    maybe_count: Option<i32>,
    maybe_big: Option<i64>,
}

fn everything() -> Everything {
    Everything {
        flag: true,
        tiny: -7,
        small: 1234,
        count: 99,
        id: -1_234_567_890_123,
        ratio: 0.5,
        name: "order-book".to_string(),
        tags: vec!["a".to_string(), "b".to_string()],
        scores: vec![3, 1, 4, 1, 5],
        blob: vec![0, 255, 7],
        attrs: HashMap::from([("k".to_string(), "v".to_string())]),
        maybe_note: Some("note".to_string()),
        maybe_count: None,
        maybe_big: Some(1 << 40),
    }
}

#[test]
fn primitive_record_round_trip() {
    let mut fory = Fory::default();
    fory.register::<PrimitiveRecord>(100).unwrap();
    let record = PrimitiveRecord {
        id: 42,
        ok: true,
        ratio: 1.5,
    };
    let bytes = fory.serialize(&record).unwrap();
    let back: PrimitiveRecord = fory.deserialize(&bytes).unwrap();
    assert_eq!(record, back);
}

#[test]
fn primitive_record_wire_layout() {
    // header, language tag, type id 100, 4-byte fingerprint, then the body
    // in size-descending primitive order: ratio, id, ok.
    let mut fory = Fory::default();
    fory.register::<PrimitiveRecord>(100).unwrap();
    let record = PrimitiveRecord {
        id: 42,
        ok: true,
        ratio: 1.5,
    };
    let bytes = fory.serialize(&record).unwrap();
    assert_eq!(bytes.len(), 20);
    // IsLittleEndian | IsXLang.
    assert_eq!(bytes[0], 0b0000_0110);
    // Language::Rust.
    assert_eq!(bytes[1], 5);
    assert_eq!(bytes[2], 100);
    assert_eq!(&bytes[7..15], &1.5f64.to_le_bytes());
    assert_eq!(&bytes[15..19], &42i32.to_le_bytes());
    assert_eq!(bytes[19], 1);
}

#[test]
fn string_and_bytes_round_trip() {
    let mut fory = Fory::default();
    fory.register::<StreamRecord>(101).unwrap();
    let record = StreamRecord {
        name: "Stream Test".to_string(),
        data: vec![1, 2, 3, 4, 5],
    };
    let bytes = fory.serialize(&record).unwrap();
    let back: StreamRecord = fory.deserialize(&bytes).unwrap();
    assert_eq!(back.name, "Stream Test");
    assert_eq!(back.data, vec![1, 2, 3, 4, 5]);
}

#[test]
fn kitchen_sink_round_trip() {
    let mut fory = Fory::default();
    fory.register::<Everything>(110).unwrap();
    let value = everything();
    let bytes = fory.serialize(&value).unwrap();
    let back: Everything = fory.deserialize(&bytes).unwrap();
    assert_eq!(value, back);
}

#[test]
fn declaration_order_does_not_change_the_wire() {
    #[derive(ForyObject, Debug, PartialEq)]
    struct A {
        x: i32,
        y: f64,
    }
    #[derive(ForyObject, Debug, PartialEq)]
    struct B {
        y: f64,
        x: i32,
    }
    let mut fa = Fory::default();
    fa.register::<A>(100).unwrap();
    let mut fb = Fory::default();
    fb.register::<B>(100).unwrap();
    let bytes_a = fa.serialize(&A { x: 7, y: 2.5 }).unwrap();
    let bytes_b = fb.serialize(&B { y: 2.5, x: 7 }).unwrap();
    assert_eq!(bytes_a, bytes_b);
    let cross: B = fb.deserialize(&bytes_a).unwrap();
    assert_eq!(cross, B { y: 2.5, x: 7 });
}

#[test]
fn top_level_collections() {
    let fory = Fory::default();
    let list = vec![1i32, -2, 3];
    let bytes = fory.serialize(&list).unwrap();
    assert_eq!(fory.deserialize::<Vec<i32>>(&bytes).unwrap(), list);

    let strings = vec!["a".to_string(), "".to_string(), "長い".to_string()];
    let bytes = fory.serialize(&strings).unwrap();
    assert_eq!(fory.deserialize::<Vec<String>>(&bytes).unwrap(), strings);

    let set: HashSet<i32> = [5, 6, 7].into_iter().collect();
    let bytes = fory.serialize(&set).unwrap();
    assert_eq!(fory.deserialize::<HashSet<i32>>(&bytes).unwrap(), set);

    let map: HashMap<String, i64> =
        HashMap::from([("a".to_string(), 1i64), ("b".to_string(), -9)]);
    let bytes = fory.serialize(&map).unwrap();
    assert_eq!(fory.deserialize::<HashMap<String, i64>>(&bytes).unwrap(), map);
}

#[test]
fn options_with_nulls_inside_collections() {
    let fory = Fory::default();
    let list = vec![Some(10i32), None, Some(20)];
    let bytes = fory.serialize(&list).unwrap();
    assert_eq!(fory.deserialize::<Vec<Option<i32>>>(&bytes).unwrap(), list);

    let map: HashMap<String, Option<String>> = HashMap::from([
        ("present".to_string(), Some("x".to_string())),
        ("absent".to_string(), None),
    ]);
    let bytes = fory.serialize(&map).unwrap();
    assert_eq!(
        fory.deserialize::<HashMap<String, Option<String>>>(&bytes)
            .unwrap(),
        map
    );
}

#[test]
fn top_level_none_uses_the_header_null_bit() {
    let fory = Fory::default();
    let value: Option<i32> = None;
    let bytes = fory.serialize(&value).unwrap();
    assert_eq!(bytes.len(), 1);
    assert_eq!(bytes[0] & 1, 1);
    assert_eq!(fory.deserialize::<Option<i32>>(&bytes).unwrap(), None);

    let bytes = fory.serialize(&Some(9i32)).unwrap();
    assert_eq!(fory.deserialize::<Option<i32>>(&bytes).unwrap(), Some(9));
}

#[test]
fn tagged_int64_boundaries_round_trip() {
    let fory = Fory::default();
    for v in [
        0i64,
        1,
        -1,
        (1 << 30) - 1,
        -(1 << 30),
        1 << 30,
        i64::MIN,
        i64::MAX,
    ] {
        let bytes = fory.serialize(&v).unwrap();
        assert_eq!(fory.deserialize::<i64>(&bytes).unwrap(), v, "value {v}");
    }
    for v in [0u64, 1, (1 << 31) - 1, 1 << 31, u64::MAX] {
        let bytes = fory.serialize(&v).unwrap();
        assert_eq!(fory.deserialize::<u64>(&bytes).unwrap(), v, "value {v}");
    }
}

#[test]
fn bulk_fast_path_matches_element_loop_bytes() {
    let fory = Fory::default();
    let values = vec![1i32, -40, 0x7FFF_FFFF, -1];
    let bytes = fory.serialize(&values).unwrap();

    // Hand-built equivalent: header, language, INT32_ARRAY tag, length,
    // then one little-endian element at a time.
    let mut expected = fory::buffer::Writer::new();
    expected.u8(0b0000_0110);
    expected.u8(5);
    expected.var_uint32(46);
    expected.var_uint32(values.len() as u32);
    for v in &values {
        expected.i32(*v);
    }
    assert_eq!(bytes, expected.dump());
}

#[test]
fn map_chunk_layout() {
    let mut entries = HashMap::new();
    entries.insert("k1".to_string(), "v1".to_string());
    entries.insert("k2".to_string(), "v2".to_string());
    entries.insert("k3".to_string(), "v3".to_string());
    let fory = Fory::default();
    let bytes = fory.serialize(&entries).unwrap();
    // header, language, MAP tag, entry count, one chunk: header byte with
    // both declared-type bits, size byte 3.
    assert_eq!(bytes[2], 24);
    assert_eq!(bytes[3], 3);
    assert_eq!(bytes[4], 0b10_0100);
    assert_eq!(bytes[5], 3);
    let back: HashMap<String, String> = fory.deserialize(&bytes).unwrap();
    assert_eq!(back, entries);
}

#[test]
fn large_maps_split_into_chunks_of_255() {
    let fory = Fory::default();
    let map: HashMap<i32, i32> = (0..600).map(|i| (i, i * 2)).collect();
    let bytes = fory.serialize(&map).unwrap();
    let back: HashMap<i32, i32> = fory.deserialize(&bytes).unwrap();
    assert_eq!(back, map);
}

#[derive(ForyObject, Debug, PartialEq, Clone, Copy)]
enum Side {
    Buy,
    Sell,
}

#[derive(ForyObject, Debug, PartialEq)]
enum Payload {
    Empty,
    Text(String),
    Number(f64),
    Batch(Vec<i32>),
}

#[test]
fn unit_enum_round_trip() {
    let mut fory = Fory::default();
    fory.register::<Side>(120).unwrap();
    for side in [Side::Buy, Side::Sell] {
        let bytes = fory.serialize(&side).unwrap();
        assert_eq!(fory.deserialize::<Side>(&bytes).unwrap(), side);
    }
}

#[test]
fn union_round_trip() {
    let mut fory = Fory::default();
    fory.register::<Payload>(121).unwrap();
    for value in [
        Payload::Empty,
        Payload::Text("hello".to_string()),
        Payload::Number(-2.25),
        Payload::Batch(vec![1, 2, 3]),
    ] {
        let bytes = fory.serialize(&value).unwrap();
        assert_eq!(fory.deserialize::<Payload>(&bytes).unwrap(), value);
    }
}

#[test]
fn union_rejects_out_of_range_index() {
    let mut fory = Fory::default();
    fory.register::<Payload>(121).unwrap();
    let bytes = fory.serialize(&Payload::Empty).unwrap();
    let mut corrupted = bytes.clone();
    // The arm index is the byte right after the varuint type id.
    let last = corrupted.len() - 1;
    corrupted[last] = 9;
    let err = fory.deserialize::<Payload>(&corrupted).unwrap_err();
    assert!(matches!(err.kind(), fory::ErrorKind::Deserialization(_)));
}

#[derive(ForyObject, Debug, PartialEq)]
struct Scheduled {
    when: NaiveDate,
    grace: Duration,
}

#[test]
fn temporal_round_trip() {
    let mut fory = Fory::default();
    fory.register::<Scheduled>(130).unwrap();
    let value = Scheduled {
        when: NaiveDate::from_ymd_opt(1999, 12, 31).unwrap(),
        grace: Duration::seconds(90) + Duration::nanoseconds(123),
    };
    let bytes = fory.serialize(&value).unwrap();
    assert_eq!(fory.deserialize::<Scheduled>(&bytes).unwrap(), value);
}

#[derive(ForyObject, Debug, PartialEq)]
struct Inner {
    label: String,
    weight: i32,
}

#[derive(ForyObject, Debug, PartialEq)]
struct Outer {
    inner: Inner,
    more: Vec<Inner>,
}

#[test]
fn nested_structs_round_trip() {
    let mut fory = Fory::default();
    fory.register::<Inner>(140).unwrap();
    fory.register::<Outer>(141).unwrap();
    let value = Outer {
        inner: Inner {
            label: "root".to_string(),
            weight: 1,
        },
        more: vec![
            Inner {
                label: "a".to_string(),
                weight: 2,
            },
            Inner {
                label: "b".to_string(),
                weight: 3,
            },
        ],
    };
    let bytes = fory.serialize(&value).unwrap();
    assert_eq!(fory.deserialize::<Outer>(&bytes).unwrap(), value);
}

#[derive(ForyObject, Debug, PartialEq)]
struct Annotated {
    #[fory(compress)]
    count: i32,
    #[fory(encoding = "fixed")]
    stamp: i64,
    #[fory(id = 3)]
    name: String,
    #[fory(ignore)]
    scratch: i32,
}

#[test]
fn annotations_round_trip_and_ignore_resets() {
    let mut fory = Fory::default();
    fory.register::<Annotated>(150).unwrap();
    let value = Annotated {
        count: -300,
        stamp: 1_700_000_000_000,
        name: "tagged".to_string(),
        scratch: 42,
    };
    let bytes = fory.serialize(&value).unwrap();
    let back: Annotated = fory.deserialize(&bytes).unwrap();
    assert_eq!(back.count, -300);
    assert_eq!(back.stamp, 1_700_000_000_000);
    assert_eq!(back.name, "tagged");
    // Ignored fields are not on the wire and come back as defaults.
    assert_eq!(back.scratch, 0);
}

#[derive(ForyObject, Debug, PartialEq)]
struct Chain {
    value: i32,
    next: Option<Box<Chain>>,
}

#[test]
fn boxed_recursion_round_trip() {
    let mut fory = Fory::default();
    fory.register::<Chain>(160).unwrap();
    let chain = Chain {
        value: 1,
        next: Some(Box::new(Chain {
            value: 2,
            next: Some(Box::new(Chain {
                value: 3,
                next: None,
            })),
        })),
    };
    let bytes = fory.serialize(&chain).unwrap();
    assert_eq!(fory.deserialize::<Chain>(&bytes).unwrap(), chain);
}

#[test]
fn named_registration_round_trip() {
    let mut fory = Fory::default();
    fory.register_by_namespace::<PrimitiveRecord>("org.example", "primitive_record")
        .unwrap();
    let record = PrimitiveRecord {
        id: 7,
        ok: false,
        ratio: -0.5,
    };
    let bytes = fory.serialize(&record).unwrap();
    assert_eq!(fory.deserialize::<PrimitiveRecord>(&bytes).unwrap(), record);
}

#[test]
fn registration_is_validated() {
    let mut fory = Fory::default();
    assert!(fory.register::<PrimitiveRecord>(10).is_err());
    fory.register::<PrimitiveRecord>(100).unwrap();
    assert!(fory.register::<PrimitiveRecord>(101).is_err());
    assert!(fory.register::<StreamRecord>(100).is_err());
    assert!(fory
        .register_by_namespace::<StreamRecord>("ns", "bad.name")
        .is_err());
    let auto = fory.register_auto::<StreamRecord>().unwrap();
    assert!(auto >= 64);
}

#[test]
fn fingerprint_mismatch_is_reported() {
    #[derive(ForyObject, Debug, PartialEq)]
    struct V1 {
        a: i32,
    }
    #[derive(ForyObject, Debug, PartialEq)]
    struct V2 {
        a: i32,
        b: Option<String>,
    }
    let mut writer = Fory::default();
    writer.register::<V1>(100).unwrap();
    let mut reader = Fory::default();
    reader.register::<V2>(100).unwrap();
    let bytes = writer.serialize(&V1 { a: 1 }).unwrap();
    let err = reader.deserialize::<V2>(&bytes).unwrap_err();
    match err.kind() {
        fory::ErrorKind::HashMismatch { type_name, .. } => {
            assert_eq!(type_name, "V2");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn compressed_strings_round_trip() {
    let fory = Fory::default().compress_string(true);
    for s in ["latin café", "plain ascii", "日本語テキスト", "astral 𝄞"] {
        let bytes = fory.serialize(&s.to_string()).unwrap();
        assert_eq!(fory.deserialize::<String>(&bytes).unwrap(), s, "{s}");
    }
}

#[test]
fn non_xlang_profile_round_trip() {
    let mut fory = Fory::default().xlang(false);
    fory.register::<Everything>(110).unwrap();
    let value = everything();
    let bytes = fory.serialize(&value).unwrap();
    assert_eq!(fory.deserialize::<Everything>(&bytes).unwrap(), value);
}

#[test]
fn header_bits_must_match_the_reader_profile() {
    let fory = Fory::default();
    let bytes = fory.serialize(&5i32).unwrap();
    let strict = Fory::default().xlang(false);
    assert!(strict.deserialize::<i32>(&bytes).is_err());
}

#[test]
fn serialize_into_reuses_pooled_buffers() {
    let mut pool = fory::BufferPool::new();
    let fory = Fory::default();
    let buf = pool.borrow(1024, false);
    let mut writer = fory::buffer::Writer::from_vec(buf);
    fory.serialize_into(&vec![1i64, 2, 3], &mut writer).unwrap();
    let bytes = writer.dump();
    assert_eq!(fory.deserialize::<Vec<i64>>(&bytes).unwrap(), vec![1, 2, 3]);
    pool.give_back(bytes);
    assert_eq!(pool.pooled_count(), 1);
}
