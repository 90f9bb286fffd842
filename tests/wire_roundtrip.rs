//! Binary wire format: round-trips for every declared shape, the field-order
//! invariant, and corruption handling.

use std::collections::{HashMap, HashSet};

use autocodec::{
    CodecError, FieldDescriptor, FieldError, Record, RecordId, Registry, WireError, WireReader,
    WireWriter,
};

#[derive(Debug, PartialEq)]
struct Everything {
    id: RecordId,
    flag: bool,
    count: u32,
    offset: i64,
    ratio: f64,
    name: String,
    tags: Vec<String>,
    codes: HashSet<i32>,
    grid: Box<[u8]>,
    weights: HashMap<String, f32>,
    limits: HashMap<u32, i64>,
}

impl Record for Everything {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::scalar("flag", "flag", |r: &Everything| &r.flag, |r, v| r.flag = v),
            FieldDescriptor::scalar("count", "count", |r: &Everything| &r.count, |r, v| r.count = v),
            FieldDescriptor::scalar("offset", "offset", |r: &Everything| &r.offset, |r, v| r.offset = v),
            FieldDescriptor::scalar("ratio", "ratio", |r: &Everything| &r.ratio, |r, v| r.ratio = v),
            FieldDescriptor::scalar("name", "name", |r: &Everything| &r.name, |r, v| r.name = v),
            FieldDescriptor::list("tags", "tags", |r: &Everything| &r.tags, |r, v| r.tags = v),
            FieldDescriptor::set("codes", "codes", |r: &Everything| &r.codes, |r, v| r.codes = v),
            FieldDescriptor::buffer("grid", "grid", |r: &Everything| &r.grid, |r, v| r.grid = v),
            FieldDescriptor::map("weights", "weights", |r: &Everything| &r.weights, |r, v| r.weights = v),
            FieldDescriptor::map("limits", "limits", |r: &Everything| &r.limits, |r, v| r.limits = v),
        ]
    }
}

fn rid(s: &str) -> RecordId {
    s.parse().expect("record id")
}

fn blank(id: RecordId) -> Everything {
    Everything {
        id,
        flag: false,
        count: 0,
        offset: 0,
        ratio: 0.0,
        name: String::new(),
        tags: Vec::new(),
        codes: HashSet::new(),
        grid: Vec::new().into_boxed_slice(),
        weights: HashMap::new(),
        limits: HashMap::new(),
    }
}

fn everything_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_record_type::<Everything, _>(rid("wiretest:everything"), blank);
    registry
}

fn sample() -> Everything {
    let mut rec = blank(rid("wiretest:sample"));
    rec.flag = true;
    rec.count = 70_000;
    rec.offset = -9_000_000_000;
    rec.ratio = 0.625;
    rec.name = "furnace".to_string();
    rec.tags = vec!["hot".to_string(), "slow".to_string()];
    rec.codes = [3, -7, 40].into_iter().collect();
    rec.grid = vec![9, 8, 7, 6].into_boxed_slice();
    rec.weights = [("coal".to_string(), 0.5f32), ("wood".to_string(), 0.25)]
        .into_iter()
        .collect();
    rec.limits = [(1u32, 100i64), (2, -200)].into_iter().collect();
    rec
}

#[test]
fn roundtrip_every_shape() {
    let registry = everything_registry();
    let original = sample();

    let mut w = WireWriter::new();
    registry.encode_wire(&original, &mut w).expect("encode");
    let bytes = w.into_bytes();

    let mut r = WireReader::new(&bytes);
    let back: Everything = registry
        .decode_wire(rid("wiretest:sample"), &mut r)
        .expect("decode");
    assert_eq!(back, original);
    assert_eq!(r.remaining(), 0);
}

#[test]
fn roundtrip_empty_collections() {
    let registry = everything_registry();
    let original = blank(rid("wiretest:empty"));

    let mut w = WireWriter::new();
    registry.encode_wire(&original, &mut w).expect("encode");
    let bytes = w.into_bytes();

    let back: Everything = registry
        .decode_wire(rid("wiretest:empty"), &mut WireReader::new(&bytes))
        .expect("decode");
    assert_eq!(back, original);
}

#[derive(Debug, PartialEq)]
struct Pair {
    id: RecordId,
    first: u16,
    second: u16,
}

impl Record for Pair {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::scalar("first", "first", |r: &Pair| &r.first, |r, v| r.first = v),
            FieldDescriptor::scalar("second", "second", |r: &Pair| &r.second, |r, v| r.second = v),
        ]
    }
}

#[derive(Debug, PartialEq)]
struct Swapped {
    id: RecordId,
    first: u16,
    second: u16,
}

impl Record for Swapped {
    // Same two fields as Pair, declared in the opposite order.
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::scalar("second", "second", |r: &Swapped| &r.second, |r, v| r.second = v),
            FieldDescriptor::scalar("first", "first", |r: &Swapped| &r.first, |r, v| r.first = v),
        ]
    }
}

#[test]
fn field_order_mismatch_is_silent_corruption() {
    // The wire form carries no field names: decoding with a reordered
    // descriptor list does not fail, it mis-assigns values. This test pins
    // down that fragility rather than fixing it.
    let mut registry = Registry::new();
    registry.register_record_type::<Pair, _>(rid("wiretest:pair"), |id| Pair {
        id,
        first: 0,
        second: 0,
    });
    registry.register_record_type::<Swapped, _>(rid("wiretest:swapped"), |id| Swapped {
        id,
        first: 0,
        second: 0,
    });

    let pair = Pair {
        id: rid("wiretest:a"),
        first: 1,
        second: 2,
    };
    let mut w = WireWriter::new();
    registry.encode_wire(&pair, &mut w).expect("encode");
    let bytes = w.into_bytes();

    let crossed: Swapped = registry
        .decode_wire(rid("wiretest:a"), &mut WireReader::new(&bytes))
        .expect("decode succeeds at the wire level");
    assert_eq!(crossed.second, 1);
    assert_eq!(crossed.first, 2);
}

#[test]
fn truncated_input_is_fatal() {
    let registry = everything_registry();
    let mut w = WireWriter::new();
    registry.encode_wire(&sample(), &mut w).expect("encode");
    let bytes = w.into_bytes();

    let cut = &bytes[..bytes.len() / 2];
    let err = registry
        .decode_wire::<Everything>(rid("wiretest:cut"), &mut WireReader::new(cut))
        .expect_err("decode must fail");
    assert!(matches!(err, CodecError::Field { .. }));
}

#[derive(Debug, PartialEq)]
struct Tagged {
    id: RecordId,
    tags: Vec<String>,
}

impl Record for Tagged {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![FieldDescriptor::list(
            "tags",
            "tags",
            |r: &Tagged| &r.tags,
            |r, v| r.tags = v,
        )]
    }
}

#[test]
fn adversarial_size_prefix_is_rejected() {
    let mut registry = Registry::new();
    registry.register_record_type::<Tagged, _>(rid("wiretest:tagged"), |id| Tagged {
        id,
        tags: Vec::new(),
    });

    // A size prefix claiming u32::MAX elements must fail on the cap, before
    // any allocation in its image.
    let mut w = WireWriter::new();
    w.write_varint(u32::MAX);
    let bytes = w.into_bytes();

    let err = registry
        .decode_wire::<Tagged>(rid("wiretest:evil"), &mut WireReader::new(&bytes))
        .expect_err("decode must fail");
    match err {
        CodecError::Field { field, source, .. } => {
            assert_eq!(field, "tags");
            assert!(matches!(
                source,
                FieldError::Wire(WireError::OversizedLength(_))
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_record_type_is_reported() {
    let registry = Registry::new();
    let err = registry
        .decode_wire::<Tagged>(rid("wiretest:none"), &mut WireReader::new(&[]))
        .expect_err("decode must fail");
    assert!(matches!(err, CodecError::UnknownRecordType(_)));
}
