#![allow(clippy::unwrap_used)]

use drisl::{marshal, unmarshal, Cid, Decode, Encode, ErrorCode, Value, ValueMap};

fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

#[derive(Debug, Default, PartialEq, Encode, Decode)]
struct Plain {
    b: bool,
    a: i64,
}

#[test]
fn plain_struct_encodes_as_sorted_map() {
    let bytes = marshal(&Plain { b: true, a: 7 }).unwrap();
    // {"a": 7, "b": true}
    assert_eq!(bytes, hex("a26161076162f5"));
    assert_eq!(unmarshal::<Plain>(&bytes).unwrap(), Plain { b: true, a: 7 });
}

#[derive(Debug, Default, PartialEq, Encode, Decode)]
struct Renamed {
    #[cbor(rename = "content-type")]
    content_type: String,
}

#[test]
fn rename_controls_the_map_key() {
    let v = Renamed {
        content_type: "text/html".into(),
    };
    let bytes = marshal(&v).unwrap();
    let open: Value = unmarshal(&bytes).unwrap();
    assert_eq!(
        open.as_map().unwrap().get("content-type").unwrap(),
        &Value::from("text/html")
    );
    assert_eq!(unmarshal::<Renamed>(&bytes).unwrap(), v);
}

#[derive(Debug, Default, PartialEq, Encode, Decode)]
struct Omits {
    #[cbor(omitempty)]
    count: i64,
    #[cbor(omitempty)]
    name: String,
    #[cbor(omitempty)]
    tags: Vec<String>,
    #[cbor(omitzero)]
    src: Cid,
    always: bool,
}

#[test]
fn omitempty_drops_logically_empty_fields() {
    let bytes = marshal(&Omits::default()).unwrap();
    // Only {"always": false} remains.
    assert_eq!(bytes, hex("a166616c77617973f4"));

    let full = Omits {
        count: 2,
        name: "x".into(),
        tags: vec!["t".into()],
        src: Cid::hash_bytes(b"data"),
        always: true,
    };
    let bytes = marshal(&full).unwrap();
    assert_eq!(unmarshal::<Omits>(&bytes).unwrap(), full);
}

#[test]
fn absent_fields_decode_to_their_zero_values() {
    // {} binds every field to its default.
    let v: Omits = unmarshal(&hex("a0")).unwrap();
    assert_eq!(v, Omits::default());
    assert!(!v.src.defined());
}

#[derive(Debug, Default, PartialEq, Encode, Decode)]
#[cbor(toarray)]
struct Position {
    x: i64,
    y: i64,
    z: i64,
}

#[test]
fn toarray_encodes_declared_field_order() {
    let bytes = marshal(&Position { x: 1, y: 2, z: 3 }).unwrap();
    assert_eq!(bytes, hex("83010203"));
    assert_eq!(
        unmarshal::<Position>(&bytes).unwrap(),
        Position { x: 1, y: 2, z: 3 }
    );
}

#[test]
fn toarray_tolerates_length_differences() {
    // Surplus elements are discarded.
    let v: Position = unmarshal(&hex("8401020304")).unwrap();
    assert_eq!(v, Position { x: 1, y: 2, z: 3 });
    // Missing elements stay zero.
    let v: Position = unmarshal(&hex("820102")).unwrap();
    assert_eq!(v, Position { x: 1, y: 2, z: 0 });
    // A map input does not bind to a toarray record.
    assert_eq!(
        unmarshal::<Position>(&hex("a0")).unwrap_err().code,
        ErrorCode::TypeMismatch
    );
}

#[derive(Debug, Default, PartialEq, Encode, Decode)]
#[cbor(toarray)]
struct Pair(i64, String);

#[test]
fn tuple_structs_use_toarray() {
    let v = Pair(5, "five".into());
    let bytes = marshal(&v).unwrap();
    assert_eq!(bytes, hex("82056466697665"));
    assert_eq!(unmarshal::<Pair>(&bytes).unwrap(), v);
}

#[derive(Debug, Default, PartialEq, Encode, Decode)]
struct WithUnknown {
    known: i64,
    #[cbor(unknown)]
    rest: ValueMap,
}

#[test]
fn unknown_bucket_round_trips_extra_keys() {
    // {"zz": true, "extra": "e", "known": 1} in canonical (bytewise) order.
    let bytes = hex("a3627a7af56565787472616165656b6e6f776e01");
    let v: WithUnknown = unmarshal(&bytes).unwrap();
    assert_eq!(v.known, 1);
    assert_eq!(v.rest.get("extra").unwrap(), &Value::from("e"));
    assert_eq!(v.rest.get("zz").unwrap(), &Value::Bool(true));

    // Unknown keys are re-emitted alongside declared fields, byte-exact.
    assert_eq!(marshal(&v).unwrap(), bytes);
}

#[derive(Debug, Default, PartialEq, Encode, Decode)]
struct WithSkip {
    kept: i64,
    #[cbor(skip)]
    ignored: i64,
}

#[test]
fn skip_never_encodes_or_decodes() {
    let bytes = marshal(&WithSkip { kept: 1, ignored: 9 }).unwrap();
    // {"kept": 1}
    assert_eq!(bytes, hex("a1646b65707401"));

    // Even a wire key named "ignored" does not populate the field:
    // {"kept": 1, "ignored": 5} in canonical order.
    let bytes = hex("a2646b657074016769676e6f72656405");
    let v: WithSkip = unmarshal(&bytes).unwrap();
    assert_eq!(v, WithSkip { kept: 1, ignored: 0 });
}

#[derive(Debug, Default, PartialEq, Encode, Decode)]
struct CaseTarget {
    #[cbor(rename = "Fun")]
    fun: i64,
}

#[test]
fn keys_match_exactly_then_case_insensitively() {
    // Exact key: {"Fun": 3}
    let bytes = marshal(&CaseTarget { fun: 3 }).unwrap();
    assert_eq!(bytes, hex("a16346756e03"));
    assert_eq!(unmarshal::<CaseTarget>(&bytes).unwrap(), CaseTarget { fun: 3 });

    // Case-insensitive fallback: {"fUN": 4}
    let v: CaseTarget = unmarshal(&hex("a16366554e04")).unwrap();
    assert_eq!(v, CaseTarget { fun: 4 });
}

#[derive(Debug, Default, PartialEq, Encode, Decode)]
struct Nested {
    inner: Option<Plain>,
    items: Vec<i64>,
}

#[test]
fn nested_records_round_trip() {
    let v = Nested {
        inner: Some(Plain { b: false, a: -2 }),
        items: vec![1, 2, 3],
    };
    let bytes = marshal(&v).unwrap();
    assert_eq!(unmarshal::<Nested>(&bytes).unwrap(), v);

    // Null binds Option to None.
    let v = Nested {
        inner: None,
        items: Vec::new(),
    };
    let bytes = marshal(&v).unwrap();
    assert_eq!(unmarshal::<Nested>(&bytes).unwrap(), v);
}

#[derive(Debug, Default, PartialEq, Encode, Decode)]
struct Doc<'a> {
    #[cbor(omitempty)]
    title: &'a str,
    body: String,
}

#[test]
fn borrowed_fields_bind_to_the_input_buffer() {
    let bytes = marshal(&Doc {
        title: "t",
        body: "b".into(),
    })
    .unwrap();
    let v: Doc<'_> = unmarshal(&bytes).unwrap();
    assert_eq!(v.title, "t");
    assert_eq!(v.body, "b");
}
