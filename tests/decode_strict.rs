//! Negative decoding vectors: every one of these inputs is well-formed CBOR
//! that the strict profile must reject rather than silently normalize.

#![allow(clippy::unwrap_used)]

use drisl::{unmarshal, unmarshal_with, valid, DecOptions, ErrorCode, Value};

fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

fn decode_err(bytes: &[u8]) -> ErrorCode {
    let err = unmarshal::<Value>(bytes).unwrap_err();
    assert!(!valid(bytes));
    err.code
}

#[test]
fn non_minimal_integer_heads() {
    // 0 encoded with a one-byte argument
    assert_eq!(decode_err(&hex("1800")), ErrorCode::NonMinimalHead);
    // 10 encoded as two-byte argument
    assert_eq!(decode_err(&hex("19000a")), ErrorCode::NonMinimalHead);
    // 255 encoded as four-byte argument
    assert_eq!(decode_err(&hex("1a000000ff")), ErrorCode::NonMinimalHead);
    // 500 encoded as eight-byte argument
    assert_eq!(
        decode_err(&hex("1b00000000000001f4")),
        ErrorCode::NonMinimalHead
    );
    // Non-minimal string length head
    assert_eq!(decode_err(&hex("780161")), ErrorCode::NonMinimalHead);
}

#[test]
fn narrow_float_heads() {
    // binary16 1.0
    assert_eq!(decode_err(&hex("f93c00")), ErrorCode::NarrowFloatForbidden);
    // binary32 1.5
    assert_eq!(
        decode_err(&hex("fa3fc00000")),
        ErrorCode::NarrowFloatForbidden
    );
}

#[test]
fn non_finite_floats() {
    // binary64 NaN
    assert_eq!(decode_err(&hex("fb7ff8000000000000")), ErrorCode::InvalidFloat);
    // binary64 +Infinity
    assert_eq!(decode_err(&hex("fb7ff0000000000000")), ErrorCode::InvalidFloat);
    // binary64 -Infinity
    assert_eq!(decode_err(&hex("fbfff0000000000000")), ErrorCode::InvalidFloat);
}

#[test]
fn indefinite_lengths() {
    for bad in ["5fff", "7fff", "9fff", "bfff", "9f01ff"] {
        assert_eq!(
            decode_err(&hex(bad)),
            ErrorCode::IndefiniteLengthForbidden,
            "{bad}"
        );
    }
}

#[test]
fn duplicate_map_keys() {
    assert_eq!(
        decode_err(&hex("a2616101616102")),
        ErrorCode::DuplicateKey
    );
}

#[test]
fn unsorted_map_keys() {
    // {"b": 1, "a": 2}
    assert_eq!(decode_err(&hex("a2616201616102")), ErrorCode::UnsortedKeys);
    // {"aa": 1, "b": 2} is unsorted under bytewise ordering
    assert_eq!(
        decode_err(&hex("a262616101616202")),
        ErrorCode::UnsortedKeys
    );
}

#[test]
fn non_text_map_keys() {
    // {1: 1}
    assert_eq!(decode_err(&hex("a10101")), ErrorCode::InvalidMapKey);
    // {null: 1}
    assert_eq!(decode_err(&hex("a1f601")), ErrorCode::InvalidMapKey);
    // {b"a": 1}
    assert_eq!(decode_err(&hex("a1416101")), ErrorCode::InvalidMapKey);
}

#[test]
fn time_tags_require_explicit_opt_in_that_does_not_exist() {
    // tag 0 ("2013-03-21T20:04:00Z")
    assert_eq!(
        decode_err(&hex("c074323031332d30332d32315432303a30343a30305a")),
        ErrorCode::UnknownTag
    );
    // tag 1 (epoch seconds)
    assert_eq!(decode_err(&hex("c11a514b67b0")), ErrorCode::UnknownTag);
}

#[test]
fn bignum_tags_are_foreign() {
    // tag 2 with a one-byte magnitude
    assert_eq!(decode_err(&hex("c24101")), ErrorCode::UnknownTag);
    // tag 3
    assert_eq!(decode_err(&hex("c34101")), ErrorCode::UnknownTag);
}

#[test]
fn simple_values_other_than_false_true_null() {
    assert_eq!(decode_err(&hex("f7")), ErrorCode::InvalidSimpleValue);
    assert_eq!(decode_err(&hex("f820")), ErrorCode::InvalidSimpleValue);
    assert_eq!(decode_err(&hex("f0")), ErrorCode::InvalidSimpleValue);
}

#[test]
fn undefined_folds_to_null_only_when_allowed() {
    let opts = DecOptions {
        allow_undefined: true,
        ..DecOptions::default()
    };
    let v: Value = unmarshal_with(&hex("f7"), opts).unwrap();
    assert_eq!(v, Value::Null);
    // Undefined is never emitted, so the fold is one-way.
    assert_eq!(drisl::marshal(&v).unwrap(), hex("f6"));
}

#[test]
fn malformed_cids() {
    // tag 42 wrapping a 3-byte digest body
    assert_eq!(decode_err(&hex("d82a4400010203")), ErrorCode::ForbiddenCid);
    // tag 42 without the 0x00 prefix
    assert_eq!(decode_err(&hex("d82a4101")), ErrorCode::UnknownTag);
    // tag 42 wrapping a text string
    assert_eq!(decode_err(&hex("d82a6161")), ErrorCode::UnknownTag);
}

#[test]
fn trailing_data() {
    assert_eq!(decode_err(&hex("f500")), ErrorCode::TrailingData);
    assert_eq!(decode_err(&hex("0101")), ErrorCode::TrailingData);
}

#[test]
fn truncated_items() {
    assert_eq!(decode_err(&hex("8201")), ErrorCode::UnexpectedEnd);
    assert_eq!(decode_err(&hex("61")), ErrorCode::UnexpectedEnd);
    assert_eq!(decode_err(&hex("fb00")), ErrorCode::UnexpectedEnd);
}

#[test]
fn invalid_utf8_text() {
    assert_eq!(decode_err(&hex("61ff")), ErrorCode::InvalidUtf8);
    // invalid UTF-8 in a map key
    assert_eq!(decode_err(&hex("a161ff01")), ErrorCode::InvalidUtf8);
}

#[test]
fn int64_range_only_narrows_decoding() {
    let opts = DecOptions {
        int64_range_only: true,
        ..DecOptions::default()
    };
    // 2^63
    assert_eq!(
        unmarshal_with::<Value>(&hex("1b8000000000000000"), opts)
            .unwrap_err()
            .code,
        ErrorCode::IntegerOutOfRange
    );
    // -(2^63) - 1
    assert_eq!(
        unmarshal_with::<Value>(&hex("3b8000000000000000"), opts)
            .unwrap_err()
            .code,
        ErrorCode::IntegerOutOfRange
    );
    // i64::MAX and i64::MIN still pass
    assert!(unmarshal_with::<Value>(&hex("1b7fffffffffffffff"), opts).is_ok());
    assert!(unmarshal_with::<Value>(&hex("3b7fffffffffffffff"), opts).is_ok());
}

#[test]
fn adapter_narrowing_checks_target_range() {
    // 256 into a u8 target
    assert_eq!(
        unmarshal::<u8>(&hex("190100")).unwrap_err().code,
        ErrorCode::IntegerOverflow
    );
    // -1 into a u64 target
    assert_eq!(
        unmarshal::<u64>(&hex("20")).unwrap_err().code,
        ErrorCode::IntegerOverflow
    );
}

#[test]
fn rfc3339_decoding_is_text_not_tagged() {
    use chrono::{DateTime, FixedOffset};

    // A plain text string binds to a time target...
    let bytes = drisl::marshal("2009-02-13T23:31:30Z").unwrap();
    let t: DateTime<FixedOffset> = unmarshal(&bytes).unwrap();
    assert_eq!(t.timestamp(), 1_234_567_890);

    // ...but a non-time string does not.
    let bytes = drisl::marshal("not a timestamp").unwrap();
    assert!(unmarshal::<DateTime<FixedOffset>>(&bytes).is_err());
}

#[test]
fn null_does_not_bind_to_a_cid_target() {
    assert_eq!(
        unmarshal::<drisl::Cid>(&hex("f6")).unwrap_err().code,
        ErrorCode::TypeMismatch
    );
    assert_eq!(unmarshal::<Option<drisl::Cid>>(&hex("f6")).unwrap(), None);
}
