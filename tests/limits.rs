//! Resource caps enforced at their exact documented boundaries.

#![allow(clippy::unwrap_used)]

use drisl::{unmarshal_with, DecOptions, ErrorCode, Value};

fn nested_arrays(depth: usize) -> Vec<u8> {
    let mut out = vec![0x81; depth.saturating_sub(1)];
    out.push(0x80);
    out
}

#[test]
fn depth_passes_at_cap_and_fails_past_it() {
    let opts = DecOptions {
        max_nested_levels: 8,
        ..DecOptions::default()
    };
    assert!(unmarshal_with::<Value>(&nested_arrays(8), opts).is_ok());
    assert_eq!(
        unmarshal_with::<Value>(&nested_arrays(9), opts)
            .unwrap_err()
            .code,
        ErrorCode::DepthLimitExceeded
    );
}

#[test]
fn tags_count_toward_depth() {
    let opts = DecOptions {
        max_nested_levels: 4,
        ..DecOptions::default()
    };
    // Three arrays wrapping a CID tag: 4 levels, passes.
    let cid = drisl::Cid::hash_bytes(b"x");
    let tagged = drisl::marshal(&cid).unwrap();
    let mut bytes = vec![0x81, 0x81, 0x81];
    bytes.extend_from_slice(&tagged);
    assert!(unmarshal_with::<Value>(&bytes, opts).is_ok());

    // Four arrays wrapping the tag: 5 levels, fails.
    let mut bytes = vec![0x81, 0x81, 0x81, 0x81];
    bytes.extend_from_slice(&tagged);
    assert_eq!(
        unmarshal_with::<Value>(&bytes, opts).unwrap_err().code,
        ErrorCode::DepthLimitExceeded
    );
}

#[test]
fn array_element_cap_is_exact() {
    let opts = DecOptions {
        max_array_elements: 16,
        ..DecOptions::default()
    };
    // Array of exactly 16 small integers.
    let mut ok = vec![0x90];
    ok.extend(std::iter::repeat(0x01).take(16));
    assert!(unmarshal_with::<Value>(&ok, opts).is_ok());

    // 17 elements exceeds the cap before any allocation happens.
    let mut bad = vec![0x91];
    bad.extend(std::iter::repeat(0x01).take(17));
    assert_eq!(
        unmarshal_with::<Value>(&bad, opts).unwrap_err().code,
        ErrorCode::ArrayLimitExceeded
    );
}

#[test]
fn map_pair_cap_is_exact() {
    let opts = DecOptions {
        max_map_pairs: 16,
        ..DecOptions::default()
    };

    let build = |pairs: usize| {
        let mut entries = Vec::new();
        for i in 0..pairs {
            entries.push((format!("k{i:02}"), Value::from(i as i64)));
        }
        let map = Value::Map(drisl::ValueMap::from_entries(entries).unwrap());
        drisl::marshal(&map).unwrap()
    };

    assert!(unmarshal_with::<Value>(&build(16), opts).is_ok());
    assert_eq!(
        unmarshal_with::<Value>(&build(17), opts).unwrap_err().code,
        ErrorCode::MapLimitExceeded
    );
}

#[test]
fn string_lengths_are_bounded_by_the_element_cap() {
    let opts = DecOptions {
        max_array_elements: 16,
        ..DecOptions::default()
    };
    // A 17-byte byte string is over the cap; the length head alone triggers
    // the failure, before the payload is touched.
    let mut bad = vec![0x51];
    bad.extend(std::iter::repeat(0u8).take(17));
    assert_eq!(
        unmarshal_with::<Value>(&bad, opts).unwrap_err().code,
        ErrorCode::BytesLimitExceeded
    );

    let mut bad = vec![0x71];
    bad.extend(std::iter::repeat(b'a').take(17));
    assert_eq!(
        unmarshal_with::<Value>(&bad, opts).unwrap_err().code,
        ErrorCode::TextLimitExceeded
    );
}

#[test]
fn length_hints_are_checked_before_allocation() {
    // An array claiming 2^31-1 elements with a 3-byte body must fail on the
    // cap, not attempt the allocation.
    let bytes = [0x9a, 0x7f, 0xff, 0xff, 0xff, 0x01, 0x01, 0x01];
    let err = unmarshal_with::<Value>(&bytes, DecOptions::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::ArrayLimitExceeded);
}

#[test]
fn out_of_range_options_are_rejected() {
    let opts = DecOptions {
        max_nested_levels: 2,
        ..DecOptions::default()
    };
    assert_eq!(
        unmarshal_with::<Value>(&[0xf5], opts).unwrap_err().code,
        ErrorCode::InvalidOptions
    );
}
