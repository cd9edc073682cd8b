#![no_main]

use libfuzzer_sys::fuzz_target;

use drisl::{marshal, unmarshal, Value};

fuzz_target!(|data: &[u8]| {
    // Anything the strict decoder accepts must re-encode to the same bytes.
    if let Ok(v) = unmarshal::<Value>(data) {
        let re_encoded = marshal(&v).expect("decoded value must re-encode");
        assert_eq!(re_encoded, data);
    }
});
