#![no_main]

use libfuzzer_sys::fuzz_target;

use drisl::{validate, DecOptions};

fuzz_target!(|data: &[u8]| {
    // The validator must never panic, whatever the input.
    let opts = DecOptions {
        max_nested_levels: 64,
        ..DecOptions::default()
    };
    let _ = validate(data, &opts);
});
