#![no_main]

use libfuzzer_sys::fuzz_target;

use roster_search::{decode, encode};

fuzz_target!(|data: &str| {
    let rows = decode(data);

    assert_eq!(decode(&encode(&rows)), rows);
});
