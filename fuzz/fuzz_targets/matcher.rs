#![no_main]

use libfuzzer_sys::fuzz_target;

use roster_search::{matches, normalize};

fuzz_target!(|data: (&str, &str)| {
    let (haystack, query) = data;

    let normalized = normalize(haystack);
    assert_eq!(normalize(&normalized), normalized);

    assert!(matches(haystack, haystack));
    assert!(matches(haystack, ""));

    let _ = matches(haystack, query);
});
