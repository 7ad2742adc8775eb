//! Fuzz target: `PackageName` parsing.
//!
//! Accepted names must survive a Display round trip and never contain an
//! empty segment.

#![no_main]

use dedup_core::PackageName;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(name) = text.parse::<PackageName>() else {
        return;
    };
    assert_eq!(name.as_str(), text);
    assert!(name.as_str().split('.').all(|s| !s.is_empty()));
    let again: PackageName = name.to_string().parse().expect("accepted name must reparse");
    assert_eq!(again, name);
});
