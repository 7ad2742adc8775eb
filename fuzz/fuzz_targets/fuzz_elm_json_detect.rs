//! Fuzz target: test framework version detection from `elm.json`.

#![no_main]

use dedup_core::ElmTestVersion;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let version = ElmTestVersion::detect(&text);
    assert!(!version.compilers().is_empty());
});
