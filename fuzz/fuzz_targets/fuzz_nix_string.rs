//! Fuzz target: Nix string quoting.
//!
//! The quoted literal must never contain an unescaped interpolation or an
//! unescaped closing quote.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let quoted = dedup_nix::nix_string(text);
    assert!(quoted.starts_with('"') && quoted.ends_with('"'));

    let inner = &quoted[1..quoted.len() - 1];
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => panic!("unescaped quote in {quoted}"),
            '$' => assert_ne!(chars.peek(), Some(&'{'), "unescaped interpolation in {quoted}"),
            _ => {}
        }
    }
});
