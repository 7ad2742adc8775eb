//! Fuzz target: sandbox declarations loaded from JSON.
//!
//! Any accepted declaration must describe and render without panicking, and
//! its description must be idempotent.

#![no_main]

use dedup_core::SandboxSpec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(spec) = SandboxSpec::from_json(text) else {
        return;
    };
    let first = spec.describe();
    assert_eq!(first, spec.describe());
    assert!(first.members.len() <= spec.target_packages.len());
    let _ = dedup_nix::render_sandbox(&spec);
});
