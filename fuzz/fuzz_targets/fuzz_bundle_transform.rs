//! Fuzz target for test bundle transformation.
//!
//! Bundles come from test authors' machines; arbitrary bytes must produce
//! an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mf_bundle::{transform_bytes, TransformOptions};

fuzz_target!(|data: &[u8]| {
    let _ = transform_bytes(data, &TransformOptions::default());
});
