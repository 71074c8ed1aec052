//! Fuzz target for script framing.
//!
//! Every body line must come back indented and in order; strict-mode
//! checks must never panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mf_bundle::{check_parameters, frame_script};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    body: &'a str,
    test_name: &'a str,
    app_name: &'a str,
    app_id: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let framed = frame_script(input.body, input.test_name, input.app_name, input.app_id);

    let indented: String = input
        .body
        .split_inclusive('\n')
        .map(|line| format!("    {line}"))
        .collect();
    assert!(framed.contains(&indented));

    let _ = check_parameters(input.test_name, input.app_name, input.app_id);
});
