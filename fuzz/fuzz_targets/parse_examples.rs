#![no_main]
use std::str::FromStr;

use libfuzzer_sys::fuzz_target;
use ssa_synth::evaluation::ExampleSuite;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(suite) = ExampleSuite::from_str(s) {
            // Printed suites parse back to the same examples.
            assert_eq!(ExampleSuite::from_str(&suite.to_string()).ok(), Some(suite));
        }
    }
});
