#![no_main]

use libfuzzer_sys::fuzz_target;

use afinar::pass_order::{Pass, PassOrdering};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Neither the token parser nor entry validation may panic on
        // arbitrary input.
        let _ = Pass::parse(input);

        let tokens: Vec<String> = input.split(',').map(str::to_string).collect();
        let _ = PassOrdering::from_entry("fuzz", &tokens);
    }
});
