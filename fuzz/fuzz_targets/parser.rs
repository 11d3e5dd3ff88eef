#![no_main]

use libfuzzer_sys::fuzz_target;

// Whatever reads must print back to text that reads as the same thing
fuzz_target!(|source: &str| {
    if let Ok(program) = schemer::parse_all(source) {
        for expr in program {
            let rendered = expr.to_string();
            let reparsed = schemer::parse(&rendered).expect("rendered datum should read back");
            assert_eq!(reparsed.to_string(), rendered);
        }
    }
});
