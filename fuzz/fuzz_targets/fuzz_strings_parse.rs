#![no_main]

use libfuzzer_sys::fuzz_target;
use pkpass_rs::strings;

fuzz_target!(|data: &[u8]| {
    let translations = strings::parse(data);

    // Whatever was parsed must survive a serialize/parse cycle unchanged
    let serialized = strings::serialize(&translations);
    assert_eq!(strings::parse(&serialized), translations);
});
