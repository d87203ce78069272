#![no_main]
use libfuzzer_sys::fuzz_target;
use spdx_doc::codec::{JsonCodec, SpdxCodec};

/// Fuzz the JSON decoder.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = JsonCodec::new().decode_str(s);
    }
});
