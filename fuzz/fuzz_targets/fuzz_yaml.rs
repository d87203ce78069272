#![no_main]
use libfuzzer_sys::fuzz_target;
use spdx_doc::codec::{SpdxCodec, YamlCodec};

/// Fuzz the YAML decoder.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = YamlCodec::new().decode_str(s);
    }
});
