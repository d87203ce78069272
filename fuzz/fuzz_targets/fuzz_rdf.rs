#![no_main]
use libfuzzer_sys::fuzz_target;
use spdx_doc::codec::{RdfCodec, SpdxCodec};

/// Fuzz the RDF/XML decoder.
///
/// Exercises the streaming event walker both on raw input and with the
/// input embedded inside a well-formed RDF envelope.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let codec = RdfCodec::new();

        // Try raw input
        let _ = codec.decode_str(s);

        // Try embedding inside an RDF envelope
        if s.len() < 10_000 {
            let wrapped = format!(
                "<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\" xmlns:spdx=\"http://spdx.org/rdf/terms#\">{s}</rdf:RDF>",
            );
            let _ = codec.decode_str(&wrapped);
        }
    }
});
