//! YAML codec.
//!
//! YAML shares the JSON schema (same keys, same shorthand for membership,
//! described packages and nested annotations), so this codec is a thin
//! syntax layer over the wire structs in the JSON codec.

use std::io::Write;

use crate::codec::json::{from_wire, to_wire, WireDocument};
use crate::codec::{
    check_requested_version, finish_decode, FormatConfidence, FormatDetection, SpdxCodec,
};
use crate::error::{EncodeErrorKind, Result, SpdxError};
use crate::model::{Document, SpdxVersion};

const FORMAT: &str = "yaml";

/// Codec for the SPDX YAML format.
#[derive(Debug, Clone, Default)]
pub struct YamlCodec {
    version: Option<SpdxVersion>,
}

impl YamlCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept only documents declaring the given schema version.
    #[must_use]
    pub fn for_version(version: SpdxVersion) -> Self {
        Self {
            version: Some(version),
        }
    }
}

impl SpdxCodec for YamlCodec {
    fn decode_str(&self, content: &str) -> Result<Document> {
        let wire: WireDocument = serde_yaml::from_str(content)?;
        let (doc, facts) = from_wire(wire)?;
        check_requested_version(FORMAT, doc.spec_version, self.version)?;
        finish_decode(doc, facts)
    }

    fn encode(&self, doc: &Document, sink: &mut dyn Write) -> Result<()> {
        let wire = to_wire(doc, FORMAT)?;
        let rendered = serde_yaml::to_string(&wire).map_err(|e| {
            SpdxError::encode(
                FORMAT,
                "document serialization",
                EncodeErrorKind::Serialization(e.to_string()),
            )
        })?;
        sink.write_all(rendered.as_bytes())?;
        Ok(())
    }

    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn detect(&self, content: &str) -> FormatDetection {
        let trimmed = content.trim_start();
        // Braces and angle brackets mean JSON or XML, not YAML.
        if trimmed.starts_with('{') || trimmed.starts_with('<') {
            return FormatDetection::no_match();
        }

        let has_version = content.contains("spdxVersion:");
        let has_id = content.contains("SPDXID:");
        let has_data_license = content.contains("dataLicense:");
        let version = extract_scalar(content, "spdxVersion");

        let detection = if has_version && has_id {
            FormatDetection::with_confidence(FormatConfidence::CERTAIN)
        } else if has_version || (has_id && has_data_license) {
            FormatDetection::with_confidence(FormatConfidence::HIGH)
        } else if has_data_license && content.contains("packages:") {
            FormatDetection::with_confidence(FormatConfidence::MEDIUM)
                .warning("missing spdxVersion field")
        } else {
            return FormatDetection::no_match();
        };

        match version {
            Some(version) => detection.version(&version),
            None => detection,
        }
    }
}

/// Pull a top-level scalar out of raw YAML, quoted or not.
fn extract_scalar(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let rest = line.strip_prefix(key)?.strip_prefix(':')?;
        let value = rest.trim().trim_matches('"').trim_matches('\'');
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::error::FormatErrorKind;
    use crate::model::ElementId;

    const MINIMAL: &str = r#"spdxVersion: SPDX-2.3
dataLicense: CC0-1.0
SPDXID: SPDXRef-DOCUMENT
name: minimal
documentNamespace: https://example.com/spdx/minimal
creationInfo:
  created: "2023-04-01T12:00:00Z"
  creators:
  - "Tool: spdx-doc-0.1"
packages:
- SPDXID: SPDXRef-Package-demo
  name: demo
  downloadLocation: NOASSERTION
  packageVerificationCode:
    packageVerificationCodeValue: d6a770ba38583ed4bb4525bd96e50461655d2758
  hasFiles:
  - SPDXRef-File-main
files:
- SPDXID: SPDXRef-File-main
  fileName: ./src/main.c
  checksums:
  - algorithm: SHA1
    checksumValue: c2b4e1c67a2d28fced849ee1bb76e7391b93eb12
documentDescribes:
- SPDXRef-Package-demo
"#;

    #[test]
    fn test_decode_minimal() {
        let doc = YamlCodec::new().decode_str(MINIMAL).unwrap();
        assert_eq!(doc.spec_version, SpdxVersion::V2_3);
        assert_eq!(doc.packages.len(), 1);
        assert_eq!(doc.files.len(), 1);
        assert_eq!(doc.relationships.len(), 2);
        assert_eq!(
            doc.described_packages(),
            vec![ElementId::new("Package-demo").unwrap()]
        );
    }

    #[test]
    fn test_round_trip_is_fixpoint() {
        let codec = YamlCodec::new();
        let doc = codec.decode_str(MINIMAL).unwrap();
        let encoded = codec.encode_to_string(&doc).unwrap();
        let again = codec.decode_str(&encoded).unwrap();
        assert_eq!(doc.content_digest(), again.content_digest());
    }

    #[test]
    fn test_yaml_and_json_agree() {
        let from_yaml = YamlCodec::new().decode_str(MINIMAL).unwrap();
        let as_json = JsonCodec::new().encode_to_string(&from_yaml).unwrap();
        let from_json = JsonCodec::new().decode_str(&as_json).unwrap();
        assert_eq!(from_yaml.content_digest(), from_json.content_digest());
    }

    #[test]
    fn test_invalid_yaml_is_format_error() {
        let err = YamlCodec::new()
            .decode_str("spdxVersion: [unclosed")
            .unwrap_err();
        assert!(matches!(
            err,
            SpdxError::Decode {
                source: FormatErrorKind::InvalidYaml(_),
                ..
            }
        ));
    }

    #[test]
    fn test_detect_confidence() {
        let codec = YamlCodec::new();
        let detection = codec.detect(MINIMAL);
        assert_eq!(detection.confidence.value(), FormatConfidence::CERTAIN.value());
        assert_eq!(detection.version.as_deref(), Some("SPDX-2.3"));

        // JSON and tag-value content must not look like YAML.
        assert_eq!(
            codec.detect("{\"spdxVersion\": \"SPDX-2.3\"}").confidence.value(),
            FormatConfidence::NONE.value()
        );
        assert_eq!(
            codec.detect("SPDXVersion: SPDX-2.3").confidence.value(),
            FormatConfidence::NONE.value()
        );
    }

    #[test]
    fn test_extract_scalar_handles_quoting() {
        assert_eq!(
            extract_scalar("spdxVersion: SPDX-2.2\n", "spdxVersion").as_deref(),
            Some("SPDX-2.2")
        );
        assert_eq!(
            extract_scalar("spdxVersion: \"SPDX-2.1\"\n", "spdxVersion").as_deref(),
            Some("SPDX-2.1")
        );
        assert_eq!(extract_scalar("name: x\n", "spdxVersion"), None);
    }
}
