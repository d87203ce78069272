//! Round-trip and fixture decoding tests across all four serialization formats.
//!
//! Fixtures under `tests/fixtures/` are organized by format. The `minimal`
//! fixtures for tag-value, JSON, and YAML carry identical document content,
//! so their content digests must agree; the RDF minimal fixture exercises the
//! RDF/XML vocabulary and is asserted on its own. The `full` fixtures cover
//! every element kind a 2.3 document can carry.

use std::path::PathBuf;

use spdx_doc::codec::{
    DocumentFormat, FormatConfidence, decode_file, decode_str, detect_format, encode_file,
    encode_str,
};
use spdx_doc::model::{
    Agent, Annotation, AnnotationType, Checksum, ChecksumAlgorithm, CreationInfo, Document,
    DocumentRefId, ElementId, ElementRef, ExternalDocumentRef, ExternalPackageRef,
    ExternalRefCategory, File, FileType, OtherLicense, Package, PackagePurpose,
    PackageVerificationCode, Relationship, RelationshipType, Snippet, SnippetRange, SpdxVersion,
    parse_timestamp,
};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(FIXTURES_DIR).join(relative)
}

fn decode_fixture(relative: &str) -> Document {
    decode_file(&fixture_path(relative))
        .unwrap_or_else(|err| panic!("fixture {relative} should decode: {err}"))
}

fn element_id(token: &str) -> ElementId {
    ElementId::new(token).expect("valid element identifier")
}

/// A document touching every element kind, built through the model API.
fn full_document() -> Document {
    let created = parse_timestamp("2024-03-01T12:00:00Z").expect("valid timestamp");
    let creation = CreationInfo::new(created)
        .with_creator(Agent::Tool("spdx-doc-tests".to_string()))
        .with_creator(Agent::Person("Jane Doe (jane@example.com)".to_string()))
        .with_license_list_version("3.21");

    let mut doc = Document::new("built-example", "https://spdx.example.com/built", creation)
        .with_version(SpdxVersion::V2_3);
    doc.comment = Some("Synthesized for round-trip coverage.\nSecond line.".to_string());

    doc.add_external_document_ref(ExternalDocumentRef::new(
        DocumentRefId::new("toolchain").expect("valid document ref"),
        "https://spdx.example.com/toolchain-1.4",
        Checksum::sha1("d6a770ba38583ed4bb4525bd96e50461655d2759"),
    ));

    let app = element_id("Package-app");
    let main_file = element_id("File-main");
    let vendor_file = element_id("File-vendor");

    let mut package = Package::new(app.clone(), "example-app")
        .with_version("2.0.0")
        .with_download_location("https://example.com/app-2.0.0.tar.gz")
        .with_files_analyzed(true)
        .with_supplier(Agent::Organization("Example Corp".to_string()))
        .with_license_concluded("Apache-2.0")
        .with_license_declared("Apache-2.0")
        .with_verification_code(
            PackageVerificationCode::new("85ed0817af83a24ad8da68c2b5094de69833983c")
                .with_excluded_file("./package.spdx"),
        )
        .with_external_ref(ExternalPackageRef::new(
            ExternalRefCategory::PackageManager,
            "purl",
            "pkg:cargo/example-app@2.0.0",
        ));
    package.originator = Some(Agent::Person("Jane Doe (jane@example.com)".to_string()));
    package.checksums.push(Checksum::new(
        ChecksumAlgorithm::Sha256,
        "11b6d3ee554eedf79299905a98f9b9a04e498210b59f15094c916c91d150efcd",
    ));
    package.home_page = Some("https://example.com/app".to_string());
    package.license_info_from_files.push("Apache-2.0".to_string());
    package
        .license_info_from_files
        .push("LicenseRef-internal-1".to_string());
    package.copyright_text = Some("Copyright 2024 Example Corp".to_string());
    package.summary = Some("Example application.".to_string());
    package.primary_purpose = Some(PackagePurpose::Application);
    package.release_date = Some(parse_timestamp("2024-02-20T00:00:00Z").expect("valid timestamp"));
    doc.add_package(package);

    doc.add_file(
        File::new(main_file.clone(), "./src/main.c")
            .with_file_type(FileType::Source)
            .with_checksum(Checksum::sha1("d6a770ba38583ed4bb4525bd96e50461655d2759"))
            .with_checksum(Checksum::new(
                ChecksumAlgorithm::Md5,
                "624c1abb3664f4b35547e7c73864ad24",
            ))
            .with_license_concluded("Apache-2.0")
            .with_copyright_text("Copyright 2024 Example Corp"),
    );
    doc.add_file(
        File::new(vendor_file.clone(), "./vendor/lib.c")
            .with_checksum(Checksum::sha1("3f786850e387550fdab836ed7e6dc881de23001b"))
            .with_license_concluded("LicenseRef-internal-1"),
    );

    doc.add_snippet(
        Snippet::new(element_id("Snippet-banner"), vendor_file.clone())
            .with_byte_range(310, 420)
            .with_line_range(5, 23)
            .with_license_concluded("MIT"),
    );

    doc.add_other_license(
        OtherLicense::new(
            "LicenseRef-internal-1",
            "Internal use only.\nDo not redistribute.",
        )
        .expect("valid license ref")
        .with_name("Example Internal License")
        .with_cross_reference("https://example.com/licenses/internal"),
    );

    doc.add_annotation(Annotation::new(
        doc.id.clone(),
        Agent::Tool("spdx-doc-tests".to_string()),
        AnnotationType::Other,
        parse_timestamp("2024-03-03T10:00:00Z").expect("valid timestamp"),
        "Inventory spot checked.",
    ));
    doc.add_annotation(Annotation::new(
        app.clone(),
        Agent::Person("Jane Doe (jane@example.com)".to_string()),
        AnnotationType::Review,
        parse_timestamp("2024-03-02T08:30:00Z").expect("valid timestamp"),
        "Reviewed license conclusions.",
    ));

    doc.add_relationship(Relationship::new(
        doc.id.clone(),
        RelationshipType::Describes,
        app.clone(),
    ));
    doc.add_relationship(Relationship::new(
        app.clone(),
        RelationshipType::Contains,
        main_file,
    ));
    doc.add_relationship(Relationship::new(
        app.clone(),
        RelationshipType::Contains,
        vendor_file,
    ));
    doc.add_relationship(
        Relationship::new(
            app,
            RelationshipType::DependsOn,
            "DocumentRef-toolchain:SPDXRef-Package-gcc"
                .parse::<ElementRef>()
                .expect("valid external reference"),
        )
        .with_comment("Built with the pinned toolchain."),
    );

    doc
}

// ============================================================================
// Fixture decoding
// ============================================================================

mod decode_tests {
    use super::*;

    #[test]
    fn test_minimal_tag_value_fixture() {
        let doc = decode_fixture("tagvalue/minimal.spdx");

        assert_eq!(doc.spec_version, SpdxVersion::V2_3);
        assert_eq!(doc.name, "minimal-example");
        assert_eq!(doc.namespace, "https://spdx.example.com/minimal");
        assert_eq!(doc.data_license, "CC0-1.0");
        assert_eq!(doc.packages.len(), 1);
        assert_eq!(doc.files.len(), 0);
        assert_eq!(doc.relationships.len(), 1);

        let package = &doc.packages[0];
        assert_eq!(package.name, "example-app");
        assert_eq!(package.version.as_deref(), Some("1.2.3"));
        assert!(!package.files_analyzed);
        assert_eq!(package.license_concluded.as_deref(), Some("MIT"));

        let described = doc.described_packages();
        assert_eq!(described, vec![element_id("Package-app")]);
    }

    #[test]
    fn test_minimal_json_fixture() {
        let doc = decode_fixture("json/minimal.spdx.json");

        assert_eq!(doc.name, "minimal-example");
        assert_eq!(doc.packages.len(), 1);
        // documentDescribes expands into a DESCRIBES relationship.
        assert_eq!(doc.relationships.len(), 1);
        assert_eq!(
            doc.relationships[0].relationship_type,
            RelationshipType::Describes
        );
        assert_eq!(doc.described_packages(), vec![element_id("Package-app")]);
    }

    #[test]
    fn test_minimal_yaml_fixture() {
        let doc = decode_fixture("yaml/minimal.spdx.yaml");

        assert_eq!(doc.name, "minimal-example");
        assert_eq!(doc.spec_version, SpdxVersion::V2_3);
        assert_eq!(doc.packages.len(), 1);
        assert_eq!(doc.packages[0].version.as_deref(), Some("1.2.3"));
        assert_eq!(doc.described_packages(), vec![element_id("Package-app")]);
    }

    #[test]
    fn test_minimal_rdf_fixture() {
        let doc = decode_fixture("rdf/minimal.spdx.rdf.xml");

        assert_eq!(doc.name, "minimal-example");
        assert_eq!(doc.namespace, "https://spdx.example.com/minimal");
        assert_eq!(doc.packages.len(), 1);
        assert_eq!(doc.files.len(), 1);

        let package = &doc.packages[0];
        assert_eq!(package.name, "example-app");
        assert_eq!(package.version.as_deref(), Some("1.2.3"));
        assert!(package.files_analyzed);
        // License URIs map back to bare identifiers.
        assert_eq!(package.license_concluded.as_deref(), Some("MIT"));
        let code = package
            .verification_code
            .as_ref()
            .expect("verification code present");
        assert_eq!(code.value, "85ed0817af83a24ad8da68c2b5094de69833983c");

        let file = &doc.files[0];
        assert_eq!(file.name, "./src/main.c");
        assert_eq!(file.checksums.len(), 1);
        assert_eq!(file.checksums[0].algorithm, ChecksumAlgorithm::Sha1);

        // describesPackage and hasFile both surface as relationships.
        assert_eq!(doc.relationships.len(), 2);
        assert_eq!(doc.described_packages(), vec![element_id("Package-app")]);
        let membership = doc.file_membership();
        let members = membership
            .get(&element_id("Package-app"))
            .expect("package has membership entry");
        assert!(members.contains(&element_id("File-main")));
    }

    #[test]
    fn test_full_tag_value_fixture() {
        let doc = decode_fixture("tagvalue/full.spdx");

        assert_eq!(doc.name, "full-example");
        let comment = doc.comment.as_deref().expect("document comment present");
        assert!(
            comment.contains('\n'),
            "text block should preserve the line break: {comment:?}"
        );

        assert_eq!(doc.creation_info.creators.len(), 2);
        assert_eq!(doc.creation_info.license_list_version.as_deref(), Some("3.21"));
        assert_eq!(
            doc.creation_info.comment.as_deref(),
            Some("Generated during release packaging.")
        );

        assert_eq!(doc.external_document_refs.len(), 1);
        let ext_doc = &doc.external_document_refs[0];
        assert_eq!(ext_doc.id.to_string(), "DocumentRef-toolchain");
        assert_eq!(ext_doc.checksum.algorithm, ChecksumAlgorithm::Sha1);

        assert_eq!(doc.packages.len(), 1);
        let package = &doc.packages[0];
        assert_eq!(package.file_name.as_deref(), Some("example-app-2.0.0.tar.gz"));
        assert!(matches!(&package.supplier, Some(Agent::Organization(name)) if name == "Example Corp"));
        assert!(package.files_analyzed);
        let code = package
            .verification_code
            .as_ref()
            .expect("verification code present");
        assert_eq!(code.excluded_files, vec!["./package.spdx".to_string()]);
        assert_eq!(package.checksums[0].algorithm, ChecksumAlgorithm::Sha256);
        assert_eq!(package.license_info_from_files.len(), 2);
        assert_eq!(package.primary_purpose, Some(PackagePurpose::Application));
        assert_eq!(
            package.release_date,
            Some(parse_timestamp("2024-02-20T00:00:00Z").expect("valid timestamp"))
        );
        assert_eq!(package.external_refs.len(), 1);
        let ext_ref = &package.external_refs[0];
        assert_eq!(ext_ref.category, ExternalRefCategory::PackageManager);
        assert_eq!(ext_ref.ref_type, "purl");
        assert_eq!(ext_ref.comment.as_deref(), Some("Canonical registry entry."));

        // Files land in the flat document list; membership is derived.
        assert_eq!(doc.files.len(), 2);
        let main_file = &doc.files[0];
        assert_eq!(main_file.file_types, vec![FileType::Source]);
        assert_eq!(main_file.checksums.len(), 2);
        assert_eq!(main_file.contributors, vec!["Jane Doe".to_string()]);

        assert_eq!(doc.snippets.len(), 1);
        let snippet = &doc.snippets[0];
        assert_eq!(snippet.name.as_deref(), Some("banner"));
        assert_eq!(snippet.from_file.to_string(), "SPDXRef-File-vendor");
        assert_eq!(snippet.byte_range, Some(SnippetRange { start: 310, end: 420 }));
        assert_eq!(snippet.line_range, Some(SnippetRange { start: 5, end: 23 }));
        assert_eq!(snippet.license_info_in_snippets, vec!["MIT".to_string()]);

        assert_eq!(doc.other_licenses.len(), 1);
        let license = &doc.other_licenses[0];
        assert_eq!(license.license_id, "LicenseRef-internal-1");
        assert!(license.extracted_text.contains('\n'));
        assert_eq!(license.name.as_deref(), Some("Example Internal License"));
        assert_eq!(license.cross_references.len(), 1);

        assert_eq!(doc.annotations.len(), 1);
        let annotation = &doc.annotations[0];
        assert_eq!(annotation.target.to_string(), "SPDXRef-Package-app");
        assert_eq!(annotation.annotation_type, AnnotationType::Review);

        // Explicit DESCRIBES and DEPENDS_ON plus two derived CONTAINS edges.
        assert_eq!(doc.relationships.len(), 4);
        let depends_on = doc
            .relationships
            .iter()
            .find(|r| r.relationship_type == RelationshipType::DependsOn)
            .expect("DEPENDS_ON relationship present");
        assert_eq!(
            depends_on.ref_b.to_string(),
            "DocumentRef-toolchain:SPDXRef-Package-gcc"
        );
        assert_eq!(
            depends_on.comment.as_deref(),
            Some("Built with the pinned toolchain.")
        );
        let contains_count = doc
            .relationships
            .iter()
            .filter(|r| r.relationship_type == RelationshipType::Contains)
            .count();
        assert_eq!(contains_count, 2);
    }

    #[test]
    fn test_full_json_fixture() {
        let doc = decode_fixture("json/full.spdx.json");

        assert_eq!(doc.name, "full-example");
        assert_eq!(doc.packages.len(), 1);
        assert_eq!(doc.files.len(), 2);
        assert_eq!(doc.snippets.len(), 1);
        assert_eq!(doc.other_licenses.len(), 1);

        // Package-nested annotations are lifted to the document with the
        // package as their target.
        assert_eq!(doc.annotations.len(), 2);
        let package_annotation = doc
            .annotations
            .iter()
            .find(|a| a.target.to_string() == "SPDXRef-Package-app")
            .expect("package annotation present");
        assert_eq!(package_annotation.annotation_type, AnnotationType::Review);
        let doc_annotation = doc
            .annotations
            .iter()
            .find(|a| a.target.to_string() == "SPDXRef-DOCUMENT")
            .expect("document annotation present");
        assert_eq!(doc_annotation.annotation_type, AnnotationType::Other);

        // hasFiles membership becomes CONTAINS, documentDescribes becomes
        // DESCRIBES, and the explicit DEPENDS_ON survives untouched.
        assert_eq!(doc.relationships.len(), 4);
        let membership = doc.file_membership();
        let members = membership
            .get(&element_id("Package-app"))
            .expect("package has membership entry");
        assert_eq!(members.len(), 2);

        let snippet = &doc.snippets[0];
        assert_eq!(snippet.byte_range, Some(SnippetRange { start: 310, end: 420 }));
        assert_eq!(snippet.line_range, Some(SnippetRange { start: 5, end: 23 }));
    }

    #[test]
    fn test_minimal_fixtures_agree_across_formats() {
        // The tag-value, JSON, and YAML minimal fixtures carry the same
        // content, so the digest must not care which format it came from.
        let tag_value = decode_fixture("tagvalue/minimal.spdx");
        let json = decode_fixture("json/minimal.spdx.json");
        let yaml = decode_fixture("yaml/minimal.spdx.yaml");

        assert_eq!(tag_value.content_digest(), json.content_digest());
        assert_eq!(json.content_digest(), yaml.content_digest());
    }

    #[test]
    fn test_fixtures_detect_expected_format() {
        let cases = [
            ("tagvalue/minimal.spdx", DocumentFormat::TagValue),
            ("tagvalue/full.spdx", DocumentFormat::TagValue),
            ("json/minimal.spdx.json", DocumentFormat::Json),
            ("json/full.spdx.json", DocumentFormat::Json),
            ("yaml/minimal.spdx.yaml", DocumentFormat::Yaml),
            ("rdf/minimal.spdx.rdf.xml", DocumentFormat::RdfXml),
        ];

        for (relative, expected) in cases {
            let content = std::fs::read_to_string(fixture_path(relative))
                .unwrap_or_else(|err| panic!("fixture {relative} should be readable: {err}"));
            let detection = detect_format(&content)
                .unwrap_or_else(|| panic!("fixture {relative} should be detectable"));
            assert_eq!(detection.format, Some(expected), "fixture {relative}");
            assert!(
                detection.confidence >= FormatConfidence::HIGH,
                "fixture {relative} detected with {:?}",
                detection.confidence
            );
        }
    }
}

// ============================================================================
// Round trips
// ============================================================================

mod roundtrip_tests {
    use super::*;

    fn assert_fixpoint(doc: &Document, format: DocumentFormat) {
        let encoded = encode_str(doc, format)
            .unwrap_or_else(|err| panic!("{} encode should succeed: {err}", format.name()));
        let decoded = decode_str(&encoded)
            .unwrap_or_else(|err| panic!("{} re-decode should succeed: {err}", format.name()));
        assert_eq!(
            doc.content_digest(),
            decoded.content_digest(),
            "{} round trip changed the document",
            format.name()
        );
    }

    #[test]
    fn test_tag_value_fixture_round_trip() {
        let doc = decode_fixture("tagvalue/full.spdx");
        assert_fixpoint(&doc, DocumentFormat::TagValue);
    }

    #[test]
    fn test_json_fixture_round_trip() {
        let doc = decode_fixture("json/full.spdx.json");
        assert_fixpoint(&doc, DocumentFormat::Json);
    }

    #[test]
    fn test_yaml_fixture_round_trip() {
        let doc = decode_fixture("yaml/minimal.spdx.yaml");
        assert_fixpoint(&doc, DocumentFormat::Yaml);
    }

    #[test]
    fn test_rdf_fixture_round_trip() {
        let doc = decode_fixture("rdf/minimal.spdx.rdf.xml");
        assert_fixpoint(&doc, DocumentFormat::RdfXml);
    }

    #[test]
    fn test_built_document_round_trips_through_every_format() {
        let built = full_document();
        spdx_doc::validate::validate(&built).expect("built document should be valid");

        for format in DocumentFormat::ALL {
            assert_fixpoint(&built, format);
        }
    }

    #[test]
    fn test_built_document_json_round_trip_is_lossless() {
        let built = full_document();
        let encoded = encode_str(&built, DocumentFormat::Json).expect("encode succeeds");
        let decoded = decode_str(&encoded).expect("decode succeeds");

        assert_eq!(built.content_digest(), decoded.content_digest());
        assert_eq!(decoded.packages.len(), 1);
        assert_eq!(decoded.files.len(), 2);
        assert_eq!(decoded.snippets.len(), 1);
        assert_eq!(decoded.annotations.len(), 2);
        assert_eq!(decoded.relationships.len(), 4);
        assert_eq!(decoded.external_document_refs.len(), 1);
    }

    #[test]
    fn test_multi_line_text_survives_tag_value() {
        let built = full_document();
        let encoded = encode_str(&built, DocumentFormat::TagValue).expect("encode succeeds");
        assert!(encoded.contains("<text>"), "multi-line values use text blocks");

        let decoded = decode_str(&encoded).expect("decode succeeds");
        assert_eq!(
            decoded.comment.as_deref(),
            Some("Synthesized for round-trip coverage.\nSecond line.")
        );
        assert_eq!(
            decoded.other_licenses[0].extracted_text,
            "Internal use only.\nDo not redistribute."
        );
    }

    #[test]
    fn test_document_describes_shorthand_matches_explicit_relationship() {
        let shorthand = r#"{
  "spdxVersion": "SPDX-2.3",
  "dataLicense": "CC0-1.0",
  "SPDXID": "SPDXRef-DOCUMENT",
  "name": "shorthand",
  "documentNamespace": "https://spdx.example.com/shorthand",
  "creationInfo": {
    "created": "2024-03-01T12:00:00Z",
    "creators": ["Tool: spdx-doc-tests"]
  },
  "packages": [
    {
      "SPDXID": "SPDXRef-Package-app",
      "name": "example-app",
      "downloadLocation": "NOASSERTION",
      "filesAnalyzed": false
    }
  ],
  "documentDescribes": ["SPDXRef-Package-app"]
}"#;
        let explicit = r#"{
  "spdxVersion": "SPDX-2.3",
  "dataLicense": "CC0-1.0",
  "SPDXID": "SPDXRef-DOCUMENT",
  "name": "shorthand",
  "documentNamespace": "https://spdx.example.com/shorthand",
  "creationInfo": {
    "created": "2024-03-01T12:00:00Z",
    "creators": ["Tool: spdx-doc-tests"]
  },
  "packages": [
    {
      "SPDXID": "SPDXRef-Package-app",
      "name": "example-app",
      "downloadLocation": "NOASSERTION",
      "filesAnalyzed": false
    }
  ],
  "relationships": [
    {
      "spdxElementId": "SPDXRef-DOCUMENT",
      "relationshipType": "DESCRIBES",
      "relatedSpdxElement": "SPDXRef-Package-app"
    }
  ]
}"#;

        let from_shorthand = decode_str(shorthand).expect("shorthand decodes");
        let from_explicit = decode_str(explicit).expect("explicit decodes");

        assert_eq!(from_shorthand.relationships.len(), 1);
        assert_eq!(from_explicit.relationships.len(), 1);
        assert_eq!(
            from_shorthand.content_digest(),
            from_explicit.content_digest()
        );
    }
}

// ============================================================================
// File I/O
// ============================================================================

mod file_io_tests {
    use super::*;

    #[test]
    fn test_encode_file_then_decode_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("built.spdx.yaml");

        let built = full_document();
        encode_file(&built, &path, DocumentFormat::Yaml).expect("encode to file succeeds");

        // decode_file sniffs the content, not the extension.
        let decoded = decode_file(&path).expect("decode from file succeeds");
        assert_eq!(built.content_digest(), decoded.content_digest());
    }

    #[test]
    fn test_decode_file_reports_missing_path() {
        let missing = fixture_path("does-not-exist.spdx");
        let err = decode_file(&missing).expect_err("missing file should error");
        assert!(
            matches!(err, spdx_doc::SpdxError::Io { .. }),
            "unexpected error: {err}"
        );
    }
}
