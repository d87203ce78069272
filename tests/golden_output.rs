//! Golden encode output for the tag-value format.
//!
//! Tag-value is the one serialization with a fully deterministic byte
//! layout (fixed tag order, fixed section order), so it gets snapshot
//! coverage: any drift in the encoder shows up as a snapshot diff rather
//! than as a subtle cross-format disagreement.

use spdx_doc::codec::{DocumentFormat, encode_str};
use spdx_doc::model::{
    Agent, Checksum, ChecksumAlgorithm, CreationInfo, Document, ElementId, File, Package,
    Relationship, RelationshipType, parse_timestamp,
};

fn element_id(token: &str) -> ElementId {
    ElementId::new(token).expect("valid element identifier")
}

fn creation_info() -> CreationInfo {
    let created = parse_timestamp("2024-01-15T10:30:00Z").expect("valid timestamp");
    CreationInfo::new(created).with_creator(Agent::Tool("spdx-doc-tests".to_string()))
}

#[test]
fn golden_tagvalue_minimal() {
    let mut doc = Document::new("snapshot", "https://example.com/spdx/snapshot", creation_info());
    doc.add_package(
        Package::new(element_id("Package-app"), "app")
            .with_version("1.2.3")
            .with_files_analyzed(false),
    );
    doc.add_relationship(Relationship::new(
        doc.id.clone(),
        RelationshipType::Describes,
        element_id("Package-app"),
    ));

    spdx_doc::validate::validate(&doc).expect("document validates");
    let encoded = encode_str(&doc, DocumentFormat::TagValue).expect("encodes");

    insta::assert_snapshot!(encoded, @r"
SPDXVersion: SPDX-2.3
DataLicense: CC0-1.0
SPDXID: SPDXRef-DOCUMENT
DocumentName: snapshot
DocumentNamespace: https://example.com/spdx/snapshot

Creator: Tool: spdx-doc-tests
Created: 2024-01-15T10:30:00Z

PackageName: app
SPDXID: SPDXRef-Package-app
PackageVersion: 1.2.3
PackageDownloadLocation: NOASSERTION
FilesAnalyzed: false

Relationship: SPDXRef-DOCUMENT DESCRIBES SPDXRef-Package-app
");
}

#[test]
fn golden_tagvalue_nests_contained_file() {
    let mut doc = Document::new("golden", "https://example.com/spdx/golden", creation_info());
    doc.add_package(
        Package::new(element_id("Package-app"), "app")
            .with_version("1.2.3")
            .with_download_location("https://example.com/app-1.2.3.tar.gz")
            .with_license_concluded("MIT"),
    );
    doc.add_file(
        File::new(element_id("File-main"), "./src/main.c")
            .with_checksum(Checksum::new(
                ChecksumAlgorithm::Sha1,
                "c2b4e1c67a2d28fced849ee1bb76e7391b93eb12",
            ))
            .with_license_concluded("MIT"),
    );
    doc.add_relationship(Relationship::new(
        doc.id.clone(),
        RelationshipType::Describes,
        element_id("Package-app"),
    ));
    doc.add_relationship(Relationship::new(
        element_id("Package-app"),
        RelationshipType::Contains,
        element_id("File-main"),
    ));

    spdx_doc::validate::validate(&doc).expect("document validates");
    let encoded = encode_str(&doc, DocumentFormat::TagValue).expect("encodes");

    // The CONTAINS edge is expressed by nesting the file under its package,
    // so no Relationship line repeats it.
    insta::assert_snapshot!(encoded, @r"
SPDXVersion: SPDX-2.3
DataLicense: CC0-1.0
SPDXID: SPDXRef-DOCUMENT
DocumentName: golden
DocumentNamespace: https://example.com/spdx/golden

Creator: Tool: spdx-doc-tests
Created: 2024-01-15T10:30:00Z

PackageName: app
SPDXID: SPDXRef-Package-app
PackageVersion: 1.2.3
PackageDownloadLocation: https://example.com/app-1.2.3.tar.gz
PackageLicenseConcluded: MIT

FileName: ./src/main.c
SPDXID: SPDXRef-File-main
FileChecksum: SHA1: c2b4e1c67a2d28fced849ee1bb76e7391b93eb12
LicenseConcluded: MIT

Relationship: SPDXRef-DOCUMENT DESCRIBES SPDXRef-Package-app
");
}
