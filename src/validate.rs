//! Structural validation of document graphs.
//!
//! The checks run over a fully populated [`Document`] and collect every
//! violation before reporting, so a caller sees the complete picture in one
//! pass instead of fixing errors one at a time. Format loaders run this
//! after parsing; callers assembling documents by hand run it through
//! [`validate`] before trusting the graph.

use indexmap::IndexSet;
use tracing::debug;

use crate::model::{
    Document, DocumentIndex, DocumentRefId, ElementKind, ElementRef, SpdxVersion,
};

pub use crate::error::{ValidationError, ValidationErrorKind};

/// Validate a document's structural invariants.
///
/// Returns every violation found; an `Err` always carries at least one
/// error. Syntax-level problems never reach this layer, so everything
/// reported here is about the graph itself.
pub fn validate(doc: &Document) -> Result<(), Vec<ValidationError>> {
    let index = DocumentIndex::build(doc);
    let mut errors = Vec::new();

    check_identifier_uniqueness(&index, &mut errors);
    check_reference_closure(doc, &index, &mut errors);
    check_files_analyzed(doc, &mut errors);
    check_snippet_containment(doc, &index, &mut errors);
    check_version_fields(doc, &mut errors);

    debug!(
        elements = index.len(),
        errors = errors.len(),
        "structural validation finished"
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_identifier_uniqueness(index: &DocumentIndex, errors: &mut Vec<ValidationError>) {
    for (id, kind) in index.duplicates() {
        errors.push(ValidationError::new(
            ValidationErrorKind::DuplicateIdentifier,
            id.to_string(),
            format!(
                "identifier is declared more than once (later declaration is a {})",
                kind.as_str()
            ),
        ));
    }
}

fn check_reference_closure(
    doc: &Document,
    index: &DocumentIndex,
    errors: &mut Vec<ValidationError>,
) {
    let declared: IndexSet<&DocumentRefId> =
        doc.external_document_refs.iter().map(|r| &r.id).collect();

    for rel in &doc.relationships {
        let site = format!("{} relationship", rel.relationship_type);
        check_reference(&rel.ref_a, &site, &declared, index, errors);
        check_reference(&rel.ref_b, &site, &declared, index, errors);
    }
    for annotation in &doc.annotations {
        check_reference(&annotation.target, "annotation target", &declared, index, errors);
    }
    for snippet in &doc.snippets {
        check_reference(&snippet.from_file, "snippet fromFile", &declared, index, errors);
    }
}

fn check_reference(
    reference: &ElementRef,
    site: &str,
    declared: &IndexSet<&DocumentRefId>,
    index: &DocumentIndex,
    errors: &mut Vec<ValidationError>,
) {
    let ElementRef::Id(id) = reference else {
        return;
    };
    match &id.document_ref {
        Some(doc_ref) => {
            if !declared.contains(doc_ref) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UndeclaredExternalDocument,
                    reference.to_string(),
                    format!(
                        "{site} names external document {doc_ref} which is not listed \
                         in the external document references"
                    ),
                ));
            }
        }
        None => {
            if !index.contains(&id.element) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnresolvedReference,
                    reference.to_string(),
                    format!("{site} names {reference} which no element in this document declares"),
                ));
            }
        }
    }
}

fn check_files_analyzed(doc: &Document, errors: &mut Vec<ValidationError>) {
    let membership = doc.file_membership();
    let described: IndexSet<_> = doc.described_packages().into_iter().collect();

    for package in &doc.packages {
        let file_count = membership.get(&package.id).map_or(0, IndexSet::len);
        if package.files_analyzed {
            if described.contains(&package.id) && file_count == 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InconsistentFilesAnalyzed,
                    package.id.to_string(),
                    "package is described by the document with filesAnalyzed = true \
                     but has no associated files"
                        .to_string(),
                ));
            }
        } else {
            if file_count > 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InconsistentFilesAnalyzed,
                    package.id.to_string(),
                    format!(
                        "package declares filesAnalyzed = false but has {file_count} \
                         associated file(s)"
                    ),
                ));
            }
            if !package.license_info_from_files.is_empty() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InconsistentFilesAnalyzed,
                    package.id.to_string(),
                    "package declares filesAnalyzed = false but lists \
                     licenseInfoFromFiles entries"
                        .to_string(),
                ));
            }
            if package.verification_code.is_some() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InconsistentFilesAnalyzed,
                    package.id.to_string(),
                    "package declares filesAnalyzed = false but carries a package \
                     verification code"
                        .to_string(),
                ));
            }
        }
    }
}

fn check_snippet_containment(
    doc: &Document,
    index: &DocumentIndex,
    errors: &mut Vec<ValidationError>,
) {
    for snippet in &doc.snippets {
        match &snippet.from_file {
            ElementRef::None | ElementRef::NoAssertion => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::OrphanSnippet,
                    snippet.id.to_string(),
                    "snippet fromFile is a sentinel; a snippet must name a file in \
                     the same document"
                        .to_string(),
                ));
            }
            ElementRef::Id(id) if !id.is_local() => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::OrphanSnippet,
                    snippet.id.to_string(),
                    format!(
                        "snippet fromFile points into external document {id}; it must \
                         name a file in the same document"
                    ),
                ));
            }
            ElementRef::Id(id) => match index.kind_of(&id.element) {
                Some(ElementKind::File) | None => {
                    // Undeclared targets were already reported by the
                    // reference-closure check.
                }
                Some(kind) => {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::OrphanSnippet,
                        snippet.id.to_string(),
                        format!("snippet fromFile names a {} element, not a file", kind.as_str()),
                    ));
                }
            },
        }
    }
}

/// Flag document content a declared schema version does not admit.
///
/// Newer vocabulary in an older document is a structural inconsistency the
/// same way a dangling reference is; encoders rely on validated documents
/// never smuggling fields past their version gate.
fn check_version_fields(doc: &Document, errors: &mut Vec<ValidationError>) {
    let version = doc.spec_version;

    for package in &doc.packages {
        if version < SpdxVersion::V2_3 {
            if let Some(purpose) = package.primary_purpose {
                errors.push(version_error(
                    &package.id.to_string(),
                    &format!("primary purpose {purpose}"),
                    version,
                ));
            }
            if package.release_date.is_some()
                || package.built_date.is_some()
                || package.valid_until_date.is_some()
            {
                errors.push(version_error(
                    &package.id.to_string(),
                    "release/built/validUntil dates",
                    version,
                ));
            }
        }
        for checksum in &package.checksums {
            if version < checksum.algorithm.introduced_in() {
                errors.push(version_error(
                    &package.id.to_string(),
                    &format!("checksum algorithm {}", checksum.algorithm),
                    version,
                ));
            }
        }
    }
    for file in &doc.files {
        for checksum in &file.checksums {
            if version < checksum.algorithm.introduced_in() {
                errors.push(version_error(
                    &file.id.to_string(),
                    &format!("checksum algorithm {}", checksum.algorithm),
                    version,
                ));
            }
        }
    }
    for rel in &doc.relationships {
        if version < rel.relationship_type.introduced_in() {
            errors.push(version_error(
                &rel.ref_a.to_string(),
                &format!("relationship type {}", rel.relationship_type),
                version,
            ));
        }
    }
}

fn version_error(reference: &str, what: &str, version: SpdxVersion) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::UnsupportedFieldForVersion,
        reference.to_string(),
        format!("{what} is not admitted by {version}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Agent, Annotation, AnnotationType, Checksum, ChecksumAlgorithm, CreationInfo,
        DocElementId, Document, DocumentRefId, ElementId, ExternalDocumentRef, File, Package,
        PackageVerificationCode, Relationship, RelationshipType, Snippet,
    };
    use chrono::Utc;

    fn eid(token: &str) -> ElementId {
        ElementId::new(token).unwrap()
    }

    fn make_doc() -> Document {
        Document::new(
            "doc",
            "https://example.com/spdx/doc",
            CreationInfo::new(Utc::now()).with_creator(Agent::Tool("spdx-doc".into())),
        )
    }

    fn kinds(errors: &[ValidationError]) -> Vec<ValidationErrorKind> {
        errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_document_passes() {
        let mut doc = make_doc();
        let mut pkg = Package::new(eid("Package-1"), "pkg");
        pkg.verification_code = Some(PackageVerificationCode::new(
            "d6a770ba38583ed4bb4525bd96e50461655d2758",
        ));
        doc.add_package(pkg);
        doc.add_file(File::new(eid("File-1"), "./a.c"));
        doc.add_relationship(Relationship::new(
            ElementId::document(),
            RelationshipType::Describes,
            eid("Package-1"),
        ));
        doc.add_relationship(Relationship::new(
            eid("Package-1"),
            RelationshipType::Contains,
            eid("File-1"),
        ));

        assert!(validate(&doc).is_ok());
    }

    #[test]
    fn test_duplicate_identifier() {
        let mut doc = make_doc();
        doc.add_package(Package::new(eid("Element-1"), "a"));
        doc.add_file(File::new(eid("Element-1"), "./a.c"));
        doc.add_relationship(Relationship::new(
            ElementId::document(),
            RelationshipType::Describes,
            eid("Element-1"),
        ));

        let errors = validate(&doc).unwrap_err();
        assert!(kinds(&errors).contains(&ValidationErrorKind::DuplicateIdentifier));
    }

    #[test]
    fn test_dangling_relationship_endpoint() {
        let mut doc = make_doc();
        doc.add_relationship(Relationship::new(
            ElementId::document(),
            RelationshipType::Describes,
            eid("Package-missing"),
        ));

        let errors = validate(&doc).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::UnresolvedReference]);
        assert!(errors[0].message.contains("SPDXRef-Package-missing"));
    }

    #[test]
    fn test_undeclared_external_document() {
        let mut doc = make_doc();
        doc.add_package(Package::new(eid("Package-1"), "pkg").with_files_analyzed(false));
        doc.add_relationship(Relationship::new(
            ElementId::document(),
            RelationshipType::Describes,
            eid("Package-1"),
        ));
        doc.add_relationship(Relationship::new(
            eid("Package-1"),
            RelationshipType::DependsOn,
            DocElementId::external(
                DocumentRefId::new("other-doc").unwrap(),
                eid("Package-zlib"),
            ),
        ));

        let errors = validate(&doc).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![ValidationErrorKind::UndeclaredExternalDocument]
        );

        // Declaring the external document clears the error.
        doc.add_external_document_ref(ExternalDocumentRef::new(
            DocumentRefId::new("other-doc").unwrap(),
            "https://example.com/spdx/other",
            Checksum::sha1("d6a770ba38583ed4bb4525bd96e50461655d2758"),
        ));
        assert!(validate(&doc).is_ok());
    }

    #[test]
    fn test_files_analyzed_false_with_files() {
        let mut doc = make_doc();
        let mut pkg = Package::new(eid("Package-1"), "pkg").with_files_analyzed(false);
        pkg.license_info_from_files.push("MIT".to_string());
        doc.add_package(pkg);
        doc.add_file(File::new(eid("File-1"), "./a.c"));
        doc.add_relationship(Relationship::new(
            eid("Package-1"),
            RelationshipType::Contains,
            eid("File-1"),
        ));

        let errors = validate(&doc).unwrap_err();
        let inconsistent = errors
            .iter()
            .filter(|e| e.kind == ValidationErrorKind::InconsistentFilesAnalyzed)
            .count();
        assert_eq!(inconsistent, 2);
    }

    #[test]
    fn test_described_package_without_files() {
        let mut doc = make_doc();
        doc.add_package(Package::new(eid("Package-1"), "pkg"));
        doc.add_relationship(Relationship::new(
            ElementId::document(),
            RelationshipType::Describes,
            eid("Package-1"),
        ));

        let errors = validate(&doc).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![ValidationErrorKind::InconsistentFilesAnalyzed]
        );
    }

    #[test]
    fn test_orphan_snippet_variants() {
        let mut doc = make_doc();
        doc.add_package(Package::new(eid("Package-1"), "pkg").with_files_analyzed(false));
        // Snippet pointing at a package rather than a file.
        doc.add_snippet(Snippet::new(eid("Snippet-1"), eid("Package-1")));
        // Snippet pointing at a sentinel.
        doc.add_snippet(Snippet::new(eid("Snippet-2"), ElementRef::NoAssertion));
        doc.add_relationship(Relationship::new(
            ElementId::document(),
            RelationshipType::Describes,
            eid("Package-1"),
        ));

        let errors = validate(&doc).unwrap_err();
        let orphans = errors
            .iter()
            .filter(|e| e.kind == ValidationErrorKind::OrphanSnippet)
            .count();
        assert_eq!(orphans, 2);
    }

    #[test]
    fn test_dangling_snippet_reported_once() {
        let mut doc = make_doc();
        doc.add_snippet(Snippet::new(eid("Snippet-1"), eid("File-missing")));

        let errors = validate(&doc).unwrap_err();
        // Unresolved, not also orphan.
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::UnresolvedReference]);
    }

    #[test]
    fn test_annotation_target_checked() {
        let mut doc = make_doc();
        doc.add_annotation(Annotation::new(
            eid("Package-missing"),
            Agent::Person("Reviewer".into()),
            AnnotationType::Review,
            Utc::now(),
            "looks fine",
        ));

        let errors = validate(&doc).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::UnresolvedReference]);
    }

    #[test]
    fn test_version_gate_on_checksum_algorithm() {
        let mut doc = make_doc().with_version(SpdxVersion::V2_1);
        let mut pkg = Package::new(eid("Package-1"), "pkg").with_files_analyzed(false);
        pkg.checksums.push(Checksum::new(
            ChecksumAlgorithm::Blake3,
            "deadbeef".to_string(),
        ));
        doc.add_package(pkg);
        doc.add_relationship(Relationship::new(
            ElementId::document(),
            RelationshipType::Describes,
            eid("Package-1"),
        ));

        let errors = validate(&doc).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![ValidationErrorKind::UnsupportedFieldForVersion]
        );
    }

    #[test]
    fn test_errors_collected_in_batch() {
        let mut doc = make_doc();
        doc.add_package(Package::new(eid("Package-1"), "a"));
        doc.add_package(Package::new(eid("Package-1"), "b"));
        doc.add_relationship(Relationship::new(
            ElementId::document(),
            RelationshipType::Describes,
            eid("Package-gone"),
        ));
        doc.add_snippet(Snippet::new(eid("Snippet-1"), ElementRef::None));

        let errors = validate(&doc).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
