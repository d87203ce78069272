//! The document root: ownership, identity bookkeeping and derivations.

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use xxhash_rust::xxh3::xxh3_64;

use crate::model::annotation::Annotation;
use crate::model::common::{format_timestamp, Agent, Checksum, SpdxVersion};
use crate::model::file::File;
use crate::model::ident::{DocumentRefId, ElementId, ElementRef};
use crate::model::license::OtherLicense;
use crate::model::package::Package;
use crate::model::relationship::{Relationship, RelationshipType};
use crate::model::snippet::Snippet;

/// Data license every SPDX 2.x document carries.
pub const DATA_LICENSE: &str = "CC0-1.0";

/// Who and when a document was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationInfo {
    pub license_list_version: Option<String>,
    pub creators: Vec<Agent>,
    pub created: DateTime<Utc>,
    pub comment: Option<String>,
}

impl CreationInfo {
    #[must_use]
    pub fn new(created: DateTime<Utc>) -> Self {
        Self {
            license_list_version: None,
            creators: Vec::new(),
            created,
            comment: None,
        }
    }

    #[must_use]
    pub fn with_creator(mut self, creator: Agent) -> Self {
        self.creators.push(creator);
        self
    }

    #[must_use]
    pub fn with_license_list_version(mut self, version: impl Into<String>) -> Self {
        self.license_list_version = Some(version.into());
        self
    }
}

/// An entry in the external-document-reference table.
///
/// Scoped references resolve their `DocumentRef-` part against these ids;
/// the checksum pins which bytes the external document is.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalDocumentRef {
    pub id: DocumentRefId,
    pub uri: String,
    pub checksum: Checksum,
}

impl ExternalDocumentRef {
    #[must_use]
    pub fn new(id: DocumentRefId, uri: impl Into<String>, checksum: Checksum) -> Self {
        Self {
            id,
            uri: uri.into(),
            checksum,
        }
    }
}

/// An SPDX document: the root element owning every other element by value.
///
/// The logical graph is link-shaped (relationships and scoped references
/// point at identifiers); ownership stays strictly tree-shaped. Codecs build
/// a document once per load and hand it over complete; there is no partially
/// constructed state to observe.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub spec_version: SpdxVersion,
    /// Always `CC0-1.0` in conforming documents
    pub data_license: String,
    /// Always the local `DOCUMENT` element
    pub id: ElementId,
    pub name: String,
    pub namespace: String,
    pub comment: Option<String>,
    pub creation_info: CreationInfo,
    pub external_document_refs: Vec<ExternalDocumentRef>,
    pub packages: Vec<Package>,
    pub files: Vec<File>,
    pub snippets: Vec<Snippet>,
    pub other_licenses: Vec<OtherLicense>,
    pub annotations: Vec<Annotation>,
    pub relationships: Vec<Relationship>,
}

impl Document {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        creation_info: CreationInfo,
    ) -> Self {
        Self {
            spec_version: SpdxVersion::default(),
            data_license: DATA_LICENSE.to_string(),
            id: ElementId::document(),
            name: name.into(),
            namespace: namespace.into(),
            comment: None,
            creation_info,
            external_document_refs: Vec::new(),
            packages: Vec::new(),
            files: Vec::new(),
            snippets: Vec::new(),
            other_licenses: Vec::new(),
            annotations: Vec::new(),
            relationships: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: SpdxVersion) -> Self {
        self.spec_version = version;
        self
    }

    // ------------------------------------------------------------------
    // Append operations used by format loaders and builders
    // ------------------------------------------------------------------

    pub fn add_package(&mut self, package: Package) {
        self.packages.push(package);
    }

    pub fn add_file(&mut self, file: File) {
        self.files.push(file);
    }

    pub fn add_snippet(&mut self, snippet: Snippet) {
        self.snippets.push(snippet);
    }

    pub fn add_other_license(&mut self, license: OtherLicense) {
        self.other_licenses.push(license);
    }

    pub fn add_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    pub fn add_external_document_ref(&mut self, external_ref: ExternalDocumentRef) {
        self.external_document_refs.push(external_ref);
    }

    // ------------------------------------------------------------------
    // Identity bookkeeping
    // ------------------------------------------------------------------

    /// Every element identifier declared in this document: the document
    /// itself, packages, files (flat and package-nested) and snippets.
    ///
    /// Duplicates collapse here; the validator uses the element index to
    /// see them.
    #[must_use]
    pub fn all_identifiers(&self) -> IndexSet<ElementId> {
        let mut ids = IndexSet::new();
        ids.insert(self.id.clone());
        for package in &self.packages {
            ids.insert(package.id.clone());
            for file in &package.files {
                ids.insert(file.id.clone());
            }
        }
        for file in &self.files {
            ids.insert(file.id.clone());
        }
        for snippet in &self.snippets {
            ids.insert(snippet.id.clone());
        }
        ids
    }

    /// Whether any describes edge touches the document element.
    #[must_use]
    pub fn has_describes_relationship(&self) -> bool {
        self.relationships.iter().any(|rel| {
            (rel.relationship_type == RelationshipType::Describes
                && rel.ref_a.as_local().is_some_and(ElementId::is_document))
                || (rel.relationship_type == RelationshipType::DescribedBy
                    && rel.ref_b.as_local().is_some_and(ElementId::is_document))
        })
    }

    /// The packages this document describes, derived from relationships.
    ///
    /// `DESCRIBES` edges out of the document element and `DESCRIBED_BY`
    /// edges into it both carry the fact. When a document declares no
    /// describes edge at all and holds exactly one package, that package is
    /// described (the legacy primary-package convention of relationship-free
    /// tag-value documents). The result is never stored; every consumer
    /// re-derives it through this call.
    #[must_use]
    pub fn described_packages(&self) -> Vec<ElementId> {
        let mut described: IndexSet<ElementId> = IndexSet::new();
        for rel in &self.relationships {
            match rel.relationship_type {
                RelationshipType::Describes
                    if rel.ref_a.as_local().is_some_and(ElementId::is_document) =>
                {
                    if let Some(target) = rel.ref_b.as_local() {
                        described.insert(target.clone());
                    }
                }
                RelationshipType::DescribedBy
                    if rel.ref_b.as_local().is_some_and(ElementId::is_document) =>
                {
                    if let Some(target) = rel.ref_a.as_local() {
                        described.insert(target.clone());
                    }
                }
                _ => {}
            }
        }

        if described.is_empty() && !self.has_describes_relationship() {
            if let [only] = self.packages.as_slice() {
                described.insert(only.id.clone());
            }
        }

        described.into_iter().collect()
    }

    /// Package-to-file membership, the single source of truth consulted by
    /// the validator and by encoders deriving nested views.
    ///
    /// Unions the relationship spelling (`CONTAINS`/`CONTAINED_BY` between a
    /// local package and a local file) with any legacy nested file lists, so
    /// a file stated both ways counts once.
    #[must_use]
    pub fn file_membership(&self) -> IndexMap<ElementId, IndexSet<ElementId>> {
        let package_ids: IndexSet<&ElementId> = self.packages.iter().map(|p| &p.id).collect();
        let file_ids: IndexSet<&ElementId> = self
            .files
            .iter()
            .map(|f| &f.id)
            .chain(
                self.packages
                    .iter()
                    .flat_map(|p| p.files.iter().map(|f| &f.id)),
            )
            .collect();

        let mut membership: IndexMap<ElementId, IndexSet<ElementId>> = IndexMap::new();
        for package in &self.packages {
            let members = membership.entry(package.id.clone()).or_default();
            for file in &package.files {
                members.insert(file.id.clone());
            }
        }

        for rel in &self.relationships {
            let (package, file) = match rel.relationship_type {
                RelationshipType::Contains => (&rel.ref_a, &rel.ref_b),
                RelationshipType::ContainedBy => (&rel.ref_b, &rel.ref_a),
                _ => continue,
            };
            let (Some(package), Some(file)) = (package.as_local(), file.as_local()) else {
                continue;
            };
            if package_ids.contains(package) && file_ids.contains(file) {
                if let Some(members) = membership.get_mut(package) {
                    members.insert(file.clone());
                }
            }
        }

        membership
    }

    /// Find a flat file record by identifier.
    #[must_use]
    pub fn file(&self, id: &ElementId) -> Option<&File> {
        self.files.iter().find(|f| &f.id == id)
    }

    /// Find a package record by identifier.
    #[must_use]
    pub fn package(&self, id: &ElementId) -> Option<&Package> {
        self.packages.iter().find(|p| &p.id == id)
    }

    // ------------------------------------------------------------------
    // Structural content digest
    // ------------------------------------------------------------------

    /// A digest capturing the document's structural content, stable under
    /// the cosmetic variation codecs introduce (list reordering of unordered
    /// collections, derived-relationship placement).
    ///
    /// Defined over normalized documents (membership in relationships, files
    /// flat); two decoded documents are structurally equivalent exactly when
    /// their digests agree.
    #[must_use]
    pub fn content_digest(&self) -> u64 {
        let mut buf = Vec::new();

        push(&mut buf, "document");
        push(&mut buf, &self.spec_version.to_string());
        push(&mut buf, &self.data_license);
        push(&mut buf, &self.id.to_string());
        push(&mut buf, &self.name);
        push(&mut buf, &self.namespace);
        push_opt(&mut buf, self.comment.as_deref());

        push_opt(&mut buf, self.creation_info.license_list_version.as_deref());
        for creator in &self.creation_info.creators {
            push(&mut buf, &creator.to_string());
        }
        push(&mut buf, &format_timestamp(&self.creation_info.created));
        push_opt(&mut buf, self.creation_info.comment.as_deref());

        let mut external_refs: Vec<&ExternalDocumentRef> =
            self.external_document_refs.iter().collect();
        external_refs.sort_by(|a, b| a.id.cmp(&b.id));
        for external_ref in external_refs {
            push(&mut buf, &external_ref.id.to_string());
            push(&mut buf, &external_ref.uri);
            push(&mut buf, &external_ref.checksum.to_string());
        }

        let mut packages: Vec<&Package> = self.packages.iter().collect();
        packages.sort_by(|a, b| a.id.cmp(&b.id));
        for package in packages {
            digest_package(&mut buf, package);
        }

        let mut files: Vec<&File> = self
            .files
            .iter()
            .chain(self.packages.iter().flat_map(|p| p.files.iter()))
            .collect();
        files.sort_by(|a, b| a.id.cmp(&b.id));
        for file in files {
            digest_file(&mut buf, file);
        }

        let mut snippets: Vec<&Snippet> = self.snippets.iter().collect();
        snippets.sort_by(|a, b| a.id.cmp(&b.id));
        for snippet in snippets {
            digest_snippet(&mut buf, snippet);
        }

        let mut licenses: Vec<&OtherLicense> = self.other_licenses.iter().collect();
        licenses.sort_by(|a, b| a.license_id.cmp(&b.license_id));
        for license in licenses {
            push(&mut buf, "license");
            push(&mut buf, &license.license_id);
            push(&mut buf, &license.extracted_text);
            push_opt(&mut buf, license.name.as_deref());
            push_sorted(&mut buf, &license.cross_references);
            push_opt(&mut buf, license.comment.as_deref());
        }

        let mut annotations: Vec<String> = self
            .annotations
            .iter()
            .map(|a| {
                format!(
                    "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
                    a.target,
                    a.annotator,
                    a.annotation_type,
                    format_timestamp(&a.date),
                    a.comment
                )
            })
            .collect();
        annotations.sort();
        for annotation in annotations {
            push(&mut buf, "annotation");
            push(&mut buf, &annotation);
        }

        let mut relationships: Vec<String> = self
            .relationships
            .iter()
            .map(|r| format!("{r}\u{1f}{}", r.comment.as_deref().unwrap_or_default()))
            .collect();
        relationships.sort();
        for relationship in relationships {
            push(&mut buf, "relationship");
            push(&mut buf, &relationship);
        }

        xxh3_64(&buf)
    }
}

fn push(buf: &mut Vec<u8>, value: &str) {
    buf.extend_from_slice(value.as_bytes());
    buf.push(0x1f);
}

fn push_opt(buf: &mut Vec<u8>, value: Option<&str>) {
    push(buf, value.unwrap_or("\u{0}"));
}

fn push_sorted(buf: &mut Vec<u8>, values: &[String]) {
    let mut sorted: Vec<&String> = values.iter().collect();
    sorted.sort();
    for value in sorted {
        push(buf, value);
    }
}

fn digest_package(buf: &mut Vec<u8>, package: &Package) {
    push(buf, "package");
    push(buf, &package.id.to_string());
    push(buf, &package.name);
    push_opt(buf, package.version.as_deref());
    push_opt(buf, package.file_name.as_deref());
    push_opt(buf, package.supplier.as_ref().map(|a| a.to_string()).as_deref());
    push_opt(buf, package.originator.as_ref().map(|a| a.to_string()).as_deref());
    push(buf, &package.download_location);
    push(buf, if package.files_analyzed { "true" } else { "false" });
    if let Some(code) = &package.verification_code {
        push(buf, &code.value);
        push_sorted(buf, &code.excluded_files);
    }
    let mut checksums: Vec<String> = package.checksums.iter().map(Checksum::to_string).collect();
    checksums.sort();
    for checksum in checksums {
        push(buf, &checksum);
    }
    push_opt(buf, package.home_page.as_deref());
    push_opt(buf, package.source_info.as_deref());
    push_opt(buf, package.license_concluded.as_deref());
    push_sorted(buf, &package.license_info_from_files);
    push_opt(buf, package.license_declared.as_deref());
    push_opt(buf, package.license_comments.as_deref());
    push_opt(buf, package.copyright_text.as_deref());
    push_opt(buf, package.summary.as_deref());
    push_opt(buf, package.description.as_deref());
    push_opt(buf, package.comment.as_deref());
    let mut external_refs: Vec<String> = package
        .external_refs
        .iter()
        .map(|r| {
            format!(
                "{}\u{1f}{}\u{1f}{}\u{1f}{}",
                r.category,
                r.ref_type,
                r.locator,
                r.comment.as_deref().unwrap_or_default()
            )
        })
        .collect();
    external_refs.sort();
    for external_ref in external_refs {
        push(buf, &external_ref);
    }
    for attribution in &package.attribution_texts {
        push(buf, attribution);
    }
    push_opt(buf, package.primary_purpose.map(|p| p.to_string()).as_deref());
    push_opt(buf, package.release_date.as_ref().map(format_timestamp).as_deref());
    push_opt(buf, package.built_date.as_ref().map(format_timestamp).as_deref());
    push_opt(
        buf,
        package.valid_until_date.as_ref().map(format_timestamp).as_deref(),
    );
}

fn digest_file(buf: &mut Vec<u8>, file: &File) {
    push(buf, "file");
    push(buf, &file.id.to_string());
    push(buf, &file.name);
    let mut types: Vec<String> = file.file_types.iter().map(|t| t.to_string()).collect();
    types.sort();
    for file_type in types {
        push(buf, &file_type);
    }
    let mut checksums: Vec<String> = file.checksums.iter().map(Checksum::to_string).collect();
    checksums.sort();
    for checksum in checksums {
        push(buf, &checksum);
    }
    push_opt(buf, file.license_concluded.as_deref());
    push_sorted(buf, &file.license_info_in_files);
    push_opt(buf, file.license_comments.as_deref());
    push_opt(buf, file.copyright_text.as_deref());
    push_opt(buf, file.comment.as_deref());
    push_opt(buf, file.notice_text.as_deref());
    push_sorted(buf, &file.contributors);
    for attribution in &file.attribution_texts {
        push(buf, attribution);
    }
}

fn digest_snippet(buf: &mut Vec<u8>, snippet: &Snippet) {
    push(buf, "snippet");
    push(buf, &snippet.id.to_string());
    push(buf, &snippet.from_file.to_string());
    push_opt(buf, snippet.name.as_deref());
    push_opt(buf, snippet.byte_range.map(|r| r.to_string()).as_deref());
    push_opt(buf, snippet.line_range.map(|r| r.to_string()).as_deref());
    push_opt(buf, snippet.license_concluded.as_deref());
    push_sorted(buf, &snippet.license_info_in_snippets);
    push_opt(buf, snippet.license_comments.as_deref());
    push_opt(buf, snippet.copyright_text.as_deref());
    push_opt(buf, snippet.comment.as_deref());
    for attribution in &snippet.attribution_texts {
        push(buf, attribution);
    }
}
