//! JSON codec.
//!
//! The SPDX JSON shape differs from the model in three ways: membership can
//! be spelled through per-package `hasFiles` lists, the described packages
//! can be spelled through `documentDescribes`, and annotations are nested
//! inside the element they target. Decoding lifts all three into the flat
//! relationship/annotation model; encoding derives them back and drops the
//! relationships the shorthand now carries.
//!
//! The wire structs here also back the YAML codec, which shares the same
//! logical schema with a different surface syntax.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::codec::{
    check_requested_version, finish_decode, normalize, FormatConfidence, FormatDetection,
    SpdxCodec,
};
use crate::error::{EncodeErrorKind, FormatErrorKind, Result, SpdxError};
use crate::model::{
    format_timestamp, parse_timestamp, Agent, Annotation, AnnotationType, Checksum,
    ChecksumAlgorithm, CreationInfo, Document, DocumentRefId, ElementId, ElementRef,
    ExternalDocumentRef, ExternalPackageRef, ExternalRefCategory, File, FileType, OtherLicense,
    Package, PackageVerificationCode, Relationship, RelationshipType, Snippet, SnippetRange,
    SpdxVersion,
};

const FORMAT: &str = "json";

/// Codec for the SPDX JSON format.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    version: Option<SpdxVersion>,
}

impl JsonCodec {
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

impl SpdxCodec for JsonCodec {
    fn decode_str(&self, content: &str) -> Result<Document> {
        let wire: WireDocument = serde_json::from_str(content)?;
        let (doc, facts) = from_wire(wire)?;
        check_requested_version(FORMAT, doc.spec_version, self.version)?;
        finish_decode(doc, facts)
    }

    fn encode(&self, doc: &Document, sink: &mut dyn Write) -> Result<()> {
        let wire = to_wire(doc, FORMAT)?;
        serde_json::to_writer_pretty(&mut *sink, &wire).map_err(|e| {
            SpdxError::encode(
                FORMAT,
                "document serialization",
                EncodeErrorKind::Serialization(e.to_string()),
            )
        })?;
        sink.write_all(b"\n")?;
        Ok(())
    }

    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn detect(&self, content: &str) -> FormatDetection {
        if !content.trim_start().starts_with('{') {
            return FormatDetection::no_match();
        }

        let has_version = content.contains("\"spdxVersion\"");
        let has_id = content.contains("\"SPDXID\"");
        let has_data_license = content.contains("\"dataLicense\"");
        let version = extract_quoted_value(content, "spdxVersion");

        let detection = if has_version && has_id {
            FormatDetection::with_confidence(FormatConfidence::CERTAIN)
        } else if has_version || (has_id && has_data_license) {
            FormatDetection::with_confidence(FormatConfidence::HIGH)
        } else if has_data_license && content.contains("\"packages\"") {
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

/// Pull a quoted scalar out of raw JSON/YAML without parsing it.
pub(crate) fn extract_quoted_value(content: &str, key: &str) -> Option<String> {
    let idx = content.find(&format!("\"{key}\""))?;
    let rest = &content[idx + key.len() + 2..];
    let rest = &rest[rest.find(':')? + 1..];
    let rest = &rest[rest.find('"')? + 1..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

// ============================================================================
// Wire structs
//
// Field names mirror the published JSON schema; values stay strings and are
// converted at the boundary so one malformed record names its field.
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireDocument {
    spdx_version: String,
    data_license: String,
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    document_namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    creation_info: WireCreationInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_document_refs: Option<Vec<WireExternalDocumentRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    packages: Option<Vec<WirePackage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<Vec<WireFile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snippets: Option<Vec<WireSnippet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_extracted_licensing_infos: Option<Vec<WireOtherLicense>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotations: Option<Vec<WireAnnotation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_describes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    relationships: Option<Vec<WireRelationship>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCreationInfo {
    created: String,
    creators: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_list_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireExternalDocumentRef {
    external_document_id: String,
    spdx_document: String,
    checksum: WireChecksum,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireChecksum {
    algorithm: String,
    checksum_value: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePackage {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    package_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    originator: Option<String>,
    download_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files_analyzed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    package_verification_code: Option<WireVerificationCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checksums: Option<Vec<WireChecksum>>,
    #[serde(rename = "homepage", skip_serializing_if = "Option::is_none")]
    home_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_concluded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_info_from_files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_declared: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    copyright_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_refs: Option<Vec<WireExternalRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribution_texts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_package_purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    built_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_until_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotations: Option<Vec<WireAnnotation>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVerificationCode {
    package_verification_code_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    package_verification_code_excluded_files: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireExternalRef {
    reference_category: String,
    reference_type: String,
    reference_locator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFile {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checksums: Option<Vec<WireChecksum>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_concluded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_info_in_files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    copyright_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_contributors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribution_texts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotations: Option<Vec<WireAnnotation>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSnippet {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    snippet_from_file: String,
    ranges: Vec<WireRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_concluded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_info_in_snippets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    copyright_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribution_texts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotations: Option<Vec<WireAnnotation>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRange {
    start_pointer: WirePointer,
    end_pointer: WirePointer,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePointer {
    reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line_number: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOtherLicense {
    license_id: String,
    extracted_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    see_alsos: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnnotation {
    annotation_date: String,
    annotation_type: String,
    annotator: String,
    comment: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRelationship {
    spdx_element_id: String,
    relationship_type: String,
    related_spdx_element: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

// ============================================================================
// Wire -> model
// ============================================================================

// Value-level conversion errors carry the generic "SPDX" label like the
// model's own FromStr impls; syntax errors stay codec-labelled.
fn invalid_value(context: &str, field: &str, message: impl Into<String>) -> SpdxError {
    SpdxError::decode(
        "SPDX",
        context,
        FormatErrorKind::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        },
    )
}

fn parse_date(value: &str, ctx: &str, field: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    parse_timestamp(value)
        .map_err(|_| invalid_value(ctx, field, format!("invalid timestamp '{value}'")))
}

fn parse_agent(value: &str, ctx: &str, field: &str) -> Result<Agent> {
    value
        .parse::<Agent>()
        .map_err(|_| invalid_value(ctx, field, format!("unparseable agent '{value}'")))
}

impl WireChecksum {
    fn into_model(self, ctx: &str) -> Result<Checksum> {
        let algorithm = self.algorithm.parse::<ChecksumAlgorithm>().map_err(|_| {
            invalid_value(ctx, "algorithm", format!("unknown algorithm '{}'", self.algorithm))
        })?;
        Ok(Checksum::new(algorithm, self.checksum_value))
    }

    fn from_model(checksum: &Checksum) -> Self {
        Self {
            algorithm: checksum.algorithm.to_string(),
            checksum_value: checksum.value.clone(),
        }
    }
}

impl WireAnnotation {
    fn into_model(self, target: ElementRef, ctx: &str) -> Result<Annotation> {
        let date = parse_date(&self.annotation_date, ctx, "annotationDate")?;
        let annotation_type = self.annotation_type.parse::<AnnotationType>().map_err(|_| {
            invalid_value(
                ctx,
                "annotationType",
                format!("unknown annotation type '{}'", self.annotation_type),
            )
        })?;
        let annotator = parse_agent(&self.annotator, ctx, "annotator")?;
        Ok(Annotation::new(target, annotator, annotation_type, date, self.comment))
    }

    fn from_model(annotation: &Annotation) -> Self {
        Self {
            annotation_date: format_timestamp(&annotation.date),
            annotation_type: annotation.annotation_type.to_string(),
            annotator: annotation.annotator.to_string(),
            comment: annotation.comment.clone(),
        }
    }
}

/// Convert the wire document into a model document plus the shorthand facts
/// (`hasFiles`, `documentDescribes`, nested annotations already lifted).
pub(crate) fn from_wire(
    wire: WireDocument,
) -> Result<(Document, normalize::DerivedFacts)> {
    let ctx = "document header";
    let version = wire.spdx_version.parse::<SpdxVersion>()?;
    let doc_id = wire.spdx_id.parse::<ElementId>()?;
    let created = parse_date(&wire.creation_info.created, ctx, "created")?;

    let mut creation_info = CreationInfo::new(created);
    creation_info.license_list_version = wire.creation_info.license_list_version;
    creation_info.comment = wire.creation_info.comment;
    for creator in wire.creation_info.creators {
        creation_info
            .creators
            .push(parse_agent(&creator, ctx, "creators")?);
    }

    let mut doc =
        Document::new(wire.name, wire.document_namespace, creation_info).with_version(version);
    doc.data_license = wire.data_license;
    doc.id = doc_id;
    doc.comment = wire.comment;

    for external_ref in wire.external_document_refs.unwrap_or_default() {
        let id = external_ref.external_document_id.parse::<DocumentRefId>()?;
        let checksum = external_ref.checksum.into_model("externalDocumentRefs")?;
        doc.add_external_document_ref(ExternalDocumentRef::new(
            id,
            external_ref.spdx_document,
            checksum,
        ));
    }

    let mut facts = normalize::DerivedFacts::new();
    let mut annotations: Vec<Annotation> = Vec::new();

    for wire_pkg in wire.packages.unwrap_or_default() {
        let (pkg, has_files, pkg_annotations) = wire_pkg.into_model()?;
        for file_ref in has_files {
            facts.contains.push((pkg.id.clone(), file_ref));
        }
        annotations.extend(pkg_annotations);
        doc.add_package(pkg);
    }

    for wire_file in wire.files.unwrap_or_default() {
        let (file, file_annotations) = wire_file.into_model()?;
        annotations.extend(file_annotations);
        doc.add_file(file);
    }

    for wire_snippet in wire.snippets.unwrap_or_default() {
        let (snippet, snippet_annotations) = wire_snippet.into_model()?;
        annotations.extend(snippet_annotations);
        doc.add_snippet(snippet);
    }

    for wire_license in wire.has_extracted_licensing_infos.unwrap_or_default() {
        let mut license = OtherLicense::new(wire_license.license_id, wire_license.extracted_text)?;
        license.name = wire_license.name;
        license.cross_references = wire_license.see_alsos.unwrap_or_default();
        license.comment = wire_license.comment;
        doc.add_other_license(license);
    }

    for wire_annotation in wire.annotations.unwrap_or_default() {
        let target = ElementRef::local(doc.id.clone());
        annotations.push(wire_annotation.into_model(target, "document annotations")?);
    }
    doc.annotations = annotations;

    for described in wire.document_describes.unwrap_or_default() {
        facts.describes.push(described.parse::<ElementRef>()?);
    }

    for wire_rel in wire.relationships.unwrap_or_default() {
        let ctx = "relationships";
        let ref_a = wire_rel.spdx_element_id.parse::<ElementRef>()?;
        let relationship_type = wire_rel
            .relationship_type
            .parse::<RelationshipType>()
            .map_err(|_| {
                invalid_value(
                    ctx,
                    "relationshipType",
                    format!("unknown relationship type '{}'", wire_rel.relationship_type),
                )
            })?;
        let ref_b = wire_rel.related_spdx_element.parse::<ElementRef>()?;
        let mut rel = Relationship::new(ref_a, relationship_type, ref_b);
        rel.comment = wire_rel.comment;
        doc.add_relationship(rel);
    }

    Ok((doc, facts))
}

impl WirePackage {
    fn into_model(self) -> Result<(Package, Vec<ElementId>, Vec<Annotation>)> {
        let ctx = format!("package '{}'", self.name);
        let id = self.spdx_id.parse::<ElementId>()?;
        let mut pkg = Package::new(id, self.name);
        pkg.version = self.version_info;
        pkg.file_name = self.package_file_name;
        pkg.supplier = self
            .supplier
            .map(|s| parse_agent(&s, &ctx, "supplier"))
            .transpose()?;
        pkg.originator = self
            .originator
            .map(|s| parse_agent(&s, &ctx, "originator"))
            .transpose()?;
        if let Some(location) = self.download_location {
            pkg.download_location = location;
        }
        pkg.files_analyzed = self.files_analyzed.unwrap_or(true);
        if let Some(code) = self.package_verification_code {
            let mut verification = PackageVerificationCode::new(code.package_verification_code_value);
            verification.excluded_files =
                code.package_verification_code_excluded_files.unwrap_or_default();
            pkg.verification_code = Some(verification);
        }
        for checksum in self.checksums.unwrap_or_default() {
            pkg.checksums.push(checksum.into_model(&ctx)?);
        }
        pkg.home_page = self.home_page;
        pkg.source_info = self.source_info;
        pkg.license_concluded = self.license_concluded;
        pkg.license_info_from_files = self.license_info_from_files.unwrap_or_default();
        pkg.license_declared = self.license_declared;
        pkg.license_comments = self.license_comments;
        pkg.copyright_text = self.copyright_text;
        pkg.summary = self.summary;
        pkg.description = self.description;
        pkg.comment = self.comment;
        for external_ref in self.external_refs.unwrap_or_default() {
            let category = external_ref
                .reference_category
                .parse::<ExternalRefCategory>()
                .map_err(|_| {
                    invalid_value(
                        &ctx,
                        "referenceCategory",
                        format!("unknown category '{}'", external_ref.reference_category),
                    )
                })?;
            let mut model_ref = ExternalPackageRef::new(
                category,
                external_ref.reference_type,
                external_ref.reference_locator,
            );
            model_ref.comment = external_ref.comment;
            pkg.external_refs.push(model_ref);
        }
        pkg.attribution_texts = self.attribution_texts.unwrap_or_default();
        if let Some(purpose) = self.primary_package_purpose {
            pkg.primary_purpose = Some(purpose.parse().map_err(|_| {
                invalid_value(&ctx, "primaryPackagePurpose", format!("unknown purpose '{purpose}'"))
            })?);
        }
        pkg.release_date = self
            .release_date
            .map(|d| parse_date(&d, &ctx, "releaseDate"))
            .transpose()?;
        pkg.built_date = self
            .built_date
            .map(|d| parse_date(&d, &ctx, "builtDate"))
            .transpose()?;
        pkg.valid_until_date = self
            .valid_until_date
            .map(|d| parse_date(&d, &ctx, "validUntilDate"))
            .transpose()?;

        let mut has_files = Vec::new();
        for file_ref in self.has_files.unwrap_or_default() {
            has_files.push(file_ref.parse::<ElementId>()?);
        }
        let mut annotations = Vec::new();
        for annotation in self.annotations.unwrap_or_default() {
            let target = ElementRef::local(pkg.id.clone());
            annotations.push(annotation.into_model(target, &ctx)?);
        }

        Ok((pkg, has_files, annotations))
    }
}

impl WireFile {
    fn into_model(self) -> Result<(File, Vec<Annotation>)> {
        let ctx = format!("file '{}'", self.file_name);
        let id = self.spdx_id.parse::<ElementId>()?;
        let mut file = File::new(id, self.file_name);
        for file_type in self.file_types.unwrap_or_default() {
            file.file_types.push(file_type.parse::<FileType>().map_err(|_| {
                invalid_value(&ctx, "fileTypes", format!("unknown file type '{file_type}'"))
            })?);
        }
        for checksum in self.checksums.unwrap_or_default() {
            file.checksums.push(checksum.into_model(&ctx)?);
        }
        file.license_concluded = self.license_concluded;
        file.license_info_in_files = self.license_info_in_files.unwrap_or_default();
        file.license_comments = self.license_comments;
        file.copyright_text = self.copyright_text;
        file.comment = self.comment;
        file.notice_text = self.notice_text;
        file.contributors = self.file_contributors.unwrap_or_default();
        file.attribution_texts = self.attribution_texts.unwrap_or_default();

        let mut annotations = Vec::new();
        for annotation in self.annotations.unwrap_or_default() {
            let target = ElementRef::local(file.id.clone());
            annotations.push(annotation.into_model(target, &ctx)?);
        }
        Ok((file, annotations))
    }
}

impl WireSnippet {
    fn into_model(self) -> Result<(Snippet, Vec<Annotation>)> {
        let ctx = format!("snippet '{}'", self.spdx_id);
        let id = self.spdx_id.parse::<ElementId>()?;
        let from_file = self.snippet_from_file.parse::<ElementRef>()?;
        let mut snippet = Snippet::new(id, from_file);
        snippet.name = self.name;
        for range in self.ranges {
            let start = &range.start_pointer;
            let end = &range.end_pointer;
            match (start.offset, end.offset, start.line_number, end.line_number) {
                (Some(start), Some(end), _, _) => {
                    snippet.byte_range = Some(SnippetRange { start, end });
                }
                (_, _, Some(start), Some(end)) => {
                    snippet.line_range = Some(SnippetRange { start, end });
                }
                _ => {
                    return Err(invalid_value(
                        &ctx,
                        "ranges",
                        "range pointers carry neither offsets nor line numbers",
                    ));
                }
            }
        }
        snippet.license_concluded = self.license_concluded;
        snippet.license_info_in_snippets = self.license_info_in_snippets.unwrap_or_default();
        snippet.license_comments = self.license_comments;
        snippet.copyright_text = self.copyright_text;
        snippet.comment = self.comment;
        snippet.attribution_texts = self.attribution_texts.unwrap_or_default();

        let mut annotations = Vec::new();
        for annotation in self.annotations.unwrap_or_default() {
            let target = ElementRef::local(snippet.id.clone());
            annotations.push(annotation.into_model(target, &ctx)?);
        }
        Ok((snippet, annotations))
    }
}

// ============================================================================
// Model -> wire
// ============================================================================

/// Convert a validated document into the wire shape, deriving `hasFiles`,
/// `documentDescribes` and nested annotations.
pub(crate) fn to_wire(doc: &Document, format: &str) -> Result<WireDocument> {
    let membership = doc.file_membership();
    let membership_pairs = normalize::membership_pairs(doc);
    let mut annotations = normalize::annotations_by_target(doc, format)?;

    let packages: Vec<WirePackage> = doc
        .packages
        .iter()
        .map(|pkg| {
            let has_files: Vec<String> = membership
                .get(&pkg.id)
                .map(|members| members.iter().map(ElementId::to_string).collect())
                .unwrap_or_default();
            let nested = annotations.shift_remove(&pkg.id).unwrap_or_default();
            WirePackage::from_model(pkg, has_files, &nested)
        })
        .collect();

    let files: Vec<WireFile> = normalize::all_files(doc)
        .into_iter()
        .map(|file| {
            let nested = annotations.shift_remove(&file.id).unwrap_or_default();
            WireFile::from_model(file, &nested)
        })
        .collect();

    let snippets: Vec<WireSnippet> = doc
        .snippets
        .iter()
        .map(|snippet| {
            let nested = annotations.shift_remove(&snippet.id).unwrap_or_default();
            WireSnippet::from_model(snippet, &nested)
        })
        .collect();

    let licenses: Vec<WireOtherLicense> = doc
        .other_licenses
        .iter()
        .map(|license| WireOtherLicense {
            license_id: license.license_id.clone(),
            extracted_text: license.extracted_text.clone(),
            name: license.name.clone(),
            see_alsos: non_empty(license.cross_references.clone()),
            comment: license.comment.clone(),
        })
        .collect();

    let document_annotations = annotations.shift_remove(&doc.id).unwrap_or_default();
    if let Some((target, _)) = annotations.first() {
        return Err(SpdxError::encode(
            format,
            "annotation placement",
            EncodeErrorKind::UnrepresentableAnnotation {
                target: target.to_string(),
            },
        ));
    }

    let describes: Vec<String> = normalize::describes_list(doc)
        .iter()
        .map(ElementId::to_string)
        .collect();

    let relationships: Vec<WireRelationship> = doc
        .relationships
        .iter()
        .filter(|rel| {
            !normalize::expressed_by_nesting(rel, &membership_pairs)
                && !normalize::expressed_by_describes_list(rel)
        })
        .map(|rel| WireRelationship {
            spdx_element_id: rel.ref_a.to_string(),
            relationship_type: rel.relationship_type.to_string(),
            related_spdx_element: rel.ref_b.to_string(),
            comment: rel.comment.clone(),
        })
        .collect();

    Ok(WireDocument {
        spdx_version: doc.spec_version.to_string(),
        data_license: doc.data_license.clone(),
        spdx_id: doc.id.to_string(),
        name: doc.name.clone(),
        document_namespace: doc.namespace.clone(),
        comment: doc.comment.clone(),
        creation_info: WireCreationInfo {
            created: format_timestamp(&doc.creation_info.created),
            creators: doc
                .creation_info
                .creators
                .iter()
                .map(Agent::to_string)
                .collect(),
            license_list_version: doc.creation_info.license_list_version.clone(),
            comment: doc.creation_info.comment.clone(),
        },
        external_document_refs: non_empty(
            doc.external_document_refs
                .iter()
                .map(|external_ref| WireExternalDocumentRef {
                    external_document_id: external_ref.id.to_string(),
                    spdx_document: external_ref.uri.clone(),
                    checksum: WireChecksum::from_model(&external_ref.checksum),
                })
                .collect(),
        ),
        packages: non_empty(packages),
        files: non_empty(files),
        snippets: non_empty(snippets),
        has_extracted_licensing_infos: non_empty(licenses),
        annotations: non_empty(
            document_annotations
                .iter()
                .map(WireAnnotation::from_model)
                .collect(),
        ),
        document_describes: non_empty(describes),
        relationships: non_empty(relationships),
    })
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

impl WirePackage {
    fn from_model(pkg: &Package, has_files: Vec<String>, nested: &[Annotation]) -> Self {
        Self {
            spdx_id: pkg.id.to_string(),
            name: pkg.name.clone(),
            version_info: pkg.version.clone(),
            package_file_name: pkg.file_name.clone(),
            supplier: pkg.supplier.as_ref().map(Agent::to_string),
            originator: pkg.originator.as_ref().map(Agent::to_string),
            download_location: Some(pkg.download_location.clone()),
            files_analyzed: Some(pkg.files_analyzed),
            package_verification_code: pkg.verification_code.as_ref().map(|code| {
                WireVerificationCode {
                    package_verification_code_value: code.value.clone(),
                    package_verification_code_excluded_files: non_empty(
                        code.excluded_files.clone(),
                    ),
                }
            }),
            checksums: non_empty(pkg.checksums.iter().map(WireChecksum::from_model).collect()),
            home_page: pkg.home_page.clone(),
            source_info: pkg.source_info.clone(),
            license_concluded: pkg.license_concluded.clone(),
            license_info_from_files: non_empty(pkg.license_info_from_files.clone()),
            license_declared: pkg.license_declared.clone(),
            license_comments: pkg.license_comments.clone(),
            copyright_text: pkg.copyright_text.clone(),
            summary: pkg.summary.clone(),
            description: pkg.description.clone(),
            comment: pkg.comment.clone(),
            external_refs: non_empty(
                pkg.external_refs
                    .iter()
                    .map(|external_ref| WireExternalRef {
                        reference_category: external_ref.category.to_string(),
                        reference_type: external_ref.ref_type.clone(),
                        reference_locator: external_ref.locator.clone(),
                        comment: external_ref.comment.clone(),
                    })
                    .collect(),
            ),
            attribution_texts: non_empty(pkg.attribution_texts.clone()),
            primary_package_purpose: pkg.primary_purpose.map(|p| p.to_string()),
            release_date: pkg.release_date.as_ref().map(format_timestamp),
            built_date: pkg.built_date.as_ref().map(format_timestamp),
            valid_until_date: pkg.valid_until_date.as_ref().map(format_timestamp),
            has_files: non_empty(has_files),
            annotations: non_empty(nested.iter().map(WireAnnotation::from_model).collect()),
        }
    }
}

impl WireFile {
    fn from_model(file: &File, nested: &[Annotation]) -> Self {
        Self {
            spdx_id: file.id.to_string(),
            file_name: file.name.clone(),
            file_types: non_empty(file.file_types.iter().map(|t| t.to_string()).collect()),
            checksums: non_empty(file.checksums.iter().map(WireChecksum::from_model).collect()),
            license_concluded: file.license_concluded.clone(),
            license_info_in_files: non_empty(file.license_info_in_files.clone()),
            license_comments: file.license_comments.clone(),
            copyright_text: file.copyright_text.clone(),
            comment: file.comment.clone(),
            notice_text: file.notice_text.clone(),
            file_contributors: non_empty(file.contributors.clone()),
            attribution_texts: non_empty(file.attribution_texts.clone()),
            annotations: non_empty(nested.iter().map(WireAnnotation::from_model).collect()),
        }
    }
}

impl WireSnippet {
    fn from_model(snippet: &Snippet, nested: &[Annotation]) -> Self {
        let reference = snippet.from_file.to_string();
        let mut ranges = Vec::new();
        if let Some(range) = snippet.byte_range {
            ranges.push(WireRange {
                start_pointer: WirePointer {
                    reference: reference.clone(),
                    offset: Some(range.start),
                    line_number: None,
                },
                end_pointer: WirePointer {
                    reference: reference.clone(),
                    offset: Some(range.end),
                    line_number: None,
                },
            });
        }
        if let Some(range) = snippet.line_range {
            ranges.push(WireRange {
                start_pointer: WirePointer {
                    reference: reference.clone(),
                    offset: None,
                    line_number: Some(range.start),
                },
                end_pointer: WirePointer {
                    reference: reference.clone(),
                    offset: None,
                    line_number: Some(range.end),
                },
            });
        }
        Self {
            spdx_id: snippet.id.to_string(),
            name: snippet.name.clone(),
            snippet_from_file: reference,
            ranges,
            license_concluded: snippet.license_concluded.clone(),
            license_info_in_snippets: non_empty(snippet.license_info_in_snippets.clone()),
            license_comments: snippet.license_comments.clone(),
            copyright_text: snippet.copyright_text.clone(),
            comment: snippet.comment.clone(),
            attribution_texts: non_empty(snippet.attribution_texts.clone()),
            annotations: non_empty(nested.iter().map(WireAnnotation::from_model).collect()),
        }
    }
}
