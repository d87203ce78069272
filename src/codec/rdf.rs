//! RDF/XML codec.
//!
//! The RDF binding is a graph serialization: one `spdx:SpdxDocument` subject
//! plus flat `spdx:Package`/`spdx:File`/`spdx:Snippet` subjects, each
//! identified by `rdf:about="{namespace}#{identifier}"`, with
//! `rdf:resource` attributes for cross-references. Membership is spelled
//! through `spdx:hasFile`, described packages through
//! `spdx:describesPackage`, and relationships nest `spdx:Relationship`
//! nodes under the subject that owns their left endpoint.
//!
//! Decoding walks reader events into per-subject accumulators (values stay
//! strings until the subject closes), then resolves reference URIs against
//! the document namespace and external-document table once the whole graph
//! has been seen. Vocabulary values are accepted both as element text
//! (`DEPENDS_ON`) and as the URI-coded resource form
//! (`…#relationshipType_dependsOn`).

use std::io::Write;

use indexmap::{IndexMap, IndexSet};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

use crate::codec::{
    check_requested_version, finish_decode, normalize, FormatConfidence, FormatDetection,
    SpdxCodec,
};
use crate::error::{EncodeErrorKind, FormatErrorKind, Result, SpdxError};
use crate::model::{
    format_timestamp, parse_timestamp, Agent, Annotation, Checksum, CreationInfo, Document,
    DocumentRefId, ElementId, ElementRef, ExternalDocumentRef, ExternalPackageRef, File,
    OtherLicense, Package, PackageVerificationCode, Relationship, RelationshipType, Snippet,
    SnippetRange, SpdxVersion,
};

const FORMAT: &str = "rdf";

const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const SPDX_NS: &str = "http://spdx.org/rdf/terms#";
const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
const DOAP_NS: &str = "http://usefulinc.com/ns/doap#";
const PTR_NS: &str = "http://www.w3.org/2009/pointers#";
const LICENSE_NS: &str = "http://spdx.org/licenses/";

/// Codec for the SPDX RDF/XML format.
#[derive(Debug, Clone, Default)]
pub struct RdfCodec {
    version: Option<SpdxVersion>,
}

impl RdfCodec {
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

impl SpdxCodec for RdfCodec {
    fn decode_str(&self, content: &str) -> Result<Document> {
        let mut decoder = Decoder::default();
        decoder.run(content)?;
        let (doc, facts) = decoder.finish()?;
        check_requested_version(FORMAT, doc.spec_version, self.version)?;
        finish_decode(doc, facts)
    }

    fn encode(&self, doc: &Document, sink: &mut dyn Write) -> Result<()> {
        encode_document(doc, sink)
    }

    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn detect(&self, content: &str) -> FormatDetection {
        if !content.trim_start().starts_with('<') {
            return FormatDetection::no_match();
        }

        let has_rdf = content.contains("<rdf:RDF");
        let has_doc = content.contains("spdx:SpdxDocument");
        let has_ns = content.contains(SPDX_NS);
        let version = extract_element_text(content, "spdx:specVersion");

        let detection = if has_doc && (has_rdf || has_ns) {
            FormatDetection::with_confidence(FormatConfidence::CERTAIN)
        } else if has_doc || (has_rdf && has_ns) {
            FormatDetection::with_confidence(FormatConfidence::HIGH)
        } else if has_rdf {
            FormatDetection::with_confidence(FormatConfidence::LOW)
                .warning("rdf:RDF root without SPDX markers")
        } else {
            return FormatDetection::no_match();
        };

        match version {
            Some(version) => detection.version(&version),
            None => detection,
        }
    }
}

fn extract_element_text(content: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let start = content.find(&open)? + open.len();
    let rest = &content[start..];
    let end = rest.find('<')?;
    let value = rest[..end].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// ============================================================================
// Shared reader plumbing
// ============================================================================

fn xml_error(message: String) -> SpdxError {
    SpdxError::decode(FORMAT, "XML parsing", FormatErrorKind::InvalidXml(message))
}

fn rdf_value_error(context: &str, field: &str, message: impl Into<String>) -> SpdxError {
    SpdxError::decode(
        FORMAT,
        context,
        FormatErrorKind::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        },
    )
}

fn next_event<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>> {
    reader.read_event().map_err(|e| xml_error(e.to_string()))
}

fn skip_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<()> {
    reader
        .read_to_end(start.name())
        .map_err(|e| xml_error(e.to_string()))?;
    Ok(())
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_error(err.to_string()))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|err| xml_error(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn about_attr(e: &BytesStart) -> Result<Option<String>> {
    attr_value(e, b"rdf:about")
}

fn resource_attr(e: &BytesStart) -> Result<Option<String>> {
    attr_value(e, b"rdf:resource")
}

fn require_about(e: &BytesStart, element: &str) -> Result<String> {
    about_attr(e)?
        .ok_or_else(|| rdf_value_error(element, "rdf:about", "subject carries no rdf:about"))
}

fn require_resource(e: &BytesStart) -> Result<String> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    resource_attr(e)?
        .ok_or_else(|| rdf_value_error(&name, "rdf:resource", "reference carries no rdf:resource"))
}

/// Accumulate the text content of an element up to its end tag.
fn text_content(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<String> {
    let end = start.to_end().into_owned();
    let mut out = String::new();
    loop {
        match next_event(reader)? {
            Event::Text(t) => out.push_str(&t.unescape().map_err(|e| xml_error(e.to_string()))?),
            Event::CData(c) => out.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Event::Comment(_) => {}
            Event::End(e) if e.name() == end.name() => break,
            Event::Eof => {
                return Err(xml_error(format!(
                    "unexpected end of input inside <{}>",
                    String::from_utf8_lossy(end.name().as_ref())
                )))
            }
            _ => {
                return Err(xml_error(format!(
                    "markup inside text-valued <{}>",
                    String::from_utf8_lossy(end.name().as_ref())
                )))
            }
        }
    }
    Ok(out)
}

/// The identifier fragment of an `rdf:about` URI.
fn fragment_id(uri: &str, element: &str) -> Result<ElementId> {
    let fragment = uri.rsplit_once('#').map_or(uri, |(_, f)| f);
    fragment.parse::<ElementId>().map_err(|_| {
        rdf_value_error(
            element,
            "rdf:about",
            format!("`{uri}` does not end in an SPDXRef fragment"),
        )
    })
}

/// Convert the URI-coded vocabulary form (`…#relationshipType_dependsOn`)
/// to the canonical spelling; plain text passes through unchanged.
fn vocab_value(raw: &str) -> String {
    let Some((_, fragment)) = raw.rsplit_once('#') else {
        return raw.to_string();
    };
    let Some((_, coded)) = fragment.split_once('_') else {
        return fragment.to_string();
    };
    let mut out = String::with_capacity(coded.len() + 4);
    for c in coded.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}

/// Strip the license-list URI prefix from resource-coded license values.
fn license_value(raw: &str) -> String {
    if let Some(id) = raw.strip_prefix(LICENSE_NS) {
        return id.to_string();
    }
    match raw.rsplit_once('#') {
        Some((_, fragment)) if !fragment.is_empty() => fragment.to_string(),
        _ => raw.to_string(),
    }
}

/// Map the sentinel term URIs back to their literals.
fn sentinel_or(raw: String) -> String {
    match raw.rsplit_once('#') {
        Some((_, "noassertion")) => "NOASSERTION".to_string(),
        Some((_, "none")) => "NONE".to_string(),
        _ => raw,
    }
}

/// Read a license-valued property: `rdf:resource` or text content.
fn read_license(reader: &mut Reader<&[u8]>, e: &BytesStart) -> Result<String> {
    if let Some(resource) = resource_attr(e)? {
        skip_element(reader, e)?;
        Ok(license_value(&resource))
    } else {
        text_content(reader, e)
    }
}

/// Resolve a raw reference (URI, rendered identifier, or sentinel literal)
/// against the document namespace and external-document table.
fn resolve_ref(raw: &str, doc: &Document) -> Result<ElementRef> {
    match raw.rsplit_once('#') {
        Some((_, "noassertion")) => Ok(ElementRef::NoAssertion),
        Some((_, "none")) => Ok(ElementRef::None),
        Some((base, fragment)) => {
            if !base.is_empty() && base != doc.namespace {
                if let Some(external) = doc
                    .external_document_refs
                    .iter()
                    .find(|external| external.uri == base)
                {
                    return Ok(ElementRef::external(
                        external.id.clone(),
                        fragment.parse::<ElementId>()?,
                    ));
                }
            }
            fragment.parse::<ElementRef>()
        }
        None => raw.parse::<ElementRef>(),
    }
}

// ============================================================================
// Decoder
// ============================================================================

/// Raw per-subject accumulators. Values stay strings until the subject
/// closes; reference URIs stay raw until the whole graph has been walked.
#[derive(Debug, Default)]
struct RawPackage {
    name: Option<String>,
    version: Option<String>,
    file_name: Option<String>,
    supplier: Option<String>,
    originator: Option<String>,
    download_location: Option<String>,
    files_analyzed: Option<String>,
    verification_value: Option<String>,
    verification_excluded: Vec<String>,
    checksums: Vec<Checksum>,
    home_page: Option<String>,
    source_info: Option<String>,
    license_concluded: Option<String>,
    license_info_from_files: Vec<String>,
    license_declared: Option<String>,
    license_comments: Option<String>,
    copyright_text: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    comment: Option<String>,
    external_refs: Vec<RawExternalRef>,
    attribution_texts: Vec<String>,
    primary_purpose: Option<String>,
    release_date: Option<String>,
    built_date: Option<String>,
    valid_until_date: Option<String>,
}

#[derive(Debug, Default)]
struct RawExternalRef {
    category: Option<String>,
    ref_type: Option<String>,
    locator: Option<String>,
    comment: Option<String>,
}

#[derive(Debug, Default)]
struct RawFile {
    name: Option<String>,
    file_types: Vec<String>,
    checksums: Vec<Checksum>,
    license_concluded: Option<String>,
    license_info_in_files: Vec<String>,
    license_comments: Option<String>,
    copyright_text: Option<String>,
    comment: Option<String>,
    notice_text: Option<String>,
    contributors: Vec<String>,
    attribution_texts: Vec<String>,
}

#[derive(Debug)]
struct RawSnippet {
    id: ElementId,
    from_file: Option<String>,
    name: Option<String>,
    byte_range: Option<(u64, u64)>,
    line_range: Option<(u64, u64)>,
    license_concluded: Option<String>,
    license_info_in_snippets: Vec<String>,
    license_comments: Option<String>,
    copyright_text: Option<String>,
    comment: Option<String>,
    attribution_texts: Vec<String>,
}

#[derive(Debug, Default)]
struct RawAnnotation {
    date: Option<String>,
    annotation_type: Option<String>,
    annotator: Option<String>,
    comment: Option<String>,
}

#[derive(Debug)]
struct RawRelationship {
    owner: ElementId,
    relationship_type: RelationshipType,
    related: String,
    comment: Option<String>,
}

#[derive(Debug)]
enum RawPointer {
    Byte(u64),
    Line(u64),
}

#[derive(Debug)]
enum ParsedRange {
    Byte(u64, u64),
    Line(u64, u64),
}

#[derive(Debug, Default)]
struct Decoder {
    doc_about: Option<String>,
    version: Option<String>,
    data_license: Option<String>,
    name: Option<String>,
    comment: Option<String>,
    created: Option<String>,
    creators: Vec<String>,
    license_list_version: Option<String>,
    creation_comment: Option<String>,
    external_refs: Vec<ExternalDocumentRef>,
    packages: Vec<Package>,
    files: Vec<File>,
    licenses: Vec<OtherLicense>,
    annotations: Vec<Annotation>,
    raw_snippets: Vec<RawSnippet>,
    raw_describes: Vec<String>,
    raw_contains: Vec<(ElementId, String)>,
    raw_relationships: Vec<RawRelationship>,
}

impl Decoder {
    fn run(&mut self, content: &str) -> Result<()> {
        let mut reader = Reader::from_str(content);
        loop {
            match next_event(&mut reader)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"rdf:RDF" => {}
                    b"spdx:SpdxDocument" => self.parse_document(&mut reader, &e)?,
                    b"spdx:Package" => {
                        self.parse_package(&mut reader, &e)?;
                    }
                    b"spdx:File" => {
                        self.parse_file(&mut reader, &e)?;
                    }
                    b"spdx:Snippet" => {
                        self.parse_snippet(&mut reader, &e)?;
                    }
                    other => {
                        debug!(
                            element = %String::from_utf8_lossy(other),
                            "ignoring unknown top-level element"
                        );
                        skip_element(&mut reader, &e)?;
                    }
                },
                Event::Eof => break,
                _ => {}
            }
        }
        if self.doc_about.is_none() {
            return Err(SpdxError::missing_field(
                FORMAT,
                "spdx:SpdxDocument",
                "document graph",
            ));
        }
        Ok(())
    }

    fn parse_document(&mut self, reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<()> {
        let about = require_about(start, "spdx:SpdxDocument")?;
        let doc_id = fragment_id(&about, "spdx:SpdxDocument")?;
        self.doc_about = Some(about);
        let end = start.to_end().into_owned();
        loop {
            match next_event(reader)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"spdx:specVersion" => self.version = Some(text_content(reader, &e)?),
                    b"spdx:dataLicense" => self.data_license = Some(read_license(reader, &e)?),
                    b"spdx:name" => self.name = Some(text_content(reader, &e)?),
                    b"rdfs:comment" => self.comment = Some(text_content(reader, &e)?),
                    b"spdx:creationInfo" => self.parse_creation_info(reader, &e)?,
                    b"spdx:externalDocumentRef" => {
                        self.parse_external_document_ref(reader, &e)?;
                    }
                    b"spdx:describesPackage" => {
                        let related = self.parse_related(reader, &e)?;
                        self.raw_describes.push(related);
                    }
                    b"spdx:hasExtractedLicensingInfo" => {
                        let license = self.parse_license_info(reader, &e)?;
                        self.licenses.push(license);
                    }
                    b"spdx:relationship" => {
                        let rel = self.parse_relationship(reader, &e, doc_id.clone())?;
                        self.raw_relationships.push(rel);
                    }
                    b"spdx:annotation" => {
                        let raw = parse_annotation(reader, &e)?;
                        self.annotations.push(raw.build(doc_id.clone())?);
                    }
                    other => {
                        debug!(
                            element = %String::from_utf8_lossy(other),
                            "ignoring unknown document property"
                        );
                        skip_element(reader, &e)?;
                    }
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"spdx:dataLicense" => {
                        self.data_license = Some(license_value(&require_resource(&e)?));
                    }
                    b"spdx:describesPackage" => {
                        self.raw_describes.push(require_resource(&e)?);
                    }
                    _ => {}
                },
                Event::End(e) if e.name() == end.name() => break,
                Event::Eof => return Err(xml_error("truncated spdx:SpdxDocument".to_string())),
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_creation_info(&mut self, reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<()> {
        let end = start.to_end().into_owned();
        loop {
            match next_event(reader)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"spdx:CreationInfo" => {}
                    b"spdx:created" => self.created = Some(text_content(reader, &e)?),
                    b"spdx:creator" => self.creators.push(text_content(reader, &e)?),
                    b"spdx:licenseListVersion" => {
                        self.license_list_version = Some(text_content(reader, &e)?);
                    }
                    b"rdfs:comment" => self.creation_comment = Some(text_content(reader, &e)?),
                    _ => skip_element(reader, &e)?,
                },
                Event::End(e) if e.name() == end.name() => break,
                Event::End(_) => {}
                Event::Eof => return Err(xml_error("truncated spdx:creationInfo".to_string())),
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_external_document_ref(
        &mut self,
        reader: &mut Reader<&[u8]>,
        start: &BytesStart,
    ) -> Result<()> {
        let ctx = "spdx:externalDocumentRef";
        let end = start.to_end().into_owned();
        let mut about = about_attr(start)?;
        let mut id_text: Option<String> = None;
        let mut uri: Option<String> = None;
        let mut checksum: Option<Checksum> = None;
        loop {
            match next_event(reader)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"spdx:ExternalDocumentRef" => {
                        if about.is_none() {
                            about = about_attr(&e)?;
                        }
                    }
                    b"spdx:externalDocumentId" => id_text = Some(text_content(reader, &e)?),
                    b"spdx:spdxDocument" => uri = Some(text_content(reader, &e)?),
                    b"spdx:checksum" => checksum = Some(parse_checksum(reader, &e)?),
                    _ => skip_element(reader, &e)?,
                },
                Event::Empty(e) => {
                    if e.name().as_ref() == b"spdx:spdxDocument" {
                        uri = Some(require_resource(&e)?);
                    }
                }
                Event::End(e) if e.name() == end.name() => break,
                Event::End(_) => {}
                Event::Eof => return Err(xml_error("truncated externalDocumentRef".to_string())),
                _ => {}
            }
        }
        let token = match (id_text, about) {
            (Some(text), _) => text,
            (None, Some(about)) => about
                .rsplit_once('#')
                .map_or(about.clone(), |(_, f)| f.to_string()),
            (None, None) => {
                return Err(SpdxError::missing_field(FORMAT, "rdf:about", ctx));
            }
        };
        let id = token.parse::<DocumentRefId>()?;
        let uri = uri.ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:spdxDocument", ctx))?;
        let checksum =
            checksum.ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:checksum", ctx))?;
        self.external_refs
            .push(ExternalDocumentRef::new(id, uri, checksum));
        Ok(())
    }

    fn parse_license_info(
        &mut self,
        reader: &mut Reader<&[u8]>,
        start: &BytesStart,
    ) -> Result<OtherLicense> {
        let ctx = "spdx:hasExtractedLicensingInfo";
        let end = start.to_end().into_owned();
        let mut license_id: Option<String> = None;
        let mut extracted_text: Option<String> = None;
        let mut name: Option<String> = None;
        let mut cross_references: Vec<String> = Vec::new();
        let mut comment: Option<String> = None;
        loop {
            match next_event(reader)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"spdx:ExtractedLicensingInfo" => {}
                    b"spdx:licenseId" => license_id = Some(text_content(reader, &e)?),
                    b"spdx:extractedText" => extracted_text = Some(text_content(reader, &e)?),
                    b"spdx:name" => name = Some(text_content(reader, &e)?),
                    b"rdfs:seeAlso" => cross_references.push(text_content(reader, &e)?),
                    b"rdfs:comment" => comment = Some(text_content(reader, &e)?),
                    _ => skip_element(reader, &e)?,
                },
                Event::Empty(e) => {
                    if e.name().as_ref() == b"rdfs:seeAlso" {
                        cross_references.push(require_resource(&e)?);
                    }
                }
                Event::End(e) if e.name() == end.name() => break,
                Event::End(_) => {}
                Event::Eof => return Err(xml_error("truncated licensing info".to_string())),
                _ => {}
            }
        }
        let license_id =
            license_id.ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:licenseId", ctx))?;
        let extracted_text = extracted_text
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:extractedText", ctx))?;
        let mut license = OtherLicense::new(license_id, extracted_text)?;
        license.name = name;
        license.cross_references = cross_references;
        license.comment = comment;
        Ok(license)
    }

    #[allow(clippy::too_many_lines)]
    fn parse_package(
        &mut self,
        reader: &mut Reader<&[u8]>,
        start: &BytesStart,
    ) -> Result<ElementId> {
        let about = require_about(start, "spdx:Package")?;
        let id = fragment_id(&about, "spdx:Package")?;
        let end = start.to_end().into_owned();
        let mut raw = RawPackage::default();
        loop {
            match next_event(reader)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"spdx:name" => raw.name = Some(text_content(reader, &e)?),
                    b"spdx:versionInfo" => raw.version = Some(text_content(reader, &e)?),
                    b"spdx:packageFileName" => raw.file_name = Some(text_content(reader, &e)?),
                    b"spdx:supplier" => raw.supplier = Some(text_content(reader, &e)?),
                    b"spdx:originator" => raw.originator = Some(text_content(reader, &e)?),
                    b"spdx:downloadLocation" => {
                        raw.download_location = Some(text_content(reader, &e)?);
                    }
                    b"spdx:filesAnalyzed" => raw.files_analyzed = Some(text_content(reader, &e)?),
                    b"spdx:packageVerificationCode" => {
                        let (value, excluded) = parse_verification_code(reader, &e)?;
                        raw.verification_value = Some(value);
                        raw.verification_excluded = excluded;
                    }
                    b"spdx:checksum" => raw.checksums.push(parse_checksum(reader, &e)?),
                    b"doap:homepage" | b"spdx:homepage" => {
                        raw.home_page = Some(text_content(reader, &e)?);
                    }
                    b"spdx:sourceInfo" => raw.source_info = Some(text_content(reader, &e)?),
                    b"spdx:licenseConcluded" => {
                        raw.license_concluded = Some(read_license(reader, &e)?);
                    }
                    b"spdx:licenseInfoFromFiles" => {
                        raw.license_info_from_files.push(read_license(reader, &e)?);
                    }
                    b"spdx:licenseDeclared" => {
                        raw.license_declared = Some(read_license(reader, &e)?);
                    }
                    b"spdx:licenseComments" => {
                        raw.license_comments = Some(text_content(reader, &e)?);
                    }
                    b"spdx:copyrightText" => raw.copyright_text = Some(text_content(reader, &e)?),
                    b"spdx:summary" => raw.summary = Some(text_content(reader, &e)?),
                    b"spdx:description" => raw.description = Some(text_content(reader, &e)?),
                    b"rdfs:comment" => raw.comment = Some(text_content(reader, &e)?),
                    b"spdx:externalRef" => {
                        raw.external_refs.push(parse_external_ref(reader, &e)?);
                    }
                    b"spdx:attributionText" => {
                        raw.attribution_texts.push(text_content(reader, &e)?);
                    }
                    b"spdx:primaryPackagePurpose" => {
                        raw.primary_purpose = Some(vocab_value(&text_content(reader, &e)?));
                    }
                    b"spdx:releaseDate" => raw.release_date = Some(text_content(reader, &e)?),
                    b"spdx:builtDate" => raw.built_date = Some(text_content(reader, &e)?),
                    b"spdx:validUntilDate" => {
                        raw.valid_until_date = Some(text_content(reader, &e)?);
                    }
                    b"spdx:hasFile" => {
                        let related = self.parse_related(reader, &e)?;
                        self.raw_contains.push((id.clone(), related));
                    }
                    b"spdx:relationship" => {
                        let rel = self.parse_relationship(reader, &e, id.clone())?;
                        self.raw_relationships.push(rel);
                    }
                    b"spdx:annotation" => {
                        let annotation = parse_annotation(reader, &e)?;
                        self.annotations.push(annotation.build(id.clone())?);
                    }
                    other => {
                        debug!(
                            element = %String::from_utf8_lossy(other),
                            "ignoring unknown package property"
                        );
                        skip_element(reader, &e)?;
                    }
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"spdx:hasFile" => {
                        self.raw_contains.push((id.clone(), require_resource(&e)?));
                    }
                    b"spdx:downloadLocation" => {
                        raw.download_location = Some(sentinel_or(require_resource(&e)?));
                    }
                    b"spdx:licenseConcluded" => {
                        raw.license_concluded = Some(license_value(&require_resource(&e)?));
                    }
                    b"spdx:licenseDeclared" => {
                        raw.license_declared = Some(license_value(&require_resource(&e)?));
                    }
                    b"spdx:licenseInfoFromFiles" => {
                        raw.license_info_from_files
                            .push(license_value(&require_resource(&e)?));
                    }
                    b"doap:homepage" | b"spdx:homepage" => {
                        raw.home_page = Some(require_resource(&e)?);
                    }
                    b"spdx:primaryPackagePurpose" => {
                        raw.primary_purpose = Some(vocab_value(&require_resource(&e)?));
                    }
                    _ => {}
                },
                Event::End(e) if e.name() == end.name() => break,
                Event::Eof => return Err(xml_error("truncated spdx:Package".to_string())),
                _ => {}
            }
        }
        let pkg = raw.build(id.clone())?;
        self.packages.push(pkg);
        Ok(id)
    }

    fn parse_file(&mut self, reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<ElementId> {
        let about = require_about(start, "spdx:File")?;
        let id = fragment_id(&about, "spdx:File")?;
        let end = start.to_end().into_owned();
        let mut raw = RawFile::default();
        loop {
            match next_event(reader)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"spdx:fileName" => raw.name = Some(text_content(reader, &e)?),
                    b"spdx:fileType" => {
                        raw.file_types.push(vocab_value(&text_content(reader, &e)?));
                    }
                    b"spdx:checksum" => raw.checksums.push(parse_checksum(reader, &e)?),
                    b"spdx:licenseConcluded" => {
                        raw.license_concluded = Some(read_license(reader, &e)?);
                    }
                    b"spdx:licenseInfoInFile" | b"spdx:licenseInfoInFiles" => {
                        raw.license_info_in_files.push(read_license(reader, &e)?);
                    }
                    b"spdx:licenseComments" => {
                        raw.license_comments = Some(text_content(reader, &e)?);
                    }
                    b"spdx:copyrightText" => raw.copyright_text = Some(text_content(reader, &e)?),
                    b"rdfs:comment" => raw.comment = Some(text_content(reader, &e)?),
                    b"spdx:noticeText" => raw.notice_text = Some(text_content(reader, &e)?),
                    b"spdx:fileContributor" => raw.contributors.push(text_content(reader, &e)?),
                    b"spdx:attributionText" => {
                        raw.attribution_texts.push(text_content(reader, &e)?);
                    }
                    b"spdx:relationship" => {
                        let rel = self.parse_relationship(reader, &e, id.clone())?;
                        self.raw_relationships.push(rel);
                    }
                    b"spdx:annotation" => {
                        let annotation = parse_annotation(reader, &e)?;
                        self.annotations.push(annotation.build(id.clone())?);
                    }
                    other => {
                        debug!(
                            element = %String::from_utf8_lossy(other),
                            "ignoring unknown file property"
                        );
                        skip_element(reader, &e)?;
                    }
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"spdx:fileType" => {
                        raw.file_types.push(vocab_value(&require_resource(&e)?));
                    }
                    b"spdx:licenseConcluded" => {
                        raw.license_concluded = Some(license_value(&require_resource(&e)?));
                    }
                    b"spdx:licenseInfoInFile" | b"spdx:licenseInfoInFiles" => {
                        raw.license_info_in_files
                            .push(license_value(&require_resource(&e)?));
                    }
                    _ => {}
                },
                Event::End(e) if e.name() == end.name() => break,
                Event::Eof => return Err(xml_error("truncated spdx:File".to_string())),
                _ => {}
            }
        }
        let file = raw.build(id.clone())?;
        self.files.push(file);
        Ok(id)
    }

    fn parse_snippet(
        &mut self,
        reader: &mut Reader<&[u8]>,
        start: &BytesStart,
    ) -> Result<ElementId> {
        let about = require_about(start, "spdx:Snippet")?;
        let id = fragment_id(&about, "spdx:Snippet")?;
        let end = start.to_end().into_owned();
        let mut raw = RawSnippet {
            id: id.clone(),
            from_file: None,
            name: None,
            byte_range: None,
            line_range: None,
            license_concluded: None,
            license_info_in_snippets: Vec::new(),
            license_comments: None,
            copyright_text: None,
            comment: None,
            attribution_texts: Vec::new(),
        };
        loop {
            match next_event(reader)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"spdx:snippetFromFile" => {
                        raw.from_file = Some(self.parse_related(reader, &e)?);
                    }
                    b"spdx:name" => raw.name = Some(text_content(reader, &e)?),
                    b"spdx:range" => match parse_range(reader, &e)? {
                        ParsedRange::Byte(from, to) => raw.byte_range = Some((from, to)),
                        ParsedRange::Line(from, to) => raw.line_range = Some((from, to)),
                    },
                    b"spdx:licenseConcluded" => {
                        raw.license_concluded = Some(read_license(reader, &e)?);
                    }
                    b"spdx:licenseInfoInSnippet" | b"spdx:licenseInfoInSnippets" => {
                        raw.license_info_in_snippets.push(read_license(reader, &e)?);
                    }
                    b"spdx:licenseComments" => {
                        raw.license_comments = Some(text_content(reader, &e)?);
                    }
                    b"spdx:copyrightText" => raw.copyright_text = Some(text_content(reader, &e)?),
                    b"rdfs:comment" => raw.comment = Some(text_content(reader, &e)?),
                    b"spdx:attributionText" => {
                        raw.attribution_texts.push(text_content(reader, &e)?);
                    }
                    b"spdx:relationship" => {
                        let rel = self.parse_relationship(reader, &e, id.clone())?;
                        self.raw_relationships.push(rel);
                    }
                    b"spdx:annotation" => {
                        let annotation = parse_annotation(reader, &e)?;
                        self.annotations.push(annotation.build(id.clone())?);
                    }
                    other => {
                        debug!(
                            element = %String::from_utf8_lossy(other),
                            "ignoring unknown snippet property"
                        );
                        skip_element(reader, &e)?;
                    }
                },
                Event::Empty(e) => {
                    if e.name().as_ref() == b"spdx:snippetFromFile" {
                        raw.from_file = Some(require_resource(&e)?);
                    }
                }
                Event::End(e) if e.name() == end.name() => break,
                Event::Eof => return Err(xml_error("truncated spdx:Snippet".to_string())),
                _ => {}
            }
        }
        self.raw_snippets.push(raw);
        Ok(id)
    }

    /// Read the target of a reference-valued property: an `rdf:resource`
    /// shorthand, a sentinel or identifier as text, or an inline subject
    /// definition (which is parsed and registered like a top-level one).
    fn parse_related(&mut self, reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<String> {
        if let Some(resource) = resource_attr(start)? {
            skip_element(reader, start)?;
            return Ok(resource);
        }
        let end = start.to_end().into_owned();
        let mut found: Option<String> = None;
        loop {
            match next_event(reader)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"spdx:Package" => {
                        found = Some(self.parse_package(reader, &e)?.to_string());
                    }
                    b"spdx:File" => {
                        found = Some(self.parse_file(reader, &e)?.to_string());
                    }
                    b"spdx:Snippet" => {
                        found = Some(self.parse_snippet(reader, &e)?.to_string());
                    }
                    _ => {
                        if let Some(about) = about_attr(&e)? {
                            found = Some(about);
                        }
                        skip_element(reader, &e)?;
                    }
                },
                Event::Empty(e) => {
                    if let Some(about) = about_attr(&e)? {
                        found = Some(about);
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| xml_error(e.to_string()))?;
                    let text = text.trim();
                    if !text.is_empty() {
                        found = Some(text.to_string());
                    }
                }
                Event::End(e) if e.name() == end.name() => break,
                Event::Eof => return Err(xml_error("truncated reference property".to_string())),
                _ => {}
            }
        }
        found.ok_or_else(|| {
            rdf_value_error(
                "reference property",
                &String::from_utf8_lossy(end.name().as_ref()),
                "no resource, text, or inline element found",
            )
        })
    }

    fn parse_relationship(
        &mut self,
        reader: &mut Reader<&[u8]>,
        start: &BytesStart,
        owner: ElementId,
    ) -> Result<RawRelationship> {
        let ctx = "spdx:relationship";
        let end = start.to_end().into_owned();
        let mut rel_type: Option<String> = None;
        let mut related: Option<String> = None;
        let mut comment: Option<String> = None;
        loop {
            match next_event(reader)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"spdx:Relationship" => {}
                    b"spdx:relationshipType" => {
                        rel_type = Some(vocab_value(&text_content(reader, &e)?));
                    }
                    b"spdx:relatedSpdxElement" => {
                        related = Some(self.parse_related(reader, &e)?);
                    }
                    b"rdfs:comment" => comment = Some(text_content(reader, &e)?),
                    _ => skip_element(reader, &e)?,
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"spdx:relationshipType" => {
                        rel_type = Some(vocab_value(&require_resource(&e)?));
                    }
                    b"spdx:relatedSpdxElement" => related = Some(require_resource(&e)?),
                    _ => {}
                },
                Event::End(e) if e.name() == end.name() => break,
                Event::End(_) => {}
                Event::Eof => return Err(xml_error("truncated relationship".to_string())),
                _ => {}
            }
        }
        let rel_type = rel_type
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:relationshipType", ctx))?
            .parse::<RelationshipType>()?;
        let related = related
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:relatedSpdxElement", ctx))?;
        Ok(RawRelationship {
            owner,
            relationship_type: rel_type,
            related,
            comment,
        })
    }

    fn finish(self) -> Result<(Document, normalize::DerivedFacts)> {
        let ctx = "document header";
        let about = self
            .doc_about
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "rdf:about", ctx))?;
        let (namespace, doc_fragment) = about.rsplit_once('#').ok_or_else(|| {
            rdf_value_error(
                ctx,
                "rdf:about",
                format!("`{about}` must be `<namespace>#<identifier>`"),
            )
        })?;
        let doc_id = doc_fragment.parse::<ElementId>()?;
        let version = self
            .version
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:specVersion", ctx))?
            .parse::<SpdxVersion>()?;
        let name = self
            .name
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:name", ctx))?;
        let created = self
            .created
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:created", ctx))?;

        let mut creation_info = CreationInfo::new(parse_timestamp(&created)?);
        creation_info.license_list_version = self.license_list_version;
        creation_info.comment = self.creation_comment;
        for creator in self.creators {
            creation_info.creators.push(creator.parse::<Agent>()?);
        }

        let mut doc = Document::new(name, namespace, creation_info).with_version(version);
        doc.id = doc_id;
        doc.comment = self.comment;
        if let Some(data_license) = self.data_license {
            doc.data_license = data_license;
        }
        for external_ref in self.external_refs {
            doc.add_external_document_ref(external_ref);
        }
        for pkg in self.packages {
            doc.add_package(pkg);
        }
        for file in self.files {
            doc.add_file(file);
        }
        for license in self.licenses {
            doc.add_other_license(license);
        }
        doc.annotations = self.annotations;

        for raw in self.raw_snippets {
            let snippet = raw.build(&doc)?;
            doc.add_snippet(snippet);
        }

        let mut facts = normalize::DerivedFacts::new();
        for uri in self.raw_describes {
            facts.describes.push(resolve_ref(&uri, &doc)?);
        }
        for (package, uri) in self.raw_contains {
            match resolve_ref(&uri, &doc)? {
                ElementRef::Id(id) if id.is_local() => {
                    facts.contains.push((package, id.element));
                }
                other => {
                    // hasFile to an external or sentinel target has no
                    // membership semantics locally; keep it as an edge.
                    doc.add_relationship(Relationship::new(
                        package,
                        RelationshipType::Contains,
                        other,
                    ));
                }
            }
        }
        for raw in self.raw_relationships {
            let ref_b = resolve_ref(&raw.related, &doc)?;
            let mut rel = Relationship::new(raw.owner, raw.relationship_type, ref_b);
            rel.comment = raw.comment;
            doc.add_relationship(rel);
        }

        Ok((doc, facts))
    }
}

// ============================================================================
// Node parsers shared across subjects
// ============================================================================

fn parse_checksum(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Checksum> {
    let ctx = "spdx:checksum";
    let end = start.to_end().into_owned();
    let mut algorithm: Option<String> = None;
    let mut value: Option<String> = None;
    loop {
        match next_event(reader)? {
            Event::Start(e) => match e.name().as_ref() {
                b"spdx:Checksum" => {}
                b"spdx:algorithm" => algorithm = Some(vocab_value(&text_content(reader, &e)?)),
                b"spdx:checksumValue" => value = Some(text_content(reader, &e)?),
                _ => skip_element(reader, &e)?,
            },
            Event::Empty(e) => {
                if e.name().as_ref() == b"spdx:algorithm" {
                    algorithm = Some(vocab_value(&require_resource(&e)?));
                }
            }
            Event::End(e) if e.name() == end.name() => break,
            Event::End(_) => {}
            Event::Eof => return Err(xml_error("truncated checksum".to_string())),
            _ => {}
        }
    }
    let algorithm = algorithm
        .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:algorithm", ctx))?
        .parse()?;
    let value = value.ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:checksumValue", ctx))?;
    Ok(Checksum::new(algorithm, value))
}

fn parse_verification_code(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
) -> Result<(String, Vec<String>)> {
    let ctx = "spdx:packageVerificationCode";
    let end = start.to_end().into_owned();
    let mut value: Option<String> = None;
    let mut excluded: Vec<String> = Vec::new();
    loop {
        match next_event(reader)? {
            Event::Start(e) => match e.name().as_ref() {
                b"spdx:PackageVerificationCode" => {}
                b"spdx:packageVerificationCodeValue" => {
                    value = Some(text_content(reader, &e)?);
                }
                b"spdx:packageVerificationCodeExcludedFile" => {
                    excluded.push(text_content(reader, &e)?);
                }
                _ => skip_element(reader, &e)?,
            },
            Event::End(e) if e.name() == end.name() => break,
            Event::End(_) => {}
            Event::Eof => return Err(xml_error("truncated verification code".to_string())),
            _ => {}
        }
    }
    let value = value.ok_or_else(|| {
        SpdxError::missing_field(FORMAT, "spdx:packageVerificationCodeValue", ctx)
    })?;
    Ok((value, excluded))
}

fn parse_external_ref(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<RawExternalRef> {
    let end = start.to_end().into_owned();
    let mut raw = RawExternalRef::default();
    loop {
        match next_event(reader)? {
            Event::Start(e) => match e.name().as_ref() {
                b"spdx:ExternalRef" => {}
                b"spdx:referenceCategory" => {
                    raw.category = Some(vocab_value(&text_content(reader, &e)?));
                }
                b"spdx:referenceType" => {
                    raw.ref_type = Some(reference_type_value(&text_content(reader, &e)?));
                }
                b"spdx:referenceLocator" => raw.locator = Some(text_content(reader, &e)?),
                b"rdfs:comment" => raw.comment = Some(text_content(reader, &e)?),
                _ => skip_element(reader, &e)?,
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"spdx:referenceCategory" => {
                    raw.category = Some(vocab_value(&require_resource(&e)?));
                }
                b"spdx:referenceType" => {
                    raw.ref_type = Some(reference_type_value(&require_resource(&e)?));
                }
                _ => {}
            },
            Event::End(e) if e.name() == end.name() => break,
            Event::End(_) => {}
            Event::Eof => return Err(xml_error("truncated external reference".to_string())),
            _ => {}
        }
    }
    Ok(raw)
}

/// Reference types may come URI-coded (`…/references/purl`); keep the last
/// path segment.
fn reference_type_value(raw: &str) -> String {
    raw.rsplit(['/', '#'])
        .next()
        .unwrap_or(raw)
        .to_string()
}

fn parse_annotation(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<RawAnnotation> {
    let end = start.to_end().into_owned();
    let mut raw = RawAnnotation::default();
    loop {
        match next_event(reader)? {
            Event::Start(e) => match e.name().as_ref() {
                b"spdx:Annotation" => {}
                b"spdx:annotationDate" => raw.date = Some(text_content(reader, &e)?),
                b"spdx:annotationType" => {
                    raw.annotation_type = Some(vocab_value(&text_content(reader, &e)?));
                }
                b"spdx:annotator" => raw.annotator = Some(text_content(reader, &e)?),
                b"rdfs:comment" => raw.comment = Some(text_content(reader, &e)?),
                _ => skip_element(reader, &e)?,
            },
            Event::Empty(e) => {
                if e.name().as_ref() == b"spdx:annotationType" {
                    raw.annotation_type = Some(vocab_value(&require_resource(&e)?));
                }
            }
            Event::End(e) if e.name() == end.name() => break,
            Event::End(_) => {}
            Event::Eof => return Err(xml_error("truncated annotation".to_string())),
            _ => {}
        }
    }
    Ok(raw)
}

fn parse_pointer(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<RawPointer> {
    let ctx = "snippet range pointer";
    let end = start.to_end().into_owned();
    let mut offset: Option<u64> = None;
    let mut line: Option<u64> = None;
    loop {
        match next_event(reader)? {
            Event::Start(e) => match e.name().as_ref() {
                b"ptr:ByteOffsetPointer" | b"ptr:BytePointer" | b"ptr:LineCharPointer" => {}
                b"ptr:offset" => offset = Some(parse_position(&text_content(reader, &e)?, ctx)?),
                b"ptr:lineNumber" => line = Some(parse_position(&text_content(reader, &e)?, ctx)?),
                _ => skip_element(reader, &e)?,
            },
            Event::End(e) if e.name() == end.name() => break,
            Event::End(_) => {}
            Event::Eof => return Err(xml_error("truncated range pointer".to_string())),
            _ => {}
        }
    }
    match (offset, line) {
        (Some(value), _) => Ok(RawPointer::Byte(value)),
        (None, Some(value)) => Ok(RawPointer::Line(value)),
        (None, None) => Err(rdf_value_error(
            ctx,
            "ptr:offset",
            "pointer carries neither ptr:offset nor ptr:lineNumber",
        )),
    }
}

fn parse_position(text: &str, ctx: &str) -> Result<u64> {
    text.trim()
        .parse::<u64>()
        .map_err(|e| rdf_value_error(ctx, "position", format!("bad position `{text}`: {e}")))
}

fn parse_range(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<ParsedRange> {
    let ctx = "spdx:range";
    let end = start.to_end().into_owned();
    let mut from: Option<RawPointer> = None;
    let mut to: Option<RawPointer> = None;
    loop {
        match next_event(reader)? {
            Event::Start(e) => match e.name().as_ref() {
                b"ptr:StartEndPointer" => {}
                b"ptr:startPointer" => from = Some(parse_pointer(reader, &e)?),
                b"ptr:endPointer" => to = Some(parse_pointer(reader, &e)?),
                _ => skip_element(reader, &e)?,
            },
            Event::End(e) if e.name() == end.name() => break,
            Event::End(_) => {}
            Event::Eof => return Err(xml_error("truncated snippet range".to_string())),
            _ => {}
        }
    }
    match (from, to) {
        (Some(RawPointer::Byte(from)), Some(RawPointer::Byte(to))) => {
            Ok(ParsedRange::Byte(from, to))
        }
        (Some(RawPointer::Line(from)), Some(RawPointer::Line(to))) => {
            Ok(ParsedRange::Line(from, to))
        }
        (None, _) | (_, None) => Err(rdf_value_error(
            ctx,
            "ptr:startPointer",
            "range is missing a start or end pointer",
        )),
        _ => Err(rdf_value_error(
            ctx,
            "ptr:startPointer",
            "start and end pointers use different pointer kinds",
        )),
    }
}

// ============================================================================
// Raw record conversion
// ============================================================================

impl RawPackage {
    fn build(self, id: ElementId) -> Result<Package> {
        let ctx = format!("package {id}");
        let name = self
            .name
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:name", &ctx))?;
        let mut pkg = Package::new(id, name);
        pkg.version = self.version;
        pkg.file_name = self.file_name;
        pkg.supplier = self.supplier.map(|s| s.parse::<Agent>()).transpose()?;
        pkg.originator = self.originator.map(|s| s.parse::<Agent>()).transpose()?;
        if let Some(location) = self.download_location {
            pkg.download_location = location;
        }
        if let Some(analyzed) = self.files_analyzed {
            pkg.files_analyzed = match analyzed.trim() {
                "true" => true,
                "false" => false,
                other => {
                    return Err(rdf_value_error(
                        &ctx,
                        "spdx:filesAnalyzed",
                        format!("expected true or false, got `{other}`"),
                    ));
                }
            };
        }
        if let Some(value) = self.verification_value {
            let mut code = PackageVerificationCode::new(value);
            code.excluded_files = self.verification_excluded;
            pkg.verification_code = Some(code);
        }
        pkg.checksums = self.checksums;
        pkg.home_page = self.home_page;
        pkg.source_info = self.source_info;
        pkg.license_concluded = self.license_concluded;
        pkg.license_info_from_files = self.license_info_from_files;
        pkg.license_declared = self.license_declared;
        pkg.license_comments = self.license_comments;
        pkg.copyright_text = self.copyright_text;
        pkg.summary = self.summary;
        pkg.description = self.description;
        pkg.comment = self.comment;
        for raw in self.external_refs {
            let category = raw
                .category
                .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:referenceCategory", &ctx))?
                .parse()?;
            let ref_type = raw
                .ref_type
                .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:referenceType", &ctx))?;
            let locator = raw
                .locator
                .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:referenceLocator", &ctx))?;
            let mut external_ref = ExternalPackageRef::new(category, ref_type, locator);
            external_ref.comment = raw.comment;
            pkg.external_refs.push(external_ref);
        }
        pkg.attribution_texts = self.attribution_texts;
        if let Some(purpose) = self.primary_purpose {
            pkg.primary_purpose = Some(purpose.parse()?);
        }
        pkg.release_date = self
            .release_date
            .map(|d| parse_timestamp(&d))
            .transpose()?;
        pkg.built_date = self.built_date.map(|d| parse_timestamp(&d)).transpose()?;
        pkg.valid_until_date = self
            .valid_until_date
            .map(|d| parse_timestamp(&d))
            .transpose()?;
        Ok(pkg)
    }
}

impl RawFile {
    fn build(self, id: ElementId) -> Result<File> {
        let ctx = format!("file {id}");
        let name = self
            .name
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:fileName", &ctx))?;
        let mut file = File::new(id, name);
        for file_type in self.file_types {
            file.file_types.push(file_type.parse()?);
        }
        file.checksums = self.checksums;
        file.license_concluded = self.license_concluded;
        file.license_info_in_files = self.license_info_in_files;
        file.license_comments = self.license_comments;
        file.copyright_text = self.copyright_text;
        file.comment = self.comment;
        file.notice_text = self.notice_text;
        file.contributors = self.contributors;
        file.attribution_texts = self.attribution_texts;
        Ok(file)
    }
}

impl RawSnippet {
    fn build(self, doc: &Document) -> Result<Snippet> {
        let ctx = format!("snippet {}", self.id);
        let raw_ref = self
            .from_file
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:snippetFromFile", &ctx))?;
        let from_file = resolve_ref(&raw_ref, doc)?;
        let mut snippet = Snippet::new(self.id, from_file);
        snippet.name = self.name;
        snippet.byte_range = self.byte_range.map(|(start, end)| SnippetRange { start, end });
        snippet.line_range = self.line_range.map(|(start, end)| SnippetRange { start, end });
        snippet.license_concluded = self.license_concluded;
        snippet.license_info_in_snippets = self.license_info_in_snippets;
        snippet.license_comments = self.license_comments;
        snippet.copyright_text = self.copyright_text;
        snippet.comment = self.comment;
        snippet.attribution_texts = self.attribution_texts;
        Ok(snippet)
    }
}

impl RawAnnotation {
    fn build(self, target: ElementId) -> Result<Annotation> {
        let ctx = format!("annotation on {target}");
        let date = self
            .date
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:annotationDate", &ctx))?;
        let annotation_type = self
            .annotation_type
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:annotationType", &ctx))?
            .parse()?;
        let annotator = self
            .annotator
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "spdx:annotator", &ctx))?
            .parse::<Agent>()?;
        Ok(Annotation::new(
            target,
            annotator,
            annotation_type,
            parse_timestamp(&date)?,
            self.comment.unwrap_or_default(),
        ))
    }
}

// ============================================================================
// Encoder
// ============================================================================

fn encode_document(doc: &Document, sink: &mut dyn Write) -> Result<()> {
    let membership = doc.file_membership();
    let membership_pairs = normalize::membership_pairs(doc);
    let mut annotations = normalize::annotations_by_target(doc, FORMAT)?;

    // Relationships nest under the subject owning their left endpoint, so a
    // sentinel or external subject has nowhere to go.
    let mut nested: IndexMap<ElementId, Vec<&Relationship>> = IndexMap::new();
    for rel in &doc.relationships {
        if normalize::expressed_by_nesting(rel, &membership_pairs)
            || normalize::expressed_by_describes_list(rel)
        {
            continue;
        }
        match rel.ref_a.as_local() {
            Some(id) => nested.entry(id.clone()).or_default().push(rel),
            None => {
                return Err(SpdxError::encode(
                    FORMAT,
                    "relationship placement",
                    EncodeErrorKind::UnrepresentableRelationship {
                        subject: rel.ref_a.to_string(),
                    },
                ));
            }
        }
    }

    let mut enc = Encoder {
        w: Writer::new_with_indent(sink, b' ', 2),
        doc,
    };
    enc.put(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("rdf:RDF");
    root.push_attribute(("xmlns:rdf", RDF_NS));
    root.push_attribute(("xmlns:spdx", SPDX_NS));
    root.push_attribute(("xmlns:rdfs", RDFS_NS));
    root.push_attribute(("xmlns:doap", DOAP_NS));
    root.push_attribute(("xmlns:ptr", PTR_NS));
    enc.put(Event::Start(root))?;

    enc.write_document(&mut nested, &mut annotations)?;
    for pkg in &doc.packages {
        enc.write_package(pkg, membership.get(&pkg.id), &mut nested, &mut annotations)?;
    }
    for file in normalize::all_files(doc) {
        enc.write_file(file, &mut nested, &mut annotations)?;
    }
    for snippet in &doc.snippets {
        enc.write_snippet(snippet, &mut nested, &mut annotations)?;
    }

    if let Some((target, _)) = annotations.first() {
        return Err(SpdxError::encode(
            FORMAT,
            "annotation placement",
            EncodeErrorKind::UnrepresentableAnnotation {
                target: target.to_string(),
            },
        ));
    }

    enc.put(Event::End(BytesEnd::new("rdf:RDF")))?;
    let sink = enc.w.into_inner();
    sink.write_all(b"\n")?;
    Ok(())
}

struct Encoder<'a> {
    w: Writer<&'a mut dyn Write>,
    doc: &'a Document,
}

impl Encoder<'_> {
    fn put(&mut self, event: Event) -> Result<()> {
        self.w.write_event(event).map_err(|e| {
            SpdxError::encode(
                FORMAT,
                "XML writing",
                EncodeErrorKind::Serialization(e.to_string()),
            )
        })
    }

    fn open(&mut self, tag: &str) -> Result<()> {
        self.put(Event::Start(BytesStart::new(tag)))
    }

    fn open_about(&mut self, tag: &str, about: &str) -> Result<()> {
        let mut e = BytesStart::new(tag);
        e.push_attribute(("rdf:about", about));
        self.put(Event::Start(e))
    }

    fn close(&mut self, tag: &str) -> Result<()> {
        self.put(Event::End(BytesEnd::new(tag)))
    }

    fn text_element(&mut self, tag: &str, value: &str) -> Result<()> {
        self.open(tag)?;
        self.put(Event::Text(BytesText::new(value)))?;
        self.close(tag)
    }

    fn opt_element(&mut self, tag: &str, value: Option<&String>) -> Result<()> {
        if let Some(value) = value {
            self.text_element(tag, value)?;
        }
        Ok(())
    }

    fn resource(&mut self, tag: &str, uri: &str) -> Result<()> {
        let mut e = BytesStart::new(tag);
        e.push_attribute(("rdf:resource", uri));
        self.put(Event::Empty(e))
    }

    fn element_uri(&self, id: &ElementId) -> String {
        format!("{}#{}", self.doc.namespace, id)
    }

    fn ref_uri(&self, reference: &ElementRef) -> Result<String> {
        match reference {
            ElementRef::Id(id) => match &id.document_ref {
                None => Ok(self.element_uri(&id.element)),
                Some(document_ref) => {
                    let external = self
                        .doc
                        .external_document_refs
                        .iter()
                        .find(|external| &external.id == document_ref)
                        .ok_or_else(|| {
                            SpdxError::encode(
                                FORMAT,
                                "reference rendering",
                                EncodeErrorKind::UndeclaredDocumentRef {
                                    document_ref: document_ref.as_str().to_string(),
                                },
                            )
                        })?;
                    Ok(format!("{}#{}", external.uri, id.element))
                }
            },
            ElementRef::None => Ok(format!("{SPDX_NS}none")),
            ElementRef::NoAssertion => Ok(format!("{SPDX_NS}noassertion")),
        }
    }

    fn write_relationships(
        &mut self,
        id: &ElementId,
        nested: &mut IndexMap<ElementId, Vec<&Relationship>>,
    ) -> Result<()> {
        for rel in nested.shift_remove(id).unwrap_or_default() {
            self.open("spdx:relationship")?;
            self.open("spdx:Relationship")?;
            self.text_element("spdx:relationshipType", &rel.relationship_type.to_string())?;
            let uri = self.ref_uri(&rel.ref_b)?;
            self.resource("spdx:relatedSpdxElement", &uri)?;
            self.opt_element("rdfs:comment", rel.comment.as_ref())?;
            self.close("spdx:Relationship")?;
            self.close("spdx:relationship")?;
        }
        Ok(())
    }

    fn write_annotations(
        &mut self,
        id: &ElementId,
        annotations: &mut IndexMap<ElementId, Vec<Annotation>>,
    ) -> Result<()> {
        for annotation in annotations.shift_remove(id).unwrap_or_default() {
            self.open("spdx:annotation")?;
            self.open("spdx:Annotation")?;
            self.text_element("spdx:annotationDate", &format_timestamp(&annotation.date))?;
            self.text_element("spdx:annotationType", &annotation.annotation_type.to_string())?;
            self.text_element("spdx:annotator", &annotation.annotator.to_string())?;
            self.text_element("rdfs:comment", &annotation.comment)?;
            self.close("spdx:Annotation")?;
            self.close("spdx:annotation")?;
        }
        Ok(())
    }

    fn write_checksum(&mut self, tag: &str, checksum: &Checksum) -> Result<()> {
        self.open(tag)?;
        self.open("spdx:Checksum")?;
        self.text_element("spdx:algorithm", &checksum.algorithm.to_string())?;
        self.text_element("spdx:checksumValue", &checksum.value)?;
        self.close("spdx:Checksum")?;
        self.close(tag)
    }

    fn write_document(
        &mut self,
        nested: &mut IndexMap<ElementId, Vec<&Relationship>>,
        annotations: &mut IndexMap<ElementId, Vec<Annotation>>,
    ) -> Result<()> {
        let doc = self.doc;
        let about = self.element_uri(&doc.id);
        self.open_about("spdx:SpdxDocument", &about)?;
        self.text_element("spdx:specVersion", &doc.spec_version.to_string())?;
        self.resource(
            "spdx:dataLicense",
            &format!("{LICENSE_NS}{}", doc.data_license),
        )?;
        self.text_element("spdx:name", &doc.name)?;
        self.opt_element("rdfs:comment", doc.comment.as_ref())?;

        self.open("spdx:creationInfo")?;
        self.open("spdx:CreationInfo")?;
        self.opt_element(
            "spdx:licenseListVersion",
            doc.creation_info.license_list_version.as_ref(),
        )?;
        for creator in &doc.creation_info.creators {
            self.text_element("spdx:creator", &creator.to_string())?;
        }
        self.text_element("spdx:created", &format_timestamp(&doc.creation_info.created))?;
        self.opt_element("rdfs:comment", doc.creation_info.comment.as_ref())?;
        self.close("spdx:CreationInfo")?;
        self.close("spdx:creationInfo")?;

        for external in &doc.external_document_refs {
            let about = format!("{}#{}", doc.namespace, external.id);
            self.open("spdx:externalDocumentRef")?;
            self.open_about("spdx:ExternalDocumentRef", &about)?;
            self.resource("spdx:spdxDocument", &external.uri)?;
            self.write_checksum("spdx:checksum", &external.checksum)?;
            self.close("spdx:ExternalDocumentRef")?;
            self.close("spdx:externalDocumentRef")?;
        }

        for described in normalize::describes_list(doc) {
            let uri = self.element_uri(&described);
            self.resource("spdx:describesPackage", &uri)?;
        }

        self.write_relationships(&doc.id, nested)?;
        self.write_annotations(&doc.id, annotations)?;

        for license in &doc.other_licenses {
            self.open("spdx:hasExtractedLicensingInfo")?;
            self.open("spdx:ExtractedLicensingInfo")?;
            self.text_element("spdx:licenseId", &license.license_id)?;
            self.text_element("spdx:extractedText", &license.extracted_text)?;
            self.opt_element("spdx:name", license.name.as_ref())?;
            for url in &license.cross_references {
                self.text_element("rdfs:seeAlso", url)?;
            }
            self.opt_element("rdfs:comment", license.comment.as_ref())?;
            self.close("spdx:ExtractedLicensingInfo")?;
            self.close("spdx:hasExtractedLicensingInfo")?;
        }

        self.close("spdx:SpdxDocument")
    }

    #[allow(clippy::too_many_lines)]
    fn write_package(
        &mut self,
        pkg: &Package,
        members: Option<&IndexSet<ElementId>>,
        nested: &mut IndexMap<ElementId, Vec<&Relationship>>,
        annotations: &mut IndexMap<ElementId, Vec<Annotation>>,
    ) -> Result<()> {
        let about = self.element_uri(&pkg.id);
        self.open_about("spdx:Package", &about)?;
        self.text_element("spdx:name", &pkg.name)?;
        self.opt_element("spdx:versionInfo", pkg.version.as_ref())?;
        self.opt_element("spdx:packageFileName", pkg.file_name.as_ref())?;
        if let Some(supplier) = &pkg.supplier {
            self.text_element("spdx:supplier", &supplier.to_string())?;
        }
        if let Some(originator) = &pkg.originator {
            self.text_element("spdx:originator", &originator.to_string())?;
        }
        self.text_element("spdx:downloadLocation", &pkg.download_location)?;
        if !pkg.files_analyzed {
            self.text_element("spdx:filesAnalyzed", "false")?;
        }
        if let Some(code) = &pkg.verification_code {
            self.open("spdx:packageVerificationCode")?;
            self.open("spdx:PackageVerificationCode")?;
            self.text_element("spdx:packageVerificationCodeValue", &code.value)?;
            for excluded in &code.excluded_files {
                self.text_element("spdx:packageVerificationCodeExcludedFile", excluded)?;
            }
            self.close("spdx:PackageVerificationCode")?;
            self.close("spdx:packageVerificationCode")?;
        }
        for checksum in &pkg.checksums {
            self.write_checksum("spdx:checksum", checksum)?;
        }
        self.opt_element("doap:homepage", pkg.home_page.as_ref())?;
        self.opt_element("spdx:sourceInfo", pkg.source_info.as_ref())?;
        self.opt_element("spdx:licenseConcluded", pkg.license_concluded.as_ref())?;
        for license in &pkg.license_info_from_files {
            self.text_element("spdx:licenseInfoFromFiles", license)?;
        }
        self.opt_element("spdx:licenseDeclared", pkg.license_declared.as_ref())?;
        self.opt_element("spdx:licenseComments", pkg.license_comments.as_ref())?;
        self.opt_element("spdx:copyrightText", pkg.copyright_text.as_ref())?;
        self.opt_element("spdx:summary", pkg.summary.as_ref())?;
        self.opt_element("spdx:description", pkg.description.as_ref())?;
        self.opt_element("rdfs:comment", pkg.comment.as_ref())?;
        for external_ref in &pkg.external_refs {
            self.open("spdx:externalRef")?;
            self.open("spdx:ExternalRef")?;
            self.text_element("spdx:referenceCategory", &external_ref.category.to_string())?;
            self.text_element("spdx:referenceType", &external_ref.ref_type)?;
            self.text_element("spdx:referenceLocator", &external_ref.locator)?;
            self.opt_element("rdfs:comment", external_ref.comment.as_ref())?;
            self.close("spdx:ExternalRef")?;
            self.close("spdx:externalRef")?;
        }
        for text in &pkg.attribution_texts {
            self.text_element("spdx:attributionText", text)?;
        }
        if self.doc.spec_version >= SpdxVersion::V2_3 {
            if let Some(purpose) = pkg.primary_purpose {
                self.text_element("spdx:primaryPackagePurpose", &purpose.to_string())?;
            }
            if let Some(date) = &pkg.release_date {
                self.text_element("spdx:releaseDate", &format_timestamp(date))?;
            }
            if let Some(date) = &pkg.built_date {
                self.text_element("spdx:builtDate", &format_timestamp(date))?;
            }
            if let Some(date) = &pkg.valid_until_date {
                self.text_element("spdx:validUntilDate", &format_timestamp(date))?;
            }
        }
        for member in members.into_iter().flatten() {
            let uri = self.element_uri(member);
            self.resource("spdx:hasFile", &uri)?;
        }
        self.write_relationships(&pkg.id, nested)?;
        self.write_annotations(&pkg.id, annotations)?;
        self.close("spdx:Package")
    }

    fn write_file(
        &mut self,
        file: &File,
        nested: &mut IndexMap<ElementId, Vec<&Relationship>>,
        annotations: &mut IndexMap<ElementId, Vec<Annotation>>,
    ) -> Result<()> {
        let about = self.element_uri(&file.id);
        self.open_about("spdx:File", &about)?;
        self.text_element("spdx:fileName", &file.name)?;
        for file_type in &file.file_types {
            self.text_element("spdx:fileType", &file_type.to_string())?;
        }
        for checksum in &file.checksums {
            self.write_checksum("spdx:checksum", checksum)?;
        }
        self.opt_element("spdx:licenseConcluded", file.license_concluded.as_ref())?;
        for license in &file.license_info_in_files {
            self.text_element("spdx:licenseInfoInFile", license)?;
        }
        self.opt_element("spdx:licenseComments", file.license_comments.as_ref())?;
        self.opt_element("spdx:copyrightText", file.copyright_text.as_ref())?;
        self.opt_element("rdfs:comment", file.comment.as_ref())?;
        self.opt_element("spdx:noticeText", file.notice_text.as_ref())?;
        for contributor in &file.contributors {
            self.text_element("spdx:fileContributor", contributor)?;
        }
        for text in &file.attribution_texts {
            self.text_element("spdx:attributionText", text)?;
        }
        self.write_relationships(&file.id, nested)?;
        self.write_annotations(&file.id, annotations)?;
        self.close("spdx:File")
    }

    fn write_snippet(
        &mut self,
        snippet: &Snippet,
        nested: &mut IndexMap<ElementId, Vec<&Relationship>>,
        annotations: &mut IndexMap<ElementId, Vec<Annotation>>,
    ) -> Result<()> {
        let about = self.element_uri(&snippet.id);
        let from_uri = self.ref_uri(&snippet.from_file)?;
        self.open_about("spdx:Snippet", &about)?;
        self.resource("spdx:snippetFromFile", &from_uri)?;
        self.opt_element("spdx:name", snippet.name.as_ref())?;
        if let Some(range) = snippet.byte_range {
            self.write_range(&from_uri, "ptr:ByteOffsetPointer", "ptr:offset", range)?;
        }
        if let Some(range) = snippet.line_range {
            self.write_range(&from_uri, "ptr:LineCharPointer", "ptr:lineNumber", range)?;
        }
        self.opt_element("spdx:licenseConcluded", snippet.license_concluded.as_ref())?;
        for license in &snippet.license_info_in_snippets {
            self.text_element("spdx:licenseInfoInSnippet", license)?;
        }
        self.opt_element("spdx:licenseComments", snippet.license_comments.as_ref())?;
        self.opt_element("spdx:copyrightText", snippet.copyright_text.as_ref())?;
        self.opt_element("rdfs:comment", snippet.comment.as_ref())?;
        for text in &snippet.attribution_texts {
            self.text_element("spdx:attributionText", text)?;
        }
        self.write_relationships(&snippet.id, nested)?;
        self.write_annotations(&snippet.id, annotations)?;
        self.close("spdx:Snippet")
    }

    fn write_range(
        &mut self,
        file_uri: &str,
        pointer_tag: &str,
        value_tag: &str,
        range: SnippetRange,
    ) -> Result<()> {
        self.open("spdx:range")?;
        self.open("ptr:StartEndPointer")?;
        for (side, value) in [("ptr:startPointer", range.start), ("ptr:endPointer", range.end)] {
            self.open(side)?;
            self.open(pointer_tag)?;
            self.resource("ptr:reference", file_uri)?;
            self.text_element(value_tag, &value.to_string())?;
            self.close(pointer_tag)?;
            self.close(side)?;
        }
        self.close("ptr:StartEndPointer")?;
        self.close("spdx:range")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::model::AnnotationType;

    const NS: &str = "https://example.com/spdx/minimal";

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:spdx="http://spdx.org/rdf/terms#" xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#" xmlns:doap="http://usefulinc.com/ns/doap#" xmlns:ptr="http://www.w3.org/2009/pointers#">
  <spdx:SpdxDocument rdf:about="https://example.com/spdx/minimal#SPDXRef-DOCUMENT">
    <spdx:specVersion>SPDX-2.3</spdx:specVersion>
    <spdx:dataLicense rdf:resource="http://spdx.org/licenses/CC0-1.0"/>
    <spdx:name>minimal</spdx:name>
    <spdx:creationInfo>
      <spdx:CreationInfo>
        <spdx:creator>Tool: spdx-doc-0.1</spdx:creator>
        <spdx:created>2023-04-01T12:00:00Z</spdx:created>
      </spdx:CreationInfo>
    </spdx:creationInfo>
    <spdx:describesPackage rdf:resource="https://example.com/spdx/minimal#SPDXRef-Package-demo"/>
  </spdx:SpdxDocument>
  <spdx:Package rdf:about="https://example.com/spdx/minimal#SPDXRef-Package-demo">
    <spdx:name>demo</spdx:name>
    <spdx:downloadLocation>NOASSERTION</spdx:downloadLocation>
    <spdx:packageVerificationCode>
      <spdx:PackageVerificationCode>
        <spdx:packageVerificationCodeValue>d6a770ba38583ed4bb4525bd96e50461655d2758</spdx:packageVerificationCodeValue>
      </spdx:PackageVerificationCode>
    </spdx:packageVerificationCode>
    <spdx:hasFile rdf:resource="https://example.com/spdx/minimal#SPDXRef-File-main"/>
  </spdx:Package>
  <spdx:File rdf:about="https://example.com/spdx/minimal#SPDXRef-File-main">
    <spdx:fileName>./src/main.c</spdx:fileName>
    <spdx:checksum>
      <spdx:Checksum>
        <spdx:algorithm rdf:resource="http://spdx.org/rdf/terms#checksumAlgorithm_sha1"/>
        <spdx:checksumValue>c2b4e1c67a2d28fced849ee1bb76e7391b93eb12</spdx:checksumValue>
      </spdx:Checksum>
    </spdx:checksum>
  </spdx:File>
</rdf:RDF>
"#;

    #[test]
    fn test_decode_minimal() {
        let doc = RdfCodec::new().decode_str(MINIMAL).unwrap();
        assert_eq!(doc.spec_version, SpdxVersion::V2_3);
        assert_eq!(doc.data_license, "CC0-1.0");
        assert_eq!(doc.namespace, NS);
        assert_eq!(doc.packages.len(), 1);
        assert_eq!(doc.files.len(), 1);
        // hasFile and describesPackage both became relationships.
        assert_eq!(doc.relationships.len(), 2);
        assert_eq!(
            doc.described_packages(),
            vec![ElementId::new("Package-demo").unwrap()]
        );
        // URI-coded algorithm decoded to the canonical spelling.
        assert_eq!(doc.files[0].checksums[0].algorithm.to_string(), "SHA1");
    }

    #[test]
    fn test_round_trip_is_fixpoint() {
        let codec = RdfCodec::new();
        let doc = codec.decode_str(MINIMAL).unwrap();
        let encoded = codec.encode_to_string(&doc).unwrap();
        let again = codec.decode_str(&encoded).unwrap();
        assert_eq!(doc.content_digest(), again.content_digest());
    }

    #[test]
    fn test_rdf_and_json_agree() {
        let from_rdf = RdfCodec::new().decode_str(MINIMAL).unwrap();
        let as_json = JsonCodec::new().encode_to_string(&from_rdf).unwrap();
        let from_json = JsonCodec::new().decode_str(&as_json).unwrap();
        assert_eq!(from_rdf.content_digest(), from_json.content_digest());
    }

    #[test]
    fn test_nested_relationship_with_vocab_resource() {
        let content = MINIMAL.replace(
            "    <spdx:hasFile rdf:resource=\"https://example.com/spdx/minimal#SPDXRef-File-main\"/>",
            "    <spdx:hasFile rdf:resource=\"https://example.com/spdx/minimal#SPDXRef-File-main\"/>\n    <spdx:relationship>\n      <spdx:Relationship>\n        <spdx:relationshipType rdf:resource=\"http://spdx.org/rdf/terms#relationshipType_dependsOn\"/>\n        <spdx:relatedSpdxElement rdf:resource=\"http://spdx.org/rdf/terms#noassertion\"/>\n        <rdfs:comment>vendored build input</rdfs:comment>\n      </spdx:Relationship>\n    </spdx:relationship>",
        );
        let doc = RdfCodec::new().decode_str(&content).unwrap();
        let rel = doc
            .relationships
            .iter()
            .find(|rel| rel.relationship_type == RelationshipType::DependsOn)
            .unwrap();
        assert_eq!(
            rel.ref_a.as_local(),
            Some(&ElementId::new("Package-demo").unwrap())
        );
        assert_eq!(rel.ref_b, ElementRef::NoAssertion);
        assert_eq!(rel.comment.as_deref(), Some("vendored build input"));

        // Commented edges survive a round trip.
        let codec = RdfCodec::new();
        let encoded = codec.encode_to_string(&doc).unwrap();
        let again = codec.decode_str(&encoded).unwrap();
        assert_eq!(doc.content_digest(), again.content_digest());
    }

    #[test]
    fn test_inline_related_element_reference() {
        let content = MINIMAL.replace(
            "    <spdx:hasFile rdf:resource=\"https://example.com/spdx/minimal#SPDXRef-File-main\"/>",
            "    <spdx:hasFile rdf:resource=\"https://example.com/spdx/minimal#SPDXRef-File-main\"/>\n    <spdx:relationship>\n      <spdx:Relationship>\n        <spdx:relationshipType>GENERATED_FROM</spdx:relationshipType>\n        <spdx:relatedSpdxElement>\n          <spdx:SpdxElement rdf:about=\"https://example.com/spdx/minimal#SPDXRef-File-main\"/>\n        </spdx:relatedSpdxElement>\n      </spdx:Relationship>\n    </spdx:relationship>",
        );
        let doc = RdfCodec::new().decode_str(&content).unwrap();
        let rel = doc
            .relationships
            .iter()
            .find(|rel| rel.relationship_type == RelationshipType::GeneratedFrom)
            .unwrap();
        assert_eq!(
            rel.ref_b.as_local(),
            Some(&ElementId::new("File-main").unwrap())
        );
    }

    #[test]
    fn test_snippet_ranges_round_trip() {
        let content = MINIMAL.replace(
            "</rdf:RDF>",
            r#"  <spdx:Snippet rdf:about="https://example.com/spdx/minimal#SPDXRef-Snippet-1">
    <spdx:snippetFromFile rdf:resource="https://example.com/spdx/minimal#SPDXRef-File-main"/>
    <spdx:range>
      <ptr:StartEndPointer>
        <ptr:startPointer>
          <ptr:ByteOffsetPointer>
            <ptr:reference rdf:resource="https://example.com/spdx/minimal#SPDXRef-File-main"/>
            <ptr:offset>310</ptr:offset>
          </ptr:ByteOffsetPointer>
        </ptr:startPointer>
        <ptr:endPointer>
          <ptr:ByteOffsetPointer>
            <ptr:reference rdf:resource="https://example.com/spdx/minimal#SPDXRef-File-main"/>
            <ptr:offset>420</ptr:offset>
          </ptr:ByteOffsetPointer>
        </ptr:endPointer>
      </ptr:StartEndPointer>
    </spdx:range>
    <spdx:range>
      <ptr:StartEndPointer>
        <ptr:startPointer>
          <ptr:LineCharPointer>
            <ptr:reference rdf:resource="https://example.com/spdx/minimal#SPDXRef-File-main"/>
            <ptr:lineNumber>5</ptr:lineNumber>
          </ptr:LineCharPointer>
        </ptr:startPointer>
        <ptr:endPointer>
          <ptr:LineCharPointer>
            <ptr:reference rdf:resource="https://example.com/spdx/minimal#SPDXRef-File-main"/>
            <ptr:lineNumber>23</ptr:lineNumber>
          </ptr:LineCharPointer>
        </ptr:endPointer>
      </ptr:StartEndPointer>
    </spdx:range>
  </spdx:Snippet>
</rdf:RDF>"#,
        );
        let codec = RdfCodec::new();
        let doc = codec.decode_str(&content).unwrap();
        assert_eq!(doc.snippets.len(), 1);
        assert_eq!(
            doc.snippets[0].byte_range,
            Some(SnippetRange { start: 310, end: 420 })
        );
        assert_eq!(
            doc.snippets[0].line_range,
            Some(SnippetRange { start: 5, end: 23 })
        );

        let encoded = codec.encode_to_string(&doc).unwrap();
        let again = codec.decode_str(&encoded).unwrap();
        assert_eq!(again.snippets, doc.snippets);
    }

    #[test]
    fn test_sentinel_relationship_subject_fails_encode() {
        let codec = RdfCodec::new();
        let mut doc = codec.decode_str(MINIMAL).unwrap();
        doc.add_relationship(Relationship::new(
            ElementRef::NoAssertion,
            RelationshipType::DependsOn,
            ElementId::new("Package-demo").unwrap(),
        ));

        let err = codec.encode_to_string(&doc).unwrap_err();
        assert!(matches!(
            err,
            SpdxError::Encode {
                source: EncodeErrorKind::UnrepresentableRelationship { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_annotation_round_trip() {
        let content = MINIMAL.replace(
            "    <spdx:describesPackage",
            "    <spdx:annotation>\n      <spdx:Annotation>\n        <spdx:annotationDate>2023-04-02T08:30:00Z</spdx:annotationDate>\n        <spdx:annotationType rdf:resource=\"http://spdx.org/rdf/terms#annotationType_review\"/>\n        <spdx:annotator>Person: Jane Doe</spdx:annotator>\n        <rdfs:comment>checked manually</rdfs:comment>\n      </spdx:Annotation>\n    </spdx:annotation>\n    <spdx:describesPackage",
        );
        let codec = RdfCodec::new();
        let doc = codec.decode_str(&content).unwrap();
        assert_eq!(doc.annotations.len(), 1);
        assert_eq!(doc.annotations[0].annotation_type, AnnotationType::Review);
        assert!(doc.annotations[0]
            .target
            .as_local()
            .is_some_and(ElementId::is_document));

        let encoded = codec.encode_to_string(&doc).unwrap();
        let again = codec.decode_str(&encoded).unwrap();
        assert_eq!(again.annotations, doc.annotations);
    }

    #[test]
    fn test_detect_confidence() {
        let codec = RdfCodec::new();
        let detection = codec.detect(MINIMAL);
        assert_eq!(detection.confidence.value(), FormatConfidence::CERTAIN.value());
        assert_eq!(detection.version.as_deref(), Some("SPDX-2.3"));

        assert_eq!(
            codec.detect("SPDXVersion: SPDX-2.3").confidence.value(),
            FormatConfidence::NONE.value()
        );
        assert_eq!(
            codec.detect("{\"spdxVersion\": \"SPDX-2.3\"}").confidence.value(),
            FormatConfidence::NONE.value()
        );
    }

    #[test]
    fn test_vocab_value_spellings() {
        assert_eq!(
            vocab_value("http://spdx.org/rdf/terms#relationshipType_dependsOn"),
            "DEPENDS_ON"
        );
        assert_eq!(
            vocab_value("http://spdx.org/rdf/terms#checksumAlgorithm_sha1"),
            "SHA1"
        );
        assert_eq!(vocab_value("DEPENDS_ON"), "DEPENDS_ON");
    }

    #[test]
    fn test_resolve_external_reference() {
        let content = MINIMAL.replace(
            "    <spdx:describesPackage",
            "    <spdx:externalDocumentRef>\n      <spdx:ExternalDocumentRef rdf:about=\"https://example.com/spdx/minimal#DocumentRef-other\">\n        <spdx:spdxDocument rdf:resource=\"https://example.com/spdx/other\"/>\n        <spdx:checksum>\n          <spdx:Checksum>\n            <spdx:algorithm>SHA1</spdx:algorithm>\n            <spdx:checksumValue>85ed0817af83a24ad8da68c2b5094de69833983c</spdx:checksumValue>\n          </spdx:Checksum>\n        </spdx:checksum>\n      </spdx:ExternalDocumentRef>\n    </spdx:externalDocumentRef>\n    <spdx:relationship>\n      <spdx:Relationship>\n        <spdx:relationshipType>DEPENDS_ON</spdx:relationshipType>\n        <spdx:relatedSpdxElement rdf:resource=\"https://example.com/spdx/other#SPDXRef-Package-dep\"/>\n      </spdx:Relationship>\n    </spdx:relationship>\n    <spdx:describesPackage",
        );
        let doc = RdfCodec::new().decode_str(&content).unwrap();
        let rel = doc
            .relationships
            .iter()
            .find(|rel| rel.relationship_type == RelationshipType::DependsOn)
            .unwrap();
        assert_eq!(
            rel.ref_b.to_string(),
            "DocumentRef-other:SPDXRef-Package-dep"
        );

        // The external scoping survives re-encoding.
        let codec = RdfCodec::new();
        let encoded = codec.encode_to_string(&doc).unwrap();
        assert!(encoded.contains("https://example.com/spdx/other#SPDXRef-Package-dep"));
        let again = codec.decode_str(&encoded).unwrap();
        assert_eq!(doc.content_digest(), again.content_digest());
    }
}
