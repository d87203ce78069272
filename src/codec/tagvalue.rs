//! Tag-value codec.
//!
//! The line-oriented `Tag: value` format. Sections are positional: a
//! `PackageName` line opens a package, a `FileName` line opens a file that
//! belongs to the package currently open (or to no package), and so on until
//! the next section start or end of input. Multi-line values are wrapped in
//! `<text>...</text>` markers.
//!
//! Decoding accumulates raw string records per section and converts them to
//! model types when the section closes, so diagnostics can say which section
//! was incomplete. Files nested under a package become flat files plus
//! derived `CONTAINS` relationships; encoding reverses that through the
//! shared derivation rules.

use std::io::Write;

use tracing::debug;

use crate::codec::{
    check_requested_version, finish_decode, normalize, FormatConfidence, FormatDetection,
    SpdxCodec,
};
use crate::error::{FormatErrorKind, Result, SpdxError};
use crate::model::{
    format_timestamp, parse_timestamp, Agent, Annotation, AnnotationType, Checksum, CreationInfo,
    Document, DocumentRefId, ElementId, ElementRef, ExternalDocumentRef, ExternalPackageRef,
    ExternalRefCategory, File, FileType, OtherLicense, Package, PackageVerificationCode,
    Relationship, RelationshipType, Snippet, SnippetRange, SpdxVersion,
};

const FORMAT: &str = "tag-value";

/// Codec for the SPDX tag-value format.
#[derive(Debug, Clone, Default)]
pub struct TagValueCodec {
    version: Option<SpdxVersion>,
}

impl TagValueCodec {
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

impl SpdxCodec for TagValueCodec {
    fn decode_str(&self, content: &str) -> Result<Document> {
        let mut decoder = Decoder::default();
        decoder.run(content)?;
        let (doc, facts) = decoder.finish()?;
        check_requested_version(FORMAT, doc.spec_version, self.version)?;
        finish_decode(doc, facts)
    }

    fn encode(&self, doc: &Document, sink: &mut dyn Write) -> Result<()> {
        Encoder { sink }.write_document(doc)
    }

    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn detect(&self, content: &str) -> FormatDetection {
        let trimmed = content.trim_start();
        let has_version_tag =
            trimmed.starts_with("SPDXVersion:") || content.contains("\nSPDXVersion:");
        if !has_version_tag {
            // Documents may open with comment lines.
            let first_real = content
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty() && !l.starts_with('#'));
            if !first_real.is_some_and(|l| l.starts_with("SPDXVersion:")) {
                return FormatDetection::no_match();
            }
        }

        let version = extract_tag(content, "SPDXVersion");
        let has_doc_id = content.contains("SPDXID:");
        let has_data_license = content.contains("DataLicense:");

        let confidence = if has_doc_id && has_data_license {
            FormatConfidence::CERTAIN
        } else {
            FormatConfidence::HIGH
        };
        let mut detection = FormatDetection::with_confidence(confidence);
        if let Some(version) = version {
            detection = detection.version(&version);
        }
        detection
    }
}

fn extract_tag(content: &str, tag: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == tag).then(|| value.trim().to_string())
    })
}

fn invalid_line(line: usize, message: impl Into<String>) -> SpdxError {
    SpdxError::decode(
        FORMAT,
        format!("line {line}"),
        FormatErrorKind::InvalidTagValue {
            line,
            message: message.into(),
        },
    )
}

fn invalid_value(context: &str, field: &str, message: impl Into<String>) -> SpdxError {
    SpdxError::decode(
        FORMAT,
        context,
        FormatErrorKind::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        },
    )
}

// ============================================================================
// Decoder
// ============================================================================

/// Raw per-section accumulators. Values stay strings until the section
/// closes; conversion errors then name the section they came from.
#[derive(Debug, Default)]
struct RawPackage {
    start_line: usize,
    name: String,
    id: Option<String>,
    version: Option<String>,
    file_name: Option<String>,
    supplier: Option<String>,
    originator: Option<String>,
    download_location: Option<String>,
    files_analyzed: Option<String>,
    verification_code: Option<String>,
    checksums: Vec<String>,
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

#[derive(Debug)]
struct RawExternalRef {
    value: String,
    comment: Option<String>,
}

impl RawPackage {
    fn context(&self) -> String {
        format!("package '{}' (line {})", self.name, self.start_line)
    }

    fn build(self) -> Result<Package> {
        let ctx = self.context();
        let id = self
            .id
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "SPDXID", &ctx))?
            .parse::<ElementId>()?;
        let mut pkg = Package::new(id, self.name);
        pkg.version = self.version;
        pkg.file_name = self.file_name;
        pkg.supplier = parse_opt_agent(self.supplier, &ctx, "PackageSupplier")?;
        pkg.originator = parse_opt_agent(self.originator, &ctx, "PackageOriginator")?;
        if let Some(loc) = self.download_location {
            pkg.download_location = loc;
        }
        if let Some(analyzed) = self.files_analyzed {
            pkg.files_analyzed = match analyzed.as_str() {
                "true" => true,
                "false" => false,
                other => {
                    return Err(invalid_value(
                        &ctx,
                        "FilesAnalyzed",
                        format!("expected true or false, got '{other}'"),
                    ));
                }
            };
        }
        if let Some(code) = self.verification_code {
            pkg.verification_code = Some(parse_verification_code(&code));
        }
        for checksum in self.checksums {
            pkg.checksums.push(parse_checksum(&checksum, &ctx)?);
        }
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
        for external_ref in self.external_refs {
            pkg.external_refs.push(parse_external_ref(&external_ref, &ctx)?);
        }
        pkg.attribution_texts = self.attribution_texts;
        if let Some(purpose) = self.primary_purpose {
            pkg.primary_purpose = Some(purpose.parse().map_err(|_| {
                invalid_value(&ctx, "PrimaryPackagePurpose", format!("unknown purpose '{purpose}'"))
            })?);
        }
        pkg.release_date = parse_opt_date(self.release_date, &ctx, "ReleaseDate")?;
        pkg.built_date = parse_opt_date(self.built_date, &ctx, "BuiltDate")?;
        pkg.valid_until_date = parse_opt_date(self.valid_until_date, &ctx, "ValidUntilDate")?;
        Ok(pkg)
    }
}

#[derive(Debug, Default)]
struct RawFile {
    start_line: usize,
    name: String,
    id: Option<String>,
    file_types: Vec<String>,
    checksums: Vec<String>,
    license_concluded: Option<String>,
    license_info_in_files: Vec<String>,
    license_comments: Option<String>,
    copyright_text: Option<String>,
    comment: Option<String>,
    notice_text: Option<String>,
    contributors: Vec<String>,
    attribution_texts: Vec<String>,
}

impl RawFile {
    fn context(&self) -> String {
        format!("file '{}' (line {})", self.name, self.start_line)
    }

    fn build(self) -> Result<File> {
        let ctx = self.context();
        let id = self
            .id
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "SPDXID", &ctx))?
            .parse::<ElementId>()?;
        let mut file = File::new(id, self.name);
        for file_type in self.file_types {
            file.file_types.push(file_type.parse::<FileType>().map_err(|_| {
                invalid_value(&ctx, "FileType", format!("unknown file type '{file_type}'"))
            })?);
        }
        for checksum in self.checksums {
            file.checksums.push(parse_checksum(&checksum, &ctx)?);
        }
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

#[derive(Debug, Default)]
struct RawSnippet {
    start_line: usize,
    id: String,
    from_file: Option<String>,
    name: Option<String>,
    byte_range: Option<String>,
    line_range: Option<String>,
    license_concluded: Option<String>,
    license_info_in_snippets: Vec<String>,
    license_comments: Option<String>,
    copyright_text: Option<String>,
    comment: Option<String>,
    attribution_texts: Vec<String>,
}

impl RawSnippet {
    fn context(&self) -> String {
        format!("snippet '{}' (line {})", self.id, self.start_line)
    }

    fn build(self) -> Result<Snippet> {
        let ctx = self.context();
        let id = self.id.parse::<ElementId>()?;
        let from_file = self
            .from_file
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "SnippetFromFileSPDXID", &ctx))?
            .parse::<ElementRef>()?;
        let mut snippet = Snippet::new(id, from_file);
        snippet.name = self.name;
        snippet.byte_range = parse_opt_range(self.byte_range, &ctx, "SnippetByteRange")?;
        snippet.line_range = parse_opt_range(self.line_range, &ctx, "SnippetLineRange")?;
        snippet.license_concluded = self.license_concluded;
        snippet.license_info_in_snippets = self.license_info_in_snippets;
        snippet.license_comments = self.license_comments;
        snippet.copyright_text = self.copyright_text;
        snippet.comment = self.comment;
        snippet.attribution_texts = self.attribution_texts;
        Ok(snippet)
    }
}

#[derive(Debug, Default)]
struct RawLicense {
    start_line: usize,
    id: String,
    extracted_text: Option<String>,
    name: Option<String>,
    cross_references: Vec<String>,
    comment: Option<String>,
}

impl RawLicense {
    fn build(self) -> Result<OtherLicense> {
        let ctx = format!("license '{}' (line {})", self.id, self.start_line);
        let text = self
            .extracted_text
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "ExtractedText", &ctx))?;
        let mut license = OtherLicense::new(self.id, text)?;
        license.name = self.name;
        license.cross_references = self.cross_references;
        license.comment = self.comment;
        Ok(license)
    }
}

#[derive(Debug, Default)]
struct RawAnnotation {
    start_line: usize,
    annotator: String,
    date: Option<String>,
    annotation_type: Option<String>,
    target: Option<String>,
    comment: Option<String>,
}

impl RawAnnotation {
    fn build(self) -> Result<Annotation> {
        let ctx = format!("annotation (line {})", self.start_line);
        let annotator = self.annotator.parse::<Agent>().map_err(|_| {
            invalid_value(&ctx, "Annotator", format!("unparseable annotator '{}'", self.annotator))
        })?;
        let date = self
            .date
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "AnnotationDate", &ctx))?;
        let date = parse_timestamp(&date)
            .map_err(|_| invalid_value(&ctx, "AnnotationDate", format!("invalid timestamp '{date}'")))?;
        let annotation_type = self
            .annotation_type
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "AnnotationType", &ctx))?;
        let annotation_type = annotation_type.parse::<AnnotationType>().map_err(|_| {
            invalid_value(
                &ctx,
                "AnnotationType",
                format!("unknown annotation type '{annotation_type}'"),
            )
        })?;
        let target = self
            .target
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "SPDXREF", &ctx))?
            .parse::<ElementRef>()?;
        let comment = self
            .comment
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "AnnotationComment", &ctx))?;
        Ok(Annotation::new(target, annotator, annotation_type, date, comment))
    }
}

fn parse_opt_agent(value: Option<String>, ctx: &str, field: &str) -> Result<Option<Agent>> {
    value
        .map(|v| {
            v.parse::<Agent>()
                .map_err(|_| invalid_value(ctx, field, format!("unparseable agent '{v}'")))
        })
        .transpose()
}

fn parse_opt_date(
    value: Option<String>,
    ctx: &str,
    field: &str,
) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    value
        .map(|v| {
            parse_timestamp(&v)
                .map_err(|_| invalid_value(ctx, field, format!("invalid timestamp '{v}'")))
        })
        .transpose()
}

fn parse_opt_range(value: Option<String>, ctx: &str, field: &str) -> Result<Option<SnippetRange>> {
    value
        .map(|v| {
            v.parse::<SnippetRange>()
                .map_err(|_| invalid_value(ctx, field, format!("invalid range '{v}'")))
        })
        .transpose()
}

fn parse_checksum(value: &str, ctx: &str) -> Result<Checksum> {
    value
        .parse::<Checksum>()
        .map_err(|_| invalid_value(ctx, "Checksum", format!("unparseable checksum '{value}'")))
}

/// `value (excludes: ./a.c, ./b.c)` with the excludes part optional.
fn parse_verification_code(value: &str) -> PackageVerificationCode {
    match value.split_once("(excludes:") {
        Some((code, excludes)) => {
            let mut result = PackageVerificationCode::new(code.trim());
            for name in excludes.trim_end_matches(')').split(',') {
                let name = name.trim();
                if !name.is_empty() {
                    result = result.with_excluded_file(name);
                }
            }
            result
        }
        None => PackageVerificationCode::new(value.trim()),
    }
}

/// `CATEGORY type locator`, whitespace separated.
fn parse_external_ref(raw: &RawExternalRef, ctx: &str) -> Result<ExternalPackageRef> {
    let mut parts = raw.value.split_whitespace();
    let (Some(category), Some(ref_type), Some(locator)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid_value(
            ctx,
            "ExternalRef",
            format!("expected 'CATEGORY type locator', got '{}'", raw.value),
        ));
    };
    let category = category.parse::<ExternalRefCategory>().map_err(|_| {
        invalid_value(ctx, "ExternalRef", format!("unknown category '{category}'"))
    })?;
    let mut external_ref = ExternalPackageRef::new(category, ref_type, locator);
    external_ref.comment = raw.comment.clone();
    Ok(external_ref)
}

/// `DocumentRef-id uri ALGO: value`.
fn parse_external_document_ref(value: &str, line: usize) -> Result<ExternalDocumentRef> {
    let mut parts = value.splitn(3, char::is_whitespace);
    let (Some(id), Some(uri), Some(checksum)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid_line(
            line,
            format!("expected 'DocumentRef-id uri ALGO: value', got '{value}'"),
        ));
    };
    let id = id.parse::<DocumentRefId>()?;
    let checksum = checksum.trim().parse::<Checksum>().map_err(|_| {
        invalid_line(line, format!("unparseable external document checksum '{checksum}'"))
    })?;
    Ok(ExternalDocumentRef::new(id, uri, checksum))
}

/// `SPDXRef-a TYPE SPDXRef-b`, endpoints may be sentinels or scoped.
fn parse_relationship_line(value: &str, line: usize) -> Result<Relationship> {
    let mut parts = value.split_whitespace();
    let (Some(a), Some(rel_type), Some(b)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid_line(
            line,
            format!("expected 'ref TYPE ref', got '{value}'"),
        ));
    };
    let ref_a = a.parse::<ElementRef>()?;
    let relationship_type = rel_type.parse::<RelationshipType>().map_err(|_| {
        invalid_line(line, format!("unknown relationship type '{rel_type}'"))
    })?;
    let ref_b = b.parse::<ElementRef>()?;
    Ok(Relationship::new(ref_a, relationship_type, ref_b))
}

#[derive(Debug, Default)]
struct Decoder {
    version: Option<String>,
    data_license: Option<String>,
    doc_id: Option<String>,
    name: Option<String>,
    namespace: Option<String>,
    doc_comment: Option<String>,
    license_list_version: Option<String>,
    creators: Vec<String>,
    created: Option<String>,
    creator_comment: Option<String>,
    external_document_refs: Vec<ExternalDocumentRef>,
    packages: Vec<Package>,
    files: Vec<File>,
    snippets: Vec<Snippet>,
    licenses: Vec<OtherLicense>,
    annotations: Vec<Annotation>,
    relationships: Vec<Relationship>,
    facts: normalize::DerivedFacts,

    current_package: Option<RawPackage>,
    current_package_files: Vec<ElementId>,
    current_file: Option<RawFile>,
    current_snippet: Option<RawSnippet>,
    current_license: Option<RawLicense>,
    current_annotation: Option<RawAnnotation>,
}

impl Decoder {
    fn run(&mut self, content: &str) -> Result<()> {
        // key, accumulated value, line where the block opened
        let mut pending_text: Option<(String, String, usize)> = None;

        for (idx, raw_line) in content.lines().enumerate() {
            let line_no = idx + 1;

            if let Some((key, mut buf, start)) = pending_text.take() {
                if let Some(last) = raw_line.trim_end().strip_suffix("</text>") {
                    buf.push('\n');
                    buf.push_str(last);
                    self.dispatch(&key, &buf, start)?;
                } else {
                    buf.push('\n');
                    buf.push_str(raw_line);
                    pending_text = Some((key, buf, start));
                }
                continue;
            }

            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                return Err(invalid_line(line_no, "expected 'Tag: value'"));
            };
            let key = key.trim();
            let value = value.trim();

            if let Some(rest) = value.strip_prefix("<text>") {
                if let Some(inner) = rest.strip_suffix("</text>") {
                    self.dispatch(key, inner, line_no)?;
                } else {
                    pending_text = Some((key.to_string(), rest.to_string(), line_no));
                }
            } else {
                self.dispatch(key, value, line_no)?;
            }
        }

        if let Some((_, _, start)) = pending_text {
            return Err(invalid_line(start, "unterminated <text> block"));
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn dispatch(&mut self, key: &str, value: &str, line: usize) -> Result<()> {
        match key {
            // -- document ----------------------------------------------------
            "SPDXVersion" => self.version = Some(value.to_string()),
            "DataLicense" => self.data_license = Some(value.to_string()),
            "SPDXID" => {
                if let Some(file) = &mut self.current_file {
                    file.id = Some(value.to_string());
                } else if let Some(pkg) = &mut self.current_package {
                    pkg.id = Some(value.to_string());
                } else {
                    self.doc_id = Some(value.to_string());
                }
            }
            "DocumentName" => self.name = Some(value.to_string()),
            "DocumentNamespace" => self.namespace = Some(value.to_string()),
            "DocumentComment" => self.doc_comment = Some(value.to_string()),
            "ExternalDocumentRef" => {
                self.external_document_refs
                    .push(parse_external_document_ref(value, line)?);
            }
            "LicenseListVersion" => self.license_list_version = Some(value.to_string()),
            "Creator" => self.creators.push(value.to_string()),
            "Created" => self.created = Some(value.to_string()),
            "CreatorComment" => self.creator_comment = Some(value.to_string()),

            // -- package -----------------------------------------------------
            "PackageName" => {
                self.flush_file()?;
                self.flush_snippet()?;
                self.flush_package()?;
                self.current_package = Some(RawPackage {
                    start_line: line,
                    name: value.to_string(),
                    ..RawPackage::default()
                });
            }
            "PackageVersion" => self.package_field(line, |p| p.version = Some(value.into()))?,
            "PackageFileName" => self.package_field(line, |p| p.file_name = Some(value.into()))?,
            "PackageSupplier" => self.package_field(line, |p| p.supplier = Some(value.into()))?,
            "PackageOriginator" => {
                self.package_field(line, |p| p.originator = Some(value.into()))?;
            }
            "PackageDownloadLocation" => {
                self.package_field(line, |p| p.download_location = Some(value.into()))?;
            }
            "FilesAnalyzed" => {
                self.package_field(line, |p| p.files_analyzed = Some(value.into()))?;
            }
            "PackageVerificationCode" => {
                self.package_field(line, |p| p.verification_code = Some(value.into()))?;
            }
            "PackageChecksum" => self.package_field(line, |p| p.checksums.push(value.into()))?,
            "PackageHomePage" => self.package_field(line, |p| p.home_page = Some(value.into()))?,
            "PackageSourceInfo" => {
                self.package_field(line, |p| p.source_info = Some(value.into()))?;
            }
            "PackageLicenseConcluded" => {
                self.package_field(line, |p| p.license_concluded = Some(value.into()))?;
            }
            "PackageLicenseInfoFromFiles" => {
                self.package_field(line, |p| p.license_info_from_files.push(value.into()))?;
            }
            "PackageLicenseDeclared" => {
                self.package_field(line, |p| p.license_declared = Some(value.into()))?;
            }
            "PackageLicenseComments" => {
                self.package_field(line, |p| p.license_comments = Some(value.into()))?;
            }
            "PackageCopyrightText" => {
                self.package_field(line, |p| p.copyright_text = Some(value.into()))?;
            }
            "PackageSummary" => self.package_field(line, |p| p.summary = Some(value.into()))?,
            "PackageDescription" => {
                self.package_field(line, |p| p.description = Some(value.into()))?;
            }
            "PackageComment" => self.package_field(line, |p| p.comment = Some(value.into()))?,
            "ExternalRef" => self.package_field(line, |p| {
                p.external_refs.push(RawExternalRef {
                    value: value.into(),
                    comment: None,
                });
            })?,
            "ExternalRefComment" => self.package_field(line, |p| {
                if let Some(last) = p.external_refs.last_mut() {
                    last.comment = Some(value.into());
                }
            })?,
            "PackageAttributionText" => {
                self.package_field(line, |p| p.attribution_texts.push(value.into()))?;
            }
            "PrimaryPackagePurpose" => {
                self.package_field(line, |p| p.primary_purpose = Some(value.into()))?;
            }
            "ReleaseDate" => self.package_field(line, |p| p.release_date = Some(value.into()))?,
            "BuiltDate" => self.package_field(line, |p| p.built_date = Some(value.into()))?,
            "ValidUntilDate" => {
                self.package_field(line, |p| p.valid_until_date = Some(value.into()))?;
            }

            // -- file --------------------------------------------------------
            "FileName" => {
                self.flush_file()?;
                self.flush_snippet()?;
                self.current_file = Some(RawFile {
                    start_line: line,
                    name: value.to_string(),
                    ..RawFile::default()
                });
            }
            "FileType" => self.file_field(line, |f| f.file_types.push(value.into()))?,
            "FileChecksum" => self.file_field(line, |f| f.checksums.push(value.into()))?,
            "LicenseConcluded" => {
                self.file_field(line, |f| f.license_concluded = Some(value.into()))?;
            }
            "LicenseInfoInFile" => {
                self.file_field(line, |f| f.license_info_in_files.push(value.into()))?;
            }
            "LicenseComments" => {
                self.file_field(line, |f| f.license_comments = Some(value.into()))?;
            }
            "FileCopyrightText" => {
                self.file_field(line, |f| f.copyright_text = Some(value.into()))?;
            }
            "FileComment" => self.file_field(line, |f| f.comment = Some(value.into()))?,
            "FileNotice" => self.file_field(line, |f| f.notice_text = Some(value.into()))?,
            "FileContributor" => self.file_field(line, |f| f.contributors.push(value.into()))?,
            "FileAttributionText" => {
                self.file_field(line, |f| f.attribution_texts.push(value.into()))?;
            }

            // -- snippet -----------------------------------------------------
            "SnippetSPDXID" => {
                self.flush_snippet()?;
                self.current_snippet = Some(RawSnippet {
                    start_line: line,
                    id: value.to_string(),
                    ..RawSnippet::default()
                });
            }
            "SnippetFromFileSPDXID" => {
                self.snippet_field(line, |s| s.from_file = Some(value.into()))?;
            }
            "SnippetByteRange" => {
                self.snippet_field(line, |s| s.byte_range = Some(value.into()))?;
            }
            "SnippetLineRange" => {
                self.snippet_field(line, |s| s.line_range = Some(value.into()))?;
            }
            "SnippetLicenseConcluded" => {
                self.snippet_field(line, |s| s.license_concluded = Some(value.into()))?;
            }
            "LicenseInfoInSnippet" => {
                self.snippet_field(line, |s| s.license_info_in_snippets.push(value.into()))?;
            }
            "SnippetLicenseComments" => {
                self.snippet_field(line, |s| s.license_comments = Some(value.into()))?;
            }
            "SnippetCopyrightText" => {
                self.snippet_field(line, |s| s.copyright_text = Some(value.into()))?;
            }
            "SnippetComment" => self.snippet_field(line, |s| s.comment = Some(value.into()))?,
            "SnippetName" => self.snippet_field(line, |s| s.name = Some(value.into()))?,
            "SnippetAttributionText" => {
                self.snippet_field(line, |s| s.attribution_texts.push(value.into()))?;
            }

            // -- other license -----------------------------------------------
            "LicenseID" => {
                self.flush_license()?;
                self.current_license = Some(RawLicense {
                    start_line: line,
                    id: value.to_string(),
                    ..RawLicense::default()
                });
            }
            "ExtractedText" => {
                self.license_field(line, |l| l.extracted_text = Some(value.into()))?;
            }
            "LicenseName" => self.license_field(line, |l| l.name = Some(value.into()))?,
            "LicenseCrossReference" => {
                self.license_field(line, |l| l.cross_references.push(value.into()))?;
            }
            "LicenseComment" => self.license_field(line, |l| l.comment = Some(value.into()))?,

            // -- relationship ------------------------------------------------
            "Relationship" => {
                self.relationships.push(parse_relationship_line(value, line)?);
            }
            "RelationshipComment" => {
                if let Some(last) = self.relationships.last_mut() {
                    last.comment = Some(value.to_string());
                } else {
                    return Err(invalid_line(line, "RelationshipComment without a Relationship"));
                }
            }

            // -- annotation --------------------------------------------------
            "Annotator" => {
                self.flush_annotation()?;
                self.current_annotation = Some(RawAnnotation {
                    start_line: line,
                    annotator: value.to_string(),
                    ..RawAnnotation::default()
                });
            }
            "AnnotationDate" => self.annotation_field(line, |a| a.date = Some(value.into()))?,
            "AnnotationType" => {
                self.annotation_field(line, |a| a.annotation_type = Some(value.into()))?;
            }
            "SPDXREF" => self.annotation_field(line, |a| a.target = Some(value.into()))?,
            "AnnotationComment" => {
                self.annotation_field(line, |a| a.comment = Some(value.into()))?;
            }

            other => {
                debug!(tag = other, line, "ignoring unknown tag");
            }
        }
        Ok(())
    }

    fn package_field(&mut self, line: usize, f: impl FnOnce(&mut RawPackage)) -> Result<()> {
        match &mut self.current_package {
            Some(pkg) => {
                f(pkg);
                Ok(())
            }
            None => Err(invalid_line(line, "package tag outside a package section")),
        }
    }

    fn file_field(&mut self, line: usize, f: impl FnOnce(&mut RawFile)) -> Result<()> {
        match &mut self.current_file {
            Some(file) => {
                f(file);
                Ok(())
            }
            None => Err(invalid_line(line, "file tag outside a file section")),
        }
    }

    fn snippet_field(&mut self, line: usize, f: impl FnOnce(&mut RawSnippet)) -> Result<()> {
        match &mut self.current_snippet {
            Some(snippet) => {
                f(snippet);
                Ok(())
            }
            None => Err(invalid_line(line, "snippet tag outside a snippet section")),
        }
    }

    fn license_field(&mut self, line: usize, f: impl FnOnce(&mut RawLicense)) -> Result<()> {
        match &mut self.current_license {
            Some(license) => {
                f(license);
                Ok(())
            }
            None => Err(invalid_line(line, "license tag outside a license section")),
        }
    }

    fn annotation_field(&mut self, line: usize, f: impl FnOnce(&mut RawAnnotation)) -> Result<()> {
        match &mut self.current_annotation {
            Some(annotation) => {
                f(annotation);
                Ok(())
            }
            None => Err(invalid_line(line, "annotation tag outside an annotation section")),
        }
    }

    fn flush_file(&mut self) -> Result<()> {
        if let Some(raw) = self.current_file.take() {
            let file = raw.build()?;
            if self.current_package.is_some() {
                self.current_package_files.push(file.id.clone());
            }
            self.files.push(file);
        }
        Ok(())
    }

    fn flush_package(&mut self) -> Result<()> {
        if let Some(raw) = self.current_package.take() {
            let pkg = raw.build()?;
            for file_id in self.current_package_files.drain(..) {
                self.facts.contains.push((pkg.id.clone(), file_id));
            }
            self.packages.push(pkg);
        }
        Ok(())
    }

    fn flush_snippet(&mut self) -> Result<()> {
        if let Some(raw) = self.current_snippet.take() {
            self.snippets.push(raw.build()?);
        }
        Ok(())
    }

    fn flush_license(&mut self) -> Result<()> {
        if let Some(raw) = self.current_license.take() {
            self.licenses.push(raw.build()?);
        }
        Ok(())
    }

    fn flush_annotation(&mut self) -> Result<()> {
        if let Some(raw) = self.current_annotation.take() {
            self.annotations.push(raw.build()?);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(Document, normalize::DerivedFacts)> {
        self.flush_file()?;
        self.flush_snippet()?;
        self.flush_package()?;
        self.flush_license()?;
        self.flush_annotation()?;

        let ctx = "document header";
        let version = self
            .version
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "SPDXVersion", ctx))?
            .parse::<SpdxVersion>()?;
        let data_license = self
            .data_license
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "DataLicense", ctx))?;
        let doc_id = self
            .doc_id
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "SPDXID", ctx))?
            .parse::<ElementId>()?;
        let name = self
            .name
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "DocumentName", ctx))?;
        let namespace = self
            .namespace
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "DocumentNamespace", ctx))?;
        let created = self
            .created
            .ok_or_else(|| SpdxError::missing_field(FORMAT, "Created", ctx))?;
        let created = parse_timestamp(&created)
            .map_err(|_| invalid_value(ctx, "Created", format!("invalid timestamp '{created}'")))?;

        let mut creation_info = CreationInfo::new(created);
        creation_info.license_list_version = self.license_list_version;
        creation_info.comment = self.creator_comment;
        for creator in self.creators {
            let agent = creator.parse::<Agent>().map_err(|_| {
                invalid_value(ctx, "Creator", format!("unparseable creator '{creator}'"))
            })?;
            creation_info.creators.push(agent);
        }

        let mut doc = Document::new(name, namespace, creation_info).with_version(version);
        doc.data_license = data_license;
        doc.id = doc_id;
        doc.comment = self.doc_comment;
        doc.external_document_refs = self.external_document_refs;
        doc.packages = self.packages;
        doc.files = self.files;
        doc.snippets = self.snippets;
        doc.other_licenses = self.licenses;
        doc.annotations = self.annotations;
        doc.relationships = self.relationships;

        Ok((doc, self.facts))
    }
}

// ============================================================================
// Encoder
// ============================================================================

struct Encoder<'a> {
    sink: &'a mut dyn Write,
}

impl Encoder<'_> {
    fn write_document(&mut self, doc: &Document) -> Result<()> {
        let primary_parent = normalize::primary_parent(doc);
        let primary_pairs = normalize::primary_membership_pairs(doc);
        let all_files = normalize::all_files(doc);

        self.tag("SPDXVersion", &doc.spec_version.to_string())?;
        self.tag("DataLicense", &doc.data_license)?;
        self.tag("SPDXID", &doc.id.to_string())?;
        self.tag("DocumentName", &doc.name)?;
        self.tag("DocumentNamespace", &doc.namespace)?;
        for external_ref in &doc.external_document_refs {
            self.tag(
                "ExternalDocumentRef",
                &format!("{} {} {}", external_ref.id, external_ref.uri, external_ref.checksum),
            )?;
        }
        self.opt_tag("DocumentComment", doc.comment.as_deref())?;
        self.blank()?;

        if let Some(version) = &doc.creation_info.license_list_version {
            self.tag("LicenseListVersion", version)?;
        }
        for creator in &doc.creation_info.creators {
            self.tag("Creator", &creator.to_string())?;
        }
        self.tag("Created", &format_timestamp(&doc.creation_info.created))?;
        self.opt_tag("CreatorComment", doc.creation_info.comment.as_deref())?;
        self.blank()?;

        // Files not claimed by any package come first.
        for file in &all_files {
            if !primary_parent.contains_key(&file.id) {
                self.write_file(file)?;
                self.write_snippets_of(doc, &file.id)?;
            }
        }

        for package in &doc.packages {
            self.write_package(doc, package)?;
            for file in &all_files {
                if primary_parent.get(&file.id) == Some(&package.id) {
                    self.write_file(file)?;
                    self.write_snippets_of(doc, &file.id)?;
                }
            }
        }

        for license in &doc.other_licenses {
            self.write_license(license)?;
        }

        let mut wrote_relationship = false;
        for rel in &doc.relationships {
            if normalize::expressed_by_nesting(rel, &primary_pairs) {
                continue;
            }
            self.tag(
                "Relationship",
                &format!("{} {} {}", rel.ref_a, rel.relationship_type, rel.ref_b),
            )?;
            self.opt_tag("RelationshipComment", rel.comment.as_deref())?;
            wrote_relationship = true;
        }
        if wrote_relationship {
            self.blank()?;
        }

        for annotation in &doc.annotations {
            self.write_annotation(annotation)?;
        }

        Ok(())
    }

    fn write_package(&mut self, doc: &Document, pkg: &Package) -> Result<()> {
        self.tag("PackageName", &pkg.name)?;
        self.tag("SPDXID", &pkg.id.to_string())?;
        self.opt_tag("PackageVersion", pkg.version.as_deref())?;
        self.opt_tag("PackageFileName", pkg.file_name.as_deref())?;
        if let Some(supplier) = &pkg.supplier {
            self.tag("PackageSupplier", &supplier.to_string())?;
        }
        if let Some(originator) = &pkg.originator {
            self.tag("PackageOriginator", &originator.to_string())?;
        }
        self.tag("PackageDownloadLocation", &pkg.download_location)?;
        if !pkg.files_analyzed {
            self.tag("FilesAnalyzed", "false")?;
        }
        if let Some(code) = &pkg.verification_code {
            let value = if code.excluded_files.is_empty() {
                code.value.clone()
            } else {
                format!("{} (excludes: {})", code.value, code.excluded_files.join(", "))
            };
            self.tag("PackageVerificationCode", &value)?;
        }
        for checksum in &pkg.checksums {
            self.tag("PackageChecksum", &checksum.to_string())?;
        }
        self.opt_tag("PackageHomePage", pkg.home_page.as_deref())?;
        self.opt_tag("PackageSourceInfo", pkg.source_info.as_deref())?;
        self.opt_tag("PackageLicenseConcluded", pkg.license_concluded.as_deref())?;
        for license in &pkg.license_info_from_files {
            self.tag("PackageLicenseInfoFromFiles", license)?;
        }
        self.opt_tag("PackageLicenseDeclared", pkg.license_declared.as_deref())?;
        self.opt_tag("PackageLicenseComments", pkg.license_comments.as_deref())?;
        self.opt_tag("PackageCopyrightText", pkg.copyright_text.as_deref())?;
        self.opt_tag("PackageSummary", pkg.summary.as_deref())?;
        self.opt_tag("PackageDescription", pkg.description.as_deref())?;
        self.opt_tag("PackageComment", pkg.comment.as_deref())?;
        for external_ref in &pkg.external_refs {
            self.tag(
                "ExternalRef",
                &format!(
                    "{} {} {}",
                    external_ref.category, external_ref.ref_type, external_ref.locator
                ),
            )?;
            self.opt_tag("ExternalRefComment", external_ref.comment.as_deref())?;
        }
        for attribution in &pkg.attribution_texts {
            self.tag("PackageAttributionText", attribution)?;
        }
        if doc.spec_version >= SpdxVersion::V2_3 {
            if let Some(purpose) = pkg.primary_purpose {
                self.tag("PrimaryPackagePurpose", &purpose.to_string())?;
            }
            if let Some(date) = &pkg.release_date {
                self.tag("ReleaseDate", &format_timestamp(date))?;
            }
            if let Some(date) = &pkg.built_date {
                self.tag("BuiltDate", &format_timestamp(date))?;
            }
            if let Some(date) = &pkg.valid_until_date {
                self.tag("ValidUntilDate", &format_timestamp(date))?;
            }
        }
        self.blank()
    }

    fn write_file(&mut self, file: &File) -> Result<()> {
        self.tag("FileName", &file.name)?;
        self.tag("SPDXID", &file.id.to_string())?;
        for file_type in &file.file_types {
            self.tag("FileType", &file_type.to_string())?;
        }
        for checksum in &file.checksums {
            self.tag("FileChecksum", &checksum.to_string())?;
        }
        self.opt_tag("LicenseConcluded", file.license_concluded.as_deref())?;
        for license in &file.license_info_in_files {
            self.tag("LicenseInfoInFile", license)?;
        }
        self.opt_tag("LicenseComments", file.license_comments.as_deref())?;
        self.opt_tag("FileCopyrightText", file.copyright_text.as_deref())?;
        self.opt_tag("FileComment", file.comment.as_deref())?;
        self.opt_tag("FileNotice", file.notice_text.as_deref())?;
        for contributor in &file.contributors {
            self.tag("FileContributor", contributor)?;
        }
        for attribution in &file.attribution_texts {
            self.tag("FileAttributionText", attribution)?;
        }
        self.blank()
    }

    fn write_snippets_of(&mut self, doc: &Document, file_id: &ElementId) -> Result<()> {
        for snippet in &doc.snippets {
            if snippet.from_file.as_local() != Some(file_id) {
                continue;
            }
            self.tag("SnippetSPDXID", &snippet.id.to_string())?;
            self.tag("SnippetFromFileSPDXID", &snippet.from_file.to_string())?;
            if let Some(range) = snippet.byte_range {
                self.tag("SnippetByteRange", &range.to_string())?;
            }
            if let Some(range) = snippet.line_range {
                self.tag("SnippetLineRange", &range.to_string())?;
            }
            self.opt_tag("SnippetLicenseConcluded", snippet.license_concluded.as_deref())?;
            for license in &snippet.license_info_in_snippets {
                self.tag("LicenseInfoInSnippet", license)?;
            }
            self.opt_tag("SnippetLicenseComments", snippet.license_comments.as_deref())?;
            self.opt_tag("SnippetCopyrightText", snippet.copyright_text.as_deref())?;
            self.opt_tag("SnippetComment", snippet.comment.as_deref())?;
            self.opt_tag("SnippetName", snippet.name.as_deref())?;
            for attribution in &snippet.attribution_texts {
                self.tag("SnippetAttributionText", attribution)?;
            }
            self.blank()?;
        }
        Ok(())
    }

    fn write_license(&mut self, license: &OtherLicense) -> Result<()> {
        self.tag("LicenseID", &license.license_id)?;
        self.tag("ExtractedText", &license.extracted_text)?;
        self.opt_tag("LicenseName", license.name.as_deref())?;
        for uri in &license.cross_references {
            self.tag("LicenseCrossReference", uri)?;
        }
        self.opt_tag("LicenseComment", license.comment.as_deref())?;
        self.blank()
    }

    fn write_annotation(&mut self, annotation: &Annotation) -> Result<()> {
        self.tag("Annotator", &annotation.annotator.to_string())?;
        self.tag("AnnotationDate", &format_timestamp(&annotation.date))?;
        self.tag("AnnotationType", &annotation.annotation_type.to_string())?;
        self.tag("SPDXREF", &annotation.target.to_string())?;
        self.tag("AnnotationComment", &annotation.comment)?;
        self.blank()
    }

    fn tag(&mut self, key: &str, value: &str) -> Result<()> {
        if value.contains('\n') {
            writeln!(self.sink, "{key}: <text>{value}</text>")?;
        } else {
            writeln!(self.sink, "{key}: {value}")?;
        }
        Ok(())
    }

    fn opt_tag(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        if let Some(value) = value {
            self.tag(key, value)?;
        }
        Ok(())
    }

    fn blank(&mut self) -> Result<()> {
        writeln!(self.sink)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DATA_LICENSE;

    const MINIMAL: &str = "\
SPDXVersion: SPDX-2.3
DataLicense: CC0-1.0
SPDXID: SPDXRef-DOCUMENT
DocumentName: minimal
DocumentNamespace: https://example.com/spdx/minimal
Creator: Tool: spdx-doc-0.1
Created: 2023-04-01T12:00:00Z

PackageName: demo
SPDXID: SPDXRef-Package-demo
PackageDownloadLocation: NOASSERTION
PackageVerificationCode: d6a770ba38583ed4bb4525bd96e50461655d2758

FileName: ./src/main.c
SPDXID: SPDXRef-File-main
FileChecksum: SHA1: c2b4e1c67a2d28fced849ee1bb76e7391b93eb12

Relationship: SPDXRef-DOCUMENT DESCRIBES SPDXRef-Package-demo
";

    #[test]
    fn test_decode_minimal() {
        let doc = TagValueCodec::new().decode_str(MINIMAL).unwrap();
        assert_eq!(doc.spec_version, SpdxVersion::V2_3);
        assert_eq!(doc.data_license, DATA_LICENSE);
        assert_eq!(doc.packages.len(), 1);
        assert_eq!(doc.files.len(), 1);
        // Positional membership became a relationship.
        let membership = doc.file_membership();
        let members = membership.values().next().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(
            doc.described_packages(),
            vec![ElementId::new("Package-demo").unwrap()]
        );
    }

    #[test]
    fn test_decode_multiline_text() {
        let content = format!(
            "{MINIMAL}\nDocumentComment: <text>line one\nline two</text>\n"
        );
        let doc = TagValueCodec::new().decode_str(&content).unwrap();
        assert_eq!(doc.comment.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn test_unterminated_text_block() {
        let content = format!("{MINIMAL}\nDocumentComment: <text>never closed\n");
        let err = TagValueCodec::new().decode_str(&content).unwrap_err();
        assert!(matches!(
            err,
            SpdxError::Decode {
                source: FormatErrorKind::InvalidTagValue { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_missing_version_is_format_error() {
        let err = TagValueCodec::new()
            .decode_str("DataLicense: CC0-1.0\nSPDXID: SPDXRef-DOCUMENT\n")
            .unwrap_err();
        assert!(matches!(
            err,
            SpdxError::Decode {
                source: FormatErrorKind::MissingField { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_spdx3_is_unsupported() {
        let content = MINIMAL.replace("SPDX-2.3", "SPDX-3.0");
        let err = TagValueCodec::new().decode_str(&content).unwrap_err();
        assert!(err.to_string().contains("SPDX-3.0"));
    }

    #[test]
    fn test_requested_version_mismatch() {
        let err = TagValueCodec::for_version(SpdxVersion::V2_1)
            .decode_str(MINIMAL)
            .unwrap_err();
        assert!(err.to_string().contains("SPDX-2.1"));
    }

    #[test]
    fn test_malformed_reference_short_circuits() {
        let content = MINIMAL.replace(
            "Relationship: SPDXRef-DOCUMENT DESCRIBES SPDXRef-Package-demo",
            "Relationship: BogusRef-1 DESCRIBES SPDXRef-Package-demo",
        );
        let err = TagValueCodec::new().decode_str(&content).unwrap_err();
        assert!(matches!(err, SpdxError::MalformedReference { .. }));
    }

    #[test]
    fn test_verification_code_excludes() {
        let code = parse_verification_code(
            "d6a770ba38583ed4bb4525bd96e50461655d2758 (excludes: ./a.c, ./b.c)",
        );
        assert_eq!(code.value, "d6a770ba38583ed4bb4525bd96e50461655d2758");
        assert_eq!(code.excluded_files, vec!["./a.c", "./b.c"]);
    }

    #[test]
    fn test_round_trip_is_fixpoint() {
        let codec = TagValueCodec::new();
        let doc = codec.decode_str(MINIMAL).unwrap();
        let encoded = codec.encode_to_string(&doc).unwrap();
        let again = codec.decode_str(&encoded).unwrap();
        assert_eq!(doc.content_digest(), again.content_digest());
    }

    #[test]
    fn test_encode_skips_derived_contains() {
        let codec = TagValueCodec::new();
        let doc = codec.decode_str(MINIMAL).unwrap();
        let encoded = codec.encode_to_string(&doc).unwrap();
        // Nesting expresses membership; only the describes edge is explicit.
        assert!(!encoded.contains("CONTAINS"));
        assert!(encoded.contains("Relationship: SPDXRef-DOCUMENT DESCRIBES SPDXRef-Package-demo"));
    }

    #[test]
    fn test_detect_confidence() {
        let codec = TagValueCodec::new();
        assert_eq!(
            codec.detect(MINIMAL).confidence.value(),
            FormatConfidence::CERTAIN.value()
        );
        assert_eq!(
            codec.detect("{\"spdxVersion\": \"SPDX-2.3\"}").confidence.value(),
            FormatConfidence::NONE.value()
        );
        assert_eq!(
            codec.detect(MINIMAL).version.as_deref(),
            Some("SPDX-2.3")
        );
    }

    #[test]
    fn test_annotation_round_trip() {
        let content = format!(
            "{MINIMAL}\nAnnotator: Person: Jane Doe (jane@example.com)\n\
             AnnotationDate: 2023-04-02T08:30:00Z\nAnnotationType: REVIEW\n\
             SPDXREF: SPDXRef-Package-demo\nAnnotationComment: checked manually\n"
        );
        let codec = TagValueCodec::new();
        let doc = codec.decode_str(&content).unwrap();
        assert_eq!(doc.annotations.len(), 1);
        let encoded = codec.encode_to_string(&doc).unwrap();
        let again = codec.decode_str(&encoded).unwrap();
        assert_eq!(again.annotations, doc.annotations);
    }
}
