//! Serialization format codecs.
//!
//! Each supported format (tag-value, JSON, YAML, RDF/XML) implements the
//! [`SpdxCodec`] trait against the canonical document model. Decoding always
//! ends in structural validation; encoding always derives format shorthand
//! (nested file lists, `documentDescribes`) from relationships through the
//! same rules, so no two codecs disagree about what a document means.
//!
//! ## Format Detection
//!
//! Detection is confidence based: every codec reports how sure it is that it
//! can handle the content, and the highest score above the threshold wins.
//! There is no default format, so ambiguous content is an error rather than
//! a guess.

mod json;
mod normalize;
mod rdf;
mod tagvalue;
mod yaml;

pub use json::JsonCodec;
pub use rdf::RdfCodec;
pub use tagvalue::TagValueCodec;
pub use yaml::YamlCodec;

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{FormatErrorKind, Result, SpdxError};
use crate::model::{Document, SpdxVersion};

/// Maximum document size accepted by the file entrypoints (256 MB).
pub const MAX_DOCUMENT_SIZE: u64 = 256 * 1024 * 1024;

/// Minimum confidence for accepting a detection result.
pub const MIN_CONFIDENCE_THRESHOLD: f32 = 0.25;

// ============================================================================
// Detection confidence
// ============================================================================

/// Confidence that a codec can handle some content.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FormatConfidence(f32);

impl FormatConfidence {
    /// Definitely not this format
    pub const NONE: Self = Self(0.0);
    /// Might be this format
    pub const LOW: Self = Self(0.25);
    /// Likely this format
    pub const MEDIUM: Self = Self(0.5);
    /// Almost certainly this format
    pub const HIGH: Self = Self(0.75);
    /// Definitely this format
    pub const CERTAIN: Self = Self(1.0);

    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }

    /// Whether this confidence clears the acceptance threshold.
    #[must_use]
    pub fn can_parse(&self) -> bool {
        self.0 >= MIN_CONFIDENCE_THRESHOLD
    }
}

impl Default for FormatConfidence {
    fn default() -> Self {
        Self::NONE
    }
}

/// What a single codec reported about some content.
#[derive(Debug, Clone)]
pub struct FormatDetection {
    pub confidence: FormatConfidence,
    /// Declared schema version, when the content states one
    pub version: Option<String>,
    pub warnings: Vec<String>,
}

impl FormatDetection {
    #[must_use]
    pub const fn no_match() -> Self {
        Self {
            confidence: FormatConfidence::NONE,
            version: None,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_confidence(confidence: FormatConfidence) -> Self {
        Self {
            confidence,
            version: None,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    #[must_use]
    pub fn warning(mut self, warning: &str) -> Self {
        self.warnings.push(warning.to_string());
        self
    }
}

// ============================================================================
// Codec trait
// ============================================================================

/// A serialization format for SPDX documents.
///
/// `decode_str` must return a validated document; `encode` may assume its
/// input was validated and reports [`SpdxError::Encode`] only for content the
/// format itself cannot express.
pub trait SpdxCodec {
    /// Decode and validate a document from string content.
    fn decode_str(&self, content: &str) -> Result<Document>;

    /// Decode and validate a document from a file.
    ///
    /// Refuses files larger than [`MAX_DOCUMENT_SIZE`].
    fn decode(&self, path: &Path) -> Result<Document> {
        let content = read_guarded(path, self.format_name())?;
        self.decode_str(&content)
    }

    /// Encode a document into a byte sink.
    fn encode(&self, doc: &Document, sink: &mut dyn Write) -> Result<()>;

    /// Encode a document to a string.
    fn encode_to_string(&self, doc: &Document) -> Result<String> {
        let mut buf = Vec::new();
        self.encode(doc, &mut buf)?;
        String::from_utf8(buf).map_err(|e| {
            SpdxError::encode(
                self.format_name(),
                "produced non-UTF-8 output",
                crate::error::EncodeErrorKind::Serialization(e.to_string()),
            )
        })
    }

    /// Human-readable format name.
    fn format_name(&self) -> &'static str;

    /// Schema versions this codec accepts.
    fn supported_versions(&self) -> Vec<&'static str> {
        vec!["SPDX-2.1", "SPDX-2.2", "SPDX-2.3"]
    }

    /// Lightweight structural sniff without full parsing.
    fn detect(&self, content: &str) -> FormatDetection;

    /// Quick check whether this codec can likely handle the content.
    fn can_parse(&self, content: &str) -> bool {
        self.detect(content).confidence.can_parse()
    }

    /// Confidence score for this content.
    fn confidence(&self, content: &str) -> FormatConfidence {
        self.detect(content).confidence
    }
}

/// Read a file with the size guard applied.
fn read_guarded(path: &Path, format: &str) -> Result<String> {
    let metadata = std::fs::metadata(path).map_err(|e| SpdxError::io(path, e))?;
    if metadata.len() > MAX_DOCUMENT_SIZE {
        return Err(SpdxError::decode(
            format,
            path.display().to_string(),
            FormatErrorKind::InputTooLarge {
                size: metadata.len(),
                limit: MAX_DOCUMENT_SIZE,
            },
        ));
    }
    std::fs::read_to_string(path).map_err(|e| SpdxError::io(path, e))
}

/// Shared decode tail: apply derived facts, then validate.
///
/// Every codec funnels its freshly parsed document through here so decoded
/// documents are uniformly normalized and never returned unvalidated.
pub(crate) fn finish_decode(
    mut doc: Document,
    facts: normalize::DerivedFacts,
) -> Result<Document> {
    normalize::apply_derived(&mut doc, facts);
    crate::validate::validate(&doc).map_err(SpdxError::Validation)?;
    Ok(doc)
}

/// Check a decoded document against an explicitly requested schema version.
pub(crate) fn check_requested_version(
    format: &str,
    declared: SpdxVersion,
    requested: Option<SpdxVersion>,
) -> Result<()> {
    if let Some(requested) = requested {
        if declared != requested {
            return Err(SpdxError::decode(
                format,
                "schema version check",
                FormatErrorKind::InvalidValue {
                    field: "SPDXVersion".to_string(),
                    message: format!(
                        "document declares {declared} but {requested} was requested"
                    ),
                },
            ));
        }
    }
    Ok(())
}

// ============================================================================
// Format registry
// ============================================================================

/// The serialization formats this crate ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    TagValue,
    Json,
    Yaml,
    RdfXml,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 4] = [Self::TagValue, Self::Json, Self::Yaml, Self::RdfXml];

    /// Guess the format from a file extension.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "spdx" | "tag" => Some(Self::TagValue),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "rdf" | "xml" => Some(Self::RdfXml),
            _ => None,
        }
    }

    /// Construct the codec for this format.
    #[must_use]
    pub fn codec(&self) -> Box<dyn SpdxCodec> {
        match self {
            Self::TagValue => Box::new(TagValueCodec::new()),
            Self::Json => Box::new(JsonCodec::new()),
            Self::Yaml => Box::new(YamlCodec::new()),
            Self::RdfXml => Box::new(RdfCodec::new()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TagValue => "tag-value",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::RdfXml => "rdf",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DocumentFormat {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tag-value" | "tagvalue" | "tv" | "spdx" => Ok(Self::TagValue),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "rdf" | "rdf-xml" | "rdfxml" | "xml" => Ok(Self::RdfXml),
            other => Err(SpdxError::decode(
                other,
                "format name",
                FormatErrorKind::UnknownFormat,
            )),
        }
    }
}

// ============================================================================
// Detection across formats
// ============================================================================

/// Result of running detection across every codec.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// The format that should handle this content, if any cleared the bar
    pub format: Option<DocumentFormat>,
    pub confidence: FormatConfidence,
    pub version: Option<String>,
    pub warnings: Vec<String>,
}

impl DetectionResult {
    fn unknown(reason: &str) -> Self {
        Self {
            format: None,
            confidence: FormatConfidence::NONE,
            version: None,
            warnings: vec![reason.to_string()],
        }
    }

    /// Whether the detection is confident enough to parse.
    #[must_use]
    pub fn can_parse(&self) -> bool {
        self.format.is_some() && self.confidence.value() >= MIN_CONFIDENCE_THRESHOLD
    }
}

/// Confidence-based detector over all shipped codecs.
pub struct FormatDetector {
    min_confidence: f32,
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatDetector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_confidence: MIN_CONFIDENCE_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_threshold(min_confidence: f32) -> Self {
        Self {
            min_confidence: min_confidence.clamp(0.0, 1.0),
        }
    }

    /// Run every codec's sniffer and keep the best result.
    pub fn detect_from_content(&self, content: &str) -> DetectionResult {
        if content.trim().is_empty() {
            return DetectionResult::unknown("empty content");
        }

        let mut best: Option<(DocumentFormat, FormatDetection)> = None;
        for format in DocumentFormat::ALL {
            let detection = format.codec().detect(content);
            debug!(
                format = format.name(),
                confidence = detection.confidence.value(),
                "format detection"
            );
            let better = match &best {
                Some((_, current)) => detection.confidence > current.confidence,
                None => detection.confidence.value() > 0.0,
            };
            if better {
                best = Some((format, detection));
            }
        }

        match best {
            Some((format, detection))
                if detection.confidence.value() >= self.min_confidence =>
            {
                DetectionResult {
                    format: Some(format),
                    confidence: detection.confidence,
                    version: detection.version,
                    warnings: detection.warnings,
                }
            }
            Some((format, detection)) => {
                let mut result =
                    DetectionResult::unknown("no format detected with sufficient confidence");
                result.warnings.push(format!(
                    "best candidate was {} at {:.0}% confidence (threshold: {:.0}%)",
                    format.name(),
                    detection.confidence.value() * 100.0,
                    self.min_confidence * 100.0
                ));
                result
            }
            None => DetectionResult::unknown("no format detected with sufficient confidence"),
        }
    }

    /// Detect and decode in one step.
    pub fn decode_str(&self, content: &str) -> Result<Document> {
        let detection = self.detect_from_content(content);
        for warning in &detection.warnings {
            warn!("{}", warning);
        }
        match detection.format {
            Some(format) if detection.can_parse() => format.codec().decode_str(content),
            _ => Err(SpdxError::decode(
                "unknown",
                "format detection",
                FormatErrorKind::UnknownFormat,
            )),
        }
    }
}

// ============================================================================
// Free entrypoints
// ============================================================================

/// Detect the format of some content without parsing it.
///
/// Returns `None` when nothing clears the confidence threshold.
#[must_use]
pub fn detect_format(content: &str) -> Option<DetectionResult> {
    let result = FormatDetector::new().detect_from_content(content);
    result.can_parse().then_some(result)
}

/// Decode a document from a file, auto-detecting the format.
pub fn decode_file(path: &Path) -> Result<Document> {
    let content = read_guarded(path, "unknown")?;
    FormatDetector::new().decode_str(&content)
}

/// Decode a document from string content, auto-detecting the format.
pub fn decode_str(content: &str) -> Result<Document> {
    FormatDetector::new().decode_str(content)
}

/// Encode a document to a file in the given format.
pub fn encode_file(doc: &Document, path: &Path, format: DocumentFormat) -> Result<()> {
    let mut out = std::fs::File::create(path).map_err(|e| SpdxError::io(path, e))?;
    format.codec().encode(doc, &mut out)
}

/// Encode a document to a string in the given format.
pub fn encode_str(doc: &Document, format: DocumentFormat) -> Result<String> {
    format.codec().encode_to_string(doc)
}
