//! Unified error types for spdx-doc.
//!
//! The taxonomy separates syntactic failures (a byte stream that does not
//! conform to a concrete format's grammar) from structural failures (a
//! well-formed document that violates a graph invariant), so callers can
//! always tell which layer rejected their input.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for spdx-doc operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SpdxError {
    /// Input bytes did not conform to a concrete format's grammar
    #[error("Failed to decode {format} document: {context}")]
    Decode {
        format: String,
        context: String,
        #[source]
        source: FormatErrorKind,
    },

    /// A scoped-reference token did not parse
    #[error("Malformed SPDX reference `{token}`: {reason}")]
    MalformedReference { token: String, reason: String },

    /// The document is syntactically well formed but violates structural
    /// invariants; all collected violations are reported together
    #[error("Document failed structural validation with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// Encoding was asked to render something the model cannot express
    #[error("Failed to encode {format} document: {context}")]
    Encode {
        format: String,
        context: String,
        #[source]
        source: EncodeErrorKind,
    },

    /// Version adaptation failure
    #[error("Cannot convert document: {0}")]
    Convert(String),

    /// Verification-code computation failure
    #[error("Cannot compute verification code: {0}")]
    VerificationCode(String),

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Specific decode error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FormatErrorKind {
    #[error("Unknown document format - expected tag-value, JSON, YAML, or RDF/XML markers")]
    UnknownFormat,

    #[error("Unsupported SPDX version: {version} (supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),

    #[error("Invalid YAML structure: {0}")]
    InvalidYaml(String),

    #[error("Invalid XML structure: {0}")]
    InvalidXml(String),

    #[error("Invalid tag-value syntax at line {line}: {message}")]
    InvalidTagValue { line: usize, message: String },

    #[error("Missing required field: {field} in {context}")]
    MissingField { field: String, context: String },

    #[error("Invalid field value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Input of {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge { size: u64, limit: u64 },
}

/// Specific encode error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EncodeErrorKind {
    #[error("Reference to undeclared external document: DocumentRef-{document_ref}")]
    UndeclaredDocumentRef { document_ref: String },

    #[error("Annotation target {target} cannot be expressed in a nesting format")]
    UnrepresentableAnnotation { target: String },

    #[error("Relationship subject {subject} cannot be expressed in a nesting format")]
    UnrepresentableRelationship { subject: String },

    #[error("Field '{field}' is not admitted by {version}")]
    UnsupportedField { field: String, version: String },

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// A single structural-invariant violation.
///
/// `reference` is the rendered identifier of the offending element (or the
/// offending reference text itself when no element owns the problem).
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[error("{kind} [{reference}]: {message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub reference: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(
        kind: ValidationErrorKind,
        reference: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            reference: reference.into(),
            message: message.into(),
        }
    }
}

/// The classes of structural-invariant violation the validator reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum ValidationErrorKind {
    DuplicateIdentifier,
    UnresolvedReference,
    UndeclaredExternalDocument,
    InconsistentFilesAnalyzed,
    OrphanSnippet,
    UnsupportedFieldForVersion,
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DuplicateIdentifier => "duplicate identifier",
            Self::UnresolvedReference => "unresolved reference",
            Self::UndeclaredExternalDocument => "undeclared external document",
            Self::InconsistentFilesAnalyzed => "inconsistent FilesAnalyzed",
            Self::OrphanSnippet => "orphan snippet",
            Self::UnsupportedFieldForVersion => "field not admitted by version",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for spdx-doc operations
pub type Result<T> = std::result::Result<T, SpdxError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl SpdxError {
    /// Create a decode error with format and context
    pub fn decode(
        format: impl Into<String>,
        context: impl Into<String>,
        source: FormatErrorKind,
    ) -> Self {
        Self::Decode {
            format: format.into(),
            context: context.into(),
            source,
        }
    }

    /// Create an encode error with format and context
    pub fn encode(
        format: impl Into<String>,
        context: impl Into<String>,
        source: EncodeErrorKind,
    ) -> Self {
        Self::Encode {
            format: format.into(),
            context: context.into(),
            source,
        }
    }

    /// Create a malformed-reference error
    pub fn malformed_reference(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedReference {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Create a decode error for a missing required field
    pub fn missing_field(
        format: impl Into<String>,
        field: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::decode(
            format,
            "missing required field",
            FormatErrorKind::MissingField {
                field: field.into(),
                context: context.into(),
            },
        )
    }

    /// Create a decode error for an unsupported SPDX version
    pub fn unsupported_version(
        format: impl Into<String>,
        version: impl Into<String>,
        supported: impl Into<String>,
    ) -> Self {
        Self::decode(
            format,
            "version negotiation",
            FormatErrorKind::UnsupportedVersion {
                version: version.into(),
                supported: supported.into(),
            },
        )
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a version-conversion error
    pub fn convert(message: impl Into<String>) -> Self {
        Self::Convert(message.into())
    }

    /// The validation errors carried by this error, if any
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for SpdxError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SpdxError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(
            "JSON",
            "JSON deserialization",
            FormatErrorKind::InvalidJson(err.to_string()),
        )
    }
}

impl From<serde_yaml::Error> for SpdxError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::decode(
            "YAML",
            "YAML deserialization",
            FormatErrorKind::InvalidYaml(err.to_string()),
        )
    }
}

impl From<Vec<ValidationError>> for SpdxError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}
