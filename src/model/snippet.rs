//! Snippet element records.

use std::fmt;
use std::str::FromStr;

use crate::error::{FormatErrorKind, Result, SpdxError};
use crate::model::ident::{ElementId, ElementRef};

/// A region of a file with its own licensing facts.
///
/// `from_file` is typed as a full reference so malformed input can be
/// reported precisely, but validation only accepts a local reference to a
/// File declared in the same document.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub id: ElementId,
    pub from_file: ElementRef,
    pub name: Option<String>,
    pub byte_range: Option<SnippetRange>,
    pub line_range: Option<SnippetRange>,
    /// Opaque license expression
    pub license_concluded: Option<String>,
    pub license_info_in_snippets: Vec<String>,
    pub license_comments: Option<String>,
    pub copyright_text: Option<String>,
    pub comment: Option<String>,
    pub attribution_texts: Vec<String>,
}

impl Snippet {
    #[must_use]
    pub fn new(id: ElementId, from_file: impl Into<ElementRef>) -> Self {
        Self {
            id,
            from_file: from_file.into(),
            name: None,
            byte_range: None,
            line_range: None,
            license_concluded: None,
            license_info_in_snippets: Vec::new(),
            license_comments: None,
            copyright_text: None,
            comment: None,
            attribution_texts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_byte_range(mut self, start: u64, end: u64) -> Self {
        self.byte_range = Some(SnippetRange { start, end });
        self
    }

    #[must_use]
    pub fn with_line_range(mut self, start: u64, end: u64) -> Self {
        self.line_range = Some(SnippetRange { start, end });
        self
    }

    #[must_use]
    pub fn with_license_concluded(mut self, license: impl Into<String>) -> Self {
        self.license_concluded = Some(license.into());
        self
    }
}

/// A half-open position pair, 1-indexed as SPDX counts both bytes and lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnippetRange {
    pub start: u64,
    pub end: u64,
}

impl fmt::Display for SnippetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for SnippetRange {
    type Err = SpdxError;

    /// Parse the `start:end` form used by tag-value range fields.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |message: String| {
            SpdxError::decode(
                "SPDX",
                "snippet range",
                FormatErrorKind::InvalidValue {
                    field: "range".to_string(),
                    message,
                },
            )
        };
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| invalid(format!("`{s}` must be `<start>:<end>`")))?;
        let start = start
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(format!("bad start position `{start}`: {e}")))?;
        let end = end
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(format!("bad end position `{end}`: {e}")))?;
        Ok(Self { start, end })
    }
}
