//! File element records.

use std::fmt;
use std::str::FromStr;

use crate::error::{FormatErrorKind, Result, SpdxError};
use crate::model::common::{Checksum, ChecksumAlgorithm};
use crate::model::ident::ElementId;

/// A file described by the document.
///
/// Files sit flat in `Document::files` with package membership expressed
/// through `CONTAINS`/`CONTAINED_BY` relationships; legacy codecs nest them
/// under packages at the serialization boundary only.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub id: ElementId,
    /// File name, by convention a `./` relative path
    pub name: String,
    pub file_types: Vec<FileType>,
    /// At least one checksum, by convention SHA1
    pub checksums: Vec<Checksum>,
    /// Opaque license expression ("NOASSERTION" stays a plain string)
    pub license_concluded: Option<String>,
    pub license_info_in_files: Vec<String>,
    pub license_comments: Option<String>,
    pub copyright_text: Option<String>,
    pub comment: Option<String>,
    pub notice_text: Option<String>,
    pub contributors: Vec<String>,
    pub attribution_texts: Vec<String>,
}

impl File {
    #[must_use]
    pub fn new(id: ElementId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            file_types: Vec::new(),
            checksums: Vec::new(),
            license_concluded: None,
            license_info_in_files: Vec::new(),
            license_comments: None,
            copyright_text: None,
            comment: None,
            notice_text: None,
            contributors: Vec::new(),
            attribution_texts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_checksum(mut self, checksum: Checksum) -> Self {
        self.checksums.push(checksum);
        self
    }

    #[must_use]
    pub fn with_license_concluded(mut self, license: impl Into<String>) -> Self {
        self.license_concluded = Some(license.into());
        self
    }

    #[must_use]
    pub fn with_copyright_text(mut self, text: impl Into<String>) -> Self {
        self.copyright_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_types.push(file_type);
        self
    }

    /// The hex SHA1 digest, if one of the checksums carries it.
    ///
    /// Verification-code computation requires it.
    #[must_use]
    pub fn sha1(&self) -> Option<&str> {
        self.checksums
            .iter()
            .find(|c| c.algorithm == ChecksumAlgorithm::Sha1)
            .map(|c| c.value.as_str())
    }
}

/// The SPDX file type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Source,
    Binary,
    Archive,
    Application,
    Audio,
    Image,
    Text,
    Video,
    Documentation,
    Spdx,
    Other,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Source => "SOURCE",
            Self::Binary => "BINARY",
            Self::Archive => "ARCHIVE",
            Self::Application => "APPLICATION",
            Self::Audio => "AUDIO",
            Self::Image => "IMAGE",
            Self::Text => "TEXT",
            Self::Video => "VIDEO",
            Self::Documentation => "DOCUMENTATION",
            Self::Spdx => "SPDX",
            Self::Other => "OTHER",
        };
        f.write_str(s)
    }
}

impl FromStr for FileType {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        let file_type = match s {
            "SOURCE" => Self::Source,
            "BINARY" => Self::Binary,
            "ARCHIVE" => Self::Archive,
            "APPLICATION" => Self::Application,
            "AUDIO" => Self::Audio,
            "IMAGE" => Self::Image,
            "TEXT" => Self::Text,
            "VIDEO" => Self::Video,
            "DOCUMENTATION" => Self::Documentation,
            "SPDX" => Self::Spdx,
            "OTHER" => Self::Other,
            other => {
                return Err(SpdxError::decode(
                    "SPDX",
                    "file type",
                    FormatErrorKind::InvalidValue {
                        field: "fileType".to_string(),
                        message: format!("unknown file type `{other}`"),
                    },
                ))
            }
        };
        Ok(file_type)
    }
}
