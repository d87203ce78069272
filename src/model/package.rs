//! Package element records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{FormatErrorKind, Result, SpdxError};
use crate::model::common::{Agent, Checksum, SpdxVersion};
use crate::model::file::File;
use crate::model::ident::ElementId;

/// A package described by the document.
///
/// `files` is the legacy nested shape some formats use; canonical membership
/// lives in `CONTAINS`/`CONTAINED_BY` relationships. Decoders hoist nested
/// files into `Document::files` and derive membership edges, so a decoded
/// document always carries this list empty; hand-built documents may still
/// populate it and membership queries union both spellings without
/// double-counting.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub id: ElementId,
    pub name: String,
    pub version: Option<String>,
    /// Actual file name of the package artifact
    pub file_name: Option<String>,
    pub supplier: Option<Agent>,
    pub originator: Option<Agent>,
    /// Mandatory in every 2.x generation; "NOASSERTION" when unknown
    pub download_location: String,
    pub files_analyzed: bool,
    pub verification_code: Option<PackageVerificationCode>,
    pub checksums: Vec<Checksum>,
    pub home_page: Option<String>,
    pub source_info: Option<String>,
    /// Opaque license expression
    pub license_concluded: Option<String>,
    pub license_info_from_files: Vec<String>,
    pub license_declared: Option<String>,
    pub license_comments: Option<String>,
    pub copyright_text: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub comment: Option<String>,
    pub external_refs: Vec<ExternalPackageRef>,
    pub attribution_texts: Vec<String>,
    /// 2.3 only
    pub primary_purpose: Option<PackagePurpose>,
    /// 2.3 only
    pub release_date: Option<DateTime<Utc>>,
    /// 2.3 only
    pub built_date: Option<DateTime<Utc>>,
    /// 2.3 only
    pub valid_until_date: Option<DateTime<Utc>>,
    /// Legacy nested file shape; see the type docs
    pub files: Vec<File>,
}

impl Package {
    #[must_use]
    pub fn new(id: ElementId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            version: None,
            file_name: None,
            supplier: None,
            originator: None,
            download_location: "NOASSERTION".to_string(),
            files_analyzed: true,
            verification_code: None,
            checksums: Vec::new(),
            home_page: None,
            source_info: None,
            license_concluded: None,
            license_info_from_files: Vec::new(),
            license_declared: None,
            license_comments: None,
            copyright_text: None,
            summary: None,
            description: None,
            comment: None,
            external_refs: Vec::new(),
            attribution_texts: Vec::new(),
            primary_purpose: None,
            release_date: None,
            built_date: None,
            valid_until_date: None,
            files: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_download_location(mut self, location: impl Into<String>) -> Self {
        self.download_location = location.into();
        self
    }

    #[must_use]
    pub fn with_files_analyzed(mut self, analyzed: bool) -> Self {
        self.files_analyzed = analyzed;
        self
    }

    #[must_use]
    pub fn with_license_concluded(mut self, license: impl Into<String>) -> Self {
        self.license_concluded = Some(license.into());
        self
    }

    #[must_use]
    pub fn with_license_declared(mut self, license: impl Into<String>) -> Self {
        self.license_declared = Some(license.into());
        self
    }

    #[must_use]
    pub fn with_supplier(mut self, supplier: Agent) -> Self {
        self.supplier = Some(supplier);
        self
    }

    #[must_use]
    pub fn with_verification_code(mut self, code: PackageVerificationCode) -> Self {
        self.verification_code = Some(code);
        self
    }

    #[must_use]
    pub fn with_external_ref(mut self, external_ref: ExternalPackageRef) -> Self {
        self.external_refs.push(external_ref);
        self
    }
}

/// The SPDX package verification code: SHA1 over the sorted SHA1s of the
/// package's files, with an optional excluded-file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVerificationCode {
    /// Hex SHA1 digest
    pub value: String,
    pub excluded_files: Vec<String>,
}

impl PackageVerificationCode {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            excluded_files: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_excluded_file(mut self, name: impl Into<String>) -> Self {
        self.excluded_files.push(name.into());
        self
    }
}

/// An external package reference (`ExternalRef`): a pointer out of the SPDX
/// graph into another naming scheme such as purl or CPE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalPackageRef {
    pub category: ExternalRefCategory,
    /// Reference type within the category, e.g. `purl` or `cpe23Type`
    pub ref_type: String,
    pub locator: String,
    pub comment: Option<String>,
}

impl ExternalPackageRef {
    #[must_use]
    pub fn new(
        category: ExternalRefCategory,
        ref_type: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            category,
            ref_type: ref_type.into(),
            locator: locator.into(),
            comment: None,
        }
    }
}

/// External reference categories.
///
/// The hyphenated spellings are canonical; 2.2-era documents used
/// underscores and both parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalRefCategory {
    Security,
    PackageManager,
    PersistentId,
    Other,
}

impl fmt::Display for ExternalRefCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Security => "SECURITY",
            Self::PackageManager => "PACKAGE-MANAGER",
            Self::PersistentId => "PERSISTENT-ID",
            Self::Other => "OTHER",
        };
        f.write_str(s)
    }
}

impl FromStr for ExternalRefCategory {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        let category = match s {
            "SECURITY" => Self::Security,
            "PACKAGE-MANAGER" | "PACKAGE_MANAGER" => Self::PackageManager,
            "PERSISTENT-ID" | "PERSISTENT_ID" => Self::PersistentId,
            "OTHER" => Self::Other,
            other => {
                return Err(SpdxError::decode(
                    "SPDX",
                    "external reference category",
                    FormatErrorKind::InvalidValue {
                        field: "referenceCategory".to_string(),
                        message: format!("unknown category `{other}`"),
                    },
                ))
            }
        };
        Ok(category)
    }
}

/// Primary package purpose, introduced in SPDX 2.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackagePurpose {
    Application,
    Framework,
    Library,
    Container,
    OperatingSystem,
    Device,
    Firmware,
    Source,
    Archive,
    File,
    Install,
    Other,
}

impl PackagePurpose {
    /// The field itself is 2.3-only; encoders gate on this.
    #[must_use]
    pub fn introduced_in() -> SpdxVersion {
        SpdxVersion::V2_3
    }
}

impl fmt::Display for PackagePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Application => "APPLICATION",
            Self::Framework => "FRAMEWORK",
            Self::Library => "LIBRARY",
            Self::Container => "CONTAINER",
            Self::OperatingSystem => "OPERATING-SYSTEM",
            Self::Device => "DEVICE",
            Self::Firmware => "FIRMWARE",
            Self::Source => "SOURCE",
            Self::Archive => "ARCHIVE",
            Self::File => "FILE",
            Self::Install => "INSTALL",
            Self::Other => "OTHER",
        };
        f.write_str(s)
    }
}

impl FromStr for PackagePurpose {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        let purpose = match s {
            "APPLICATION" => Self::Application,
            "FRAMEWORK" => Self::Framework,
            "LIBRARY" => Self::Library,
            "CONTAINER" => Self::Container,
            "OPERATING-SYSTEM" | "OPERATING_SYSTEM" => Self::OperatingSystem,
            "DEVICE" => Self::Device,
            "FIRMWARE" => Self::Firmware,
            "SOURCE" => Self::Source,
            "ARCHIVE" => Self::Archive,
            "FILE" => Self::File,
            "INSTALL" => Self::Install,
            "OTHER" => Self::Other,
            other => {
                return Err(SpdxError::decode(
                    "SPDX",
                    "package purpose",
                    FormatErrorKind::InvalidValue {
                        field: "primaryPackagePurpose".to_string(),
                        message: format!("unknown purpose `{other}`"),
                    },
                ))
            }
        };
        Ok(purpose)
    }
}
