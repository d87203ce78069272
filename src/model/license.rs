//! Extracted licensing info (`LicenseRef-` definitions).
//!
//! License expressions elsewhere in the graph are opaque strings; these
//! records only define the `LicenseRef-` names such expressions may use, and
//! nothing cross-checks the two.

use crate::error::{FormatErrorKind, Result, SpdxError};

/// Prefix every extracted-license identifier must carry.
pub const LICENSE_REF_PREFIX: &str = "LicenseRef-";

/// A license found in the analyzed artifacts that is not on the SPDX license
/// list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherLicense {
    /// `LicenseRef-` prefixed identifier
    pub license_id: String,
    pub extracted_text: String,
    pub name: Option<String>,
    pub cross_references: Vec<String>,
    pub comment: Option<String>,
}

impl OtherLicense {
    /// Create a record, checking the `LicenseRef-` prefix convention.
    pub fn new(license_id: impl Into<String>, extracted_text: impl Into<String>) -> Result<Self> {
        let license_id = license_id.into();
        if !license_id.starts_with(LICENSE_REF_PREFIX)
            || license_id.len() == LICENSE_REF_PREFIX.len()
        {
            return Err(SpdxError::decode(
                "SPDX",
                "extracted licensing info",
                FormatErrorKind::InvalidValue {
                    field: "licenseId".to_string(),
                    message: format!("`{license_id}` must be `{LICENSE_REF_PREFIX}<idstring>`"),
                },
            ));
        }
        Ok(Self {
            license_id,
            extracted_text: extracted_text.into(),
            name: None,
            cross_references: Vec::new(),
            comment: None,
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_cross_reference(mut self, url: impl Into<String>) -> Self {
        self.cross_references.push(url.into());
        self
    }
}
