//! Annotation records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{FormatErrorKind, Result, SpdxError};
use crate::model::common::Agent;
use crate::model::ident::ElementRef;

/// A review note attached to an element by reference.
///
/// Annotations live document-wide; nesting under the target in JSON or RDF is
/// purely a serialization choice and never changes the logical model.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub target: ElementRef,
    pub annotator: Agent,
    pub annotation_type: AnnotationType,
    pub date: DateTime<Utc>,
    pub comment: String,
}

impl Annotation {
    #[must_use]
    pub fn new(
        target: impl Into<ElementRef>,
        annotator: Agent,
        annotation_type: AnnotationType,
        date: DateTime<Utc>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            annotator,
            annotation_type,
            date,
            comment: comment.into(),
        }
    }
}

/// The SPDX annotation type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationType {
    Review,
    Other,
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Review => "REVIEW",
            Self::Other => "OTHER",
        };
        f.write_str(s)
    }
}

impl FromStr for AnnotationType {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "REVIEW" => Ok(Self::Review),
            "OTHER" => Ok(Self::Other),
            other => Err(SpdxError::decode(
                "SPDX",
                "annotation type",
                FormatErrorKind::InvalidValue {
                    field: "annotationType".to_string(),
                    message: format!("unknown annotation type `{other}`"),
                },
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::common::parse_timestamp;
    use crate::model::ident::ElementId;

    #[test]
    fn test_annotation_construction() {
        let annotation = Annotation::new(
            ElementId::new("Package-1").unwrap(),
            Agent::Person("Jane Doe".to_string()),
            AnnotationType::Review,
            parse_timestamp("2021-01-01T12:00:00Z").unwrap(),
            "looks complete",
        );
        assert_eq!(annotation.target.to_string(), "SPDXRef-Package-1");
        assert_eq!(annotation.annotation_type.to_string(), "REVIEW");
    }

    #[test]
    fn test_annotation_type_parse() {
        assert_eq!("REVIEW".parse::<AnnotationType>().unwrap(), AnnotationType::Review);
        assert!("AUDIT".parse::<AnnotationType>().is_err());
    }
}
