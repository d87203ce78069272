//! Element identifiers and scoped references.
//!
//! SPDX names every element with an `SPDXRef-` prefixed token that is unique
//! within one document. References to elements may additionally be scoped to
//! an external document with a `DocumentRef-` prefix
//! (`DocumentRef-ext:SPDXRef-Package`), and two reserved literals, `NONE` and
//! `NOASSERTION`, stand in for "explicitly absent" and "not evaluated"
//! wherever a reference is expected.
//!
//! Parsing and rendering are exact inverses: for every constructible
//! non-sentinel reference `r`, `r.to_string().parse() == Ok(r)`. The token
//! alphabet (letters, digits, `.`, `-`) is enforced at construction so the
//! round-trip law cannot be broken by a token containing `:` or whitespace.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{Result, SpdxError};

/// Rendered prefix of an element identifier.
pub const SPDXREF_PREFIX: &str = "SPDXRef-";

/// Rendered prefix of an external document reference identifier.
pub const DOCREF_PREFIX: &str = "DocumentRef-";

/// Literal for the "explicitly absent" sentinel.
pub const NONE_LITERAL: &str = "NONE";

/// Literal for the "not evaluated" sentinel.
pub const NOASSERTION_LITERAL: &str = "NOASSERTION";

/// Token naming the document element itself.
const DOCUMENT_TOKEN: &str = "DOCUMENT";

fn valid_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

// ============================================================================
// ElementId
// ============================================================================

/// A document-local element identifier: the token after `SPDXRef-`.
///
/// Stored without the prefix; `Display` renders the full `SPDXRef-` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(String);

impl ElementId {
    /// Create an identifier from a bare token (no `SPDXRef-` prefix).
    ///
    /// Fails if the token is empty or contains characters outside the SPDX
    /// idstring alphabet.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if !valid_token(&token) {
            return Err(SpdxError::malformed_reference(
                &token,
                "identifier tokens must be non-empty and use only letters, digits, '.' and '-'",
            ));
        }
        Ok(Self(token))
    }

    /// The identifier of the document element itself (`SPDXRef-DOCUMENT`).
    pub fn document() -> Self {
        Self(DOCUMENT_TOKEN.to_string())
    }

    /// The bare token without the `SPDXRef-` prefix.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier names the document element.
    #[must_use]
    pub fn is_document(&self) -> bool {
        self.0 == DOCUMENT_TOKEN
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SPDXREF_PREFIX}{}", self.0)
    }
}

impl FromStr for ElementId {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.strip_prefix(SPDXREF_PREFIX) {
            Some(token) => Self::new(token),
            None => Err(SpdxError::malformed_reference(
                s,
                format!("expected the `{SPDXREF_PREFIX}` prefix"),
            )),
        }
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// ============================================================================
// DocumentRefId
// ============================================================================

/// The identifier of an external document reference: the token after
/// `DocumentRef-`. Keys the External Document Reference table and scopes
/// cross-document references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentRefId(String);

impl DocumentRefId {
    /// Create from a bare token (no `DocumentRef-` prefix).
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if !valid_token(&token) {
            return Err(SpdxError::malformed_reference(
                &token,
                "document-ref tokens must be non-empty and use only letters, digits, '.' and '-'",
            ));
        }
        Ok(Self(token))
    }

    /// The bare token without the `DocumentRef-` prefix.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentRefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{DOCREF_PREFIX}{}", self.0)
    }
}

impl FromStr for DocumentRefId {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.strip_prefix(DOCREF_PREFIX) {
            Some(token) => Self::new(token),
            None => Err(SpdxError::malformed_reference(
                s,
                format!("expected the `{DOCREF_PREFIX}` prefix"),
            )),
        }
    }
}

impl Serialize for DocumentRefId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// ============================================================================
// DocElementId
// ============================================================================

/// An element identifier optionally scoped to an external document.
///
/// `document_ref == None` means "this document". A scoped value is only
/// structurally valid when its document-ref token matches an entry in the
/// owning document's external-document-reference table; the validator checks
/// that closure, not this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocElementId {
    pub document_ref: Option<DocumentRefId>,
    pub element: ElementId,
}

impl DocElementId {
    /// A reference local to the owning document.
    pub fn local(element: ElementId) -> Self {
        Self {
            document_ref: None,
            element,
        }
    }

    /// A reference into an external document.
    pub fn external(document_ref: DocumentRefId, element: ElementId) -> Self {
        Self {
            document_ref: Some(document_ref),
            element,
        }
    }

    /// Whether the reference stays inside the owning document.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.document_ref.is_none()
    }

    /// The element identifier when the reference is local.
    #[must_use]
    pub fn as_local(&self) -> Option<&ElementId> {
        match self.document_ref {
            None => Some(&self.element),
            Some(_) => None,
        }
    }
}

impl fmt::Display for DocElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.document_ref {
            Some(doc) => write!(f, "{doc}:{}", self.element),
            None => self.element.fmt(f),
        }
    }
}

impl FromStr for DocElementId {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((doc_part, element_part)) => {
                let document_ref = DocumentRefId::from_str(doc_part).map_err(|_| {
                    SpdxError::malformed_reference(
                        s,
                        format!("scoped references must begin with `{DOCREF_PREFIX}<token>:`"),
                    )
                })?;
                let element = ElementId::from_str(element_part).map_err(|_| {
                    SpdxError::malformed_reference(
                        s,
                        format!("the element part must be `{SPDXREF_PREFIX}<token>`"),
                    )
                })?;
                Ok(Self::external(document_ref, element))
            }
            None => Ok(Self::local(ElementId::from_str(s)?)),
        }
    }
}

impl Serialize for DocElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<ElementId> for DocElementId {
    fn from(element: ElementId) -> Self {
        Self::local(element)
    }
}

// ============================================================================
// ElementRef
// ============================================================================

/// A reference position in the graph: either a concrete (possibly scoped)
/// element identifier, or one of the two SPDX sentinels.
///
/// Sentinels are a closed variant of this type rather than magic strings so
/// no call site ever string-compares against `"NOASSERTION"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementRef {
    /// A concrete element reference.
    Id(DocElementId),
    /// `NONE`: the referent is explicitly absent.
    None,
    /// `NOASSERTION`: the referent was not evaluated.
    NoAssertion,
}

impl ElementRef {
    /// A reference local to the owning document.
    pub fn local(element: ElementId) -> Self {
        Self::Id(DocElementId::local(element))
    }

    /// A reference into an external document.
    pub fn external(document_ref: DocumentRefId, element: ElementId) -> Self {
        Self::Id(DocElementId::external(document_ref, element))
    }

    /// The local reference to the document element (`SPDXRef-DOCUMENT`).
    pub fn document() -> Self {
        Self::local(ElementId::document())
    }

    /// Whether this is one of the two sentinels.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::None | Self::NoAssertion)
    }

    /// The concrete identifier, unless this is a sentinel.
    #[must_use]
    pub fn as_id(&self) -> Option<&DocElementId> {
        match self {
            Self::Id(id) => Some(id),
            _ => None,
        }
    }

    /// The local element identifier, unless scoped or sentinel.
    #[must_use]
    pub fn as_local(&self) -> Option<&ElementId> {
        self.as_id().and_then(DocElementId::as_local)
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => id.fmt(f),
            Self::None => f.write_str(NONE_LITERAL),
            Self::NoAssertion => f.write_str(NOASSERTION_LITERAL),
        }
    }
}

impl FromStr for ElementRef {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            NONE_LITERAL => Ok(Self::None),
            NOASSERTION_LITERAL => Ok(Self::NoAssertion),
            _ => DocElementId::from_str(s).map(Self::Id),
        }
    }
}

impl Serialize for ElementRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<ElementId> for ElementRef {
    fn from(element: ElementId) -> Self {
        Self::local(element)
    }
}

impl From<DocElementId> for ElementRef {
    fn from(id: DocElementId) -> Self {
        Self::Id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(token: &str) -> ElementId {
        ElementId::new(token).unwrap()
    }

    #[test]
    fn test_element_id_render_parse() {
        let id = eid("Package-1");
        assert_eq!(id.to_string(), "SPDXRef-Package-1");
        assert_eq!("SPDXRef-Package-1".parse::<ElementId>().unwrap(), id);
    }

    #[test]
    fn test_element_id_rejects_bad_tokens() {
        assert!(ElementId::new("").is_err());
        assert!(ElementId::new("has space").is_err());
        assert!(ElementId::new("has:colon").is_err());
        assert!(ElementId::new("ok.token-1").is_ok());
    }

    #[test]
    fn test_element_id_requires_prefix() {
        let err = "Package-1".parse::<ElementId>();
        assert!(matches!(err, Err(SpdxError::MalformedReference { .. })));
    }

    #[test]
    fn test_document_identifier() {
        let doc = ElementId::document();
        assert!(doc.is_document());
        assert_eq!(doc.to_string(), "SPDXRef-DOCUMENT");
        assert!(!eid("Package-1").is_document());
    }

    #[test]
    fn test_scoped_reference_round_trip() {
        let local = DocElementId::local(eid("File-7"));
        assert_eq!(local.to_string(), "SPDXRef-File-7");
        assert_eq!(local.to_string().parse::<DocElementId>().unwrap(), local);

        let external =
            DocElementId::external(DocumentRefId::new("ext-doc").unwrap(), eid("Package-1"));
        assert_eq!(external.to_string(), "DocumentRef-ext-doc:SPDXRef-Package-1");
        assert_eq!(external.to_string().parse::<DocElementId>().unwrap(), external);
    }

    #[test]
    fn test_scoped_reference_rejects_unknown_prefixes() {
        assert!("Ref-1:SPDXRef-A".parse::<DocElementId>().is_err());
        assert!("DocumentRef-x:Package".parse::<DocElementId>().is_err());
        assert!("DocumentRef-:SPDXRef-A".parse::<DocElementId>().is_err());
        assert!("DocumentRef-x:SPDXRef-".parse::<DocElementId>().is_err());
    }

    #[test]
    fn test_sentinels_parse_to_variants() {
        assert_eq!("NONE".parse::<ElementRef>().unwrap(), ElementRef::None);
        assert_eq!(
            "NOASSERTION".parse::<ElementRef>().unwrap(),
            ElementRef::NoAssertion
        );
        // Sentinels never become (docRef, elementRef) pairs.
        assert!("NONE".parse::<ElementRef>().unwrap().as_id().is_none());
    }

    #[test]
    fn test_sentinel_render_stability() {
        assert_eq!(ElementRef::None.to_string(), "NONE");
        assert_eq!(ElementRef::NoAssertion.to_string(), "NOASSERTION");
    }

    #[test]
    fn test_sentinel_lookalikes_are_not_sentinels() {
        // Only the exact literals are sentinels; prefixed forms are ids.
        let r = "SPDXRef-NONE".parse::<ElementRef>().unwrap();
        assert!(!r.is_sentinel());
        assert_eq!(r.as_local().unwrap().as_str(), "NONE");

        assert!("None".parse::<ElementRef>().is_err());
    }

    #[test]
    fn test_element_ref_round_trip() {
        let refs = [
            ElementRef::local(eid("Package-1")),
            ElementRef::external(DocumentRefId::new("other").unwrap(), eid("File-2")),
            ElementRef::None,
            ElementRef::NoAssertion,
        ];
        for r in refs {
            assert_eq!(r.to_string().parse::<ElementRef>().unwrap(), r);
        }
    }

    #[test]
    fn test_as_local_scoping() {
        let local = ElementRef::local(eid("A"));
        assert_eq!(local.as_local().unwrap().as_str(), "A");

        let external = ElementRef::external(DocumentRefId::new("d").unwrap(), eid("A"));
        assert!(external.as_local().is_none());
        assert!(external.as_id().is_some());
    }
}
