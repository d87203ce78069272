//! Relationships: the directional edges of the element graph.

use std::fmt;
use std::str::FromStr;

use crate::error::{FormatErrorKind, Result, SpdxError};
use crate::model::common::SpdxVersion;
use crate::model::ident::ElementRef;

/// A directional edge between two referenced elements.
///
/// `ref_b` may be a sentinel (`NONE`/`NOASSERTION`). Duplicate edges are
/// legal; codecs deduplicate only the edges their own shorthand expansion
/// derives, never edges the input declared explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relationship {
    pub ref_a: ElementRef,
    pub relationship_type: RelationshipType,
    pub ref_b: ElementRef,
    pub comment: Option<String>,
}

impl Relationship {
    #[must_use]
    pub fn new(
        ref_a: impl Into<ElementRef>,
        relationship_type: RelationshipType,
        ref_b: impl Into<ElementRef>,
    ) -> Self {
        Self {
            ref_a: ref_a.into(),
            relationship_type,
            ref_b: ref_b.into(),
            comment: None,
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Whether this edge carries the same fact as `other` (triple equality,
    /// comments ignored). Used by shorthand-expansion dedup.
    #[must_use]
    pub fn same_triple(&self, other: &Self) -> bool {
        self.ref_a == other.ref_a
            && self.relationship_type == other.relationship_type
            && self.ref_b == other.ref_b
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.ref_a, self.relationship_type, self.ref_b)
    }
}

/// The SPDX 2.x relationship vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RelationshipType {
    Describes,
    DescribedBy,
    Contains,
    ContainedBy,
    DependsOn,
    DependencyOf,
    DependencyManifestOf,
    BuildDependencyOf,
    DevDependencyOf,
    OptionalDependencyOf,
    ProvidedDependencyOf,
    TestDependencyOf,
    RuntimeDependencyOf,
    ExampleOf,
    Generates,
    GeneratedFrom,
    AncestorOf,
    DescendantOf,
    VariantOf,
    DistributionArtifact,
    PatchFor,
    PatchApplied,
    CopyOf,
    FileAdded,
    FileDeleted,
    FileModified,
    ExpandedFromArchive,
    DynamicLink,
    StaticLink,
    DataFileOf,
    TestCaseOf,
    BuildToolOf,
    DevToolOf,
    TestOf,
    TestToolOf,
    DocumentationOf,
    OptionalComponentOf,
    MetafileOf,
    PackageOf,
    Amends,
    PrerequisiteFor,
    HasPrerequisite,
    RequirementDescriptionFor,
    SpecificationFor,
    Other,
}

impl RelationshipType {
    /// Whether the edge expresses package/file membership in either direction.
    #[must_use]
    pub fn is_membership(self) -> bool {
        matches!(self, Self::Contains | Self::ContainedBy)
    }

    /// Whether the edge expresses the document-describes fact in either
    /// direction.
    #[must_use]
    pub fn is_describes(self) -> bool {
        matches!(self, Self::Describes | Self::DescribedBy)
    }

    /// The oldest schema version whose grammar admits this type.
    #[must_use]
    pub fn introduced_in(self) -> SpdxVersion {
        match self {
            Self::DependsOn
            | Self::DependencyOf
            | Self::DependencyManifestOf
            | Self::BuildDependencyOf
            | Self::DevDependencyOf
            | Self::OptionalDependencyOf
            | Self::ProvidedDependencyOf
            | Self::TestDependencyOf
            | Self::RuntimeDependencyOf
            | Self::ExampleOf
            | Self::DevToolOf
            | Self::TestOf
            | Self::TestToolOf => SpdxVersion::V2_2,
            Self::RequirementDescriptionFor | Self::SpecificationFor => SpdxVersion::V2_3,
            _ => SpdxVersion::V2_1,
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Describes => "DESCRIBES",
            Self::DescribedBy => "DESCRIBED_BY",
            Self::Contains => "CONTAINS",
            Self::ContainedBy => "CONTAINED_BY",
            Self::DependsOn => "DEPENDS_ON",
            Self::DependencyOf => "DEPENDENCY_OF",
            Self::DependencyManifestOf => "DEPENDENCY_MANIFEST_OF",
            Self::BuildDependencyOf => "BUILD_DEPENDENCY_OF",
            Self::DevDependencyOf => "DEV_DEPENDENCY_OF",
            Self::OptionalDependencyOf => "OPTIONAL_DEPENDENCY_OF",
            Self::ProvidedDependencyOf => "PROVIDED_DEPENDENCY_OF",
            Self::TestDependencyOf => "TEST_DEPENDENCY_OF",
            Self::RuntimeDependencyOf => "RUNTIME_DEPENDENCY_OF",
            Self::ExampleOf => "EXAMPLE_OF",
            Self::Generates => "GENERATES",
            Self::GeneratedFrom => "GENERATED_FROM",
            Self::AncestorOf => "ANCESTOR_OF",
            Self::DescendantOf => "DESCENDANT_OF",
            Self::VariantOf => "VARIANT_OF",
            Self::DistributionArtifact => "DISTRIBUTION_ARTIFACT",
            Self::PatchFor => "PATCH_FOR",
            Self::PatchApplied => "PATCH_APPLIED",
            Self::CopyOf => "COPY_OF",
            Self::FileAdded => "FILE_ADDED",
            Self::FileDeleted => "FILE_DELETED",
            Self::FileModified => "FILE_MODIFIED",
            Self::ExpandedFromArchive => "EXPANDED_FROM_ARCHIVE",
            Self::DynamicLink => "DYNAMIC_LINK",
            Self::StaticLink => "STATIC_LINK",
            Self::DataFileOf => "DATA_FILE_OF",
            Self::TestCaseOf => "TEST_CASE_OF",
            Self::BuildToolOf => "BUILD_TOOL_OF",
            Self::DevToolOf => "DEV_TOOL_OF",
            Self::TestOf => "TEST_OF",
            Self::TestToolOf => "TEST_TOOL_OF",
            Self::DocumentationOf => "DOCUMENTATION_OF",
            Self::OptionalComponentOf => "OPTIONAL_COMPONENT_OF",
            Self::MetafileOf => "METAFILE_OF",
            Self::PackageOf => "PACKAGE_OF",
            Self::Amends => "AMENDS",
            Self::PrerequisiteFor => "PREREQUISITE_FOR",
            Self::HasPrerequisite => "HAS_PREREQUISITE",
            Self::RequirementDescriptionFor => "REQUIREMENT_DESCRIPTION_FOR",
            Self::SpecificationFor => "SPECIFICATION_FOR",
            Self::Other => "OTHER",
        };
        f.write_str(s)
    }
}

impl FromStr for RelationshipType {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        let relationship_type = match s {
            "DESCRIBES" => Self::Describes,
            "DESCRIBED_BY" => Self::DescribedBy,
            "CONTAINS" => Self::Contains,
            "CONTAINED_BY" => Self::ContainedBy,
            "DEPENDS_ON" => Self::DependsOn,
            "DEPENDENCY_OF" => Self::DependencyOf,
            "DEPENDENCY_MANIFEST_OF" => Self::DependencyManifestOf,
            "BUILD_DEPENDENCY_OF" => Self::BuildDependencyOf,
            "DEV_DEPENDENCY_OF" => Self::DevDependencyOf,
            "OPTIONAL_DEPENDENCY_OF" => Self::OptionalDependencyOf,
            "PROVIDED_DEPENDENCY_OF" => Self::ProvidedDependencyOf,
            "TEST_DEPENDENCY_OF" => Self::TestDependencyOf,
            "RUNTIME_DEPENDENCY_OF" => Self::RuntimeDependencyOf,
            "EXAMPLE_OF" => Self::ExampleOf,
            "GENERATES" => Self::Generates,
            "GENERATED_FROM" => Self::GeneratedFrom,
            "ANCESTOR_OF" => Self::AncestorOf,
            "DESCENDANT_OF" => Self::DescendantOf,
            "VARIANT_OF" => Self::VariantOf,
            "DISTRIBUTION_ARTIFACT" => Self::DistributionArtifact,
            "PATCH_FOR" => Self::PatchFor,
            "PATCH_APPLIED" => Self::PatchApplied,
            "COPY_OF" => Self::CopyOf,
            "FILE_ADDED" => Self::FileAdded,
            "FILE_DELETED" => Self::FileDeleted,
            "FILE_MODIFIED" => Self::FileModified,
            "EXPANDED_FROM_ARCHIVE" => Self::ExpandedFromArchive,
            "DYNAMIC_LINK" => Self::DynamicLink,
            "STATIC_LINK" => Self::StaticLink,
            "DATA_FILE_OF" => Self::DataFileOf,
            "TEST_CASE_OF" => Self::TestCaseOf,
            "BUILD_TOOL_OF" => Self::BuildToolOf,
            "DEV_TOOL_OF" => Self::DevToolOf,
            "TEST_OF" => Self::TestOf,
            "TEST_TOOL_OF" => Self::TestToolOf,
            "DOCUMENTATION_OF" => Self::DocumentationOf,
            "OPTIONAL_COMPONENT_OF" => Self::OptionalComponentOf,
            "METAFILE_OF" => Self::MetafileOf,
            "PACKAGE_OF" => Self::PackageOf,
            "AMENDS" => Self::Amends,
            "PREREQUISITE_FOR" => Self::PrerequisiteFor,
            "HAS_PREREQUISITE" => Self::HasPrerequisite,
            "REQUIREMENT_DESCRIPTION_FOR" => Self::RequirementDescriptionFor,
            "SPECIFICATION_FOR" => Self::SpecificationFor,
            "OTHER" => Self::Other,
            other => {
                return Err(SpdxError::decode(
                    "SPDX",
                    "relationship type",
                    FormatErrorKind::InvalidValue {
                        field: "relationshipType".to_string(),
                        message: format!("unknown relationship type `{other}`"),
                    },
                ))
            }
        };
        Ok(relationship_type)
    }
}
