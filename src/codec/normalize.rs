//! Shared derivation rules between format shorthand and relationships.
//!
//! Several formats can state the same fact two ways: a file can sit inside a
//! package's file list or be the target of a `CONTAINS` relationship, and
//! the described packages can appear in `documentDescribes` or as
//! `DESCRIBES` edges. Relationships are the single source of truth in the
//! model; this module converts between the two spellings so that every
//! decoder produces the same graph for the same facts and every encoder
//! emits each fact exactly once.

use indexmap::{IndexMap, IndexSet};

use crate::error::{EncodeErrorKind, Result, SpdxError};
use crate::model::{
    Annotation, Document, ElementId, ElementRef, Relationship, RelationshipType,
};

/// Shorthand facts a decoder gathered while parsing, to be turned into
/// relationships once the whole document is in hand.
#[derive(Debug, Default)]
pub(crate) struct DerivedFacts {
    /// Package-contains-file pairs from nesting or `hasFiles` lists
    pub contains: Vec<(ElementId, ElementId)>,
    /// Targets of `documentDescribes` or equivalent
    pub describes: Vec<ElementRef>,
}

impl DerivedFacts {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

/// Materialize derived facts as relationships.
///
/// A derived edge is added only when no explicit relationship already states
/// the same fact in either direction, so a document that spelled a fact out
/// keeps its spelling and never gains a duplicate.
pub(crate) fn apply_derived(doc: &mut Document, facts: DerivedFacts) {
    for (package, file) in facts.contains {
        if !has_membership_fact(doc, &package, &file) {
            doc.add_relationship(Relationship::new(
                package,
                RelationshipType::Contains,
                file,
            ));
        }
    }
    for target in facts.describes {
        if !has_describes_fact(doc, &target) {
            doc.add_relationship(Relationship::new(
                ElementId::document(),
                RelationshipType::Describes,
                target,
            ));
        }
    }
}

fn has_membership_fact(doc: &Document, package: &ElementId, file: &ElementId) -> bool {
    doc.relationships.iter().any(|rel| match rel.relationship_type {
        RelationshipType::Contains => {
            rel.ref_a.as_local() == Some(package) && rel.ref_b.as_local() == Some(file)
        }
        RelationshipType::ContainedBy => {
            rel.ref_a.as_local() == Some(file) && rel.ref_b.as_local() == Some(package)
        }
        _ => false,
    })
}

fn has_describes_fact(doc: &Document, target: &ElementRef) -> bool {
    doc.relationships.iter().any(|rel| match rel.relationship_type {
        RelationshipType::Describes => {
            rel.ref_a.as_local().is_some_and(ElementId::is_document) && &rel.ref_b == target
        }
        RelationshipType::DescribedBy => {
            &rel.ref_a == target && rel.ref_b.as_local().is_some_and(ElementId::is_document)
        }
        _ => false,
    })
}

// ============================================================================
// Encode-side views
// ============================================================================

/// Whether an encoder that expresses membership through nesting should skip
/// this relationship because the nesting already carries it.
///
/// Only the canonical `CONTAINS` direction without a comment is skippable;
/// `CONTAINED_BY` and commented edges are always emitted explicitly so a
/// later decode reproduces the original graph.
pub(crate) fn expressed_by_nesting(
    rel: &Relationship,
    membership: &IndexSet<(ElementId, ElementId)>,
) -> bool {
    if rel.relationship_type != RelationshipType::Contains || rel.comment.is_some() {
        return false;
    }
    match (rel.ref_a.as_local(), rel.ref_b.as_local()) {
        (Some(package), Some(file)) => membership.contains(&(package.clone(), file.clone())),
        _ => false,
    }
}

/// Whether an encoder with a `documentDescribes` shorthand should skip this
/// relationship.
pub(crate) fn expressed_by_describes_list(rel: &Relationship) -> bool {
    rel.relationship_type == RelationshipType::Describes
        && rel.comment.is_none()
        && rel.ref_a.as_local().is_some_and(ElementId::is_document)
        && rel.ref_b.as_local().is_some()
}

/// All package-to-file membership pairs an encoder may express by nesting.
pub(crate) fn membership_pairs(doc: &Document) -> IndexSet<(ElementId, ElementId)> {
    let file_ids: IndexSet<&ElementId> = doc
        .files
        .iter()
        .map(|f| &f.id)
        .chain(doc.packages.iter().flat_map(|p| p.files.iter().map(|f| &f.id)))
        .collect();
    let mut pairs = IndexSet::new();
    for (package, members) in doc.file_membership() {
        for member in members {
            if file_ids.contains(&member) {
                pairs.insert((package.clone(), member));
            }
        }
    }
    pairs
}

/// For position-based formats: the single package each file is emitted
/// under. A file claimed by several packages goes under the first one in
/// declaration order; the other memberships stay explicit relationships.
pub(crate) fn primary_parent(doc: &Document) -> IndexMap<ElementId, ElementId> {
    let mut parent = IndexMap::new();
    for (package, members) in doc.file_membership() {
        for member in members {
            parent.entry(member).or_insert_with(|| package.clone());
        }
    }
    parent
}

/// Membership pairs a position-based encoder actually expresses: exactly the
/// primary-parent assignment.
pub(crate) fn primary_membership_pairs(doc: &Document) -> IndexSet<(ElementId, ElementId)> {
    primary_parent(doc)
        .into_iter()
        .map(|(file, package)| (package, file))
        .collect()
}

/// The local describes targets an encoder's `documentDescribes` shorthand
/// carries. Sentinel and external targets are excluded; their relationships
/// stay explicit.
pub(crate) fn describes_list(doc: &Document) -> Vec<ElementId> {
    doc.described_packages()
}

/// Group annotations under the local element each one targets, for formats
/// that nest annotations inside their subject.
///
/// Sentinel and external targets cannot be expressed by nesting; they are an
/// encode error rather than a silent drop.
pub(crate) fn annotations_by_target(
    doc: &Document,
    format: &str,
) -> Result<IndexMap<ElementId, Vec<Annotation>>> {
    let mut grouped: IndexMap<ElementId, Vec<Annotation>> = IndexMap::new();
    for annotation in &doc.annotations {
        let target = match &annotation.target {
            ElementRef::Id(id) if id.is_local() => id.element.clone(),
            other => {
                return Err(SpdxError::encode(
                    format,
                    "annotation placement",
                    EncodeErrorKind::UnrepresentableAnnotation {
                        target: other.to_string(),
                    },
                ));
            }
        };
        grouped.entry(target).or_default().push(annotation.clone());
    }
    Ok(grouped)
}

/// Files a serializer emits: the flat list followed by any legacy nested
/// ones, each exactly once by identifier.
pub(crate) fn all_files(doc: &Document) -> Vec<&crate::model::File> {
    let mut seen = IndexSet::new();
    let mut files = Vec::new();
    for file in doc
        .files
        .iter()
        .chain(doc.packages.iter().flat_map(|p| p.files.iter()))
    {
        if seen.insert(&file.id) {
            files.push(file);
        }
    }
    files
}
