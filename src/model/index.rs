//! A precomputed element index for fast identifier lookups.
//!
//! The validator and the encoders both need to answer "what kind of element
//! does this identifier name" many times per document. Building the index
//! once avoids repeated O(n) scans over all element lists.

use indexmap::IndexMap;

use super::{Document, ElementId};

/// What kind of element an identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Document,
    Package,
    File,
    Snippet,
}

impl ElementKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Package => "package",
            Self::File => "file",
            Self::Snippet => "snippet",
        }
    }
}

/// Identifier-to-kind index over a document.
///
/// Declaration order is preserved so diagnostics derived from the index come
/// out in document order. When an identifier is declared more than once the
/// first declaration wins and every later one is recorded in `duplicates`.
#[derive(Debug, Clone)]
#[must_use]
pub struct DocumentIndex {
    entries: IndexMap<ElementId, ElementKind>,
    duplicates: Vec<(ElementId, ElementKind)>,
}

impl DocumentIndex {
    /// Build the index from a document in one pass.
    pub fn build(doc: &Document) -> Self {
        let mut index = Self {
            entries: IndexMap::new(),
            duplicates: Vec::new(),
        };

        index.insert(doc.id.clone(), ElementKind::Document);
        for package in &doc.packages {
            index.insert(package.id.clone(), ElementKind::Package);
            for file in &package.files {
                index.insert(file.id.clone(), ElementKind::File);
            }
        }
        for file in &doc.files {
            index.insert(file.id.clone(), ElementKind::File);
        }
        for snippet in &doc.snippets {
            index.insert(snippet.id.clone(), ElementKind::Snippet);
        }

        index
    }

    fn insert(&mut self, id: ElementId, kind: ElementKind) {
        if self.entries.contains_key(&id) {
            self.duplicates.push((id, kind));
        } else {
            self.entries.insert(id, kind);
        }
    }

    /// Whether any element declares this identifier.
    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.entries.contains_key(id)
    }

    /// The kind of element the identifier names, if declared.
    #[must_use]
    pub fn kind_of(&self, id: &ElementId) -> Option<ElementKind> {
        self.entries.get(id).copied()
    }

    /// Re-declared identifiers in document order, with the kind of the
    /// later declaration.
    #[must_use]
    pub fn duplicates(&self) -> &[(ElementId, ElementKind)] {
        &self.duplicates
    }

    /// Number of distinct identifiers declared.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreationInfo, File, Package, Snippet};
    use chrono::Utc;

    fn eid(token: &str) -> ElementId {
        ElementId::new(token).unwrap()
    }

    fn make_doc() -> Document {
        Document::new(
            "doc",
            "https://example.com/spdx/doc",
            CreationInfo::new(Utc::now()),
        )
    }

    #[test]
    fn test_index_kinds() {
        let mut doc = make_doc();
        doc.add_package(Package::new(eid("Package-1"), "pkg"));
        doc.add_file(File::new(eid("File-1"), "./a.c"));
        doc.add_snippet(Snippet::new(eid("Snippet-1"), eid("File-1")));

        let index = DocumentIndex::build(&doc);
        assert_eq!(index.len(), 4);
        assert_eq!(index.kind_of(&ElementId::document()), Some(ElementKind::Document));
        assert_eq!(index.kind_of(&eid("Package-1")), Some(ElementKind::Package));
        assert_eq!(index.kind_of(&eid("File-1")), Some(ElementKind::File));
        assert_eq!(index.kind_of(&eid("Snippet-1")), Some(ElementKind::Snippet));
        assert!(!index.contains(&eid("Package-2")));
        assert!(index.duplicates().is_empty());
    }

    #[test]
    fn test_index_records_duplicates() {
        let mut doc = make_doc();
        doc.add_package(Package::new(eid("Element-1"), "pkg"));
        doc.add_file(File::new(eid("Element-1"), "./a.c"));

        let index = DocumentIndex::build(&doc);
        // First declaration wins.
        assert_eq!(index.kind_of(&eid("Element-1")), Some(ElementKind::Package));
        assert_eq!(index.duplicates(), &[(eid("Element-1"), ElementKind::File)]);
    }

    #[test]
    fn test_nested_file_indexed() {
        let mut doc = make_doc();
        let mut pkg = Package::new(eid("Package-1"), "pkg");
        pkg.files.push(File::new(eid("File-nested"), "./n.c"));
        doc.add_package(pkg);

        let index = DocumentIndex::build(&doc);
        assert_eq!(index.kind_of(&eid("File-nested")), Some(ElementKind::File));
    }
}
