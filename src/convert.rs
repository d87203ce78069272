//! Schema version adaptation.
//!
//! The canonical model is the SPDX 2.3 superset, so moving a document to a
//! newer schema generation never rewrites content: every field an older
//! grammar could express is already in its final shape, and fields a newer
//! grammar introduces stay absent. Upgrading walks the version chain one
//! step at a time and only ever touches the declared version.
//!
//! Downgrading is refused: an older grammar cannot carry newer vocabulary
//! (2.3-only checksum algorithms, relationship types, package fields), and
//! silently dropping content would betray the round-trip guarantee.

use std::cmp::Ordering;

use tracing::debug;

use crate::error::{Result, SpdxError};
use crate::model::{Document, SpdxVersion};

/// Upgrade a document to a newer schema version.
///
/// A no-op when the document already declares `target`. Fails with
/// [`SpdxError::Convert`] when `target` is older than the declared version.
pub fn upgrade(mut doc: Document, target: SpdxVersion) -> Result<Document> {
    match doc.spec_version.cmp(&target) {
        Ordering::Equal => Ok(doc),
        Ordering::Greater => Err(SpdxError::Convert(format!(
            "cannot downgrade {} to {target}; older grammars cannot carry newer \
             content losslessly",
            doc.spec_version
        ))),
        Ordering::Less => {
            while doc.spec_version < target {
                let next = doc.spec_version.successor().ok_or_else(|| {
                    SpdxError::Convert(format!(
                        "no upgrade path from {} to {target}",
                        doc.spec_version
                    ))
                })?;
                debug!(from = %doc.spec_version, to = %next, "upgrading schema version");
                doc.spec_version = next;
            }
            Ok(doc)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Agent, CreationInfo, ElementId, Package};
    use chrono::Utc;

    fn make_doc(version: SpdxVersion) -> Document {
        let mut doc = Document::new(
            "doc",
            "https://example.com/spdx/doc",
            CreationInfo::new(Utc::now()).with_creator(Agent::Tool("spdx-doc".into())),
        )
        .with_version(version);
        doc.add_package(Package::new(
            ElementId::new("Package-demo").unwrap(),
            "demo",
        ));
        doc
    }

    #[test]
    fn test_upgrade_preserves_content() {
        let original = make_doc(SpdxVersion::V2_1);
        let upgraded = upgrade(original.clone(), SpdxVersion::V2_3).unwrap();

        assert_eq!(upgraded.spec_version, SpdxVersion::V2_3);
        assert_eq!(upgraded.name, original.name);
        assert_eq!(upgraded.namespace, original.namespace);
        assert_eq!(upgraded.packages, original.packages);
        assert_eq!(upgraded.relationships, original.relationships);
    }

    #[test]
    fn test_upgrade_walks_one_step() {
        let doc = upgrade(make_doc(SpdxVersion::V2_1), SpdxVersion::V2_2).unwrap();
        assert_eq!(doc.spec_version, SpdxVersion::V2_2);
    }

    #[test]
    fn test_upgrade_to_same_version_is_identity() {
        let original = make_doc(SpdxVersion::V2_2);
        let upgraded = upgrade(original.clone(), SpdxVersion::V2_2).unwrap();
        assert_eq!(upgraded, original);
    }

    #[test]
    fn test_downgrade_is_refused() {
        let err = upgrade(make_doc(SpdxVersion::V2_3), SpdxVersion::V2_1).unwrap_err();
        match err {
            SpdxError::Convert(message) => {
                assert!(message.contains("downgrade"));
                assert!(message.contains("SPDX-2.3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
