//! Package verification codes.
//!
//! The verification code binds a package to the exact bytes of its files:
//! take the SHA1 digest of every member file, sort the hex strings, hash
//! their concatenation with SHA1 again. Anyone holding the same files can
//! recompute the code without the document.

use sha1::{Digest, Sha1};

use crate::error::{Result, SpdxError};
use crate::model::{ChecksumAlgorithm, File, PackageVerificationCode};

/// Compute the verification code over a package's member files.
///
/// `excludes` lists file names (the `./`-prefixed form recorded in the
/// document) left out of the computation; the returned code carries them so
/// a consumer can reproduce the digest. Every non-excluded member must carry
/// a SHA1 checksum.
pub fn verification_code<'a>(
    files: impl IntoIterator<Item = &'a File>,
    excludes: &[String],
) -> Result<PackageVerificationCode> {
    let mut digests = Vec::new();
    for file in files {
        if excludes.contains(&file.name) {
            continue;
        }
        let sha1 = file
            .checksums
            .iter()
            .find(|c| c.algorithm == ChecksumAlgorithm::Sha1)
            .ok_or_else(|| {
                SpdxError::VerificationCode(format!(
                    "file {} ({}) has no SHA1 checksum",
                    file.id, file.name
                ))
            })?;
        digests.push(sha1.value.to_ascii_lowercase());
    }
    digests.sort_unstable();

    let mut hasher = Sha1::new();
    for digest in &digests {
        hasher.update(digest.as_bytes());
    }

    let mut code = PackageVerificationCode::new(hex::encode(hasher.finalize()));
    code.excluded_files = excludes.to_vec();
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Checksum, ElementId};

    fn file(token: &str, name: &str, sha1: &str) -> File {
        File::new(ElementId::new(token).unwrap(), name).with_checksum(Checksum::sha1(sha1))
    }

    #[test]
    fn test_code_is_order_independent() {
        let a = file("File-a", "./a.c", "85ed0817af83a24ad8da68c2b5094de69833983c");
        let b = file("File-b", "./b.c", "c2b4e1c67a2d28fced849ee1bb76e7391b93eb12");

        let forward = verification_code([&a, &b], &[]).unwrap();
        let reverse = verification_code([&b, &a], &[]).unwrap();
        assert_eq!(forward, reverse);
        assert_eq!(forward.value.len(), 40);
        assert!(forward.value.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_digest_case_is_normalized() {
        let lower = file("File-a", "./a.c", "85ed0817af83a24ad8da68c2b5094de69833983c");
        let upper = file("File-a", "./a.c", "85ED0817AF83A24AD8DA68C2B5094DE69833983C");

        assert_eq!(
            verification_code([&lower], &[]).unwrap(),
            verification_code([&upper], &[]).unwrap()
        );
    }

    #[test]
    fn test_excluded_files_are_skipped_and_recorded() {
        let a = file("File-a", "./a.c", "85ed0817af83a24ad8da68c2b5094de69833983c");
        let b = file("File-b", "./b.c", "c2b4e1c67a2d28fced849ee1bb76e7391b93eb12");
        let excludes = vec!["./b.c".to_string()];

        let with_b = verification_code([&a, &b], &[]).unwrap();
        let without_b = verification_code([&a, &b], &excludes).unwrap();
        let only_a = verification_code([&a], &[]).unwrap();

        assert_ne!(with_b.value, without_b.value);
        assert_eq!(without_b.value, only_a.value);
        assert_eq!(without_b.excluded_files, excludes);
    }

    #[test]
    fn test_missing_sha1_names_the_file() {
        let mut bad = File::new(ElementId::new("File-a").unwrap(), "./a.c");
        bad.checksums.push(Checksum::new(
            ChecksumAlgorithm::Sha256,
            "aab321d9b18999ea33b27c2d24c6364cba9c750e66c5f20f0c1a51bb8db726f2",
        ));

        let err = verification_code([&bad], &[]).unwrap_err();
        match err {
            SpdxError::VerificationCode(message) => {
                assert!(message.contains("./a.c"));
                assert!(message.contains("SPDXRef-File-a"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
