//! **A document model and multi-format codec suite for SPDX 2.x.**
//!
//! `spdx-doc` parses, validates, converts, and writes Software Package Data
//! Exchange (SPDX) documents in the four SPDX 2.x serialization formats:
//! tag-value, JSON, YAML, and RDF/XML. Every format decodes into one
//! canonical [`Document`] model and encodes back out of it, so a document
//! can move between formats without changing meaning.
//!
//! ## Key Features
//!
//! - **Four codecs, one model**: format modules never define their own
//!   document shape. Decoding always ends in structural validation, and
//!   encoding derives format shorthand (nested file lists,
//!   `documentDescribes`) from relationships through shared rules, so no two
//!   codecs disagree about what a document means.
//! - **Confidence-based format detection**: every codec scores how sure it
//!   is that it can handle some content, and the best score above a
//!   threshold wins. Ambiguous content is an error, not a guess.
//! - **Structural validation**: identifier uniqueness, reference closure,
//!   `FilesAnalyzed` consistency, snippet containment, and per-version field
//!   admissibility are checked on every decode and available standalone via
//!   [`validate::validate`].
//! - **Schema version upgrades**: SPDX 2.1 and 2.2 documents upgrade to 2.3
//!   in memory; downgrades are refused rather than performed lossily.
//! - **Verification codes**: the SPDX package verification code algorithm
//!   over file SHA1 checksums, with exclusion support.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: the canonical [`Document`] and its element types
//!   ([`Package`], [`File`], [`Snippet`], relationships, annotations, and
//!   extracted licensing info). The model is the SPDX 2.3 superset; older
//!   documents carry a version marker and the validator rejects fields their
//!   version cannot express.
//! - **[`codec`]**: the [`SpdxCodec`] trait, the four codec implementations,
//!   the [`FormatDetector`], and file/string entrypoints such as
//!   [`codec::decode_file`] and [`codec::encode_str`].
//! - **[`validate`]**: the structural checks every decode runs.
//! - **[`convert`]**: schema version upgrades.
//! - **[`utils`]**: the package verification code algorithm.
//! - **[`cli`]**: handlers behind the `spdx-doc` command-line tool.
//!
//! ## Getting Started: Reading a Document
//!
//! ```no_run
//! use std::path::Path;
//! use spdx_doc::codec::decode_file;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let doc = decode_file(Path::new("path/to/document.spdx.json"))?;
//!
//!     println!(
//!         "{} ({}) with {} packages",
//!         doc.name,
//!         doc.spec_version,
//!         doc.packages.len()
//!     );
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Examples
//!
//! ### Converting Between Formats
//!
//! ```no_run
//! use std::path::Path;
//! use spdx_doc::codec::{decode_file, encode_str, DocumentFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let doc = decode_file(Path::new("document.spdx"))?;
//!     let json = encode_str(&doc, DocumentFormat::Json)?;
//!     println!("{json}");
//!     Ok(())
//! }
//! ```
//!
//! ### Building a Document Programmatically
//!
//! ```
//! use chrono::Utc;
//! use spdx_doc::model::{
//!     Agent, CreationInfo, Document, ElementId, Package, Relationship, RelationshipType,
//! };
//!
//! fn main() -> spdx_doc::Result<()> {
//!     let creation = CreationInfo::new(Utc::now())
//!         .with_creator(Agent::Tool("example-builder".to_string()));
//!     let mut doc = Document::new("example", "https://example.com/spdx/example", creation);
//!
//!     let pkg_id = ElementId::new("Package-app")?;
//!     doc.add_package(
//!         Package::new(pkg_id.clone(), "app")
//!             .with_version("1.0.0")
//!             .with_files_analyzed(false),
//!     );
//!     doc.add_relationship(Relationship::new(
//!         doc.id.clone(),
//!         RelationshipType::Describes,
//!         pkg_id,
//!     ));
//!
//!     spdx_doc::validate::validate(&doc)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Command-Line Interface (CLI)
//!
//! This documentation is for the `spdx-doc` library crate. The `spdx-doc`
//! binary built from the same package exposes `validate`, `convert`, and
//! `info` subcommands over these APIs; see the project README.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
// Pedantic lints: allow categories that are design choices for this codebase
#![allow(
    // Doc completeness: # Errors / # Panics sections are aspirational
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    // Decode state machines and encoders are inherently long
    clippy::too_many_lines,
    // Variable names like `ref_a`/`ref_b` are clear in context
    clippy::similar_names
)]

pub mod cli;
pub mod codec;
pub mod convert;
pub mod error;
pub mod model;
pub mod utils;
pub mod validate;

// Re-export main types for convenience
pub use codec::{
    decode_file, decode_str, detect_format, encode_file, encode_str, DetectionResult,
    DocumentFormat, FormatConfidence, FormatDetection, FormatDetector, JsonCodec, RdfCodec,
    SpdxCodec, TagValueCodec, YamlCodec,
};
pub use convert::upgrade;
pub use error::{Result, SpdxError, ValidationError, ValidationErrorKind};
pub use model::{
    Agent, Annotation, Checksum, ChecksumAlgorithm, CreationInfo, DocElementId, Document,
    DocumentRefId, ElementId, ElementRef, ExternalDocumentRef, File, OtherLicense, Package,
    Relationship, RelationshipType, Snippet, SpdxVersion,
};
pub use utils::verification_code;
