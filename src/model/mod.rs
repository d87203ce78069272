//! The canonical in-memory representation of an SPDX document.
//!
//! Every supported serialization format decodes into these structures and
//! encodes back out of them; format modules never define their own document
//! shape. Identifiers are modeled as dedicated types rather than strings, so
//! a reference that parsed is a reference that renders back verbatim.

mod annotation;
mod common;
mod document;
mod file;
mod ident;
mod index;
mod license;
mod package;
mod relationship;
mod snippet;

pub use annotation::*;
pub use common::*;
pub use document::*;
pub use file::*;
pub use ident::*;
pub use index::*;
pub use license::*;
pub use package::*;
pub use relationship::*;
pub use snippet::*;
