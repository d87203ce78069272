//! Implementation of the `info` command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use indexmap::IndexSet;
use serde::Serialize;

use crate::codec::{decode_file, DocumentFormat};
use crate::model::{format_timestamp, Document, ElementId};

/// Machine-readable summary emitted by `info --json`.
#[derive(Serialize)]
struct DocumentSummary {
    file: String,
    name: String,
    spdx_version: String,
    namespace: String,
    data_license: String,
    created: String,
    creators: Vec<String>,
    packages: usize,
    files: usize,
    snippets: usize,
    relationships: usize,
    annotations: usize,
    other_licenses: usize,
    external_document_refs: usize,
    describes: Vec<String>,
}

/// Run the `info` command.
#[allow(clippy::needless_pass_by_value)]
pub fn run_info(file: PathBuf, format: Option<DocumentFormat>, json: bool) -> Result<()> {
    let doc = match format {
        Some(format) => format.codec().decode(&file),
        None => decode_file(&file),
    }?;

    let summary = summarize(&file, &doc);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Name:            {}", summary.name);
    println!("SPDX version:    {}", summary.spdx_version);
    println!("Namespace:       {}", summary.namespace);
    println!("Data license:    {}", summary.data_license);
    println!("Created:         {}", summary.created);
    for creator in &summary.creators {
        println!("Creator:         {creator}");
    }
    println!("Packages:        {}", summary.packages);
    println!("Files:           {}", summary.files);
    println!("Snippets:        {}", summary.snippets);
    println!("Relationships:   {}", summary.relationships);
    println!("Annotations:     {}", summary.annotations);
    println!("Other licenses:  {}", summary.other_licenses);
    if summary.external_document_refs > 0 {
        println!("External docs:   {}", summary.external_document_refs);
    }
    if summary.describes.is_empty() {
        println!("Describes:       (none)");
    } else {
        println!("Describes:       {}", summary.describes.join(", "));
    }
    Ok(())
}

fn summarize(file: &Path, doc: &Document) -> DocumentSummary {
    DocumentSummary {
        file: file.display().to_string(),
        name: doc.name.clone(),
        spdx_version: doc.spec_version.to_string(),
        namespace: doc.namespace.clone(),
        data_license: doc.data_license.clone(),
        created: format_timestamp(&doc.creation_info.created),
        creators: doc
            .creation_info
            .creators
            .iter()
            .map(ToString::to_string)
            .collect(),
        packages: doc.packages.len(),
        files: count_file_elements(doc),
        snippets: doc.snippets.len(),
        relationships: doc.relationships.len(),
        annotations: doc.annotations.len(),
        other_licenses: doc.other_licenses.len(),
        external_document_refs: doc.external_document_refs.len(),
        describes: doc
            .described_packages()
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}

/// Count distinct file elements across the document and package file lists.
fn count_file_elements(doc: &Document) -> usize {
    let mut seen: IndexSet<&ElementId> = doc.files.iter().map(|f| &f.id).collect();
    for package in &doc.packages {
        for file in &package.files {
            seen.insert(&file.id);
        }
    }
    seen.len()
}
