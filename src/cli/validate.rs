//! Implementation of the `validate` command.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::codec::{decode_file, DocumentFormat};
use crate::error::{SpdxError, ValidationError};

/// Machine-readable report emitted by `validate --json`.
#[derive(Serialize)]
struct ValidationReport {
    file: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spdx_version: Option<String>,
    errors: Vec<ValidationError>,
    /// Set when the document could not be decoded at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    decode_error: Option<String>,
}

/// Run the `validate` command.
///
/// Returns the process exit code: 0 for a valid document, 1 for an invalid
/// one. I/O failures propagate as errors so the caller can map them to a
/// distinct code.
#[allow(clippy::needless_pass_by_value)]
pub fn run_validate(file: PathBuf, format: Option<DocumentFormat>, json: bool) -> Result<i32> {
    let decoded = match format {
        Some(format) => format.codec().decode(&file),
        None => decode_file(&file),
    };

    match decoded {
        Ok(doc) => {
            if json {
                print_report(&ValidationReport {
                    file: file.display().to_string(),
                    valid: true,
                    name: Some(doc.name.clone()),
                    spdx_version: Some(doc.spec_version.to_string()),
                    errors: Vec::new(),
                    decode_error: None,
                })?;
            } else {
                println!(
                    "{}: valid {} document ({} packages, {} relationships)",
                    file.display(),
                    doc.spec_version,
                    doc.packages.len(),
                    doc.relationships.len()
                );
            }
            Ok(0)
        }
        Err(SpdxError::Validation(errors)) => {
            if json {
                print_report(&ValidationReport {
                    file: file.display().to_string(),
                    valid: false,
                    name: None,
                    spdx_version: None,
                    errors,
                    decode_error: None,
                })?;
            } else {
                eprintln!("{}: {} validation error(s)", file.display(), errors.len());
                for error in &errors {
                    eprintln!("  {error}");
                }
            }
            Ok(1)
        }
        Err(err @ SpdxError::Io { .. }) => Err(err.into()),
        Err(err) => {
            if json {
                print_report(&ValidationReport {
                    file: file.display().to_string(),
                    valid: false,
                    name: None,
                    spdx_version: None,
                    errors: Vec::new(),
                    decode_error: Some(err.to_string()),
                })?;
            } else {
                eprintln!("{}: {err}", file.display());
            }
            Ok(1)
        }
    }
}

fn print_report(report: &ValidationReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
