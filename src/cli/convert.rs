//! Implementation of the `convert` command.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::codec::{decode_file, encode_file, DocumentFormat};
use crate::convert::upgrade;
use crate::model::SpdxVersion;

/// Run the `convert` command.
#[allow(clippy::needless_pass_by_value)]
pub fn run_convert(
    input: PathBuf,
    output: PathBuf,
    from: Option<DocumentFormat>,
    to: Option<DocumentFormat>,
    spdx_version: Option<String>,
) -> Result<()> {
    let target_format = resolve_target_format(to, &output)?;

    let doc = match from {
        Some(format) => format.codec().decode(&input),
        None => decode_file(&input),
    }
    .with_context(|| format!("failed to read {}", input.display()))?;

    let doc = match spdx_version {
        Some(raw) => upgrade(doc, parse_version(&raw)?)?,
        None => doc,
    };

    encode_file(&doc, &output, target_format)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "wrote {} ({}, {})",
        output.display(),
        target_format.name(),
        doc.spec_version
    );
    Ok(())
}

/// Accept both the `2.3` and `SPDX-2.3` spellings.
fn parse_version(raw: &str) -> Result<SpdxVersion> {
    let canonical = if raw.starts_with("SPDX-") {
        raw.to_string()
    } else {
        format!("SPDX-{raw}")
    };
    canonical
        .parse()
        .map_err(|_| anyhow!("unsupported SPDX version '{raw}' (supported: 2.1, 2.2, 2.3)"))
}

fn resolve_target_format(to: Option<DocumentFormat>, output: &Path) -> Result<DocumentFormat> {
    to.or_else(|| DocumentFormat::from_extension(output))
        .ok_or_else(|| {
            anyhow!(
                "cannot infer output format from '{}'; pass --to (tag-value, json, yaml, rdf)",
                output.display()
            )
        })
}
