//! spdx-doc: SPDX 2.x document validator and format converter.
//!
//! Reads tag-value, JSON, YAML, and RDF/XML documents into one canonical
//! model and writes any of them back out.

#![allow(clippy::needless_pass_by_value)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use spdx_doc::{cli, codec::DocumentFormat};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with format support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nSupported SPDX versions:",
        "\n  2.1, 2.2, 2.3",
        "\n\nSupported formats:",
        "\n  tag-value, JSON, YAML, RDF/XML"
    )
}

#[derive(Parser)]
#[command(name = "spdx-doc")]
#[command(version, long_version = build_long_version())]
#[command(about = "SPDX document validator and format converter", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Document is valid / operation succeeded
    1  Document is invalid
    2  Usage or I/O error

EXAMPLES:
    # Validate with auto-detected format
    spdx-doc validate sbom.spdx.json

    # Validate a tag-value document, machine-readable report
    spdx-doc validate sbom.spdx --json

    # Convert tag-value to JSON
    spdx-doc convert sbom.spdx -o sbom.json

    # Convert and upgrade to SPDX-2.3
    spdx-doc convert old.spdx -o new.yaml --spdx-version 2.3

    # Summarize a document
    spdx-doc info sbom.rdf.xml")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

// ============================================================================
// Command argument structs
// ============================================================================

/// Arguments for the `validate` subcommand
#[derive(Parser)]
struct ValidateArgs {
    /// Path to the SPDX document
    file: PathBuf,

    /// Input format (tag-value, json, yaml, rdf); auto-detected if omitted
    #[arg(short, long)]
    format: Option<DocumentFormat>,

    /// Emit a machine-readable JSON report
    #[arg(long)]
    json: bool,
}

/// Arguments for the `convert` subcommand
#[derive(Parser)]
struct ConvertArgs {
    /// Path to the input document
    input: PathBuf,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Input format (tag-value, json, yaml, rdf); auto-detected if omitted
    #[arg(short, long)]
    from: Option<DocumentFormat>,

    /// Output format; inferred from the output extension if omitted
    #[arg(short, long)]
    to: Option<DocumentFormat>,

    /// Upgrade to this SPDX version before encoding (e.g. 2.3)
    #[arg(long)]
    spdx_version: Option<String>,
}

/// Arguments for the `info` subcommand
#[derive(Parser)]
struct InfoArgs {
    /// Path to the SPDX document
    file: PathBuf,

    /// Input format (tag-value, json, yaml, rdf); auto-detected if omitted
    #[arg(short, long)]
    format: Option<DocumentFormat>,

    /// Emit the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a document's structural invariants
    Validate(ValidateArgs),

    /// Convert a document between formats and schema versions
    Convert(ConvertArgs),

    /// Show a summary of a document
    Info(InfoArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run_command(cli) {
        Ok(0) => {}
        Ok(exit_code) => std::process::exit(exit_code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}

/// Dispatch to command handlers. Returns the process exit code.
fn run_command(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Validate(args) => cli::run_validate(args.file, args.format, args.json),

        Commands::Convert(args) => {
            cli::run_convert(args.input, args.output, args.from, args.to, args.spdx_version)?;
            Ok(0)
        }

        Commands::Info(args) => {
            cli::run_info(args.file, args.format, args.json)?;
            Ok(0)
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "spdx-doc", &mut io::stdout());
            Ok(0)
        }
    }
}
