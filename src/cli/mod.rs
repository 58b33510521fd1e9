//! # CLI Module
//!
//! Command-line front end over the demo API in [`demo`].
//!
//! ```bash
//! # Print the interface document as YAML
//! routeschema doc
//!
//! # Write JSON to a file
//! routeschema doc --format json --output openapi.json
//!
//! # List registered operations and their security
//! routeschema routes
//! ```
//!
//! Document metadata comes from the `ROUTESCHEMA_DOC_*` variables (see
//! [`crate::config`]); logging from `ROUTESCHEMA_LOG_*`.

pub mod demo;

use crate::config::DocumentConfig;
use crate::openapi::{generate, write_document};
use crate::registry::Registry;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "routeschema")]
#[command(about = "Request schema engine CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the interface document for the demo API
    Doc {
        /// Output format when printing to stdout
        #[arg(short, long, value_enum, default_value_t = DocFormat::Yaml)]
        format: DocFormat,

        /// Write to this file instead of stdout (format follows the extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override `info.title`
        #[arg(long)]
        title: Option<String>,
    },
    /// List registered operations
    Routes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocFormat {
    Json,
    Yaml,
}

pub fn run_cli(cli: Cli) -> Result<()> {
    let registry = demo::registry().context("Failed to build demo registry")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Doc {
            format,
            output,
            title,
        } => {
            let mut config = DocumentConfig::from_env();
            if let Some(title) = title {
                config.title = title;
            }
            doc(&registry, &config, format, output, &mut out)
        }
        Commands::Routes => routes(&registry, &mut out),
    }
}

fn doc(
    registry: &Registry,
    config: &DocumentConfig,
    format: DocFormat,
    output: Option<PathBuf>,
    out: &mut impl Write,
) -> Result<()> {
    let document = generate(registry, config)?;
    match output.or_else(|| config.output_file.clone()) {
        Some(path) => write_document(&document, &path),
        None => {
            let text = match format {
                DocFormat::Json => document.to_json()?,
                DocFormat::Yaml => document.to_yaml()?,
            };
            writeln!(out, "{}", text.trim_end())?;
            Ok(())
        }
    }
}

fn routes(registry: &Registry, out: &mut impl Write) -> Result<()> {
    for op in registry.operations() {
        let security: Vec<&str> = op.security.iter().map(|s| s.name()).collect();
        let security = if security.is_empty() {
            "-".to_string()
        } else {
            security.join(",")
        };
        writeln!(out, "{:<7} {:<24} {}", op.method.as_str(), op.path, security)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_doc_args() {
        let cli = Cli::try_parse_from(["routeschema", "doc", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Doc { format, output, .. } => {
                assert_eq!(format, DocFormat::Json);
                assert!(output.is_none());
            }
            Commands::Routes => panic!("expected doc"),
        }
        assert!(Cli::try_parse_from(["routeschema", "doc", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_doc_prints_json() {
        let registry = demo::registry().unwrap();
        let mut buf = Vec::new();
        doc(&registry, &DocumentConfig::default(), DocFormat::Json, None, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["openapi"], "3.1.1");
    }

    #[test]
    fn test_doc_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.yaml");
        let registry = demo::registry().unwrap();
        let mut buf = Vec::new();
        doc(&registry, &DocumentConfig::default(), DocFormat::Json, Some(path.clone()), &mut buf)
            .unwrap();
        assert!(buf.is_empty());
        assert!(std::fs::read_to_string(path).unwrap().contains("paths:"));
    }

    #[test]
    fn test_routes_listing() {
        let registry = demo::registry().unwrap();
        let mut buf = Vec::new();
        routes(&registry, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("/users/:id"));
        assert!(text.contains("ApiKeyOrBearer"));
        assert!(text.contains("BearerAuth"));
    }
}
