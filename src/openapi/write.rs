use super::build::{generate, DocumentError};
use super::types::Document;
use crate::config::DocumentConfig;
use crate::registry::Registry;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

impl Document {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize document as JSON")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize document as YAML")
    }
}

/// Write `doc` to `path`: JSON when the path mentions `json`, YAML otherwise.
pub fn write_document(doc: &Document, path: &Path) -> Result<()> {
    let is_json = path.to_string_lossy().to_lowercase().contains("json");
    let (format, content) = if is_json {
        ("json", doc.to_json()?)
    } else {
        ("yaml", doc.to_yaml()?)
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write document to {}", path.display()))?;
    info!(path = %path.display(), format, "Document written");
    Ok(())
}

/// Generate the document and, when `config.output_file` is set, write it.
///
/// A failed write is logged and does not fail the call; the generated
/// document is still returned.
pub fn openapi(registry: &Registry, config: &DocumentConfig) -> Result<Document, DocumentError> {
    let doc = generate(registry, config)?;
    if let Some(path) = &config.output_file {
        if let Err(e) = write_document(&doc, path) {
            warn!(path = %path.display(), error = %e, "Failed to write document");
        }
    }
    Ok(doc)
}
