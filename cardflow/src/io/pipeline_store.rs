//! Pipeline document load/save helpers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use super::atomic::write_json_atomic;
use super::schema::{PIPELINE_SCHEMA, validate_schema};
use crate::core::document::PipelineDocument;

/// Load a pipeline document, validating it against the pipeline schema.
///
/// A missing file yields an empty document.
pub fn load_document(path: &Path) -> Result<PipelineDocument> {
    if !path.exists() {
        return Ok(PipelineDocument::default());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read pipeline {}", path.display()))?;
    parse_document(&contents).with_context(|| format!("load pipeline {}", path.display()))
}

/// Parse and schema-check a document from JSON text (e.g. an import file).
pub fn parse_document(contents: &str) -> Result<PipelineDocument> {
    let value: Value = serde_json::from_str(contents).context("parse pipeline document")?;
    document_from_value(value)
}

/// Schema-check an already parsed document.
pub fn document_from_value(value: Value) -> Result<PipelineDocument> {
    validate_schema(PIPELINE_SCHEMA, "pipeline", &value)?;
    serde_json::from_value(value).context("deserialize pipeline document")
}

pub fn write_document(path: &Path, document: &PipelineDocument) -> Result<()> {
    write_json_atomic(path, document)?;
    tracing::debug!(path = %path.display(), cards = document.cards.len(), "wrote pipeline");
    Ok(())
}
