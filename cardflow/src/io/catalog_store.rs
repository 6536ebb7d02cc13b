//! Catalog load/save helpers with schema + invariant validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use super::atomic::write_json_atomic;
use super::schema::{CATALOG_SCHEMA, validate_schema};
use crate::core::catalog::Catalog;
use crate::core::invariants::validate_catalog;

/// Load and validate the card type catalog (schema + invariants).
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read catalog {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse catalog {}", path.display()))?;
    validate_schema(CATALOG_SCHEMA, "catalog", &value)?;
    let catalog: Catalog = serde_json::from_value(value)
        .with_context(|| format!("deserialize catalog {}", path.display()))?;

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        return Err(anyhow!("catalog invariants failed: {}", errors.join("; ")));
    }
    tracing::debug!(path = %path.display(), types = catalog.len(), "loaded catalog");
    Ok(catalog)
}

pub fn write_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    write_json_atomic(path, catalog)
}
