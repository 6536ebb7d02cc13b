//! JSON Schema validation for the files cardflow reads.

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;

pub const CATALOG_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/catalog/v1.schema.json"
));

pub const PIPELINE_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/pipeline/v1.schema.json"
));

/// Validate `value` against the schema source `schema`.
///
/// `what` names the document in the error message (e.g. `catalog`).
pub fn validate_schema(schema: &str, what: &str, value: &Value) -> Result<()> {
    let schema_value: Value =
        serde_json::from_str(schema).with_context(|| format!("parse {} schema", what))?;
    let compiled =
        validator_for(&schema_value).map_err(|err| anyhow!("invalid {} schema: {}", what, err))?;
    if !compiled.is_valid(value) {
        let messages = compiled
            .iter_errors(value)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "{} schema validation failed: {}",
            what,
            messages.join("; ")
        ));
    }
    Ok(())
}
