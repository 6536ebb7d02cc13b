//! Validation helpers for the `.cardflow/` layout and the stored pipeline.

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::core::error::IncompleteCard;
use crate::core::invariants::validate_document;
use crate::core::references::{DanglingReference, dangling_references};
use crate::io::catalog_store::load_catalog;
use crate::io::init::CardflowPaths;
use crate::io::pipeline_store::load_document;
use crate::session::Session;

/// High-level validation outcome for a loadable workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateReport {
    pub cards: usize,
    /// Cards blocking submission; empty when the pipeline is ready.
    pub incomplete: Vec<IncompleteCard>,
    /// Column references that no longer resolve. Advisory only.
    pub dangling: Vec<DanglingReference>,
}

impl ValidateReport {
    pub fn is_ready(&self) -> bool {
        self.incomplete.is_empty()
    }
}

/// Validate layout, config, catalog, columns, filters and pipeline.
///
/// Structural problems are errors; an incomplete pipeline is reported.
pub fn validate_workspace(root: &Path) -> Result<ValidateReport> {
    let (paths, _) = CardflowPaths::load(root).context("load config.toml")?;

    ensure_dir(&paths.cardflow_dir)?;
    ensure_file(&paths.config_path)?;
    ensure_file(&paths.catalog_path)?;

    let catalog = load_catalog(&paths.catalog_path).context("load catalog")?;
    let document = load_document(&paths.pipeline_path)?;
    let errors = validate_document(&catalog, &document);
    if !errors.is_empty() {
        return Err(anyhow!("pipeline invariants failed: {}", errors.join("; ")));
    }

    let session = Session::open(root)?;
    let pipeline = session.pipeline();

    let incomplete = match pipeline.serialize() {
        Ok(_) => Vec::new(),
        Err(not_ready) => not_ready.incomplete,
    };
    Ok(ValidateReport {
        cards: pipeline.len(),
        incomplete,
        dangling: dangling_references(pipeline),
    })
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!("missing directory {}", path.display()));
    }
    if !path.is_dir() {
        return Err(anyhow!("expected directory {}", path.display()));
    }
    Ok(())
}

fn ensure_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!("missing file {}", path.display()));
    }
    if !path.is_file() {
        return Err(anyhow!("expected file {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CardId;
    use crate::test_support::TestWorkspace;
    use serde_json::json;
    use std::fs;

    #[test]
    fn fresh_workspace_is_ready() {
        let workspace = TestWorkspace::new().expect("workspace");
        let report = validate_workspace(workspace.root()).expect("validate");
        assert_eq!(report.cards, 0);
        assert!(report.is_ready());
    }

    #[test]
    fn incomplete_cards_are_reported_not_errors() {
        let workspace = TestWorkspace::new().expect("workspace");
        let id = workspace.add_card("rescale").expect("add");
        workspace.set_field(id, "method", json!("log")).expect("set");

        let report = validate_workspace(workspace.root()).expect("validate");
        assert!(!report.is_ready());
        assert_eq!(report.incomplete.len(), 1);
        assert_eq!(report.incomplete[0].id, CardId(1));
        assert_eq!(report.incomplete[0].fields, vec!["columns"]);
    }

    #[test]
    fn dangling_references_are_advisory() {
        let workspace = TestWorkspace::new().expect("workspace");
        let id = workspace.add_card("rescale").expect("add");
        workspace.set_field(id, "method", json!("log")).expect("method");
        workspace.set_field(id, "columns", json!(["gone"])).expect("columns");

        let report = validate_workspace(workspace.root()).expect("validate");
        assert!(report.is_ready());
        assert_eq!(report.dangling.len(), 1);
        assert_eq!(report.dangling[0].column, "gone");
    }

    #[test]
    fn stored_document_invariants_are_checked() {
        let workspace = TestWorkspace::new().expect("workspace");
        fs::write(
            &workspace.paths().pipeline_path,
            r#"{"cards": [{"id": 2, "type": "split", "values": {"stale": true}}]}"#,
        )
        .expect("write");
        let err = validate_workspace(workspace.root()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "pipeline invariants failed: card 2 (split): undeclared value 'stale'"
        );
    }

    #[test]
    fn missing_catalog_is_an_error() {
        let workspace = TestWorkspace::new().expect("workspace");
        fs::remove_file(&workspace.paths().catalog_path).expect("remove");
        let err = validate_workspace(workspace.root()).unwrap_err();
        assert!(err.to_string().contains("missing file"));
    }

    #[test]
    fn missing_layout_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = validate_workspace(temp.path()).unwrap_err();
        assert!(format!("{err:#}").contains("no .cardflow workspace"));
    }
}
