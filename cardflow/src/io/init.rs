//! Initialization helpers for `.cardflow/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::catalog_store::write_catalog;
use super::columns_store::{write_columns, write_filters};
use super::config::{CardflowConfig, load_config, write_config};
use super::pipeline_store::write_document;
use crate::core::builtin::builtin_catalog;
use crate::core::document::PipelineDocument;
use crate::core::filters::FilterState;

/// All canonical paths within `.cardflow/` for a project root.
///
/// Data file locations come from the workspace config; see
/// [`CardflowPaths::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardflowPaths {
    pub root: PathBuf,
    pub cardflow_dir: PathBuf,
    pub config_path: PathBuf,
    pub gitignore_path: PathBuf,
    pub catalog_path: PathBuf,
    pub columns_path: PathBuf,
    pub filters_path: PathBuf,
    pub pipeline_path: PathBuf,
    pub requests_dir: PathBuf,
}

impl CardflowPaths {
    /// Paths for the default layout.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, &CardflowConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: &CardflowConfig) -> Self {
        let root = root.into();
        let cardflow_dir = root.join(".cardflow");
        Self {
            root: root.clone(),
            config_path: cardflow_dir.join("config.toml"),
            gitignore_path: cardflow_dir.join(".gitignore"),
            catalog_path: cardflow_dir.join(&config.files.catalog),
            columns_path: cardflow_dir.join(&config.files.columns),
            filters_path: cardflow_dir.join(&config.files.filters),
            pipeline_path: cardflow_dir.join(&config.files.pipeline),
            requests_dir: cardflow_dir.join(&config.submit.requests_dir),
            cardflow_dir,
        }
    }

    /// Read `config.toml` under `root` and resolve every path from it.
    pub fn load(root: impl Into<PathBuf>) -> Result<(Self, CardflowConfig)> {
        let root = root.into();
        let defaults = Self::new(&root);
        if !defaults.cardflow_dir.is_dir() {
            return Err(anyhow!(
                "no .cardflow workspace in {} (run `cardflow init`)",
                root.display()
            ));
        }
        let config = load_config(&defaults.config_path)?;
        Ok((Self::with_config(root, &config), config))
    }
}

/// Options for `init_workspace`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing cardflow-owned files.
    pub force: bool,
}

/// Create `.cardflow/` scaffolding in `root`.
///
/// Writes the default config, the built-in catalog, empty columns, filters
/// and pipeline, and the requests directory. Fails if `.cardflow/` already
/// exists unless `options.force` is set.
pub fn init_workspace(root: &Path, options: &InitOptions) -> Result<CardflowPaths> {
    let paths = CardflowPaths::new(root);
    if paths.cardflow_dir.exists() && !options.force {
        return Err(anyhow!(
            "cardflow init: .cardflow already exists (use --force to overwrite)"
        ));
    }
    if paths.cardflow_dir.exists() && !paths.cardflow_dir.is_dir() {
        return Err(anyhow!(
            "cardflow init: .cardflow exists but is not a directory"
        ));
    }

    create_dir(&paths.cardflow_dir)?;
    create_dir(&paths.requests_dir)?;

    write_config(&paths.config_path, &CardflowConfig::default())?;
    fs::write(&paths.gitignore_path, CARDFLOW_GITIGNORE)
        .with_context(|| format!("write file {}", paths.gitignore_path.display()))?;
    write_catalog(&paths.catalog_path, &builtin_catalog())?;
    write_columns(&paths.columns_path, &[])?;
    write_filters(&paths.filters_path, &FilterState::default())?;
    write_document(&paths.pipeline_path, &PipelineDocument::default())?;

    tracing::info!(dir = %paths.cardflow_dir.display(), "initialized cardflow workspace");
    Ok(paths)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

const CARDFLOW_GITIGNORE: &str = "requests/\n";
