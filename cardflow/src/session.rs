//! One editing session over a `.cardflow/` workspace.
//!
//! A session loads the catalog, base columns, filter state and persisted
//! pipeline once, then holds the current `Pipeline` value. Edits replace that
//! value wholesale; nothing is written back until [`Session::save`].

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::catalog::Catalog;
use crate::core::document::PipelineDocument;
use crate::core::filters::FilterState;
use crate::core::pipeline::Pipeline;
use crate::io::catalog_store::load_catalog;
use crate::io::columns_store::{load_columns, load_filters};
use crate::io::config::CardflowConfig;
use crate::io::init::CardflowPaths;
use crate::io::pipeline_store::{load_document, write_document};

#[derive(Debug, Clone)]
pub struct Session {
    paths: CardflowPaths,
    config: CardflowConfig,
    filters: FilterState,
    pipeline: Pipeline,
}

impl Session {
    /// Load every input of the workspace rooted at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        let (paths, config) = CardflowPaths::load(root)?;
        let catalog = load_catalog(&paths.catalog_path).context("load catalog")?;
        let columns = load_columns(&paths.columns_path).context("load base columns")?;
        let filters = load_filters(&paths.filters_path).context("load filter state")?;
        let document = load_document(&paths.pipeline_path)?;
        let pipeline = document
            .into_pipeline(Arc::new(catalog), columns.into())
            .with_context(|| format!("restore pipeline {}", paths.pipeline_path.display()))?;

        tracing::debug!(
            root = %root.display(),
            cards = pipeline.len(),
            base_columns = pipeline.base_columns().len(),
            "opened session"
        );
        Ok(Self {
            paths,
            config,
            filters,
            pipeline,
        })
    }

    pub fn paths(&self) -> &CardflowPaths {
        &self.paths
    }

    pub fn config(&self) -> &CardflowConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        self.pipeline.catalog()
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Swap in the result of an edit.
    pub fn replace_pipeline(&mut self, pipeline: Pipeline) {
        self.pipeline = pipeline;
    }

    /// Re-read base columns and filter state after the loader or filter
    /// stage rewrote them. Cards and their values are kept.
    pub fn reload_inputs(&mut self) -> Result<()> {
        let columns = load_columns(&self.paths.columns_path).context("reload base columns")?;
        self.filters = load_filters(&self.paths.filters_path).context("reload filter state")?;
        self.pipeline = self.pipeline.with_base_columns(columns.into());
        tracing::info!(
            base_columns = self.pipeline.base_columns().len(),
            "reloaded columns and filters"
        );
        Ok(())
    }

    /// The current pipeline as a persisted document.
    pub fn export(&self) -> PipelineDocument {
        PipelineDocument::from_pipeline(&self.pipeline)
    }

    /// Replace the pipeline with an imported document.
    ///
    /// Fails without touching the session if the document names a card type
    /// the catalog does not know or repeats a card id.
    pub fn import(&mut self, document: PipelineDocument) -> Result<()> {
        let pipeline = document
            .into_pipeline(
                Arc::clone(self.pipeline.catalog()),
                self.pipeline.base_columns().into(),
            )
            .context("import pipeline")?;
        self.pipeline = pipeline;
        Ok(())
    }

    /// Persist the pipeline to the workspace's pipeline file.
    pub fn save(&self) -> Result<()> {
        write_document(&self.paths.pipeline_path, &self.export())
    }
}
