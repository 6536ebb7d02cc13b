//! Test-only helpers for building catalogs and throwaway workspaces.

use std::path::Path;

use anyhow::Result;
use serde_json::Value;
use tempfile::TempDir;

use crate::core::catalog::CardTypeConfig;
use crate::core::field::{FieldSchema, Widget};
use crate::core::output::OutputRule;
use crate::core::types::CardId;
use crate::edit::{CardTypeRef, EditCommand, edit_workspace};
use crate::io::init::{CardflowPaths, InitOptions, init_workspace};

/// A temporary directory with an initialized `.cardflow/` workspace.
pub struct TestWorkspace {
    temp: TempDir,
    paths: CardflowPaths,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let paths = init_workspace(temp.path(), &InitOptions { force: false })?;
        Ok(Self { temp, paths })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn paths(&self) -> &CardflowPaths {
        &self.paths
    }

    /// Insert a card of `type_id` at the head of the stored pipeline.
    pub fn add_card(&self, type_id: &str) -> Result<CardId> {
        edit_workspace(
            self.root(),
            &EditCommand::Add {
                card_type: CardTypeRef::TypeId(type_id.to_string()),
                after: None,
            },
        )
    }

    pub fn set_field(&self, id: CardId, key: &str, raw: Value) -> Result<CardId> {
        edit_workspace(
            self.root(),
            &EditCommand::Set {
                id,
                key: key.to_string(),
                raw,
            },
        )
    }
}

/// Field with the given widget and an explicit default.
pub fn field(key: &str, widget: Widget, default: Value) -> FieldSchema {
    FieldSchema {
        default,
        ..FieldSchema::new(key, widget)
    }
}

/// Card type config with a deterministic label derived from the id.
pub fn card_type(type_id: &str, fields: Vec<FieldSchema>, output: OutputRule) -> CardTypeConfig {
    CardTypeConfig {
        type_id: type_id.to_string(),
        label: format!("{} card", type_id),
        fields,
        output,
    }
}
