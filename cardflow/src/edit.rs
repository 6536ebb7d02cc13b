//! Edit commands for `cardflow add|remove|set` and the editor server.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::core::error::EngineError;
use crate::core::pipeline::Pipeline;
use crate::core::types::CardId;
use crate::session::Session;

/// Which card type to insert: `{"type": id}` or `{"label": label}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum CardTypeRef {
    #[serde(rename = "type")]
    TypeId(String),
    #[serde(rename = "label")]
    Label(String),
}

/// One edit against a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    Add {
        card_type: CardTypeRef,
        after: Option<CardId>,
    },
    Remove {
        id: CardId,
    },
    Set {
        id: CardId,
        key: String,
        raw: Value,
    },
}

/// Pipeline after an edit plus the card it touched.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub pipeline: Pipeline,
    pub card: CardId,
}

/// Apply `command` to `pipeline`, returning the new pipeline.
pub fn apply(pipeline: &Pipeline, command: &EditCommand) -> Result<EditOutcome, EngineError> {
    match command {
        EditCommand::Add { card_type, after } => {
            let (pipeline, card) = match card_type {
                CardTypeRef::TypeId(type_id) => pipeline.insert_card_after(*after, type_id)?,
                CardTypeRef::Label(label) => pipeline.insert_card_after_label(*after, label)?,
            };
            Ok(EditOutcome { pipeline, card })
        }
        EditCommand::Remove { id } => Ok(EditOutcome {
            pipeline: pipeline.remove_card(*id)?,
            card: *id,
        }),
        EditCommand::Set { id, key, raw } => Ok(EditOutcome {
            pipeline: pipeline.update_field(*id, key, raw.clone())?,
            card: *id,
        }),
    }
}

/// Interpret command-line input as JSON when it parses, else as a string.
///
/// `5` becomes a number, `["age"]` a list, and `zscore` the string `"zscore"`.
pub fn parse_raw_value(input: &str) -> Value {
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}

/// Load the workspace, apply `command`, and save the result.
pub fn edit_workspace(root: &Path, command: &EditCommand) -> Result<CardId> {
    let mut session = Session::open(root)?;
    let outcome = apply(session.pipeline(), command)
        .with_context(|| format!("apply {:?}", command))?;
    session.replace_pipeline(outcome.pipeline);
    session.save()?;
    tracing::debug!(card = %outcome.card, "edit applied");
    Ok(outcome.card)
}
