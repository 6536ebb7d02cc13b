//! Typed errors raised by the card engine.

use serde::Serialize;
use thiserror::Error;

use crate::core::types::CardId;

/// Programmer or catalog-consistency errors.
///
/// These indicate a caller referenced something that does not exist; they
/// never arise from ordinary user input, which degrades to invalid fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown card type '{0}'")]
    UnknownCardType(String),
    #[error("no card type labelled '{0}'")]
    UnknownCardLabel(String),
    #[error("card {0} not found in pipeline")]
    UnknownCard(CardId),
    #[error("card id {0} appears more than once")]
    DuplicateCard(CardId),
    #[error("card type '{card_type}' has no field '{key}'")]
    UnknownField { card_type: String, key: String },
}

/// Submission refused because at least one card has incomplete required fields.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Invalid request, please fill out all required fields.")]
pub struct NotReady {
    pub incomplete: Vec<IncompleteCard>,
}

/// One card that blocks submission and the required fields it is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteCard {
    pub id: CardId,
    #[serde(rename = "type")]
    pub type_id: String,
    pub fields: Vec<String>,
}
