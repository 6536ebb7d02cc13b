//! Shared value types for the card engine.
//!
//! These types are plain data: they carry no derived state and never depend on
//! I/O, so they can be freely cloned across pipeline revisions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current field values of one card, keyed by field key.
pub type FieldValues = BTreeMap<String, Value>;

/// Externally visible value of one card (`{"type": ..., <field>: <value>, ...}`).
pub type CardValue = serde_json::Map<String, Value>;

/// Stable identity of a card within one pipeline.
///
/// Identities are handed out monotonically and never reused, so they stay
/// valid across reordering and removal of unrelated cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse kind of a loaded column, as reported by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Categorical,
    Numerical,
}

/// A named handle to a dataset column, either loaded or produced by a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ColumnKind>,
    /// Summary statistics from the loader (interval bounds or distinct values).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
}

impl ColumnDescriptor {
    /// Descriptor carrying only a name, as produced by cards.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            summary: None,
        }
    }
}
