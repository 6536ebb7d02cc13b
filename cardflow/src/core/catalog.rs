//! Card type configs and the read-only catalog that holds them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::field::FieldSchema;
use crate::core::output::OutputRule;
use crate::core::types::FieldValues;

/// Immutable schema shared by every card of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTypeConfig {
    #[serde(rename = "type")]
    pub type_id: String,
    pub label: String,
    pub fields: Vec<FieldSchema>,
    pub output: OutputRule,
}

impl CardTypeConfig {
    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Initial values: every declared field set to its default.
    pub fn default_values(&self) -> FieldValues {
        self.fields
            .iter()
            .map(|field| (field.key.clone(), field.default.clone()))
            .collect()
    }

    /// Whether the output rule's base field holds a list.
    pub fn output_is_multiple(&self) -> bool {
        self.field(&self.output.field)
            .is_some_and(FieldSchema::is_multiple)
    }
}

/// Ordered set of card types available during one editing session.
///
/// The order is the human-decided order of the source and is preserved for
/// display. Configs are shared with every card instance built from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    types: Vec<Arc<CardTypeConfig>>,
}

impl Catalog {
    pub fn new(types: Vec<CardTypeConfig>) -> Self {
        Self {
            types: types.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn get(&self, type_id: &str) -> Option<&Arc<CardTypeConfig>> {
        self.types.iter().find(|config| config.type_id == type_id)
    }

    /// Look up a card type by its display label.
    pub fn by_label(&self, label: &str) -> Option<&Arc<CardTypeConfig>> {
        self.types.iter().find(|config| config.label == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CardTypeConfig>> {
        self.types.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.types.iter().map(|config| config.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
