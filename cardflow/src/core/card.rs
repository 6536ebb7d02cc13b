//! Card instances: current values plus everything derived from them.
//!
//! A `CardInstance` is immutable. `update_field` is the single mutation entry
//! point and returns a new instance; outputs are computed once per instance
//! so pipelines can reuse them across availability queries.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::core::catalog::CardTypeConfig;
use crate::core::error::EngineError;
use crate::core::field::FieldSchema;
use crate::core::types::{CardId, CardValue, ColumnDescriptor, FieldValues};

/// Derived state of one field against the card's current values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldState {
    pub visible: bool,
    pub required: bool,
    pub valid: bool,
}

impl FieldState {
    /// True if this field blocks the card from being valid.
    pub fn blocks(&self) -> bool {
        self.visible && self.required && !self.valid
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardInstance {
    id: CardId,
    config: Arc<CardTypeConfig>,
    values: FieldValues,
    outputs: Vec<ColumnDescriptor>,
}

impl CardInstance {
    /// New card with every field at its default value.
    pub fn new(id: CardId, config: Arc<CardTypeConfig>) -> Self {
        let values = config.default_values();
        Self::from_parts(id, config, values)
    }

    /// Card restored from stored values.
    ///
    /// Declared keys missing from `stored` fall back to their defaults; keys
    /// the card type does not declare are dropped.
    pub fn with_values(id: CardId, config: Arc<CardTypeConfig>, mut stored: FieldValues) -> Self {
        let values = config
            .fields
            .iter()
            .map(|field| {
                let value = stored
                    .remove(&field.key)
                    .unwrap_or_else(|| field.default.clone());
                (field.key.clone(), value)
            })
            .collect();
        Self::from_parts(id, config, values)
    }

    fn from_parts(id: CardId, config: Arc<CardTypeConfig>, values: FieldValues) -> Self {
        let visible = visible_values(&config, &values);
        let outputs = config
            .output
            .derive(config.output_is_multiple(), &visible);
        Self {
            id,
            config,
            values,
            outputs,
        }
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn config(&self) -> &Arc<CardTypeConfig> {
        &self.config
    }

    pub fn type_id(&self) -> &str {
        &self.config.type_id
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Columns this card produces, derived from its visible values.
    pub fn outputs(&self) -> &[ColumnDescriptor] {
        &self.outputs
    }

    pub fn field_state(&self, field: &FieldSchema) -> FieldState {
        FieldState {
            visible: field.is_visible(&self.values),
            required: field.is_required(&self.values),
            valid: field.is_valid(&self.values),
        }
    }

    /// `{type} ∪ {key: value}` for every field that is visible and valid.
    ///
    /// Hidden fields never leak, even when they hold a stale value.
    pub fn card_value(&self) -> CardValue {
        let mut value = CardValue::new();
        value.insert(
            "type".to_string(),
            Value::String(self.config.type_id.clone()),
        );
        value.extend(emitted_values(&self.config, &self.values));
        value
    }

    /// A card is valid when no visible, required field is invalid.
    pub fn is_valid(&self) -> bool {
        self.config
            .fields
            .iter()
            .all(|field| !self.field_state(field).blocks())
    }

    /// Keys of the visible, required fields that are currently invalid.
    pub fn incomplete_fields(&self) -> Vec<String> {
        self.config
            .fields
            .iter()
            .filter(|field| self.field_state(field).blocks())
            .map(|field| field.key.clone())
            .collect()
    }

    /// Parse `raw` for field `key` and return the updated card.
    pub fn update_field(&self, key: &str, raw: Value) -> Result<CardInstance, EngineError> {
        let field = self
            .config
            .field(key)
            .ok_or_else(|| EngineError::UnknownField {
                card_type: self.config.type_id.clone(),
                key: key.to_string(),
            })?;
        let mut values = self.values.clone();
        values.insert(key.to_string(), field.parse_input(raw));
        Ok(Self::from_parts(self.id, Arc::clone(&self.config), values))
    }
}

fn visible_values(config: &CardTypeConfig, values: &FieldValues) -> FieldValues {
    select_values(config, values, |field| field.is_visible(values))
}

fn emitted_values(config: &CardTypeConfig, values: &FieldValues) -> FieldValues {
    select_values(config, values, |field| {
        field.is_visible(values) && field.is_valid(values)
    })
}

fn select_values(
    config: &CardTypeConfig,
    values: &FieldValues,
    keep: impl Fn(&FieldSchema) -> bool,
) -> FieldValues {
    config
        .fields
        .iter()
        .filter(|field| keep(field))
        .filter_map(|field| {
            values
                .get(&field.key)
                .map(|value| (field.key.clone(), value.clone()))
        })
        .collect()
}
