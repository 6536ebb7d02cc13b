//! Derived render state for cards and fields.
//!
//! Views are recomputed from a `Pipeline` on demand and never stored; a
//! widget front end renders them and sends edits back as `(card, key, raw)`.

use serde::Serialize;
use serde_json::Value;

use crate::core::card::CardInstance;
use crate::core::field::{FieldSchema, NumericBounds, Widget};
use crate::core::pipeline::Pipeline;
use crate::core::references::{DanglingReference, dangling_references};
use crate::core::types::{CardId, ColumnDescriptor};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineView {
    pub valid: bool,
    pub cards: Vec<CardView>,
    pub dangling: Vec<DanglingReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub id: CardId,
    #[serde(rename = "type")]
    pub type_id: String,
    pub label: String,
    pub valid: bool,
    pub fields: Vec<FieldView>,
    pub outputs: Vec<ColumnDescriptor>,
}

/// Everything a widget needs to render one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub key: String,
    pub label: String,
    pub widget: Widget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub multiple: bool,
    #[serde(flatten)]
    pub bounds: NumericBounds,
    /// Resolved options; `None` for free-form inputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    pub value: Value,
    pub visible: bool,
    pub required: bool,
    pub valid: bool,
}

pub fn pipeline_view(pipeline: &Pipeline) -> PipelineView {
    PipelineView {
        valid: pipeline.is_valid(),
        cards: pipeline
            .cards()
            .map(|card| card_view(pipeline, card))
            .collect(),
        dangling: dangling_references(pipeline),
    }
}

pub fn card_view(pipeline: &Pipeline, card: &CardInstance) -> CardView {
    let needs_columns = card.config().fields.iter().any(FieldSchema::draws_from_columns);
    let available = if needs_columns {
        pipeline.available_columns(card.id())
    } else {
        Vec::new()
    };
    CardView {
        id: card.id(),
        type_id: card.type_id().to_string(),
        label: card.config().label.clone(),
        valid: card.is_valid(),
        fields: card
            .config()
            .fields
            .iter()
            .map(|field| field_view(card, field, &available))
            .collect(),
        outputs: card.outputs().to_vec(),
    }
}

fn field_view(card: &CardInstance, field: &FieldSchema, available: &[ColumnDescriptor]) -> FieldView {
    let state = card.field_state(field);
    FieldView {
        key: field.key.clone(),
        label: field.label.clone(),
        widget: field.widget,
        placeholder: field.placeholder.clone(),
        multiple: field.is_multiple(),
        bounds: field.bounds,
        options: field
            .options
            .as_ref()
            .map(|_| field.resolve_options(available)),
        value: card.value(&field.key).cloned().unwrap_or(Value::Null),
        visible: state.visible,
        required: state.required,
        valid: state.valid,
    }
}
