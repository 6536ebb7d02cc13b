//! Persisted pipeline document: the export/import format for cards.
//!
//! ```json
//! {"nextId": 3, "cards": [{"id": 2, "type": "rescale", "values": {"method": "zscore", ...}}]}
//! ```
//!
//! Card ids and the id counter are persisted so an id printed by one command
//! still names the same card in the next. Hand-written documents may omit
//! both; such cards get fresh ids on load.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::catalog::Catalog;
use crate::core::error::EngineError;
use crate::core::pipeline::Pipeline;
use crate::core::types::{CardId, ColumnDescriptor, FieldValues};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<u64>,
    #[serde(default)]
    pub cards: Vec<CardDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CardId>,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default)]
    pub values: FieldValues,
}

impl PipelineDocument {
    /// Every card's id, type and full stored values, in pipeline order.
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        Self {
            next_id: Some(pipeline.next_id()),
            cards: pipeline
                .cards()
                .map(|card| CardDocument {
                    id: Some(card.id()),
                    type_id: card.type_id().to_string(),
                    values: card.values().clone(),
                })
                .collect(),
        }
    }

    /// Rebuild a pipeline against `catalog`.
    ///
    /// Unknown card types and repeated ids are errors.
    pub fn into_pipeline(
        self,
        catalog: Arc<Catalog>,
        base_columns: Arc<[ColumnDescriptor]>,
    ) -> Result<Pipeline, EngineError> {
        Pipeline::restore(
            catalog,
            base_columns,
            self.next_id,
            self.cards
                .into_iter()
                .map(|card| (card.id, card.type_id, card.values)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builtin::builtin_catalog;
    use crate::core::card::CardInstance;
    use serde_json::{Value, json};

    fn base() -> Arc<[ColumnDescriptor]> {
        vec![ColumnDescriptor::named("age")].into()
    }

    #[test]
    fn export_then_import_keeps_types_values_and_order() {
        let catalog = Arc::new(builtin_catalog());
        let pipeline = Pipeline::new(Arc::clone(&catalog), base());
        let (pipeline, a) = pipeline.insert_card_after(None, "split").expect("a");
        let (pipeline, b) = pipeline.insert_card_after(Some(a), "rescale").expect("b");
        let pipeline = pipeline
            .update_field(a, "method", json!("tiles"))
            .and_then(|p| p.update_field(a, "tiles", json!("5")))
            .and_then(|p| p.update_field(b, "columns", json!(["partition_2"])))
            .expect("edits");

        let document = PipelineDocument::from_pipeline(&pipeline);
        let text = serde_json::to_string(&document).expect("serialize");
        let parsed: PipelineDocument = serde_json::from_str(&text).expect("parse");
        let restored = parsed.into_pipeline(catalog, base()).expect("import");

        let before: Vec<_> = pipeline
            .cards()
            .map(|c| (c.id(), c.type_id(), c.values()))
            .collect();
        let after: Vec<_> = restored
            .cards()
            .map(|c| (c.id(), c.type_id(), c.values()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(restored.next_id(), pipeline.next_id());
        let outputs: Vec<_> = restored.cards().map(CardInstance::outputs).collect();
        assert_eq!(outputs[0].len(), 5);
    }

    #[test]
    fn import_fills_defaults_and_drops_unknown_keys() {
        let document: PipelineDocument = serde_json::from_value(json!({
            "cards": [{"type": "rescale", "values": {"method": "minmax", "extra": 1}}]
        }))
        .expect("document");
        let pipeline = document
            .into_pipeline(Arc::new(builtin_catalog()), base())
            .expect("import");
        let card = pipeline.cards().next().expect("card");
        assert_eq!(card.value("method"), Some(&json!("minmax")));
        assert_eq!(card.value("suffix"), Some(&json!("rescaled")));
        assert!(card.value("extra").is_none());
    }

    #[test]
    fn ids_survive_a_head_insert_and_reload() {
        let catalog = Arc::new(builtin_catalog());
        let pipeline = Pipeline::new(Arc::clone(&catalog), base());
        let (pipeline, rescale) = pipeline.insert_card_after(None, "rescale").expect("rescale");
        let (pipeline, split) = pipeline.insert_card_after(None, "split").expect("split");

        let reloaded = PipelineDocument::from_pipeline(&pipeline)
            .into_pipeline(Arc::clone(&catalog), base())
            .expect("reload");
        let edited = reloaded
            .update_field(rescale, "method", json!("zscore"))
            .expect("edit");
        assert_eq!(edited.card(rescale).expect("rescale").type_id(), "rescale");
        assert_eq!(
            edited.card(rescale).expect("rescale").value("method"),
            Some(&json!("zscore"))
        );
        assert_eq!(edited.card(split).expect("split").value("method"), Some(&Value::Null));

        let (_, fresh) = edited.insert_card_after(None, "split").expect("insert");
        assert_eq!(fresh, CardId(3));
    }

    #[test]
    fn documents_without_ids_still_load() {
        let document: PipelineDocument =
            serde_json::from_value(json!({"cards": [{"type": "split"}, {"type": "rescale"}]}))
                .expect("document");
        let pipeline = document
            .into_pipeline(Arc::new(builtin_catalog()), base())
            .expect("import");
        let ids: Vec<CardId> = pipeline.cards().map(CardInstance::id).collect();
        assert_eq!(ids, vec![CardId(1), CardId(2)]);
    }

    #[test]
    fn import_rejects_unknown_card_types() {
        let document: PipelineDocument =
            serde_json::from_value(json!({"cards": [{"type": "pivot"}]})).expect("document");
        let err = document
            .into_pipeline(Arc::new(builtin_catalog()), base())
            .expect_err("unknown type");
        assert_eq!(err, EngineError::UnknownCardType("pivot".to_string()));
    }
}
