//! Stale column references.
//!
//! Removing or reconfiguring a card can leave other cards naming columns
//! that no longer exist. The engine never repairs those values; this module
//! only reports them.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::core::output::display_scalar;
use crate::core::pipeline::Pipeline;
use crate::core::types::CardId;

/// A visible column-picker value that names an unavailable column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingReference {
    pub card: CardId,
    pub field: String,
    pub column: String,
}

/// Every dangling reference in pipeline order.
///
/// Only fields whose options come from the column-name template are checked,
/// and only while visible. Validity is unaffected.
pub fn dangling_references(pipeline: &Pipeline) -> Vec<DanglingReference> {
    let mut found = Vec::new();
    for card in pipeline.cards() {
        let pickers: Vec<_> = card
            .config()
            .fields
            .iter()
            .filter(|field| field.draws_from_columns() && field.is_visible(card.values()))
            .collect();
        if pickers.is_empty() {
            continue;
        }

        let available = pipeline.available_columns(card.id());
        let names: HashSet<&str> = available.iter().map(|c| c.name.as_str()).collect();
        for field in pickers {
            let selected = match card.value(&field.key) {
                Some(Value::Array(items)) => items.iter().filter_map(display_scalar).collect(),
                Some(value) => display_scalar(value).into_iter().collect(),
                None => Vec::new(),
            };
            for column in selected {
                if !names.contains(column.as_str()) {
                    found.push(DanglingReference {
                        card: card.id(),
                        field: field.key.clone(),
                        column,
                    });
                }
            }
        }
    }
    found
}
