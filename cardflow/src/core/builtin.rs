//! Card types shipped with cardflow.
//!
//! Each built-in type is one variant of a closed enum and produces its config
//! through a single `match`; there is no mutable registry. `cardflow init`
//! writes these configs as the starting catalog.

use serde_json::{Value, json};

use crate::core::catalog::{CardTypeConfig, Catalog};
use crate::core::field::{
    Condition, FieldSchema, NumericBounds, OptionsSource, OptionsTemplate, TemplateVar, Widget,
};
use crate::core::output::{MAX_EXPANSION, OutputRule};

const RESCALE_METHODS: [&str; 5] = ["zscore", "maxabs", "minmax", "log", "logistic"];
const SPLIT_METHODS: [&str; 2] = ["percentile", "tiles"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCardType {
    Rescale,
    Split,
}

impl BuiltinCardType {
    pub const ALL: [BuiltinCardType; 2] = [BuiltinCardType::Rescale, BuiltinCardType::Split];

    pub fn type_id(self) -> &'static str {
        match self {
            BuiltinCardType::Rescale => "rescale",
            BuiltinCardType::Split => "split",
        }
    }

    pub fn config(self) -> CardTypeConfig {
        match self {
            BuiltinCardType::Rescale => CardTypeConfig {
                type_id: self.type_id().to_string(),
                label: "Rescale".to_string(),
                fields: vec![
                    select("method", "Method", &RESCALE_METHODS),
                    optional(column_picker("by", "Group")),
                    column_picker("columns", "Columns"),
                    optional(text("suffix", "Suffix", "rescaled")),
                ],
                output: OutputRule::new("columns").with_suffix("suffix"),
            },
            BuiltinCardType::Split => {
                let percentile = Condition::when("method", vec![json!("percentile")]);
                let tiles = Condition::when("method", vec![json!("tiles")]);
                CardTypeConfig {
                    type_id: self.type_id().to_string(),
                    label: "Split".to_string(),
                    fields: vec![
                        select("method", "Method", &SPLIT_METHODS),
                        column_picker("order_by", "Order"),
                        optional(column_picker("by", "Group")),
                        text("output", "Output", "partition"),
                        FieldSchema {
                            bounds: NumericBounds {
                                min: Some(0.0),
                                max: Some(1.0),
                                step: Some(0.01),
                            },
                            visible: percentile.clone(),
                            required: percentile,
                            ..labelled(FieldSchema::new("p", Widget::Number), "Percentile")
                        },
                        FieldSchema {
                            bounds: NumericBounds {
                                min: Some(1.0),
                                max: Some(MAX_EXPANSION as f64),
                                step: Some(1.0),
                            },
                            visible: tiles.clone(),
                            required: tiles,
                            ..labelled(FieldSchema::new("tiles", Widget::Number), "Tiles")
                        },
                    ],
                    output: OutputRule::new("output").with_number("tiles"),
                }
            }
        }
    }
}

/// Catalog containing every built-in card type, in declaration order.
pub fn builtin_catalog() -> Catalog {
    Catalog::new(BuiltinCardType::ALL.iter().map(|t| t.config()).collect())
}

fn labelled(mut field: FieldSchema, label: &str) -> FieldSchema {
    field.label = label.to_string();
    field.placeholder = Some("Select...".to_string());
    field
}

fn optional(mut field: FieldSchema) -> FieldSchema {
    field.required = Condition::Never;
    field
}

fn select(key: &str, label: &str, choices: &[&str]) -> FieldSchema {
    FieldSchema {
        options: Some(OptionsSource::Fixed(
            choices.iter().map(|choice| json!(choice)).collect(),
        )),
        ..labelled(FieldSchema::new(key, Widget::Select), label)
    }
}

fn column_picker(key: &str, label: &str) -> FieldSchema {
    FieldSchema {
        options: Some(OptionsSource::Template(OptionsTemplate {
            var: TemplateVar::Names,
        })),
        default: Value::Array(Vec::new()),
        ..labelled(FieldSchema::new(key, Widget::MultiSelect), label)
    }
}

fn text(key: &str, label: &str, default: &str) -> FieldSchema {
    FieldSchema {
        default: json!(default),
        ..labelled(FieldSchema::new(key, Widget::Text), label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::invariants::validate_catalog;

    #[test]
    fn builtin_catalog_satisfies_catalog_invariants() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.labels(), vec!["Rescale", "Split"]);
        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn builtin_configs_survive_json() {
        for builtin in BuiltinCardType::ALL {
            let config = builtin.config();
            let json = serde_json::to_value(&config).expect("serialize");
            let parsed: CardTypeConfig = serde_json::from_value(json).expect("parse");
            assert_eq!(parsed, config, "{}", builtin.type_id());
        }
    }
}
