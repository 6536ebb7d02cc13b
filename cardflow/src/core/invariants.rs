//! Semantic invariants not expressible via JSON Schema.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::catalog::{CardTypeConfig, Catalog};
use crate::core::field::{Condition, Widget};
use crate::core::output::MAX_EXPANSION;
use crate::core::document::PipelineDocument;

static FIELD_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Field key reserved for the card value's discriminator.
pub const RESERVED_KEY: &str = "type";

/// Check catalog invariants:
/// - Type ids and labels are non-empty and unique
/// - Field keys are identifiers, unique per type, and never `type`
/// - Output rule fields exist; suffix and number fields are scalar
/// - The number field uses the number widget and caps its count with `max`
/// - Predicates only reference declared sibling keys
pub fn validate_catalog(catalog: &Catalog) -> Vec<String> {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();
    let mut labels = HashSet::new();

    for config in catalog.iter() {
        if config.type_id.is_empty() {
            errors.push("card type with empty type id".to_string());
        } else if !ids.insert(config.type_id.as_str()) {
            errors.push(format!("duplicate card type '{}'", config.type_id));
        }

        if config.label.is_empty() {
            errors.push(format!("{}: label must not be empty", config.type_id));
        } else if !labels.insert(config.label.as_str()) {
            errors.push(format!(
                "{}: duplicate label '{}'",
                config.type_id, config.label
            ));
        }

        validate_fields(config, &mut errors);
        validate_output(config, &mut errors);
    }
    errors
}

fn validate_fields(config: &CardTypeConfig, errors: &mut Vec<String>) {
    let declared: HashSet<&str> = config.fields.iter().map(|f| f.key.as_str()).collect();
    let mut seen = HashSet::new();

    for field in &config.fields {
        let path = format!("{}/{}", config.type_id, field.key);
        if !FIELD_KEY_RE.is_match(&field.key) {
            errors.push(format!("{}: key is not a valid identifier", path));
        }
        if field.key == RESERVED_KEY {
            errors.push(format!("{}: key '{}' is reserved", path, RESERVED_KEY));
        }
        if !seen.insert(field.key.as_str()) {
            errors.push(format!("{}: duplicate field key", path));
        }

        for (name, condition) in [("visible", &field.visible), ("required", &field.required)] {
            check_condition(&path, name, &field.key, condition, &declared, errors);
        }
    }
}

fn check_condition(
    path: &str,
    name: &str,
    own_key: &str,
    condition: &Condition,
    declared: &HashSet<&str>,
    errors: &mut Vec<String>,
) {
    for key in condition.keys() {
        if key == own_key {
            errors.push(format!("{}: {} predicate references itself", path, name));
        } else if !declared.contains(key) {
            errors.push(format!(
                "{}: {} predicate references unknown field '{}'",
                path, name, key
            ));
        }
    }
}

fn validate_output(config: &CardTypeConfig, errors: &mut Vec<String>) {
    let output = &config.output;
    if config.field(&output.field).is_none() {
        errors.push(format!(
            "{}: output field '{}' is not declared",
            config.type_id, output.field
        ));
    }

    if let Some(key) = &output.suffix_field {
        match config.field(key) {
            None => errors.push(format!(
                "{}: suffix field '{}' is not declared",
                config.type_id, key
            )),
            Some(field) if field.is_multiple() => errors.push(format!(
                "{}: suffix field '{}' must be scalar",
                config.type_id, key
            )),
            Some(_) => {}
        }
    }

    if let Some(key) = &output.number_field {
        match config.field(key) {
            None => errors.push(format!(
                "{}: number field '{}' is not declared",
                config.type_id, key
            )),
            Some(field) => {
                if field.is_multiple() {
                    errors.push(format!(
                        "{}: number field '{}' must be scalar",
                        config.type_id, key
                    ));
                }
                if field.widget != Widget::Number {
                    errors.push(format!(
                        "{}: number field '{}' must use the number widget",
                        config.type_id, key
                    ));
                } else if !field.bounds.max.is_some_and(|max| max <= MAX_EXPANSION as f64) {
                    errors.push(format!(
                        "{}: number field '{}' must declare max <= {}",
                        config.type_id, key, MAX_EXPANSION
                    ));
                }
            }
        }
    }
}

/// Check a stored pipeline document against `catalog` before it is restored:
/// - Card ids are unique and below `nextId`
/// - Every card's type is in the catalog
/// - Stored values only use declared field keys
pub fn validate_document(catalog: &Catalog, document: &PipelineDocument) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, card) in document.cards.iter().enumerate() {
        let path = match card.id {
            Some(id) => format!("card {} ({})", id, card.type_id),
            None => format!("card #{} ({})", index + 1, card.type_id),
        };
        if let Some(id) = card.id {
            if !seen.insert(id) {
                errors.push(format!("duplicate card id {}", id));
            }
            if document.next_id.is_some_and(|next| id.0 >= next) {
                errors.push(format!("{}: id is not below nextId", path));
            }
        }

        let Some(config) = catalog.get(&card.type_id) else {
            errors.push(format!("{}: type is not in the catalog", path));
            continue;
        };
        for key in card.values.keys() {
            if config.field(key).is_none() {
                errors.push(format!("{}: undeclared value '{}'", path, key));
            }
        }
    }
    errors
}
