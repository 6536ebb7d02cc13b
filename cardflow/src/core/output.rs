//! Column-name derivation from a card's output rule.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::types::{ColumnDescriptor, FieldValues};

/// Largest count a catalog may declare as the `max` of an expansion field.
///
/// Counts beyond a field's `max` make the field invalid; derivation of an
/// out-of-range draft value still stops here.
pub const MAX_EXPANSION: usize = 4096;

/// Recipe for deriving produced column names from a card's values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRule {
    /// Field holding the base name(s).
    pub field: String,
    /// Field whose value is appended as `_<suffix>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix_field: Option<String>,
    /// Field whose value `N` expands every name into `_1 .. _N`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_field: Option<String>,
}

impl OutputRule {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            suffix_field: None,
            number_field: None,
        }
    }

    pub fn with_suffix(mut self, key: impl Into<String>) -> Self {
        self.suffix_field = Some(key.into());
        self
    }

    pub fn with_number(mut self, key: impl Into<String>) -> Self {
        self.number_field = Some(key.into());
        self
    }

    /// Field keys the rule reads, in rule order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.field.as_str())
            .chain(self.suffix_field.as_deref())
            .chain(self.number_field.as_deref())
    }

    /// Derive the produced columns from `values`.
    ///
    /// `values` must contain only the card's visible fields; an absent key
    /// behaves like `null`:
    ///
    /// 1. the base field yields its list (`multiple`) or a one-element list;
    ///    absent or empty names are skipped
    /// 2. a present suffix turns every `name` into `name_suffix`, even an
    ///    empty one
    /// 3. a present count `N` turns every `name` into `name_1 .. name_N`
    pub fn derive(&self, base_multiple: bool, values: &FieldValues) -> Vec<ColumnDescriptor> {
        let mut names: Vec<String> = match values.get(&self.field) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) if base_multiple => {
                items.iter().filter_map(display_scalar).collect()
            }
            Some(value) => display_scalar(value).into_iter().collect(),
        };
        names.retain(|name| !name.is_empty());

        let suffix = self
            .suffix_field
            .as_ref()
            .and_then(|key| values.get(key))
            .and_then(display_scalar);
        if let Some(suffix) = suffix {
            names = names
                .into_iter()
                .map(|name| format!("{name}_{suffix}"))
                .collect();
        }

        let count = self
            .number_field
            .as_ref()
            .and_then(|key| values.get(key))
            .filter(|value| !value.is_null())
            .map(|value| value.as_f64().map(copies).unwrap_or(0));
        if let Some(count) = count {
            names = names
                .iter()
                .flat_map(|name| (1..=count).map(move |i| format!("{name}_{i}")))
                .collect();
        }

        names.into_iter().map(ColumnDescriptor::named).collect()
    }
}

fn copies(n: f64) -> usize {
    if !n.is_finite() || n <= 0.0 {
        return 0;
    }
    (n.ceil() as usize).min(MAX_EXPANSION)
}

/// Render a scalar the way it appears inside a column name.
pub(crate) fn display_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => {
            if number.is_i64() || number.is_u64() {
                return Some(number.to_string());
            }
            number.as_f64().map(|x| {
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    format!("{}", x as i64)
                } else {
                    x.to_string()
                }
            })
        }
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(display_scalar)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}
